//! Domain model (IDs, artifacts, task status, poller state, errors, events).

pub mod artifact;
pub mod discovery;
pub mod errors;
pub mod events;
pub mod ids;
pub mod message;
pub mod state;
pub mod task;
pub mod upload;

pub use self::artifact::{Artifact, ArtifactOrigin, ordinal_title};
pub use self::discovery::{DiscoveryKind, DiscoveryOutcome, DiscoveryReply, DiscoveryRequest};
pub use self::errors::{
    DiscoveryError, ErrorKind, PollingError, ServiceError, StoreError, SubmissionError,
};
pub use self::events::SessionEvent;
pub use self::ids::{ArtifactId, MessageId, RequestId};
pub use self::message::{GREETING, Message, Sender};
pub use self::state::PollerState;
pub use self::task::{StatusReport, StatusResponse, SubmitResponse, TaskHandle, TaskStatus};
pub use self::upload::PendingUpload;

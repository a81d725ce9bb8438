//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **SessionBuilder**: セッションの構築とワイヤリング
//! - **Session**: 画面側ファサード（staging, submit, discovery, playback）
//! - **UploadSubmitter**: アップロード送信
//! - **TaskPoller**: task status のポーリング状態機械
//! - **DiscoveryTrigger**: チャット / 画像経由の artifact 生成
//! - **PlaybackSelector**: 再生中 artifact の選択
//! - **Transcript**: チャットログ

pub mod builder;
pub mod discovery;
pub mod playback;
pub mod poller;
pub mod session;
pub mod status;
pub mod submitter;
pub mod transcript;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, SessionBuilder};
pub use self::discovery::{APOLOGY_MESSAGE, DiscoveryTicket, DiscoveryTrigger};
pub use self::playback::PlaybackSelector;
pub use self::poller::{PollOutcome, PollerSettings, TaskPoller, TaskTicket};
pub use self::session::Session;
pub use self::status::SessionSnapshot;
pub use self::submitter::UploadSubmitter;
pub use self::transcript::Transcript;

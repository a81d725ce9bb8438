//! Transcript - チャットログ（user / bot のメッセージ列）

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::{GREETING, Message, Sender};
use crate::ports::{Clock, IdGenerator};

pub struct Transcript {
    messages: Mutex<Vec<Message>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Transcript {
    /// Starts with the bot greeting.
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        let transcript = Self {
            messages: Mutex::new(Vec::new()),
            ids,
            clock,
        };
        transcript.post(Sender::Bot, GREETING.to_string(), None);
        transcript
    }

    pub fn post_user(&self, text: impl Into<String>, image: Option<String>) -> Message {
        self.post(Sender::User, text.into(), image)
    }

    pub fn post_bot(&self, text: impl Into<String>) -> Message {
        self.post(Sender::Bot, text.into(), None)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn post(&self, sender: Sender, text: String, image: Option<String>) -> Message {
        let message = Message {
            id: self.ids.generate_message_id(),
            sender,
            text,
            image,
            created_at: self.clock.now(),
        };
        self.lock().push(message.clone());
        message
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Message>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcript")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{SystemClock, UlidGenerator};

    fn transcript() -> Transcript {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Transcript::new(Arc::new(UlidGenerator::new(Arc::clone(&clock))), clock)
    }

    #[test]
    fn seeded_with_greeting() {
        let messages = transcript().messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::Bot);
        assert_eq!(messages[0].text, GREETING);
    }

    #[test]
    fn keeps_posting_order() {
        let transcript = transcript();
        transcript.post_user("Uploaded image: cat.png", Some("cat.png".to_string()));
        transcript.post_bot("Here you go");

        let senders: Vec<_> = transcript.messages().iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::Bot, Sender::User, Sender::Bot]);
        assert_eq!(transcript.messages()[1].image.as_deref(), Some("cat.png"));
    }
}

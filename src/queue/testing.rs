use std::sync::Mutex;

use async_trait::async_trait;

use super::{PublishError, Publisher, QueueMessage};

type FailWhen = Box<dyn Fn(&QueueMessage) -> Option<PublishError> + Send + Sync>;

/// In-memory publisher that validates like the broker client and keeps
/// every accepted message.
pub struct RecordingPublisher {
    sent: Mutex<Vec<QueueMessage>>,
    attempts: Mutex<usize>,
    fail_when: FailWhen,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::failing_when(|_| None)
    }

    pub fn failing_when(
        fail_when: impl Fn(&QueueMessage) -> Option<PublishError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
            fail_when: Box::new(fail_when),
        }
    }

    pub fn sent(&self) -> Vec<QueueMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Calls that got past validation, successful or not.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, message: &QueueMessage) -> Result<(), PublishError> {
        message.validate()?;
        *self.attempts.lock().unwrap() += 1;
        if let Some(err) = (self.fail_when)(message) {
            return Err(err);
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

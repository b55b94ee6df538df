use thiserror::Error;

/// Why a message could not be handed to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// The message does not match its queue's schema. Never retried.
    #[error("Invalid message: {0}")]
    Validation(String),

    /// The broker could not be reached or answered with an error status.
    #[error("Broker unavailable: {0}")]
    Transport(String),

    /// The broker accepted the request but no queue was bound for it.
    #[error("Message not routed: {0}")]
    Routing(String),
}

impl PublishError {
    /// Only transport failures can succeed on a plain retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PublishError::Transport(_))
    }
}

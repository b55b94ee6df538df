mod error;
mod messages;
mod publisher;

pub use error::PublishError;
pub use messages::{NewsMessage, QueueMessage, QueueName, RssAtomMessage, SearcherMessage};
pub use publisher::{Publisher, RabbitPublisher};

#[cfg(test)]
pub mod testing;

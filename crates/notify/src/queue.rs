//! Event queue trait definition.

use crate::error::NotifyResult;
use async_trait::async_trait;

/// A message pulled from the notification queue.
#[derive(Clone, Debug)]
pub struct QueueMessage {
    /// Raw message body.
    pub body: String,
    /// Delivery handle used to acknowledge (delete) this delivery.
    pub receipt: String,
}

/// At-least-once delivery channel of upload notifications.
///
/// The channel owns redelivery: a message that is never deleted becomes
/// visible again after its visibility timeout and is dead-lettered by the
/// channel itself once it exceeds the configured delivery count. This
/// component keeps no retry bookkeeping of its own.
#[async_trait]
pub trait EventQueue: Send + Sync + 'static {
    /// Receive at most one message, long-polling up to the configured wait.
    /// `Ok(None)` means the wait elapsed with nothing to deliver.
    async fn receive(&self) -> NotifyResult<Option<QueueMessage>>;

    /// Acknowledge a delivery by deleting it from the queue.
    async fn delete(&self, receipt: &str) -> NotifyResult<()>;
}

//! In-memory event queue.
//!
//! Test double for the notification channel. Receives pop in FIFO order;
//! deliveries are tracked so tests can assert which messages were
//! acknowledged and which remain outstanding for redelivery.

use crate::error::NotifyResult;
use crate::queue::{EventQueue, QueueMessage};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Pause simulating an empty long-poll, so consumer loops don't spin.
const EMPTY_POLL_PAUSE: Duration = Duration::from_millis(5);

/// Process-local queue of upload notifications.
#[derive(Default)]
pub struct MemoryQueue {
    pending: Mutex<VecDeque<QueueMessage>>,
    deleted: Mutex<HashSet<String>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a message for delivery.
    pub fn push(&self, body: impl Into<String>, receipt: impl Into<String>) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.push_back(QueueMessage {
            body: body.into(),
            receipt: receipt.into(),
        });
    }

    /// Whether the given delivery was acknowledged.
    pub fn was_deleted(&self, receipt: &str) -> bool {
        let deleted = self.deleted.lock().unwrap_or_else(|e| e.into_inner());
        deleted.contains(receipt)
    }

    /// Number of messages not yet received.
    pub fn pending_len(&self) -> usize {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.len()
    }
}

#[async_trait]
impl EventQueue for MemoryQueue {
    async fn receive(&self) -> NotifyResult<Option<QueueMessage>> {
        let message = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.pop_front()
        };
        if message.is_none() {
            tokio::time::sleep(EMPTY_POLL_PAUSE).await;
        }
        Ok(message)
    }

    async fn delete(&self, receipt: &str) -> NotifyResult<()> {
        let mut deleted = self.deleted.lock().unwrap_or_else(|e| e.into_inner());
        deleted.insert(receipt.to_string());
        Ok(())
    }
}

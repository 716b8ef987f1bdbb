//! Upload notification consumption for Cabinet.
//!
//! The storage layer emits an object-created event for every upload; this
//! crate receives those events from an at-least-once queue and reconciles
//! them into file status transitions, exactly-once from the caller's
//! perspective.

pub mod backends;
pub mod error;
pub mod event;
pub mod metrics;
pub mod queue;
pub mod reconciler;

pub use backends::{MemoryQueue, SqsQueue};
pub use error::{NotifyError, NotifyResult};
pub use event::{classify, ParsedEvent, ScanStatus, UploadedFile};
pub use queue::{EventQueue, QueueMessage};
pub use reconciler::Reconciler;

use cabinet_core::config::NotificationConfig;
use std::sync::Arc;

/// Create an event queue from configuration.
pub async fn from_config(config: &NotificationConfig) -> NotifyResult<Arc<dyn EventQueue>> {
    let queue = SqsQueue::connect(config).await?;
    Ok(Arc::new(queue) as Arc<dyn EventQueue>)
}

//! Upload reconciler: maps storage object-write events to file status
//! transitions.

use crate::error::NotifyResult;
use crate::event::{classify, ParsedEvent, ScanStatus, UploadedFile};
use crate::metrics;
use crate::queue::{EventQueue, QueueMessage};
use cabinet_cache::FileCache;
use cabinet_core::FileStatus;
use cabinet_metadata::repos::FileRepo;
use cabinet_metadata::MetadataStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Pause after a failed receive so an unreachable queue doesn't spin the loop.
const RECEIVE_RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Long-running consumer of the upload notification queue.
///
/// Delivery is at-least-once, so the apply step is idempotent and a message
/// is only acknowledged *after* its status transition committed - a crash in
/// between redelivers the message and idempotency absorbs the duplicate. The
/// reverse order would lose updates.
pub struct Reconciler {
    queue: Arc<dyn EventQueue>,
    metadata: Arc<dyn MetadataStore>,
    cache: FileCache,
}

impl Reconciler {
    pub fn new(
        queue: Arc<dyn EventQueue>,
        metadata: Arc<dyn MetadataStore>,
        cache: FileCache,
    ) -> Self {
        Self {
            queue,
            metadata,
            cache,
        }
    }

    /// Spawn the consumer loop. It runs until `shutdown` is cancelled; await
    /// the returned handle to know the loop observed the signal and exited.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Consumer loop: receive-one, parse, apply, acknowledge.
    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Upload reconciler received shutdown signal and is stopping");
                    return;
                }
                received = self.queue.receive() => match received {
                    Ok(Some(message)) => self.handle_message(message).await,
                    Ok(None) => {}
                    Err(error) => {
                        tracing::error!(%error, "Error receiving from the notification queue");
                        metrics::RECEIVE_ERRORS.inc();
                        tokio::select! {
                            _ = shutdown.cancelled() => return,
                            _ = tokio::time::sleep(RECEIVE_RETRY_PAUSE) => {}
                        }
                    }
                }
            }
        }
    }

    async fn handle_message(&self, message: QueueMessage) {
        match classify(&message) {
            Ok(Some(ParsedEvent::Upload(upload))) => {
                if let Err(error) = self.apply(&upload, &message.receipt).await {
                    tracing::error!(
                        file_id = upload.file_id,
                        %error,
                        "Failed to apply upload notification; leaving it for redelivery"
                    );
                    metrics::PROCESSING_ERRORS.inc();
                }
            }
            Ok(Some(ParsedEvent::VerificationProbe)) => {
                tracing::info!("Ignoring storage verification probe in notification");
                metrics::PROBES_IGNORED.inc();
                if let Err(error) = self.queue.delete(&message.receipt).await {
                    // The probe will be redelivered and discarded again; after
                    // enough redeliveries the channel dead-letters it.
                    tracing::error!(%error, "Error deleting verification probe message");
                }
            }
            Ok(None) => {
                tracing::debug!("Notification carried no records; leaving it for the channel");
            }
            Err(error) => {
                tracing::error!(%error, "Failed to parse upload notification message");
                metrics::PARSE_ERRORS.inc();
                // No acknowledgment: the channel redelivers with its own
                // backoff and routes the message to the dead-letter queue
                // once it exceeds the configured delivery count.
            }
        }
    }

    /// Apply one upload: transition the file row, invalidate its cache
    /// entry, then delete the message.
    async fn apply(&self, upload: &UploadedFile, receipt: &str) -> NotifyResult<()> {
        let status = match upload.scan_status {
            ScanStatus::Clean => FileStatus::Uploaded,
            ScanStatus::Quarantined => FileStatus::Quarantined,
        };

        // A missing row propagates as an error: the message stays outstanding
        // for investigation instead of being falsely acknowledged.
        self.metadata
            .update_file_status(upload.file_id, status, upload.size)
            .await?;

        self.cache.remove(upload.file_id).await;

        self.queue.delete(receipt).await?;

        metrics::NOTIFICATIONS_PROCESSED.inc();
        tracing::info!(
            file_id = upload.file_id,
            status = %status,
            size = upload.size,
            "File upload notification applied"
        );
        Ok(())
    }
}

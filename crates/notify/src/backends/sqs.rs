//! SQS-backed event queue.

use crate::error::{NotifyError, NotifyResult};
use crate::queue::{EventQueue, QueueMessage};
use async_trait::async_trait;
use aws_sdk_sqs::Client;
use cabinet_core::config::NotificationConfig;

/// How long a received message stays invisible to other consumers while this
/// replica processes it. Unacknowledged messages become visible again after
/// this and are redelivered.
const VISIBILITY_TIMEOUT_SECS: i32 = 60;

/// SQS caps long-poll waits at 20 seconds.
const MAX_WAIT_SECS: u32 = 20;

/// SQS-backed upload notification queue.
pub struct SqsQueue {
    client: Client,
    queue_url: String,
    wait_secs: i32,
}

impl SqsQueue {
    /// Connect to SQS and resolve the configured queue's URL.
    ///
    /// A custom endpoint is used when configured (local stacks); otherwise
    /// the ambient AWS configuration resolves the real endpoint.
    pub async fn connect(config: &NotificationConfig) -> NotifyResult<Self> {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        let mut builder = aws_sdk_sqs::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        let client = Client::from_conf(builder.build());

        let queue_url = client
            .get_queue_url()
            .queue_name(&config.queue_name)
            .send()
            .await
            .map_err(|e| NotifyError::Queue(format!("resolve queue url: {e}")))?
            .queue_url()
            .ok_or_else(|| NotifyError::Queue("queue url missing from response".to_string()))?
            .to_string();

        tracing::info!(queue = %config.queue_name, "Connected to the upload notification queue");

        Ok(Self {
            client,
            queue_url,
            wait_secs: config.wait_secs.min(MAX_WAIT_SECS) as i32,
        })
    }
}

#[async_trait]
impl EventQueue for SqsQueue {
    async fn receive(&self) -> NotifyResult<Option<QueueMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .visibility_timeout(VISIBILITY_TIMEOUT_SECS)
            .wait_time_seconds(self.wait_secs)
            .send()
            .await
            .map_err(|e| NotifyError::Queue(format!("receive message: {e}")))?;

        let Some(message) = output.messages().first() else {
            return Ok(None);
        };

        let receipt = message
            .receipt_handle()
            .ok_or_else(|| NotifyError::Queue("message missing receipt handle".to_string()))?
            .to_string();

        Ok(Some(QueueMessage {
            body: message.body().unwrap_or_default().to_string(),
            receipt,
        }))
    }

    async fn delete(&self, receipt: &str) -> NotifyResult<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt)
            .send()
            .await
            .map_err(|e| NotifyError::Queue(format!("delete message: {e}")))?;
        Ok(())
    }
}

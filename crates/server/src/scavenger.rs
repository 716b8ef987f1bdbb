//! Daily retention scavenger, gated by the cluster leader lock.

use crate::metrics;
use cabinet_cache::LeaderLock;
use cabinet_core::config::ScavengerConfig;
use cabinet_metadata::repos::ScavengeRepo;
use cabinet_metadata::{MetadataResult, MetadataStore};
use std::sync::Arc;
use std::time::Duration;
use time::{OffsetDateTime, Time};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Timer-driven cleanup of expired file rows.
///
/// Every replica arms the same daily timer; on each fire the replicas race
/// for the leader lock and only the winner deletes rows. The lock's short
/// lifetime bounds the lockout window if the winner crashes mid-run.
pub struct Scavenger {
    metadata: Arc<dyn MetadataStore>,
    lock: LeaderLock,
    config: ScavengerConfig,
}

impl Scavenger {
    pub fn new(metadata: Arc<dyn MetadataStore>, lock: LeaderLock, config: ScavengerConfig) -> Self {
        Self {
            metadata,
            lock,
            config,
        }
    }

    /// Spawn the scavenger loop. It runs until `shutdown` is cancelled;
    /// await the returned handle to know the loop observed the signal and
    /// exited cleanly.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    async fn run(&self, shutdown: CancellationToken) {
        loop {
            let wait = time_until_next_fire(
                OffsetDateTime::now_utc(),
                self.config.fire_hour,
                self.config.fire_minute,
            );
            tracing::info!(
                wait_secs = wait.as_secs(),
                "Scavenger armed for its next execution"
            );

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Scavenger received shutdown signal and is stopping");
                    return;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            self.elect_and_run(&shutdown).await;
            // The timer is rearmed on the next loop iteration regardless of
            // how this run went.
        }
    }

    /// Race for leadership and run the deletion pass if we win.
    async fn elect_and_run(&self, shutdown: &CancellationToken) {
        for attempt in 1..=self.config.lock_attempts.max(1) {
            if self.lock.acquire().await {
                if let Err(error) = sweep(self.metadata.as_ref(), &self.config).await {
                    tracing::error!(%error, "Scavenger run failed");
                    metrics::SCAVENGER_RUN_FAILURES.inc();
                } else {
                    metrics::SCAVENGER_RUNS.inc();
                }
                self.lock.release().await;
                return;
            }

            // A held lock cannot be re-acquired until it expires or its
            // holder releases it, so shorter waits would only burn attempts.
            tracing::info!(attempt, "Leader lock is busy; waiting one lock lifetime");
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(self.lock.lifetime()) => {}
            }
        }

        tracing::error!(
            "All attempts to acquire the leader lock failed; abandoning this scavenger run"
        );
        metrics::SCAVENGER_RUNS_ABANDONED.inc();
    }
}

/// One bounded deletion pass over expired file rows.
///
/// Shared by the daily leader-elected path and the manual trigger endpoint
/// (which deliberately skips the election - the caller asked this replica).
pub async fn sweep(
    metadata: &dyn MetadataStore,
    config: &ScavengerConfig,
) -> MetadataResult<u64> {
    let cutoff = OffsetDateTime::now_utc() - time::Duration::days(i64::from(config.retention_days));
    let deleted = metadata
        .delete_files_created_before(cutoff, config.batch_limit)
        .await?;

    metrics::SCAVENGED_FILES.inc_by(deleted);
    tracing::info!(deleted, "Deleted expired files from the database");
    Ok(deleted)
}

/// The next daily fire instant strictly after `now`.
fn next_fire(now: OffsetDateTime, hour: u8, minute: u8) -> OffsetDateTime {
    let fire_time =
        Time::from_hms(hour.min(23), minute.min(59), 59).unwrap_or(Time::MIDNIGHT);

    let today = now.date().with_time(fire_time).assume_utc();
    if today > now {
        today
    } else {
        let tomorrow = now.date().next_day().unwrap_or(now.date());
        tomorrow.with_time(fire_time).assume_utc()
    }
}

fn time_until_next_fire(now: OffsetDateTime, hour: u8, minute: u8) -> Duration {
    let target = next_fire(now, hour, minute);
    Duration::from_secs((target - now).whole_seconds().max(1) as u64)
}

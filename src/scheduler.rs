//! Deferred confirmation scheduling with linear backoff.
//!
//! Every non-terminal job submitted through the manager gets exactly one
//! confirmation task, keyed by `(provider_type, external_id)` so redelivery
//! of the same job coalesces into the already-running task. A task fires,
//! asks the manager to confirm, and either stops (terminal status) or
//! re-arms itself with a delay of `attempt × interval` until the attempt
//! budget is spent.
//!
//! Attempts for one job are strictly sequential: each task owns its key for
//! its whole lifetime, so attempt N + 1 cannot start before attempt N has
//! returned and persisted its write. Different jobs run concurrently.
//!
//! When the budget runs out the task is abandoned silently and the record is
//! left in its last observed non-terminal status; the core never force-fails
//! a record because polling gave up. Operators watch for stuck `processing`
//! records out of band.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::time::sleep;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::config::ConfirmationConfig;
use crate::manager::TranscriptionManager;

/// Identity of the remote job a confirmation task is tracking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub provider_type: String,
    pub external_id: String,
}

impl JobKey {
    pub fn new(provider_type: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            external_id: external_id.into(),
        }
    }
}

/// Runs confirmation attempts for in-flight transcription jobs.
pub struct ConfirmationScheduler {
    config: ConfirmationConfig,
    in_flight: DashMap<JobKey, ()>,
    tracker: TaskTracker,
}

impl ConfirmationScheduler {
    pub fn new(config: ConfirmationConfig) -> Self {
        Self {
            config,
            in_flight: DashMap::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Number of jobs with an active confirmation task.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Enqueue a confirmation task for the given job.
    ///
    /// The first attempt fires after the configured interval. Scheduling a
    /// key that already has an active task is a no-op.
    pub fn schedule(&self, manager: Arc<TranscriptionManager>, key: JobKey) {
        if self.in_flight.insert(key.clone(), ()).is_some() {
            debug!(
                provider_type = %key.provider_type,
                external_id = %key.external_id,
                "confirmation already scheduled, coalescing"
            );
            return;
        }

        let config = self.config.clone();
        debug!(
            provider_type = %key.provider_type,
            external_id = %key.external_id,
            queue = %config.queue,
            interval = ?config.interval,
            "confirmation scheduled"
        );

        self.tracker.spawn(async move {
            Self::run(manager, key, config).await;
        });
    }

    async fn run(manager: Arc<TranscriptionManager>, key: JobKey, config: ConfirmationConfig) {
        let mut delay = config.interval;

        for attempt in 1..=config.tries {
            sleep(delay).await;

            match manager.confirm(&key.provider_type, &key.external_id).await {
                Ok(transcript) if transcript.is_finished() => {
                    info!(
                        provider_type = %key.provider_type,
                        external_id = %key.external_id,
                        status = %transcript.status,
                        attempt,
                        "transcription settled"
                    );
                    manager.scheduler().in_flight.remove(&key);
                    return;
                }
                Ok(transcript) => {
                    debug!(
                        provider_type = %key.provider_type,
                        external_id = %key.external_id,
                        status = %transcript.status,
                        attempt,
                        "transcription still in flight"
                    );
                }
                Err(error) => {
                    // A failed attempt consumes budget like any other; the
                    // next attempt follows the same backoff schedule.
                    warn!(
                        provider_type = %key.provider_type,
                        external_id = %key.external_id,
                        attempt,
                        %error,
                        "confirmation attempt failed"
                    );
                }
            }

            // Linear backoff: attempt k waits k × interval before attempt k + 1
            delay = config.interval * attempt;
        }

        warn!(
            provider_type = %key.provider_type,
            external_id = %key.external_id,
            tries = config.tries,
            "confirmation attempts exhausted, leaving record in last known state"
        );
        manager.scheduler().in_flight.remove(&key);
    }

    /// Stop accepting new tasks and wait for the active ones to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

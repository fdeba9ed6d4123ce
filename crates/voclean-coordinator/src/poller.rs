//! Per-recording polling loops.
//!
//! While a recording is `cleaning`, one loop polls its status at a fixed
//! interval until the job reaches a terminal state. Starting a second loop
//! for the same recording is a no-op; stopping a loop only cancels future
//! ticks and never touches the server-side recording state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use uuid::Uuid;

use voclean_core::constants::{
    DEFAULT_POLL_FAILURE_WARN_THRESHOLD, DEFAULT_POLL_INTERVAL_SECS,
};

use crate::coordinator::CleaningCoordinator;

#[derive(Debug, Clone)]
pub struct JobPollerConfig {
    pub interval: Duration,
    /// Consecutive transient failures before a warning is logged. The loop
    /// keeps polling regardless.
    pub failure_warn_threshold: u32,
}

impl Default for JobPollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            failure_warn_threshold: DEFAULT_POLL_FAILURE_WARN_THRESHOLD,
        }
    }
}

pub struct JobPoller {
    coordinator: Arc<CleaningCoordinator>,
    config: JobPollerConfig,
    active: Arc<Mutex<HashMap<Uuid, mpsc::Sender<()>>>>,
}

impl JobPoller {
    pub fn new(coordinator: Arc<CleaningCoordinator>, config: JobPollerConfig) -> Self {
        Self {
            coordinator,
            config,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start a polling loop for `recording_id` on behalf of `caller_id`.
    ///
    /// Returns `false` without side effects when a loop for this recording
    /// is already running.
    pub fn watch(&self, recording_id: Uuid, caller_id: Uuid) -> bool {
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        {
            let mut active = self.active.lock().expect("poller registry lock poisoned");
            if active.contains_key(&recording_id) {
                tracing::debug!(
                    recording_id = %recording_id,
                    "Polling loop already active, ignoring duplicate start"
                );
                return false;
            }
            active.insert(recording_id, stop_tx);
        }

        let coordinator = self.coordinator.clone();
        let registry = self.active.clone();
        let interval = self.config.interval;
        let warn_threshold = self.config.failure_warn_threshold;

        tokio::spawn(async move {
            tracing::debug!(
                recording_id = %recording_id,
                interval_ms = interval.as_millis() as u64,
                "Polling loop started"
            );

            let mut consecutive_failures: u32 = 0;

            loop {
                tokio::select! {
                    _ = stop_rx.recv() => {
                        tracing::debug!(recording_id = %recording_id, "Polling loop cancelled");
                        break;
                    }
                    _ = sleep(interval) => {
                        match coordinator.poll_job_status(recording_id, caller_id).await {
                            Ok(outcome) => {
                                consecutive_failures = 0;
                                if outcome.terminal {
                                    tracing::info!(
                                        recording_id = %recording_id,
                                        status = %outcome.status,
                                        "Polling loop finished, job reached terminal state"
                                    );
                                    break;
                                }
                            }
                            Err(e) if e.is_transient() => {
                                consecutive_failures += 1;
                                if consecutive_failures == warn_threshold {
                                    tracing::warn!(
                                        recording_id = %recording_id,
                                        consecutive_failures = consecutive_failures,
                                        error = %e,
                                        "Status polls keep failing, will continue retrying"
                                    );
                                } else {
                                    tracing::debug!(
                                        recording_id = %recording_id,
                                        error = %e,
                                        "Transient poll failure, retrying on next tick"
                                    );
                                }
                            }
                            Err(e) => {
                                // NotFound / PermissionDenied will not heal
                                // on retry; further ticks are pointless.
                                tracing::error!(
                                    recording_id = %recording_id,
                                    error = %e,
                                    "Polling loop stopped on permanent error"
                                );
                                break;
                            }
                        }
                    }
                }
            }

            let mut active = registry.lock().expect("poller registry lock poisoned");
            active.remove(&recording_id);
        });

        true
    }

    /// Cancel the polling loop for `recording_id`, if any. In-flight
    /// requests complete; only future ticks are suppressed.
    pub fn stop(&self, recording_id: Uuid) {
        let stop_tx = {
            let mut active = self.active.lock().expect("poller registry lock poisoned");
            active.remove(&recording_id)
        };
        if let Some(stop_tx) = stop_tx {
            let _ = stop_tx.try_send(());
        }
    }

    pub fn is_watching(&self, recording_id: Uuid) -> bool {
        let active = self.active.lock().expect("poller registry lock poisoned");
        active.contains_key(&recording_id)
    }

    /// Cancel every active loop, e.g. on service shutdown.
    pub fn shutdown(&self) {
        let senders: Vec<_> = {
            let mut active = self.active.lock().expect("poller registry lock poisoned");
            active.drain().collect()
        };
        for (recording_id, stop_tx) in senders {
            tracing::debug!(recording_id = %recording_id, "Stopping polling loop on shutdown");
            let _ = stop_tx.try_send(());
        }
    }
}

//! Offline queue service
//!
//! Care actions that could not reach the server wait here until the app
//! returns to the foreground. Replay is best effort:
//! - Entries replay in the order they were queued
//! - Storage is cleared before replay starts
//! - An entry that fails during replay is logged and dropped
//!
//! Storage failures never leave this service.

use crate::remote::RemoteActionExecutor;
use crate::repositories::OfflineQueueRepository;
use garden_assistant_shared::{ActionOutcome, CareAction, OfflineQueueEntry};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Result of one drain pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainReport {
    /// Entries the server accepted
    pub replayed: usize,
    /// Entries that failed and were discarded
    pub dropped: usize,
    /// Outcomes of the accepted entries, in replay order
    pub outcomes: Vec<ActionOutcome>,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.replayed == 0 && self.dropped == 0
    }
}

/// Durable FIFO of care actions awaiting connectivity
pub struct OfflineQueue {
    repo: OfflineQueueRepository,
    /// Serializes read-modify-write cycles on the persisted list
    lock: Mutex<()>,
}

impl OfflineQueue {
    pub fn new(repo: OfflineQueueRepository) -> Self {
        Self {
            repo,
            lock: Mutex::new(()),
        }
    }

    /// Persist an action for later replay; returns whether it was stored
    pub async fn enqueue(&self, action: CareAction) -> bool {
        let _guard = self.lock.lock().await;
        let entry = OfflineQueueEntry::new(action);
        let entry_id = entry.id;

        match self.repo.append(entry).await {
            Ok(depth) => {
                metrics::counter!("garden_offline_queue_enqueued_total").increment(1);
                debug!(entry_id = %entry_id, depth, "Queued care action");
                true
            }
            Err(e) => {
                metrics::counter!("garden_storage_failures_total").increment(1);
                warn!(entry_id = %entry_id, error = %format!("{:#}", e), "Failed to persist offline action");
                false
            }
        }
    }

    /// Entries currently waiting, oldest first
    pub async fn pending(&self) -> Vec<OfflineQueueEntry> {
        let _guard = self.lock.lock().await;
        match self.repo.load().await {
            Ok(entries) => entries,
            Err(e) => {
                metrics::counter!("garden_storage_failures_total").increment(1);
                warn!(error = %format!("{:#}", e), "Failed to read offline queue");
                Vec::new()
            }
        }
    }

    /// Take every queued entry and replay it in order
    ///
    /// The lock is only held while the list is taken, so actions queued
    /// during replay land in the fresh list for the next pass.
    pub async fn drain(&self, executor: &dyn RemoteActionExecutor) -> DrainReport {
        let entries = {
            let _guard = self.lock.lock().await;
            match self.repo.take_all().await {
                Ok(entries) => entries,
                Err(e) => {
                    metrics::counter!("garden_storage_failures_total").increment(1);
                    warn!(error = %format!("{:#}", e), "Failed to take offline queue");
                    return DrainReport::default();
                }
            }
        };

        let mut report = DrainReport::default();
        if entries.is_empty() {
            return report;
        }

        for entry in entries {
            let action = &entry.action;
            match executor.execute(action).await {
                Ok(outcome) => {
                    metrics::counter!("garden_offline_queue_replayed_total").increment(1);
                    debug!(
                        entry_id = %entry.id,
                        user_plant_id = %action.user_plant_id,
                        action = action.action_type.as_str(),
                        "Replayed offline action"
                    );
                    report.replayed += 1;
                    report.outcomes.push(outcome);
                }
                Err(failure) => {
                    metrics::counter!("garden_offline_queue_dropped_total").increment(1);
                    warn!(
                        entry_id = %entry.id,
                        task_id = ?action.task_id,
                        user_plant_id = %action.user_plant_id,
                        action = action.action_type.as_str(),
                        queued_at = %entry.timestamp,
                        error = %failure,
                        "Dropping offline action after failed replay"
                    );
                    report.dropped += 1;
                }
            }
        }

        info!(replayed = report.replayed, dropped = report.dropped, "Offline queue drained");
        report
    }
}

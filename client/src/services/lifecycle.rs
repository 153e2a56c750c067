//! Foreground lifecycle
//!
//! The offline queue is replayed only when the app comes back to the
//! foreground. The host reports each lifecycle change on an `mpsc` channel
//! and the replay task reacts to every background/inactive to active
//! transition, including ones that arrive while a replay is running.

use crate::services::coordinator::CareCoordinator;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Host application lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPhase {
    #[default]
    Active,
    Inactive,
    Background,
}

impl AppPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, AppPhase::Active)
    }

    /// Whether moving from `previous` to `self` counts as returning to the foreground
    pub fn is_foreground_transition(&self, previous: AppPhase) -> bool {
        self.is_active() && !previous.is_active()
    }
}

/// Replay the offline queue on every return to the foreground
///
/// The app is assumed active until the first phase arrives. The task exits
/// once every sender is dropped.
pub fn spawn_foreground_replay(
    coordinator: Arc<CareCoordinator>,
    mut phases: mpsc::Receiver<AppPhase>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut previous = AppPhase::default();
        while let Some(current) = phases.recv().await {
            debug!(?previous, ?current, "App phase changed");
            if current.is_foreground_transition(previous) {
                let report = coordinator.replay_offline_queue().await;
                if !report.is_empty() {
                    info!(
                        replayed = report.replayed,
                        dropped = report.dropped,
                        "Foreground replay finished"
                    );
                }
            }
            previous = current;
        }
        debug!("Lifecycle channel closed, stopping foreground replay");
    })
}

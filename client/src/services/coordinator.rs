//! Optimistic mutation coordinator
//!
//! Every care action follows the same protocol:
//! 1. Validate the action and claim its in-flight slot
//! 2. Snapshot the affected views and apply the predicted change, in one
//!    cache transaction
//! 3. Call the server (the only suspension point)
//! 4. Settle: confirm and invalidate, queue and keep, or roll back
//!
//! A rollback undoes only what the action itself applied, so actions that
//! overlap in time never erase each other's optimistic state. Only
//! rejections and local precondition failures reach the caller.

use crate::cache::{CacheState, QueryCache, SnapshotToken, ViewKey};
use crate::config::SyncConfig;
use crate::error::{CareError, CareResult};
use crate::remote::RemoteActionExecutor;
use crate::services::notifications::Notifier;
use crate::services::offline_queue::{DrainReport, OfflineQueue};
use crate::services::optimistic::OptimisticProjector;
use chrono::{DateTime, Utc};
use garden_assistant_shared::validation::{validate_care_action, validate_id};
use garden_assistant_shared::{ActionOutcome, ActionType, CareAction, RemoteFailure};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Settlement of an action, published to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum CareEvent {
    /// The server recorded the action
    Confirmed(ActionOutcome),
    /// The action is waiting in the offline queue
    Queued(CareAction),
    /// The server refused the action and its optimistic changes were undone
    RolledBack { action: CareAction, message: String },
    /// A plant was archived
    Archived { user_plant_id: String },
    /// An offline drain pass finished
    Replayed { replayed: usize, dropped: usize },
}

type InFlightKey = (String, ActionType);

/// Targets with an unsettled action
#[derive(Debug, Default, Clone)]
struct InFlight {
    keys: Arc<Mutex<HashSet<InFlightKey>>>,
}

impl InFlight {
    fn try_claim(&self, key: InFlightKey) -> Option<InFlightGuard> {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            keys: Arc::clone(&self.keys),
            key,
        })
    }
}

/// Releases its slot when dropped, whichever way the action settles
struct InFlightGuard {
    keys: Arc<Mutex<HashSet<InFlightKey>>>,
    key: InFlightKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        keys.remove(&self.key);
    }
}

/// Care action coordinator for one signed-in user
pub struct CareCoordinator {
    user_id: String,
    executor: Arc<dyn RemoteActionExecutor>,
    cache: QueryCache,
    queue: Arc<OfflineQueue>,
    notifier: Arc<dyn Notifier>,
    config: SyncConfig,
    in_flight: InFlight,
    events: broadcast::Sender<CareEvent>,
}

impl CareCoordinator {
    pub fn new(
        user_id: impl Into<String>,
        executor: Arc<dyn RemoteActionExecutor>,
        cache: QueryCache,
        queue: Arc<OfflineQueue>,
        notifier: Arc<dyn Notifier>,
        config: SyncConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            user_id: user_id.into(),
            executor,
            cache,
            queue,
            notifier,
            config,
            in_flight: InFlight::default(),
            events,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    /// Receive settlement events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CareEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: CareEvent) {
        // no subscriber is fine
        let _ = self.events.send(event);
    }

    fn home_key(&self) -> ViewKey {
        ViewKey::home(self.user_id.clone())
    }

    /// Every view a care action on this plant can change
    fn affected_keys(&self, state: &CacheState, user_plant_id: &str) -> Vec<ViewKey> {
        let mut keys = state.keys_where(|key| key.is_calendar_of(&self.user_id));
        keys.push(self.home_key());
        keys.push(ViewKey::plant(user_plant_id));
        keys
    }

    /// Log (or reverse) a care action
    ///
    /// Returns the server outcome, or a synthesized queued outcome when the
    /// server was unreachable. A rejection undoes this action's changes.
    pub async fn log_care_action(&self, action: CareAction) -> CareResult<ActionOutcome> {
        let label = action.action_type.as_str();

        validate_care_action(&action).map_err(CareError::Validation)?;
        let _slot = self.claim(&action)?;

        let snapshot = self.apply_optimistic(&action, Utc::now()).await;

        match self.executor.execute(&action).await {
            Ok(outcome) => {
                metrics::counter!("garden_care_actions_total", "action" => label, "outcome" => "confirmed")
                    .increment(1);
                self.confirm(&action, outcome).await
            }
            Err(RemoteFailure::Connectivity(message)) => {
                metrics::counter!("garden_care_actions_total", "action" => label, "outcome" => "queued")
                    .increment(1);
                warn!(
                    task_id = ?action.task_id,
                    user_plant_id = %action.user_plant_id,
                    action = label,
                    error = %message,
                    "Server unreachable, queueing care action"
                );
                self.queue.enqueue(action.clone()).await;
                let outcome = ActionOutcome::queued(&action);
                self.publish(CareEvent::Queued(action));
                Ok(outcome)
            }
            Err(RemoteFailure::Rejected(message)) => {
                metrics::counter!("garden_care_actions_total", "action" => label, "outcome" => "rolled_back")
                    .increment(1);
                info!(
                    task_id = ?action.task_id,
                    user_plant_id = %action.user_plant_id,
                    action = label,
                    error = %message,
                    "Care action rejected, rolling back"
                );
                self.roll_back(&action, &snapshot).await;
                self.publish(CareEvent::RolledBack {
                    action,
                    message: message.clone(),
                });
                Err(CareError::Rejected(message))
            }
        }
    }

    fn claim(&self, action: &CareAction) -> CareResult<Option<InFlightGuard>> {
        if !self.config.guard_in_flight {
            return Ok(None);
        }
        let target = action
            .task_id
            .clone()
            .unwrap_or_else(|| action.user_plant_id.clone());
        match self.in_flight.try_claim((target.clone(), action.action_type)) {
            Some(guard) => Ok(Some(guard)),
            None => {
                metrics::counter!(
                    "garden_care_actions_total",
                    "action" => action.action_type.as_str(),
                    "outcome" => "in_flight"
                )
                .increment(1);
                debug!(target_id = %target, action = action.action_type.as_str(), "Refusing duplicate in-flight action");
                Err(CareError::InFlight {
                    target,
                    action: action.action_type,
                })
            }
        }
    }

    /// Snapshot and project in one transaction
    async fn apply_optimistic(&self, action: &CareAction, now: DateTime<Utc>) -> SnapshotToken {
        self.cache
            .transaction(|state| {
                let keys = self.affected_keys(state, &action.user_plant_id);
                let snapshot = state.snapshot(&keys);

                let mut flipped = 0;
                for key in keys.iter().filter(|key| key.is_calendar_of(&self.user_id)) {
                    if let Some(view) = state.calendar_mut(key) {
                        if OptimisticProjector::apply_to_calendar(view, action) {
                            flipped += 1;
                        }
                    }
                }
                if let Some(home) = state.home_mut(&self.home_key()) {
                    OptimisticProjector::apply_to_home(home, action);
                }
                if let Some(detail) = state.plant_mut(&ViewKey::plant(action.user_plant_id.clone())) {
                    OptimisticProjector::apply_to_plant_detail(detail, action, now);
                }

                debug!(
                    task_id = ?action.task_id,
                    snapshotted = snapshot.len(),
                    calendar_ranges = flipped,
                    "Applied optimistic update"
                );
                snapshot
            })
            .await
    }

    /// Undo one action's projection
    ///
    /// Calendars get the task's own flag back, the home snapshot loses the
    /// action's delta and its plant summary, and the plant detail returns to
    /// its captured value. Changes made by other actions since the snapshot
    /// are kept.
    async fn roll_back(&self, action: &CareAction, snapshot: &SnapshotToken) {
        let home = self.home_key();
        let plant = ViewKey::plant(action.user_plant_id.clone());
        self.cache
            .transaction(|state| {
                for key in snapshot.keys().filter(|key| key.is_calendar_of(&self.user_id)) {
                    let before = snapshot.captured(key).and_then(|e| e.value.as_calendar());
                    if let (Some(before), Some(view)) = (before, state.calendar_mut(key)) {
                        OptimisticProjector::revert_calendar(view, before, action);
                    }
                }
                let before = snapshot.captured(&home).and_then(|e| e.value.as_home());
                if let (Some(before), Some(view)) = (before, state.home_mut(&home)) {
                    OptimisticProjector::revert_home(view, before, action);
                }
                state.restore_value(&plant, snapshot);
            })
            .await;
    }

    async fn confirm(&self, action: &CareAction, outcome: ActionOutcome) -> CareResult<ActionOutcome> {
        self.invalidate_after_success(&action.user_plant_id).await;

        if action.is_completing() {
            if let Some(notification_id) = &outcome.notification_id {
                self.cancel_reminder(notification_id).await;
            }
        }

        info!(
            task_id = ?outcome.task_id,
            user_plant_id = %outcome.user_plant_id,
            action = outcome.action_type.as_str(),
            eco_points_delta = outcome.eco_points_delta,
            "Care action confirmed"
        );
        self.publish(CareEvent::Confirmed(outcome.clone()));
        Ok(outcome)
    }

    async fn invalidate_after_success(&self, user_plant_id: &str) {
        let home = self.home_key();
        let plant = ViewKey::plant(user_plant_id);
        self.cache
            .transaction(|state| {
                state.invalidate_where(|key| key.is_calendar_of(&self.user_id));
                state.invalidate(&home);
                state.invalidate(&plant);
            })
            .await;
    }

    async fn cancel_reminder(&self, notification_id: &str) {
        if let Err(e) = self.notifier.cancel(notification_id).await {
            warn!(notification_id, error = %e, "Failed to cancel reminder");
        }
    }

    /// Archive a plant
    ///
    /// The plant leaves the home snapshot and its tasks leave every cached
    /// calendar until the server answers. Archiving is never queued, so any
    /// failure puts the plant and its tasks back.
    pub async fn archive_plant(&self, user_plant_id: &str) -> CareResult<()> {
        validate_id("userPlantId", user_plant_id).map_err(CareError::Validation)?;

        let plant_key = ViewKey::plant(user_plant_id);
        let snapshot = self
            .cache
            .transaction(|state| {
                let keys = self.affected_keys(state, user_plant_id);
                let snapshot = state.snapshot(&keys);
                for key in keys.iter().filter(|key| key.is_calendar_of(&self.user_id)) {
                    if let Some(view) = state.calendar_mut(key) {
                        OptimisticProjector::remove_plant_tasks(view, user_plant_id);
                    }
                }
                if let Some(home) = state.home_mut(&self.home_key()) {
                    OptimisticProjector::remove_plant_from_home(home, user_plant_id);
                }
                snapshot
            })
            .await;

        match self.executor.archive_plant(user_plant_id).await {
            Ok(()) => {
                let home = self.home_key();
                self.cache
                    .transaction(|state| {
                        state.invalidate_where(|key| key.is_calendar_of(&self.user_id));
                        state.invalidate(&home);
                        state.remove(&plant_key);
                    })
                    .await;
                info!(user_plant_id, "Plant archived");
                self.publish(CareEvent::Archived {
                    user_plant_id: user_plant_id.to_string(),
                });
                Ok(())
            }
            Err(failure) => {
                warn!(user_plant_id, error = %failure, "Archive failed, restoring plant");
                self.unarchive(user_plant_id, &snapshot).await;
                Err(CareError::Rejected(failure.message().to_string()))
            }
        }
    }

    async fn unarchive(&self, user_plant_id: &str, snapshot: &SnapshotToken) {
        let home = self.home_key();
        self.cache
            .transaction(|state| {
                for key in snapshot.keys().filter(|key| key.is_calendar_of(&self.user_id)) {
                    let before = snapshot.captured(key).and_then(|e| e.value.as_calendar());
                    if let (Some(before), Some(view)) = (before, state.calendar_mut(key)) {
                        OptimisticProjector::restore_plant_tasks(view, before, user_plant_id);
                    }
                }
                let before = snapshot.captured(&home).and_then(|e| e.value.as_home());
                if let (Some(before), Some(view)) = (before, state.home_mut(&home)) {
                    OptimisticProjector::restore_plant_to_home(view, before, user_plant_id);
                }
            })
            .await;
    }

    /// Replay the offline queue
    ///
    /// Called on the transition back to the foreground. When anything was
    /// replayed the calendars and home snapshot are marked for refetch.
    pub async fn replay_offline_queue(&self) -> DrainReport {
        let report = self.queue.drain(self.executor.as_ref()).await;
        if report.is_empty() {
            return report;
        }

        if report.replayed > 0 {
            let home = self.home_key();
            self.cache
                .transaction(|state| {
                    state.invalidate_where(|key| key.is_calendar_of(&self.user_id));
                    state.invalidate(&home);
                })
                .await;
        }

        // a positive delta marks a completion
        for outcome in report.outcomes.iter().filter(|o| o.eco_points_delta > 0) {
            if let Some(notification_id) = &outcome.notification_id {
                self.cancel_reminder(notification_id).await;
            }
        }

        self.publish(CareEvent::Replayed {
            replayed: report.replayed,
            dropped: report.dropped,
        });
        report
    }
}

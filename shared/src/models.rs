//! Data models for the Garden Assistant application
//!
//! These are the typed entities the client works with once a remote
//! response has been decoded. Field names follow the JSON the backend
//! returns for each view.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub use crate::units::AmountUnit;

/// Kind of care logged against a plant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Water,
    Fertilize,
    Harvest,
}

impl ActionType {
    pub const ALL: [ActionType; 3] = [ActionType::Water, ActionType::Fertilize, ActionType::Harvest];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Water => "water",
            ActionType::Fertilize => "fertilize",
            ActionType::Harvest => "harvest",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "water" => Some(ActionType::Water),
            "fertilize" => Some(ActionType::Fertilize),
            "harvest" => Some(ActionType::Harvest),
            _ => None,
        }
    }

    /// Unit the `amount` of this action is expressed in
    pub fn unit(&self) -> AmountUnit {
        match self {
            ActionType::Water => AmountUnit::Milliliters,
            ActionType::Fertilize | ActionType::Harvest => AmountUnit::Grams,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user intent to log, or reverse, a care event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CareAction {
    /// Scheduled task being fulfilled, if the action came from the calendar
    #[serde(default)]
    pub task_id: Option<String>,
    pub user_plant_id: String,
    pub action_type: ActionType,
    /// Quantity in ml (water) or grams (fertilize, harvest)
    #[serde(default)]
    pub amount: Option<f64>,
    /// Reverse a previously completed task instead of completing it
    #[serde(default)]
    pub uncomplete: bool,
}

impl CareAction {
    /// Plant-level action that is not tied to a calendar task
    pub fn for_plant(user_plant_id: impl Into<String>, action_type: ActionType) -> Self {
        Self {
            task_id: None,
            user_plant_id: user_plant_id.into(),
            action_type,
            amount: None,
            uncomplete: false,
        }
    }

    /// Completion of a scheduled task
    pub fn for_task(
        task_id: impl Into<String>,
        user_plant_id: impl Into<String>,
        action_type: ActionType,
    ) -> Self {
        Self {
            task_id: Some(task_id.into()),
            ..Self::for_plant(user_plant_id, action_type)
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn uncompleted(mut self) -> Self {
        self.uncomplete = true;
        self
    }

    pub fn is_completing(&self) -> bool {
        !self.uncomplete
    }

    /// Whether this action goes through task reconciliation or is plant-level
    pub fn is_plant_level(&self) -> bool {
        self.task_id.is_none()
    }

    /// Amount sent to the server, falling back to the per-type default
    pub fn effective_amount(&self) -> f64 {
        self.amount
            .unwrap_or_else(|| crate::care::default_amount(self.action_type))
    }
}

/// Settled result of a care action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub success: bool,
    pub eco_points_delta: i64,
    pub task_id: Option<String>,
    pub user_plant_id: String,
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
    /// Set when the outcome was synthesized after handing the action to
    /// the offline queue
    #[serde(default)]
    pub queued: bool,
}

impl ActionOutcome {
    /// Outcome reported to the caller while the action waits in the offline queue
    pub fn queued(action: &CareAction) -> Self {
        Self {
            success: true,
            eco_points_delta: crate::care::eco_points_delta(action.action_type, action.uncomplete),
            task_id: action.task_id.clone(),
            user_plant_id: action.user_plant_id.clone(),
            action_type: action.action_type,
            notification_id: None,
            queued: true,
        }
    }
}

// ============================================================================
// Calendar
// ============================================================================

/// A scheduled care reminder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_plant_id: String,
    #[serde(rename = "type")]
    pub task_type: ActionType,
    pub due_date: NaiveDate,
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Tasks for a date range, indexed by due date
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CalendarTasksView {
    pub days: BTreeMap<NaiveDate, Vec<Task>>,
}

impl CalendarTasksView {
    /// Group a flat task list by due date, keeping the server order per day
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut days: BTreeMap<NaiveDate, Vec<Task>> = BTreeMap::new();
        for task in tasks {
            days.entry(task.due_date).or_default().push(task);
        }
        Self { days }
    }

    pub fn find(&self, task_id: &str) -> Option<&Task> {
        self.days.values().flatten().find(|t| t.id == task_id)
    }

    pub fn find_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.days.values_mut().flatten().find(|t| t.id == task_id)
    }

    pub fn task_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }
}

// ============================================================================
// Home snapshot
// ============================================================================

/// Home screen summary of a single plant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlantSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub progress_pct: f64,
    pub next_action_label: String,
    pub next_action_color: String,
}

/// Aggregate per-user state shown on the home screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomeSnapshotView {
    pub eco_score: i64,
    pub delta_week: i64,
    pub streak_days: u32,
    pub liters_saved: f64,
    #[serde(default)]
    pub plants: Vec<PlantSummary>,
}

impl HomeSnapshotView {
    pub fn plant_mut(&mut self, user_plant_id: &str) -> Option<&mut PlantSummary> {
        self.plants.iter_mut().find(|p| p.id == user_plant_id)
    }
}

// ============================================================================
// Plant detail
// ============================================================================

/// Urgency of an upcoming care action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NextActionStatus {
    Overdue,
    Upcoming,
    Scheduled,
}

/// Upcoming care action on the plant detail screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NextAction {
    pub action_type: ActionType,
    pub due_date: Option<DateTime<Utc>>,
    pub status: NextActionStatus,
}

/// Amount of water given on a day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaterHistoryPoint {
    pub date: NaiveDate,
    pub amount_ml: f64,
}

/// Generic daily measurement (sun hours, soil humidity percent)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Time-series analytics for a plant
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlantAnalytics {
    #[serde(default)]
    pub water_history: Vec<WaterHistoryPoint>,
    #[serde(default)]
    pub sun_exposure: Vec<SeriesPoint>,
    #[serde(default)]
    pub soil_humidity: Vec<SeriesPoint>,
}

/// Full state of a single plant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantDetailView {
    pub id: String,
    pub name: String,
    pub growth_percent: f64,
    #[serde(default)]
    pub last_watered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_fertilized_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_harvested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_water_due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_fertilize_due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_actions: Vec<NextAction>,
    #[serde(default)]
    pub analytics: PlantAnalytics,
}

// ============================================================================
// Offline queue
// ============================================================================

/// A care action waiting for connectivity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfflineQueueEntry {
    pub id: Uuid,
    #[serde(flatten)]
    pub action: CareAction,
    pub timestamp: DateTime<Utc>,
}

impl OfflineQueueEntry {
    pub fn new(action: CareAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            timestamp: Utc::now(),
        }
    }
}

//! Remote procedure request and response types
//!
//! These mirror the loosely-typed JSON the RPC endpoints accept and
//! return. They are converted into [`crate::models`] types right at the
//! client boundary.

use crate::errors::RemoteFailure;
use crate::models::{ActionOutcome, ActionType, CareAction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date range for calendar queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Named parameters of `log_care_action`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogCareActionParams {
    pub p_task_id: Option<String>,
    pub p_user_plant_id: String,
    pub p_action_type: ActionType,
    pub p_amount: Option<f64>,
    pub p_uncomplete: bool,
}

impl From<&CareAction> for LogCareActionParams {
    fn from(action: &CareAction) -> Self {
        Self {
            p_task_id: action.task_id.clone(),
            p_user_plant_id: action.user_plant_id.clone(),
            p_action_type: action.action_type,
            p_amount: action.amount,
            p_uncomplete: action.uncomplete,
        }
    }
}

/// Response of `log_care_action`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogCareActionResponse {
    pub success: bool,
    pub eco_points_delta: i64,
    #[serde(default)]
    pub task_id: Option<String>,
    pub user_plant_id: String,
    pub action_type: String,
    #[serde(default)]
    pub notification_id: Option<String>,
}

impl LogCareActionResponse {
    /// Convert into a typed outcome
    ///
    /// `success: false` and unknown action types are treated as rejections.
    pub fn into_outcome(self) -> Result<ActionOutcome, RemoteFailure> {
        if !self.success {
            return Err(RemoteFailure::Rejected(
                "Care action was not recorded".to_string(),
            ));
        }
        let action_type = ActionType::parse(&self.action_type).ok_or_else(|| {
            RemoteFailure::Rejected(format!("Unknown action type: {}", self.action_type))
        })?;
        Ok(ActionOutcome {
            success: true,
            eco_points_delta: self.eco_points_delta,
            task_id: self.task_id,
            user_plant_id: self.user_plant_id,
            action_type,
            notification_id: self.notification_id,
            queued: false,
        })
    }
}

/// Named parameters of `get_tasks_by_range`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksByRangeParams {
    pub p_user_id: String,
    pub p_start_date: NaiveDate,
    pub p_end_date: NaiveDate,
}

/// Named parameters of procedures scoped to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserParams {
    pub p_user_id: String,
}

/// Named parameters of procedures scoped to one plant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPlantParams {
    pub p_user_plant_id: String,
}

/// Error body returned by the RPC endpoint
///
/// Both the bare `{ "message": .. }` shape and the wrapped
/// `{ "error": { "message": .. } }` shape are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<RpcErrorDetail>,
}

/// Wrapped error detail
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

impl RpcErrorBody {
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or_else(|| self.error.as_ref().and_then(|e| e.message.as_deref()))
    }
}

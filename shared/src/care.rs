//! Care rules
//!
//! Eco points, default amounts, growth increments and care intervals.
//! The optimistic path and the server agree on these numbers, so a
//! confirmed action never moves the score a second time.
//!
//! All functions here are pure.

use crate::models::ActionType;
use chrono::Duration;

/// Lower bound of any progress or growth percentage
pub const MIN_PERCENT: f64 = 0.0;

/// Upper bound of any progress or growth percentage
pub const MAX_PERCENT: f64 = 100.0;

/// Label shown on the home screen once a plant has just been looked after
pub const WELL_CARED_LABEL: &str = "Well cared for";

/// Color paired with [`WELL_CARED_LABEL`]
pub const WELL_CARED_COLOR: &str = "#4CAF50";

/// Eco points for an action, negated when the action is reversed
pub fn eco_points_delta(action: ActionType, uncomplete: bool) -> i64 {
    let points = match action {
        ActionType::Water => 1,
        ActionType::Fertilize => 2,
        ActionType::Harvest => 3,
    };
    if uncomplete {
        -points
    } else {
        points
    }
}

/// Amount assumed when the user did not enter one (ml or grams)
pub fn default_amount(action: ActionType) -> f64 {
    match action {
        ActionType::Water => 250.0,
        ActionType::Fertilize => 10.0,
        ActionType::Harvest => 100.0,
    }
}

/// Days until the next action of this type is due, if it recurs
pub fn care_interval(action: ActionType) -> Option<Duration> {
    match action {
        ActionType::Water => Some(Duration::days(2)),
        ActionType::Fertilize => Some(Duration::days(14)),
        ActionType::Harvest => None,
    }
}

/// Clamp a percentage into [0, 100]; NaN collapses to 0
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_PERCENT;
    }
    value.clamp(MIN_PERCENT, MAX_PERCENT)
}

/// Plant detail growth after a completed action
///
/// Water adds 2, fertilize adds 5, harvest sets 100.
pub fn next_growth_percent(current: f64, action: ActionType) -> f64 {
    match action {
        ActionType::Water => clamp_percent(current + 2.0),
        ActionType::Fertilize => clamp_percent(current + 5.0),
        ActionType::Harvest => MAX_PERCENT,
    }
}

/// Home snapshot progress after a completed plant-level action
///
/// Water and fertilize add 1, harvest sets 100. This is deliberately a
/// separate projection from [`next_growth_percent`].
pub fn next_progress_pct(current: f64, action: ActionType) -> f64 {
    match action {
        ActionType::Water | ActionType::Fertilize => clamp_percent(current + 1.0),
        ActionType::Harvest => MAX_PERCENT,
    }
}

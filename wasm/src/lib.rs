//! Garden Assistant WASM Module
//!
//! Exposes the care rules to the JavaScript UI so optimistic numbers shown
//! on screen match what the sync engine and the server compute.
//!
//! Action types are passed as their wire names (`water`, `fertilize`,
//! `harvest`). Unknown names yield neutral values.

use garden_assistant_shared::care;
use garden_assistant_shared::validation::validate_care_action;
use garden_assistant_shared::{classify_message, ActionType, CareAction, FailureKind};
use wasm_bindgen::prelude::*;

/// Eco points for an action, negated when reversing it
#[wasm_bindgen]
pub fn eco_points_delta(action_type: &str, uncomplete: bool) -> i32 {
    ActionType::parse(action_type)
        .map(|action| care::eco_points_delta(action, uncomplete) as i32)
        .unwrap_or(0)
}

/// Amount assumed when the user leaves the field empty
#[wasm_bindgen]
pub fn default_amount(action_type: &str) -> f64 {
    ActionType::parse(action_type)
        .map(care::default_amount)
        .unwrap_or(0.0)
}

/// Plant growth after a completed action, clamped to [0, 100]
#[wasm_bindgen]
pub fn next_growth_percent(current: f64, action_type: &str) -> f64 {
    match ActionType::parse(action_type) {
        Some(action) => care::next_growth_percent(current, action),
        None => care::clamp_percent(current),
    }
}

/// Home screen progress after a completed plant-level action
#[wasm_bindgen]
pub fn next_progress_pct(current: f64, action_type: &str) -> f64 {
    match ActionType::parse(action_type) {
        Some(action) => care::next_progress_pct(current, action),
        None => care::clamp_percent(current),
    }
}

/// Format an amount in the action's unit, e.g. `250 ml` or `1.5 kg`
#[wasm_bindgen]
pub fn format_amount(action_type: &str, amount: f64) -> String {
    ActionType::parse(action_type)
        .map(|action| action.unit().format(amount))
        .unwrap_or_default()
}

/// Whether an error message means the device is offline
#[wasm_bindgen]
pub fn is_connectivity_error(message: &str) -> bool {
    classify_message(message) == FailureKind::Connectivity
}

/// Validate a serialized care action
///
/// Returns `None` when valid, otherwise the message to show.
#[wasm_bindgen]
pub fn validate_care_action_json(json: &str) -> Option<String> {
    match serde_json::from_str::<CareAction>(json) {
        Ok(action) => validate_care_action(&action).err(),
        Err(e) => Some(format!("Invalid care action: {}", e)),
    }
}

//! Input validation functions
//!
//! Care actions are checked before any cache is touched so that a
//! malformed request never produces optimistic state.

use crate::models::CareAction;

/// Largest amount accepted for a single care action (ml or grams)
pub const MAX_CARE_AMOUNT: f64 = 10000.0;

/// Validate an identifier coming from the UI
pub fn validate_id(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} cannot be empty", field));
    }
    if value.len() > 128 {
        return Err(format!("{} is too long", field));
    }
    Ok(())
}

/// Validate a care amount
pub fn validate_amount(amount: f64) -> Result<(), String> {
    if amount.is_nan() || amount.is_infinite() {
        return Err("Amount must be a valid number".to_string());
    }
    if amount <= 0.0 {
        return Err("Amount must be greater than 0".to_string());
    }
    if amount > MAX_CARE_AMOUNT {
        return Err(format!("Amount cannot exceed {}", MAX_CARE_AMOUNT));
    }
    Ok(())
}

/// Validate a care action before it is applied
pub fn validate_care_action(action: &CareAction) -> Result<(), String> {
    validate_id("userPlantId", &action.user_plant_id)?;

    match &action.task_id {
        Some(task_id) => validate_id("taskId", task_id)?,
        None if action.uncomplete => {
            return Err("Only a scheduled task can be uncompleted".to_string());
        }
        None => {}
    }

    if let Some(amount) = action.amount {
        validate_amount(amount)?;
    }

    Ok(())
}

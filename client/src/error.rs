//! Client error handling
//!
//! Only failures that change what the user sees leave the engine as
//! [`CareError`]. Connectivity, replay and storage failures are contained
//! and logged where they happen.

use garden_assistant_shared::{ActionType, RemoteFailure};
use thiserror::Error;

/// Error returned to the UI for a care or archive action
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CareError {
    /// The server refused the action; caches have been restored
    #[error("{0}")]
    Rejected(String),

    /// The action was malformed; nothing was applied
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another invocation for the same target is still unsettled
    #[error("A {action} action for {target} is already in progress")]
    InFlight { target: String, action: ActionType },
}

impl CareError {
    /// Message suitable for display to the user
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<RemoteFailure> for CareError {
    fn from(failure: RemoteFailure) -> Self {
        CareError::Rejected(failure.message().to_string())
    }
}

/// Durable storage failure
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Notification collaborator failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Notification not found: {0}")]
    NotFound(String),

    #[error("Notifier has been disposed")]
    Disposed,
}

/// Result type alias for care actions
pub type CareResult<T> = Result<T, CareError>;

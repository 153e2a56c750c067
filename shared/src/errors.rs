//! Error types for the Garden Assistant application

use once_cell::sync::Lazy;
use regex_lite::Regex;
use thiserror::Error;

/// Messages that indicate the request never reached the server
static CONNECTIVITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)network|connection").expect("connectivity pattern is valid")
});

/// How a failed remote call should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transient: the server was not reached
    Connectivity,
    /// Authoritative: the server answered with an error
    Rejected,
}

/// Classify a failure from its message alone
pub fn classify_message(message: &str) -> FailureKind {
    if CONNECTIVITY_PATTERN.is_match(message) {
        FailureKind::Connectivity
    } else {
        FailureKind::Rejected
    }
}

/// Failure of a remote procedure call
///
/// The message is kept verbatim so it can be shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    #[error("{0}")]
    Connectivity(String),

    #[error("{0}")]
    Rejected(String),
}

impl RemoteFailure {
    /// Build a failure from a message, classifying it by pattern
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        match classify_message(&message) {
            FailureKind::Connectivity => RemoteFailure::Connectivity(message),
            FailureKind::Rejected => RemoteFailure::Rejected(message),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            RemoteFailure::Connectivity(_) => FailureKind::Connectivity,
            RemoteFailure::Rejected(_) => FailureKind::Rejected,
        }
    }

    pub fn is_connectivity(&self) -> bool {
        self.kind() == FailureKind::Connectivity
    }

    pub fn message(&self) -> &str {
        match self {
            RemoteFailure::Connectivity(msg) | RemoteFailure::Rejected(msg) => msg,
        }
    }
}

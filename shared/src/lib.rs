//! Garden Assistant Shared Library
//!
//! This crate contains the domain types, care rules and wire types shared
//! by the client engine and the WASM bindings.

pub mod care;
pub mod errors;
pub mod models;
pub mod types;
pub mod units;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::*;
pub use types::*;
pub use units::AmountUnit;

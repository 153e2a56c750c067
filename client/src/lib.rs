//! Garden Assistant sync engine
//!
//! Optimistic care-action logging and offline reconciliation over a
//! client-side query cache. The library is used by the app shell, the
//! `garden-sync` binary and the integration tests.

pub mod cache;
pub mod config;
pub mod error;
pub mod remote;
pub mod repositories;
pub mod services;
pub mod state;

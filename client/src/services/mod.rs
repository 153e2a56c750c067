//! Sync engine services
//!
//! Services coordinate the query cache, the offline queue and the remote
//! procedures. The coordinator is the only entry point the UI calls.

pub mod coordinator;
pub mod lifecycle;
pub mod notifications;
pub mod offline_queue;
pub mod optimistic;

pub use coordinator::{CareCoordinator, CareEvent};
pub use lifecycle::{spawn_foreground_replay, AppPhase};
pub use notifications::{LocalNotifier, Notifier};
pub use offline_queue::{DrainReport, OfflineQueue};
pub use optimistic::OptimisticProjector;

//! Local persistence
//!
//! Durable key-value storage and the offline queue stored on top of it.

pub mod offline_queue;
pub mod storage;

pub use offline_queue::OfflineQueueRepository;
pub use storage::{FileStorage, LocalStorage, MemoryStorage};

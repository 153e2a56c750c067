//! Remote procedure boundary
//!
//! Everything the engine needs from the server goes through these traits.
//! Implementations must return typed entities; loosely-typed JSON stays
//! inside [`rpc`].

use crate::cache::{CachedView, ViewKey};
use async_trait::async_trait;
use garden_assistant_shared::{ActionOutcome, CareAction, RemoteFailure};

pub mod rpc;

pub use rpc::RpcClient;

/// Mutating remote procedures
#[async_trait]
pub trait RemoteActionExecutor: Send + Sync {
    /// Record (or reverse) a care action
    async fn execute(&self, action: &CareAction) -> Result<ActionOutcome, RemoteFailure>;

    /// Archive a plant and its open tasks
    async fn archive_plant(&self, user_plant_id: &str) -> Result<(), RemoteFailure>;
}

/// Read procedures backing the cached views
#[async_trait]
pub trait ViewSource: Send + Sync {
    async fn fetch_view(&self, key: &ViewKey) -> Result<CachedView, RemoteFailure>;
}

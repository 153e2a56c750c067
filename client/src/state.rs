//! Client state
//!
//! Wires the engine together for one signed-in user. Every collaborator is
//! created here and owned by the state; nothing is process-wide.
//!
//! All fields are `Arc`'d or clone-cheap, so the state can be handed to
//! background tasks freely.

use crate::cache::{CachedView, QueryCache, ViewKey};
use crate::config::ClientConfig;
use crate::remote::RpcClient;
use crate::repositories::{FileStorage, LocalStorage, OfflineQueueRepository};
use crate::services::{
    spawn_foreground_replay, AppPhase, CareCoordinator, LocalNotifier, OfflineQueue,
};
use anyhow::Result;
use garden_assistant_shared::RemoteFailure;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Engine state for one user session
#[derive(Clone)]
pub struct ClientState {
    config: Arc<ClientConfig>,
    rpc: Arc<RpcClient>,
    notifier: Arc<LocalNotifier>,
    coordinator: Arc<CareCoordinator>,
}

impl ClientState {
    /// Build the state with file-backed storage from the configuration
    pub fn new(config: ClientConfig, user_id: impl Into<String>) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(config.storage.dir.clone()));
        Self::with_storage(config, user_id, storage)
    }

    /// Build the state over a caller-provided storage backend
    pub fn with_storage(
        config: ClientConfig,
        user_id: impl Into<String>,
        storage: Arc<dyn LocalStorage>,
    ) -> Result<Self> {
        let mut rpc = RpcClient::from_config(&config.remote)?;
        if let Some(token) = config.session.access_token.clone() {
            rpc = rpc.with_access_token(token);
        }
        let rpc = Arc::new(rpc);

        let queue = Arc::new(OfflineQueue::new(OfflineQueueRepository::new(
            storage,
            config.storage.queue_key.clone(),
        )));
        let notifier = Arc::new(LocalNotifier::new());
        let coordinator = Arc::new(CareCoordinator::new(
            user_id,
            rpc.clone(),
            QueryCache::new(),
            queue,
            notifier.clone(),
            config.sync.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            rpc,
            notifier,
            coordinator,
        })
    }

    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[inline]
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    #[inline]
    pub fn notifier(&self) -> &LocalNotifier {
        &self.notifier
    }

    #[inline]
    pub fn coordinator(&self) -> &Arc<CareCoordinator> {
        &self.coordinator
    }

    #[inline]
    pub fn cache(&self) -> &QueryCache {
        self.coordinator.cache()
    }

    /// Read a view through the cache, refetching when missing or stale
    pub async fn load_view(&self, key: &ViewKey) -> Result<CachedView, RemoteFailure> {
        self.cache().load(key, self.rpc.as_ref()).await
    }

    /// Start replaying the offline queue on foreground transitions
    pub fn watch_lifecycle(&self, phases: mpsc::Receiver<AppPhase>) -> JoinHandle<()> {
        spawn_foreground_replay(self.coordinator.clone(), phases)
    }

    /// End the session: drop pending reminders
    pub async fn shutdown(&self) {
        self.notifier.dispose().await;
    }
}

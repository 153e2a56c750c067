//! Client-side query cache
//!
//! Holds the three denormalized read models (calendar tasks, home
//! snapshot, plant detail) keyed by the query that produced them.
//! [`CacheState`] is the synchronous store; [`QueryCache`] is the shared
//! handle that serializes every access through one async mutex, which is
//! what lets a caller snapshot and mutate several views atomically.

use crate::remote::ViewSource;
use garden_assistant_shared::{
    CalendarTasksView, DateRange, HomeSnapshotView, PlantDetailView, RemoteFailure,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Identity of a cached view
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewKey {
    CalendarTasks { user_id: String, range: DateRange },
    HomeSnapshot { user_id: String },
    PlantDetail { user_plant_id: String },
}

impl ViewKey {
    pub fn calendar(user_id: impl Into<String>, range: DateRange) -> Self {
        ViewKey::CalendarTasks {
            user_id: user_id.into(),
            range,
        }
    }

    pub fn home(user_id: impl Into<String>) -> Self {
        ViewKey::HomeSnapshot {
            user_id: user_id.into(),
        }
    }

    pub fn plant(user_plant_id: impl Into<String>) -> Self {
        ViewKey::PlantDetail {
            user_plant_id: user_plant_id.into(),
        }
    }

    /// Any cached calendar range belonging to the user
    pub fn is_calendar_of(&self, user: &str) -> bool {
        matches!(self, ViewKey::CalendarTasks { user_id, .. } if user_id == user)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ViewKey::CalendarTasks { .. } => "calendar_tasks",
            ViewKey::HomeSnapshot { .. } => "home_snapshot",
            ViewKey::PlantDetail { .. } => "plant_detail",
        }
    }
}

/// A cached read model
#[derive(Debug, Clone, PartialEq)]
pub enum CachedView {
    Calendar(CalendarTasksView),
    Home(HomeSnapshotView),
    Plant(PlantDetailView),
}

impl CachedView {
    pub fn as_calendar(&self) -> Option<&CalendarTasksView> {
        match self {
            CachedView::Calendar(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_home(&self) -> Option<&HomeSnapshotView> {
        match self {
            CachedView::Home(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_plant(&self) -> Option<&PlantDetailView> {
        match self {
            CachedView::Plant(view) => Some(view),
            _ => None,
        }
    }
}

/// Stored value plus its freshness
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: CachedView,
    /// Marked for refetch on next access
    pub stale: bool,
}

/// Result of reading a key
#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead {
    Fresh(CachedView),
    Stale(CachedView),
    Missing,
}

impl CacheRead {
    /// The cached value regardless of freshness
    pub fn value(&self) -> Option<&CachedView> {
        match self {
            CacheRead::Fresh(v) | CacheRead::Stale(v) => Some(v),
            CacheRead::Missing => None,
        }
    }

    pub fn into_value(self) -> Option<CachedView> {
        match self {
            CacheRead::Fresh(v) | CacheRead::Stale(v) => Some(v),
            CacheRead::Missing => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, CacheRead::Stale(_))
    }
}

/// Captured state of a set of keys, restorable verbatim
///
/// Keys absent at capture time are removed again on restore.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotToken {
    entries: Vec<(ViewKey, Option<CacheEntry>)>,
}

impl SnapshotToken {
    pub fn keys(&self) -> impl Iterator<Item = &ViewKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// The entry captured for a key, if the key was cached at capture time
    pub fn captured(&self, key: &ViewKey) -> Option<&CacheEntry> {
        self.entries
            .iter()
            .find(|(captured, _)| captured == key)
            .and_then(|(_, entry)| entry.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The cache contents
#[derive(Debug, Default)]
pub struct CacheState {
    entries: HashMap<ViewKey, CacheEntry>,
}

impl CacheState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ViewKey) -> CacheRead {
        match self.entries.get(key) {
            Some(entry) if entry.stale => CacheRead::Stale(entry.value.clone()),
            Some(entry) => CacheRead::Fresh(entry.value.clone()),
            None => CacheRead::Missing,
        }
    }

    pub fn entry(&self, key: &ViewKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Store a fresh value
    pub fn set(&mut self, key: ViewKey, value: CachedView) {
        self.entries.insert(key, CacheEntry { value, stale: false });
    }

    /// Mark a key for refetch; returns whether it was cached
    pub fn invalidate(&mut self, key: &ViewKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    /// Mark every matching key for refetch; returns how many were cached
    pub fn invalidate_where(&mut self, mut predicate: impl FnMut(&ViewKey) -> bool) -> usize {
        let mut count = 0;
        for (key, entry) in self.entries.iter_mut() {
            if predicate(key) {
                entry.stale = true;
                count += 1;
            }
        }
        count
    }

    pub fn remove(&mut self, key: &ViewKey) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    pub fn keys_where(&self, mut predicate: impl FnMut(&ViewKey) -> bool) -> Vec<ViewKey> {
        self.entries.keys().filter(|k| predicate(k)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self, keys: &[ViewKey]) -> SnapshotToken {
        SnapshotToken {
            entries: keys
                .iter()
                .map(|key| (key.clone(), self.entries.get(key).cloned()))
                .collect(),
        }
    }

    pub fn restore(&mut self, token: SnapshotToken) {
        for (key, entry) in token.entries {
            match entry {
                Some(entry) => {
                    self.entries.insert(key, entry);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }

    /// Put back the captured value of a single key
    ///
    /// Only the value is restored: a key marked stale since the capture
    /// stays stale. Keys that were not cached at capture time are left
    /// alone. Returns whether anything was restored.
    pub fn restore_value(&mut self, key: &ViewKey, token: &SnapshotToken) -> bool {
        let Some(captured) = token.captured(key) else {
            return false;
        };
        let stale = self.entries.get(key).map_or(false, |entry| entry.stale) || captured.stale;
        self.entries.insert(
            key.clone(),
            CacheEntry {
                value: captured.value.clone(),
                stale,
            },
        );
        true
    }

    pub fn calendar_mut(&mut self, key: &ViewKey) -> Option<&mut CalendarTasksView> {
        match self.entries.get_mut(key).map(|e| &mut e.value) {
            Some(CachedView::Calendar(view)) => Some(view),
            _ => None,
        }
    }

    pub fn home_mut(&mut self, key: &ViewKey) -> Option<&mut HomeSnapshotView> {
        match self.entries.get_mut(key).map(|e| &mut e.value) {
            Some(CachedView::Home(view)) => Some(view),
            _ => None,
        }
    }

    pub fn plant_mut(&mut self, key: &ViewKey) -> Option<&mut PlantDetailView> {
        match self.entries.get_mut(key).map(|e| &mut e.value) {
            Some(CachedView::Plant(view)) => Some(view),
            _ => None,
        }
    }
}

/// Shared handle to the cache
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    state: Arc<Mutex<CacheState>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &ViewKey) -> CacheRead {
        self.state.lock().await.get(key)
    }

    pub async fn set(&self, key: ViewKey, value: CachedView) {
        self.state.lock().await.set(key, value);
    }

    pub async fn invalidate(&self, key: &ViewKey) -> bool {
        self.state.lock().await.invalidate(key)
    }

    pub async fn snapshot(&self, keys: &[ViewKey]) -> SnapshotToken {
        self.state.lock().await.snapshot(keys)
    }

    pub async fn restore(&self, token: SnapshotToken) {
        self.state.lock().await.restore(token);
    }

    /// Run several reads and writes with no other cache user in between
    pub async fn transaction<R>(&self, f: impl FnOnce(&mut CacheState) -> R) -> R {
        let mut state = self.state.lock().await;
        f(&mut state)
    }

    /// Read-through access
    ///
    /// A fresh value is returned as is. Otherwise the view is fetched and
    /// stored fresh. If fetching fails and a stale value exists, the stale
    /// value is returned.
    pub async fn load(
        &self,
        key: &ViewKey,
        source: &dyn ViewSource,
    ) -> Result<CachedView, RemoteFailure> {
        let cached = match self.get(key).await {
            CacheRead::Fresh(value) => return Ok(value),
            other => other,
        };

        debug!(view = key.kind(), "Fetching view");
        match source.fetch_view(key).await {
            Ok(value) => {
                self.set(key.clone(), value.clone()).await;
                Ok(value)
            }
            Err(failure) => match cached.into_value() {
                Some(stale) => {
                    warn!(view = key.kind(), error = %failure, "Refetch failed, serving stale view");
                    Ok(stale)
                }
                None => Err(failure),
            },
        }
    }
}

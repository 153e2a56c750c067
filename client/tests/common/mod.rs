//! Common test utilities for integration tests
//!
//! Every test gets its own mock RPC server and in-memory storage.

#![allow(dead_code)]

use chrono::NaiveDate;
use fake::faker::lorem::en::Word;
use fake::Fake;
use garden_assistant_client::{
    cache::{CacheEntry, ViewKey},
    config::ClientConfig,
    repositories::{LocalStorage, MemoryStorage},
    state::ClientState,
};
use garden_assistant_shared::{
    ActionType, CareAction, DateRange, HomeSnapshotView, NextAction, NextActionStatus,
    PlantAnalytics, PlantDetailView, PlantSummary, Task,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-anon-key";
pub const QUEUE_KEY: &str = "offline_care_actions";

/// Test client wrapper
pub struct TestApp {
    pub server: MockServer,
    pub state: ClientState,
    pub storage: Arc<MemoryStorage>,
    pub user_id: String,
}

impl TestApp {
    /// Create a client pointed at a fresh mock server
    pub async fn new() -> Self {
        Self::with_timeout(5).await
    }

    pub async fn with_timeout(timeout_secs: u64) -> Self {
        let server = MockServer::start().await;
        let mut config = ClientConfig::default();
        config.remote.url = server.uri();
        config.remote.api_key = Some(SecretString::new(API_KEY.to_string()));
        config.remote.timeout_secs = timeout_secs;

        let storage = Arc::new(MemoryStorage::new());
        let user_id = uuid::Uuid::new_v4().to_string();
        let state = ClientState::with_storage(config, user_id.clone(), storage.clone())
            .expect("Failed to build client state");

        Self {
            server,
            state,
            storage,
            user_id,
        }
    }

    pub fn month(&self) -> ViewKey {
        ViewKey::calendar(self.user_id.clone(), DateRange::new(day(1), day(31)))
    }

    pub fn week(&self) -> ViewKey {
        ViewKey::calendar(self.user_id.clone(), DateRange::new(day(12), day(18)))
    }

    pub fn home(&self) -> ViewKey {
        ViewKey::home(self.user_id.clone())
    }

    pub fn plant(&self) -> ViewKey {
        ViewKey::plant("p1")
    }

    /// Serve every read procedure and load all four views into the cache
    pub async fn seed_views(&self, eco_score: i64, task_completed: bool) {
        mount_rpc(&self.server, "get_tasks_by_range", 200, json!(tasks(task_completed))).await;
        mount_rpc(&self.server, "get_home_snapshot", 200, json!(home_view(eco_score))).await;
        mount_rpc(&self.server, "get_plant_detail", 200, json!(plant_view(50.0))).await;

        for key in [self.month(), self.week(), self.home(), self.plant()] {
            self.state
                .load_view(&key)
                .await
                .expect("Failed to load view");
        }
    }

    pub async fn entry(&self, key: &ViewKey) -> Option<CacheEntry> {
        self.state
            .cache()
            .transaction(|state| state.entry(key).cloned())
            .await
    }

    pub async fn eco_score(&self) -> i64 {
        let entry = self.entry(&self.home()).await.expect("home snapshot cached");
        entry.value.as_home().expect("home view").eco_score
    }

    pub async fn task_completed(&self, key: &ViewKey, task_id: &str) -> bool {
        let entry = self.entry(key).await.expect("calendar cached");
        entry
            .value
            .as_calendar()
            .and_then(|view| view.find(task_id))
            .map(|task| task.completed)
            .expect("task cached")
    }

    pub async fn is_stale(&self, key: &ViewKey) -> bool {
        self.entry(key).await.map(|e| e.stale).unwrap_or(false)
    }

    /// Raw persisted offline queue
    pub async fn persisted_queue(&self) -> Vec<Value> {
        let raw = self
            .storage
            .get_item(QUEUE_KEY)
            .await
            .expect("storage readable");
        raw.map(|raw| serde_json::from_str(&raw).expect("queue is a JSON array"))
            .unwrap_or_default()
    }

    /// Bodies of every `log_care_action` request, in arrival order
    pub async fn logged_actions(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == "/rest/v1/rpc/log_care_action")
            .map(|r| serde_json::from_slice(&r.body).expect("JSON body"))
            .collect()
    }
}

/// Mount a procedure answering with a fixed status and body
pub async fn mount_rpc(server: &MockServer, function: &str, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path(format!("/rest/v1/rpc/{}", function)))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Successful `log_care_action` response for an action
pub fn care_response(action: &CareAction, notification_id: Option<&str>) -> Value {
    json!({
        "success": true,
        "eco_points_delta": garden_assistant_shared::care::eco_points_delta(
            action.action_type,
            action.uncomplete
        ),
        "task_id": action.task_id,
        "user_plant_id": action.user_plant_id,
        "action_type": action.action_type.as_str(),
        "notification_id": notification_id,
    })
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).expect("valid day")
}

pub fn tasks(t1_completed: bool) -> Vec<Task> {
    vec![
        Task {
            id: "t1".to_string(),
            user_plant_id: "p1".to_string(),
            task_type: ActionType::Water,
            due_date: day(17),
            completed: t1_completed,
            notes: Some(Word().fake::<String>()),
        },
        Task {
            id: "t2".to_string(),
            user_plant_id: "p2".to_string(),
            task_type: ActionType::Fertilize,
            due_date: day(14),
            completed: false,
            notes: None,
        },
    ]
}

pub fn home_view(eco_score: i64) -> HomeSnapshotView {
    HomeSnapshotView {
        eco_score,
        delta_week: 5,
        streak_days: 2,
        liters_saved: 4.5,
        plants: vec![
            PlantSummary {
                id: "p1".to_string(),
                name: Word().fake(),
                photo_url: None,
                progress_pct: 30.0,
                next_action_label: "Water today".to_string(),
                next_action_color: "#F44336".to_string(),
            },
            PlantSummary {
                id: "p2".to_string(),
                name: Word().fake(),
                photo_url: None,
                progress_pct: 75.0,
                next_action_label: "Fertilize soon".to_string(),
                next_action_color: "#FF9800".to_string(),
            },
        ],
    }
}

pub fn plant_view(growth_percent: f64) -> PlantDetailView {
    PlantDetailView {
        id: "p1".to_string(),
        name: Word().fake(),
        growth_percent,
        last_watered_at: None,
        last_fertilized_at: None,
        last_harvested_at: None,
        next_water_due: None,
        next_fertilize_due: None,
        next_actions: vec![NextAction {
            action_type: ActionType::Water,
            due_date: None,
            status: NextActionStatus::Overdue,
        }],
        analytics: PlantAnalytics::default(),
    }
}

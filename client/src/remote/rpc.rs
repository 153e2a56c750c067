//! HTTP client for the remote procedures
//!
//! Procedures are called as `POST {url}/rest/v1/rpc/{name}` with named
//! JSON parameters. Transport errors are connectivity failures; any
//! response the server did send is classified by its message.

use super::{RemoteActionExecutor, ViewSource};
use crate::cache::{CachedView, ViewKey};
use crate::config::RemoteConfig;
use anyhow::Result;
use async_trait::async_trait;
use garden_assistant_shared::{
    ActionOutcome, CalendarTasksView, CareAction, HomeSnapshotView, LogCareActionParams,
    LogCareActionResponse, PlantDetailView, RemoteFailure, RpcErrorBody, Task,
    TasksByRangeParams, UserParams, UserPlantParams,
};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Remote procedure client
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    access_token: Option<SecretString>,
}

impl RpcClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            access_token: None,
        }
    }

    /// Build a client with the configured timeout and API key
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let mut client = Self::new(http, config.url.clone());
        client.api_key = config.api_key.clone();
        Ok(client)
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Authenticate calls as the signed-in user
    pub fn with_access_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }

    fn endpoint(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    /// Call a procedure and decode its result
    pub async fn call<P, R>(&self, function: &str, params: &P) -> Result<R, RemoteFailure>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut request = self.http.post(self.endpoint(function)).json(params);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key.expose_secret().as_str());
        }
        if let Some(token) = self.access_token.as_ref().or(self.api_key.as_ref()) {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(transport_failure)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_failure)?;

        if !status.is_success() {
            let failure = rejection(status, &body);
            debug!(function, status = status.as_u16(), error = %failure, "Remote procedure failed");
            return Err(failure);
        }

        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| {
            warn!(function, error = %e, "Undecodable remote response");
            RemoteFailure::Rejected(format!("Unexpected response from {}: {}", function, e))
        })
    }
}

fn transport_failure(error: reqwest::Error) -> RemoteFailure {
    RemoteFailure::Connectivity(format!("Network request failed: {}", error))
}

/// A gateway in front of the server answered for it
fn is_gateway_failure(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

fn rejection(status: StatusCode, body: &str) -> RemoteFailure {
    let parsed: RpcErrorBody = serde_json::from_str(body).unwrap_or_default();
    match parsed.message() {
        Some(message) => RemoteFailure::from_message(message.to_string()),
        None => {
            let message = format!("Request failed with status {}", status.as_u16());
            if is_gateway_failure(status) {
                RemoteFailure::Connectivity(message)
            } else {
                RemoteFailure::from_message(message)
            }
        }
    }
}

#[async_trait]
impl RemoteActionExecutor for RpcClient {
    async fn execute(&self, action: &CareAction) -> Result<ActionOutcome, RemoteFailure> {
        let response: LogCareActionResponse = self
            .call("log_care_action", &LogCareActionParams::from(action))
            .await?;
        response.into_outcome()
    }

    async fn archive_plant(&self, user_plant_id: &str) -> Result<(), RemoteFailure> {
        let params = UserPlantParams {
            p_user_plant_id: user_plant_id.to_string(),
        };
        let _: serde_json::Value = self.call("archive_plant", &params).await?;
        Ok(())
    }
}

#[async_trait]
impl ViewSource for RpcClient {
    async fn fetch_view(&self, key: &ViewKey) -> Result<CachedView, RemoteFailure> {
        match key {
            ViewKey::CalendarTasks { user_id, range } => {
                let params = TasksByRangeParams {
                    p_user_id: user_id.clone(),
                    p_start_date: range.start,
                    p_end_date: range.end,
                };
                let tasks: Vec<Task> = self.call("get_tasks_by_range", &params).await?;
                Ok(CachedView::Calendar(CalendarTasksView::from_tasks(tasks)))
            }
            ViewKey::HomeSnapshot { user_id } => {
                let params = UserParams {
                    p_user_id: user_id.clone(),
                };
                let home: HomeSnapshotView = self.call("get_home_snapshot", &params).await?;
                Ok(CachedView::Home(home))
            }
            ViewKey::PlantDetail { user_plant_id } => {
                let params = UserPlantParams {
                    p_user_plant_id: user_plant_id.clone(),
                };
                let detail: PlantDetailView = self.call("get_plant_detail", &params).await?;
                Ok(CachedView::Plant(detail))
            }
        }
    }
}

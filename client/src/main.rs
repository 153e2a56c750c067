//! Garden Assistant offline sync
//!
//! Headless replay of the offline care-action queue. Run it when the
//! device regains connectivity outside the app, or from a scheduled job:
//! - Loads configuration and validates it
//! - Replays queued actions in order
//! - Logs what was replayed and what was dropped

use anyhow::Result;
use garden_assistant_client::{config::ClientConfig, state::ClientState};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = ClientConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if ClientConfig::is_production() { "production" } else { "development" },
        "Starting Garden Assistant offline sync"
    );

    if let Err(e) = config.validate() {
        error!(error = %e, "Configuration error");
        return Err(e);
    }

    let Some(user_id) = config.session.user_id.clone() else {
        anyhow::bail!("session.user_id is required (set GARDEN__SESSION__USER_ID)");
    };
    if config.session.access_token.is_none() {
        warn!("No session access token configured, calls are authorized with the API key only");
    }

    let state = ClientState::new(config, user_id)?;
    info!(
        dir = %state.config().storage.dir.display(),
        queue_key = %state.config().storage.queue_key,
        "Replaying offline queue"
    );

    let report = state.coordinator().replay_offline_queue().await;
    info!(
        replayed = report.replayed,
        dropped = report.dropped,
        "Offline sync complete"
    );

    state.shutdown().await;
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if ClientConfig::is_production() {
            "garden_assistant_client=info,garden_sync=info".into()
        } else {
            "garden_assistant_client=debug,garden_sync=debug,reqwest=info".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if ClientConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

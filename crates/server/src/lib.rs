//! Apitrack server library.
//!
//! Assembles the router, the tracking and timing middleware and the
//! tracker from configuration, and serves them. Used by the apitrack
//! binary and by the integration tests.

#![deny(missing_docs)]

mod clock;
mod health;
mod middleware;
mod stats;
mod timing;

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, anyhow};
use axum::{Router, routing::get};
use config::{Config, TrackingMode};
use metrics::MetricRegistry;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracking::{ApiCallsTracker, PersistentTracker, RedisStore};

use crate::{middleware::TrackingLayer, timing::RequestTimingLayer};

/// Configuration for serving apitrack.
pub struct ServeConfig {
    /// The socket address the server binds to.
    pub listen_address: SocketAddr,
    /// The deserialized apitrack TOML configuration.
    pub config: Config,
}

/// Starts and runs the apitrack server with the provided configuration.
pub async fn serve(ServeConfig { listen_address, config }: ServeConfig) -> anyhow::Result<()> {
    config.validate()?;

    let registry = Arc::new(MetricRegistry::new());
    let tracker = Arc::new(build_tracker(&config).await?);

    let mut app = Router::new()
        .route("/clock/date", get(clock::date))
        .route("/clock/timestamp", get(clock::timestamp))
        .route("/stats", get(stats::stats))
        .with_state(registry.clone());

    if config.server.health.enabled {
        app = app.route(&config.server.health.path, get(health::health));
    }

    if let Some(assets) = &config.server.assets {
        app = app.nest_service("/assets", ServeDir::new(&assets.dir));
    }

    // The timing layer sits outside the tracking layer, so a request's
    // measured duration includes the tracker submission.
    let app = app
        .layer(TrackingLayer::new(tracker))
        .layer(RequestTimingLayer::new(registry));

    let listener = TcpListener::bind(listen_address)
        .await
        .map_err(|e| anyhow!("Failed to bind to {listen_address}: {e}"))?;

    log::info!("Stats report available at: http://{listen_address}/stats");

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow!("Failed to start HTTP server: {e}"))?;

    Ok(())
}

async fn build_tracker(config: &Config) -> anyhow::Result<ApiCallsTracker> {
    let tracking = &config.tracking;

    match tracking.mode {
        TrackingMode::Ignore => Ok(ApiCallsTracker::Ignoring),
        TrackingMode::Log => Ok(ApiCallsTracker::Logging),
        TrackingMode::Persist => {
            let storage = tracking
                .storage
                .as_ref()
                .context(r#"[tracking.storage] is required when tracking mode is "persist""#)?;

            let store = RedisStore::connect(storage)
                .await
                .context("Failed to connect to the tracking store")?;

            let tracker = PersistentTracker::new(
                Arc::new(store),
                tracking.queue_capacity,
                tracking.min_workers,
                tracking.max_workers,
            );

            Ok(ApiCallsTracker::Persistent(tracker))
        }
    }
}

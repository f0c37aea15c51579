mod app_state;
pub mod auth;
pub mod middleware;
mod routes;
mod shutdown;

pub use app_state::AppState;

use crate::config::{self, Config};
use crate::geoip::GeoIpClient;
use crate::storage::{self, retention};
use anyhow::Result;
use axum::{middleware as axum_mw, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub async fn run(config: Config) -> Result<()> {
    let db = storage::init(&config)?;

    // Background retention cleanup
    let prune_interval =
        config::parse_duration(&config.storage.prune_interval, "storage.prune_interval")?;
    let metric_days = retention::parse_retention_days(&config.storage.retention.metrics);
    let ban_days = retention::parse_retention_days(&config.storage.retention.ban_events);

    tokio::spawn(retention::retention_task(
        db.clone(),
        prune_interval.as_secs(),
        metric_days,
        ban_days,
    ));

    let geoip = Arc::new(GeoIpClient::new(&config.geoip));
    let state = AppState::new(config.clone(), db, geoip);

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.bind.parse()?, config.server.port);

    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .merge(routes::open())
        .merge(routes::agent(state.clone()))
        .layer(axum_mw::from_fn(middleware::request_timing));

    middleware::apply(router).with_state(state)
}

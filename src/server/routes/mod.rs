pub mod api;
pub mod health;

use crate::server::{middleware, AppState};
use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Unauthenticated routes: probes and the dashboard read API. Session
/// auth for readers is an external concern; the default bind is loopback.
pub fn open() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/version", get(health::version_info))
        .route("/api/servers", get(api::list_servers))
        .route("/api/servers/:id/series", get(api::server_series))
        .route("/api/servers/:id/bans", get(api::server_bans))
}

/// Agent routes, gated by bearer token authentication
pub fn agent(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/metrics", post(api::ingest_metrics))
        .layer(axum_mw::from_fn_with_state(state, middleware::agent_auth))
}

use crate::ingest::{charts, derive, status};
use crate::server::middleware::ErrorResponse;
use crate::server::AppState;
use crate::storage::{MetricRecord, Server};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Hard cap on chart window size: a week of five-minute samples
const MAX_SERIES_POINTS: u32 = 2016;
const DEFAULT_SERIES_POINTS: u32 = 288;

#[derive(Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub metric_id: i64,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn db_error(e: rusqlite::Error) -> ApiError {
    ErrorResponse::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        &format!("Database error: {}", e),
    )
}

/// POST /api/metrics - receive one snapshot from an agent.
///
/// The authenticated server arrives via request extensions. Processing
/// order: store the record, mark the server seen, pick up the agent
/// version, classify status, then diff banned IPs. Geo failures never
/// surface here.
pub async fn ingest_metrics(
    State(state): State<Arc<AppState>>,
    Extension(server): Extension<Server>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    if !payload.is_object() {
        return Err(ErrorResponse::new(
            StatusCode::BAD_REQUEST,
            "Request body must be a JSON object",
        ));
    }

    let now = Utc::now();
    let metric = MetricRecord::from_payload(server.id, now, &payload);

    let metric_id = state.db.insert_metric(&metric).map_err(db_error)?;
    state.db.mark_server_seen(server.id, now).map_err(db_error)?;

    if let Some(version) = payload.get("agent_version").and_then(Value::as_str) {
        state
            .db
            .update_agent_version(server.id, version)
            .map_err(db_error)?;
    }

    let new_status = status::classify(&metric);
    state
        .db
        .update_server_status(server.id, new_status)
        .map_err(db_error)?;

    state
        .ban_tracker
        .process(server.id, &metric, now)
        .await
        .map_err(|e| {
            ErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Ban tracking error: {}", e),
            )
        })?;

    info!(
        server = %server.name,
        metric_id,
        status = %new_status,
        "Metrics ingested"
    );

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            success: true,
            metric_id,
        }),
    ))
}

/// GET /api/servers - all registered servers with staleness-resolved
/// status, a derived summary of each server's latest snapshot, and
/// fleet-wide status counts
pub async fn list_servers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let servers = state.db.get_servers().map_err(db_error)?;

    let now = Utc::now();
    let threshold = state.offline_threshold();

    // Worst first, like the dashboard: critical, warning, offline, online
    let mut ranked: Vec<_> = servers
        .iter()
        .map(|s| (s, s.effective_status(now, threshold)))
        .collect();
    ranked.sort_by_key(|(s, status)| (status_rank(*status), s.name.clone()));

    let mut stats: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
    let mut entries = Vec::with_capacity(ranked.len());

    for (s, status) in ranked {
        *stats.entry(status.to_string()).or_insert(0) += 1;

        let latest = state.db.latest_metric(s.id).map_err(db_error)?;
        let summary = latest.as_ref().map(|m| {
            serde_json::json!({
                "recorded_at": m.recorded_at,
                "uptime": m.uptime,
                "memory_percent": derive::memory_percent(m, 2),
                "swap_percent": derive::swap_percent(m, 2),
                "normalized_load": derive::normalized_load(m, 2),
                "max_disk_percent": derive::max_disk_percent(m, 2),
                "failed_services": derive::failed_services_count(m),
            })
        });

        entries.push(serde_json::json!({
            "id": s.id,
            "name": s.name,
            "hostname": s.hostname,
            "status": status.to_string(),
            "last_seen_at": s.last_seen_at,
            "is_active": s.is_active,
            "agent_version": s.agent_version,
            "latest": summary,
        }));
    }

    Ok(Json(serde_json::json!({
        "servers": entries,
        "count": entries.len(),
        "stats": stats,
    })))
}

fn status_rank(status: crate::storage::ServerStatus) -> u8 {
    use crate::storage::ServerStatus::*;
    match status {
        Critical => 1,
        Warning => 2,
        Offline => 3,
        Online => 4,
    }
}

#[derive(Deserialize)]
pub struct SeriesParams {
    pub points: Option<u32>,
}

/// GET /api/servers/:id/series - chart series over the recent window
pub async fn server_series(
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<i64>,
    Query(params): Query<SeriesParams>,
) -> Result<Json<Value>, ApiError> {
    let server = state
        .db
        .get_server(server_id)
        .map_err(db_error)?
        .ok_or_else(|| ErrorResponse::new(StatusCode::NOT_FOUND, "Server not found"))?;

    let points = params
        .points
        .unwrap_or(DEFAULT_SERIES_POINTS)
        .min(MAX_SERIES_POINTS);

    let window = state
        .db
        .recent_metrics(server.id, points)
        .map_err(db_error)?;
    let bundle = charts::build(&window);

    Ok(Json(serde_json::json!({
        "server_id": server.id,
        "points": window.len(),
        "series": bundle,
    })))
}

#[derive(Deserialize)]
pub struct BansParams {
    pub limit: Option<u32>,
}

/// GET /api/servers/:id/bans - recent ban history plus per-IP ban counts
/// for the IPs the latest snapshot reports as banned
pub async fn server_bans(
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<i64>,
    Query(params): Query<BansParams>,
) -> Result<Json<Value>, ApiError> {
    let server = state
        .db
        .get_server(server_id)
        .map_err(db_error)?
        .ok_or_else(|| ErrorResponse::new(StatusCode::NOT_FOUND, "Server not found"))?;

    let events = state
        .db
        .recent_ban_events(server.id, params.limit.unwrap_or(50))
        .map_err(db_error)?;

    let current_ips = state
        .db
        .latest_metric(server.id)
        .map_err(db_error)?
        .map(|m| m.banned_ips())
        .unwrap_or_default();

    let ban_counts = state
        .db
        .ban_counts(server.id, &current_ips)
        .map_err(db_error)?;

    // Live geo annotation for the currently reported set; cache-backed
    // and best-effort, missing entries just render without location
    let geo = state.geoip.lookup_many(&current_ips).await;

    Ok(Json(serde_json::json!({
        "events": events,
        "count": events.len(),
        "currently_banned": current_ips,
        "ban_counts": ban_counts,
        "geo": geo,
    })))
}

use crate::server::auth;
use crate::server::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::{info, warn};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(code: StatusCode, message: &str) -> (StatusCode, Json<Self>) {
        (
            code,
            Json(Self {
                error: message.to_string(),
                code: code.as_u16(),
            }),
        )
    }
}

pub fn apply(router: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new()),
    )
}

/// Agent token authentication. Resolves the bearer token to an active
/// server and attaches it to the request; the ingest handler reads it
/// from extensions. Marking "seen" is the handler's job, not auth's.
pub async fn agent_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match auth::resolve_server(&state.db, token) {
        Ok(server) => {
            request.extensions_mut().insert(server);
            next.run(request).await
        }
        Err(e) => {
            warn!(path = %request.uri().path(), reason = %e, "Agent authentication failed");
            ErrorResponse::new(e.status_code(), &e.to_string()).into_response()
        }
    }
}

/// Request timing middleware
pub async fn request_timing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        path = %path,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}

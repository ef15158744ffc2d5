// media-cli/src/http.rs
// ============================================================================
// Module: HTTP Entry Point
// Description: The analyst-facing read surface plus the export mutation,
//              and the liveness route.
// Purpose: Implement the selected HTTP contracts of §6 that the core
//          depends on directly (monitor KPIs, incidents, top content,
//          export jobs), gated by role.
// Dependencies: axum, axum-server, media-core, serde_json
// ============================================================================

//! ## Overview
//! Every handler shares one [`AppState`] wrapping the store behind an
//! `Arc<dyn Store>`. Errors are mapped once, in [`error_response`], to the
//! `{error, message}` body and status code table every JSON error body in
//! this workspace follows; handlers themselves only ever return `Ok` or a
//! [`StoreError`] via `?`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use media_core::StoreError;
use media_core::core::identifiers::RequestId;
use media_core::core::identifiers::UserId;
use media_core::interfaces::Store;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::health;
use crate::role::Role;

/// Shared state every handler reads from.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
}

impl AppState {
    /// Wraps `store` for handler use.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Builds the router: liveness plus the monitor/incidents/content/exports
/// read-and-mutate surface.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/monitor/kpis", get(handle_monitor_kpis))
        .route("/incidents", get(handle_incidents))
        .route("/content", get(handle_content))
        .route("/exports", post(handle_create_export))
        .with_state(state)
}

/// Binds and serves `router` at `addr` until the process is terminated.
///
/// # Errors
/// Returns a message describing a bind or serve failure.
pub async fn serve(router: Router, addr: SocketAddr) -> Result<(), String> {
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|err| format!("http bind failed: {err}"))?;
    axum::serve(listener, router).await.map_err(|err| format!("http server failed: {err}"))
}

/// Liveness route: reports DB reachability with no configured-key checks.
async fn handle_health(State(state): State<AppState>) -> Response {
    let report = health::run_health_check(state.store.as_ref(), &[]).await;
    let status = if report.is_healthy() { StatusCode::OK } else { StatusCode::INTERNAL_SERVER_ERROR };
    (status, Json(report)).into_response()
}

/// Query parameters shared by the monitor and content list routes: a flat
/// filter bag plus an optional result limit.
#[derive(Debug, Deserialize)]
struct FiltersQuery {
    /// Arbitrary filter key/value pairs forwarded to the store as-is.
    #[serde(flatten)]
    filters: std::collections::BTreeMap<String, String>,
    /// Maximum rows to return, where the route supports one.
    #[serde(default)]
    limit: Option<u32>,
}

/// `GET /monitor/kpis`: aggregated monitor KPIs, gated at [`Role::Viewer`].
async fn handle_monitor_kpis(headers: HeaderMap, State(state): State<AppState>, Query(query): Query<FiltersQuery>) -> Response {
    if Role::from_headers(&headers) < Role::Viewer {
        return error_response(&StoreError::Forbidden("insufficient role".to_string()));
    }
    let filters = filters_to_value(&query.filters);
    match state.store.aggregate_monitor_kpis(&filters).await {
        Ok(kpis) => (StatusCode::OK, Json(kpis)).into_response(),
        Err(err) => error_response(&err),
    }
}

/// `GET /incidents`: currently active incidents, gated at [`Role::Viewer`].
async fn handle_incidents(headers: HeaderMap, State(state): State<AppState>) -> Response {
    if Role::from_headers(&headers) < Role::Viewer {
        return error_response(&StoreError::Forbidden("insufficient role".to_string()));
    }
    match state.store.list_active_incidents().await {
        Ok(incidents) => (StatusCode::OK, Json(incidents)).into_response(),
        Err(err) => error_response(&err),
    }
}

/// `GET /content`: top content by the given filters, gated at [`Role::Viewer`].
async fn handle_content(headers: HeaderMap, State(state): State<AppState>, Query(query): Query<FiltersQuery>) -> Response {
    if Role::from_headers(&headers) < Role::Viewer {
        return error_response(&StoreError::Forbidden("insufficient role".to_string()));
    }
    let filters = filters_to_value(&query.filters);
    let limit = query.limit.unwrap_or(50);
    match state.store.list_top_content(&filters, limit).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(err) => error_response(&err),
    }
}

/// Body of the `POST /exports` request.
#[derive(Debug, Deserialize)]
struct CreateExportRequest {
    /// Filters scoping the export, forwarded to the store as-is.
    #[serde(default)]
    filters: Value,
    /// Caller identity to stamp on the export job, when supplied.
    #[serde(default)]
    requested_by_user_id: Option<String>,
}

/// `POST /exports`: creates an export job, gated at [`Role::Analyst`].
async fn handle_create_export(headers: HeaderMap, State(state): State<AppState>, Json(body): Json<CreateExportRequest>) -> Response {
    if Role::from_headers(&headers) < Role::Analyst {
        return error_response(&StoreError::Forbidden("insufficient role".to_string()));
    }
    let requested_by_user_id = body.requested_by_user_id.map(UserId::from);
    let request_id = headers.get("x-request-id").and_then(|value| value.to_str().ok()).map(RequestId::from);
    match state.store.create_export_job(body.filters, requested_by_user_id.as_ref(), request_id.as_ref()).await {
        Ok(export_job_id) => (StatusCode::ACCEPTED, Json(json!({ "exportJobId": export_job_id.as_str() }))).into_response(),
        Err(err) => error_response(&err),
    }
}

/// Converts a flat string filter bag into the JSON object the store expects.
fn filters_to_value(filters: &std::collections::BTreeMap<String, String>) -> Value {
    Value::Object(filters.iter().map(|(key, value)| (key.clone(), Value::from(value.as_str()))).collect())
}

/// Maps a [`StoreError`] to the `{error, message}` JSON body and status
/// code table in §7.
fn error_response(err: &StoreError) -> Response {
    let (status, kind) = match err {
        StoreError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
        StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        StoreError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        StoreError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        StoreError::Misconfigured(_) => (StatusCode::INTERNAL_SERVER_ERROR, "misconfigured"),
        StoreError::TransientUpstream(_) => (StatusCode::BAD_GATEWAY, "transient_upstream"),
        StoreError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    (status, Json(json!({ "error": kind, "message": err.to_string() }))).into_response()
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::error_response;
    use axum::http::StatusCode;
    use media_core::StoreError;

    #[tokio::test]
    async fn validation_errors_map_to_422() {
        let response = error_response(&StoreError::Validation("bad".to_string()));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn forbidden_errors_map_to_403() {
        let response = error_response(&StoreError::Forbidden("nope".to_string()));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

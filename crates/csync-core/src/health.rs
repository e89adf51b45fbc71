use axum::http::StatusCode;

/// Handler for `GET /healthz` — process liveness.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Handler for `GET /readyz` — readiness. The auth service keeps all
/// state in process memory, so ready is equivalent to alive; services
/// with external dependencies should mount their own check instead.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}

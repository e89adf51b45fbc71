use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use csync_core::health::{healthz, readyz};
use csync_core::middleware::request_id_layer;

use crate::handlers::auth::{callback, logout, me, start, verify};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Auth flow
        .route("/api/auth/start", post(start))
        .route("/api/auth/verify", post(verify))
        .route("/api/auth/callback", get(callback))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}

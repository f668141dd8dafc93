use std::sync::Arc;

use axum::{routing::get, Router};

use auth_cell::router::auth_routes;
use booking_cell::router::booking_routes;
use identity_cell::router::role_routes;
use prescription_cell::router::prescription_routes;
use shared_config::AppConfig;

/// Every cell is mounted both bare and under /api, matching the paths
/// deployed clients already use.
pub fn create_router(state: Arc<AppConfig>) -> Router {
    let cells = Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/role", role_routes(state.clone()))
        .nest("/booking", booking_routes(state.clone()))
        .nest("/prescription", prescription_routes(state));

    Router::new()
        .route(
            "/",
            get(|| async { "Samarth Clinics API Server is running" }),
        )
        .nest("/api", cells.clone())
        .merge(cells)
}

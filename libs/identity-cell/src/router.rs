use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{get_doctors, get_role, update_role};

/// Role and doctor-directory routes.
///
/// The doctor listing is public so the booking page can render without a
/// session. Role reads and updates require a valid token.
pub fn role_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new().route("/doctors", get(get_doctors));

    let protected_routes = Router::new()
        .route("/update", post(update_role))
        .route("/{id}", get(get_role))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

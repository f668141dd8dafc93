use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/admin-firewall", post(handlers::admin_firewall))
        .route("/doctor/login", post(handlers::doctor_login))
        .route("/doctor/register", post(handlers::register_doctor))
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/user", post(handlers::resolve_contact));

    let protected_routes = Router::new()
        .route("/{id}", get(handlers::get_user_details))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public_routes.merge(protected_routes).with_state(state)
}

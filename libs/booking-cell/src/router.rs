use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Booking routes.
///
/// Creation and the availability probe are public so visitors can book
/// without an account. Everything else needs a valid token; the all-bookings
/// and per-doctor listings additionally require the doctor role, enforced in
/// the handlers.
pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/create", post(handlers::create_booking))
        .route("/time-slot", post(handlers::check_time_slot));

    let protected_routes = Router::new()
        .route("/single/{id}", get(handlers::get_booking))
        .route("/user/{user_id}", get(handlers::get_user_bookings))
        .route("/update/{id}", post(handlers::update_booking))
        .route("/delete/{id}", delete(handlers::delete_booking))
        .route("/{doctor_id}/details/{user_id}", post(handlers::get_booking_id))
        .route("/all", get(handlers::get_all_bookings))
        .route("/{doctor_id}", get(handlers::get_doctor_bookings))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

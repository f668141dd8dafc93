use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn prescription_routes(state: Arc<AppConfig>) -> Router {
    let public_routes =
        Router::new().route("/share/{shareable_id}", get(handlers::share_prescription));

    let protected_routes = Router::new()
        .route("/create/{doctor_id}", post(handlers::create_prescription))
        .route("/user/{user_id}", get(handlers::get_user_prescriptions))
        .route(
            "/single/{prescription_id}",
            get(handlers::get_single_prescription),
        )
        .route(
            "/{doctor_id}/update/{prescription_id}",
            put(handlers::update_prescription),
        )
        .route(
            "/{doctor_id}/payment/{prescription_id}",
            patch(handlers::update_payment),
        )
        .route(
            "/{doctor_id}/patient/{patient_id}/payments",
            get(handlers::get_patient_payments),
        )
        .route(
            "/{doctor_id}/patients-with-appointments",
            get(handlers::get_patients_with_appointments),
        )
        .route("/{doctor_id}", get(handlers::get_prescriptions))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public_routes.merge(protected_routes).with_state(state)
}

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{IdentityError, UpdateRoleRequest};
use crate::services::identity::IdentityService;

fn to_app_error(err: IdentityError) -> AppError {
    match err {
        IdentityError::NotFound => AppError::NotFound("No user found".to_string()),
        IdentityError::MissingContact => {
            AppError::ValidationError("Email or phone number is required".to_string())
        }
        IdentityError::EmailTaken => AppError::Conflict(
            "A user with this email already exists. Please use a different email or contact support.".to_string(),
        ),
        IdentityError::PhoneTaken => AppError::Conflict(
            "A user with this phone number already exists. Please use a different phone number or contact support.".to_string(),
        ),
        IdentityError::ValidationError(msg) => AppError::ValidationError(msg),
        IdentityError::Store(e) => AppError::Database(e.to_string()),
        IdentityError::Serialization(e) => AppError::Internal(e.to_string()),
    }
}

/// Public doctor directory, used by the booking page.
#[axum::debug_handler]
pub async fn get_doctors(State(state): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let identity_service = IdentityService::new(&state);

    let doctors = identity_service.list_doctors().await.map_err(to_app_error)?;

    Ok(Json(json!(doctors)))
}

#[axum::debug_handler]
pub async fn get_role(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let identity_service = IdentityService::new(&state);

    let identity = identity_service.get(id).await.map_err(to_app_error)?;

    Ok(Json(json!({ "role": identity.role })))
}

#[axum::debug_handler]
pub async fn update_role(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<Value>, AppError> {
    let identity_service = IdentityService::new(&state);

    let identity = identity_service
        .update_role(request.user_id, request.role)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "message": "Role updated successfully",
        "user": identity
    })))
}

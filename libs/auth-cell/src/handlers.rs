use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use identity_cell::models::ContactDetails;
use identity_cell::IdentityError;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AdminFirewallRequest, AuthError, LoginRequest, RegisterRequest};
use crate::services::AuthService;

fn to_app_error(err: AuthError) -> AppError {
    match err {
        AuthError::MissingFields | AuthError::MissingCredentials => {
            AppError::ValidationError(err.to_string())
        }
        AuthError::InvalidCredentials
        | AuthError::PasswordlessAccount
        | AuthError::EmailExists => AppError::BadRequest(err.to_string()),
        AuthError::NotADoctor => AppError::Forbidden(err.to_string()),
        AuthError::InvalidAdminPassword => AppError::Auth(err.to_string()),
        AuthError::Hashing(msg) | AuthError::TokenSigning(msg) => AppError::Internal(msg),
        AuthError::Identity(IdentityError::NotFound) => {
            AppError::NotFound("No user found".to_string())
        }
        AuthError::Identity(IdentityError::MissingContact) => {
            AppError::ValidationError("Email or phone number is required".to_string())
        }
        AuthError::Identity(IdentityError::EmailTaken) => AppError::Conflict(
            "A user with this email already exists. Please use a different email or contact support.".to_string(),
        ),
        AuthError::Identity(IdentityError::PhoneTaken) => AppError::Conflict(
            "A user with this phone number already exists. Please use a different phone number or contact support.".to_string(),
        ),
        AuthError::Identity(IdentityError::ValidationError(msg)) => {
            AppError::ValidationError(msg)
        }
        AuthError::Identity(IdentityError::Store(e)) => AppError::Database(e.to_string()),
        AuthError::Identity(IdentityError::Serialization(e)) => AppError::Internal(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn admin_firewall(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<AdminFirewallRequest>,
) -> Result<Json<Value>, AppError> {
    let auth_service = AuthService::new(&state);

    auth_service
        .verify_admin_password(request.admin_password.as_deref().unwrap_or(""))
        .map_err(to_app_error)?;

    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let auth_service = AuthService::new(&state);

    let session = auth_service.register(request).await.map_err(to_app_error)?;

    Ok((StatusCode::CREATED, Json(json!(session))))
}

#[axum::debug_handler]
pub async fn register_doctor(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let auth_service = AuthService::new(&state);

    let session = auth_service
        .register_doctor(request)
        .await
        .map_err(to_app_error)?;

    Ok((StatusCode::CREATED, Json(json!(session))))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let auth_service = AuthService::new(&state);

    let session = auth_service.login(request).await.map_err(to_app_error)?;

    Ok(Json(json!(session)))
}

#[axum::debug_handler]
pub async fn doctor_login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let auth_service = AuthService::new(&state);

    let session = auth_service
        .login_doctor(request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(session)))
}

/// Booking-page contact lookup. Existing matches come back 200, fresh
/// records 201.
#[axum::debug_handler]
pub async fn resolve_contact(
    State(state): State<Arc<AppConfig>>,
    Json(contact): Json<ContactDetails>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let auth_service = AuthService::new(&state);

    let resolved = auth_service
        .resolve_contact(contact)
        .await
        .map_err(to_app_error)?;

    let status = if resolved.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(json!(resolved.identity))))
}

#[axum::debug_handler]
pub async fn get_user_details(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let auth_service = AuthService::new(&state);

    let identity = auth_service.get_identity(id).await.map_err(to_app_error)?;

    Ok(Json(json!(identity)))
}

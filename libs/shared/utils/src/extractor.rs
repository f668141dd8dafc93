use std::sync::Arc;

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    body::Body,
};
use reqwest::Method;
use serde::Deserialize;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::jwt::validate_token;

#[derive(Debug, Deserialize)]
struct IdentityRow {
    id: Uuid,
    email: Option<String>,
    full_name: Option<String>,
    #[serde(default)]
    role: Role,
}

// Middleware for authentication. A signature check alone is not enough: the
// identity behind the token is re-read from the store, so a deleted identity
// cannot keep using an old token and the stored role always wins over the
// role claim.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Extract token from headers
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Access denied. No token provided.".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    let token = &auth_value[7..];

    // Validate token
    let claimed = validate_token(token, &config.jwt_secret).map_err(AppError::Auth)?;

    // Cross-check against the live identity store
    let user = load_identity(&config, claimed.id).await?;

    // Add user to request extensions
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

async fn load_identity(config: &AppConfig, id: Uuid) -> Result<User, AppError> {
    let store = SupabaseClient::new(config);
    let path = format!("/rest/v1/identities?id=eq.{}&select=id,email,full_name,role", id);

    let rows: Vec<IdentityRow> = store
        .request(Method::GET, &path, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let row = rows.into_iter().next().ok_or_else(|| {
        AppError::Auth("User no longer exists in the system. Please register again.".to_string())
    })?;

    Ok(User {
        id: row.id,
        email: row.email,
        full_name: row.full_name,
        role: row.role,
    })
}

/// Guard for doctor-only handlers.
pub fn require_doctor(user: &User) -> Result<(), AppError> {
    if user.role.is_doctor() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied. Doctor role required.".to_string()))
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use identity_cell::IdentityError;
use shared_models::auth::Role;

/// Shared by patient and doctor sign-up. Doctor registration ignores the
/// role field and always lands on the doctor role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub age: Option<i32>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminFirewallRequest {
    pub admin_password: Option<String>,
}

/// The identity slice returned next to a fresh token.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please provide all required fields")]
    MissingFields,

    #[error("Please provide email and password")]
    MissingCredentials,

    // Same message for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Only doctors can login here")]
    NotADoctor,

    #[error("This account doesn't use password authentication")]
    PasswordlessAccount,

    #[error("User with this email already exists")]
    EmailExists,

    #[error("Invalid admin password")]
    InvalidAdminPassword,

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error("Failed to sign token: {0}")]
    TokenSigning(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

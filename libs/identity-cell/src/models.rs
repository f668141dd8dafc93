use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::supabase::StoreError;
use shared_models::auth::Role;

/// A person record. Doctors and patients share this table; walk-in patients
/// created by the booking flow start out with no usable credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub age: Option<i32>,
    pub address: Option<String>,
    // Never serialized into responses. Placeholder credentials are not valid
    // argon2 hashes, so they can never pass verification.
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub prescriptions: Vec<Uuid>,
    #[serde(default)]
    pub bookings: Vec<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial contact descriptor used to resolve a person to an identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactDetails {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub age: Option<i32>,
    pub address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub identity: Identity,
    /// True when the resolver had to create a fresh record.
    pub created: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("No user found")]
    NotFound,

    #[error("Email or phone number is required")]
    MissingContact,

    #[error("A user with this email already exists")]
    EmailTaken,

    #[error("A user with this phone number already exists")]
    PhoneTaken,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

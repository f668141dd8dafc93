use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub iat: Option<u64>,
}

/// Role assigned to an identity. Walk-in patients created by the booking flow
/// start out as `Unassigned` until a role is explicitly set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Doctor,
    // Older records stored patients under the legacy "user" label
    #[serde(alias = "user")]
    Patient,
    #[default]
    Unassigned,
}

impl Role {
    pub fn is_doctor(&self) -> bool {
        matches!(self, Role::Doctor)
    }

    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some("doctor") => Role::Doctor,
            Some("patient") | Some("user") => Role::Patient,
            _ => Role::Unassigned,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Doctor => write!(f, "doctor"),
            Role::Patient => write!(f, "patient"),
            Role::Unassigned => write!(f, "unassigned"),
        }
    }
}

/// Authenticated caller, attached to requests by the auth middleware after the
/// token has been cross-checked against the identity store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Role,
}

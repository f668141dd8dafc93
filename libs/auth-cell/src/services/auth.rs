use tracing::{debug, info};
use uuid::Uuid;

use identity_cell::models::{ContactDetails, Identity, ResolvedIdentity};
use identity_cell::{IdentityResolver, IdentityService};
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_utils::jwt::sign_token;

use crate::models::{AuthError, LoginRequest, RegisterRequest, SessionResponse, SessionUser};
use crate::services::password;

// Mirrors request-field truthiness: an empty string counts as absent.
fn provided(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub struct AuthService {
    identities: IdentityService,
    resolver: IdentityResolver,
    jwt_secret: String,
    admin_password: String,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            identities: IdentityService::new(config),
            resolver: IdentityResolver::new(config),
            jwt_secret: config.jwt_secret.clone(),
            admin_password: config.admin_password.clone(),
        }
    }

    /// Gate in front of the doctor sign-up page. An unconfigured (empty)
    /// admin password never matches.
    pub fn verify_admin_password(&self, submitted: &str) -> Result<(), AuthError> {
        if self.admin_password.is_empty() || submitted != self.admin_password {
            return Err(AuthError::InvalidAdminPassword);
        }
        Ok(())
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<SessionResponse, AuthError> {
        let role = request.role.unwrap_or(Role::Patient);
        self.register_with_role(request, role).await
    }

    /// Doctor sign-up always lands on the doctor role, whatever the payload
    /// claims.
    pub async fn register_doctor(
        &self,
        request: RegisterRequest,
    ) -> Result<SessionResponse, AuthError> {
        self.register_with_role(request, Role::Doctor).await
    }

    async fn register_with_role(
        &self,
        request: RegisterRequest,
        role: Role,
    ) -> Result<SessionResponse, AuthError> {
        let (Some(email), Some(password), Some(full_name)) = (
            provided(request.email),
            provided(request.password),
            provided(request.full_name),
        ) else {
            return Err(AuthError::MissingFields);
        };

        if self.identities.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailExists);
        }

        let hash = password::hash_password(&password)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let contact = ContactDetails {
            email: Some(email),
            phone: request.phone,
            full_name: Some(full_name),
            age: request.age,
            address: request.address,
        };
        let identity = self
            .identities
            .create_identity(&contact, role, Some(hash))
            .await?;

        info!("Registered identity {} with role {}", identity.id, role);
        self.session_for(identity)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<SessionResponse, AuthError> {
        self.login_checked(request, false).await
    }

    /// Login restricted to identities holding the doctor role. The role is
    /// checked before the password so a valid patient credential still gets
    /// the role refusal.
    pub async fn login_doctor(&self, request: LoginRequest) -> Result<SessionResponse, AuthError> {
        self.login_checked(request, true).await
    }

    async fn login_checked(
        &self,
        request: LoginRequest,
        doctors_only: bool,
    ) -> Result<SessionResponse, AuthError> {
        let (Some(email), Some(submitted)) =
            (provided(request.email), provided(request.password))
        else {
            return Err(AuthError::MissingCredentials);
        };

        let Some(identity) = self.identities.find_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if doctors_only && !identity.role.is_doctor() {
            return Err(AuthError::NotADoctor);
        }

        let Some(hash) = identity.password_hash.as_deref() else {
            return Err(AuthError::PasswordlessAccount);
        };

        if !password::verify_password(&submitted, hash) {
            return Err(AuthError::InvalidCredentials);
        }

        debug!("Login accepted for identity {}", identity.id);
        self.session_for(identity)
    }

    /// Public contact lookup used by the booking page: resolve the details
    /// to an existing identity or create one.
    pub async fn resolve_contact(
        &self,
        contact: ContactDetails,
    ) -> Result<ResolvedIdentity, AuthError> {
        Ok(self.resolver.resolve(&contact).await?)
    }

    pub async fn get_identity(&self, id: Uuid) -> Result<Identity, AuthError> {
        Ok(self.identities.get(id).await?)
    }

    fn session_for(&self, identity: Identity) -> Result<SessionResponse, AuthError> {
        let token = sign_token(
            identity.id,
            identity.email.as_deref(),
            identity.role,
            &self.jwt_secret,
        )
        .map_err(AuthError::TokenSigning)?;

        Ok(SessionResponse {
            token,
            user: SessionUser {
                id: identity.id,
                email: identity.email,
                full_name: identity.full_name,
                role: identity.role,
            },
        })
    }
}

use serde_json::{json, Map};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::Role;

use crate::models::{ContactDetails, Identity, IdentityError, ResolvedIdentity};
use crate::services::identity::IdentityService;

/// Shared dedup logic: booking and prescription flows both funnel walk-in
/// patient details through here so one person never ends up as two records.
pub struct IdentityResolver {
    identities: IdentityService,
}

impl IdentityResolver {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            identities: IdentityService::new(config),
        }
    }

    /// Resolve a contact descriptor to an identity: match by email first, then
    /// by phone, else create a walk-in patient record. Requires at least one
    /// of email or phone.
    pub async fn resolve(
        &self,
        contact: &ContactDetails,
    ) -> Result<ResolvedIdentity, IdentityError> {
        let contact = normalized(contact);

        if contact.email.is_none() && contact.phone.is_none() {
            return Err(IdentityError::MissingContact);
        }

        if let Some(existing) = self.lookup(&contact).await? {
            debug!("Resolved contact to existing identity {}", existing.id);
            let identity = self.merge_new_details(existing, &contact).await?;
            return Ok(ResolvedIdentity {
                identity,
                created: false,
            });
        }

        let identity = self
            .identities
            .create_identity(&contact, Role::Patient, Some(placeholder_credential()))
            .await?;

        Ok(ResolvedIdentity {
            identity,
            created: true,
        })
    }

    /// Prescription-flow variant: a bare name is enough to create a record,
    /// and matched identities are used as-is without merging new details.
    pub async fn find_or_create(
        &self,
        contact: &ContactDetails,
    ) -> Result<ResolvedIdentity, IdentityError> {
        let mut contact = normalized(contact);

        if let Some(existing) = self.lookup(&contact).await? {
            return Ok(ResolvedIdentity {
                identity: existing,
                created: false,
            });
        }

        if contact.full_name.is_none() {
            contact.full_name = Some("Unknown Patient".to_string());
        }

        let identity = self
            .identities
            .create_identity(&contact, Role::Patient, Some(placeholder_credential()))
            .await?;

        Ok(ResolvedIdentity {
            identity,
            created: true,
        })
    }

    // Email match takes precedence over phone match.
    async fn lookup(&self, contact: &ContactDetails) -> Result<Option<Identity>, IdentityError> {
        if let Some(email) = contact.email.as_deref() {
            if let Some(identity) = self.identities.find_by_email(email).await? {
                return Ok(Some(identity));
            }
        }

        if let Some(phone) = contact.phone.as_deref() {
            if let Some(identity) = self.identities.find_by_phone(phone).await? {
                return Ok(Some(identity));
            }
        }

        Ok(None)
    }

    // Selective merge: only fields that are provided and differ are written,
    // and email/phone only move when no other identity already owns the new
    // value. That keeps two people from collapsing into one record.
    async fn merge_new_details(
        &self,
        existing: Identity,
        contact: &ContactDetails,
    ) -> Result<Identity, IdentityError> {
        let mut update = Map::new();

        if let Some(name) = contact.full_name.as_deref() {
            if existing.full_name.as_deref() != Some(name) {
                update.insert("full_name".to_string(), json!(name));
            }
        }

        if let Some(age) = contact.age {
            if existing.age != Some(age) {
                update.insert("age".to_string(), json!(age));
            }
        }

        if let Some(address) = contact.address.as_deref() {
            if existing.address.as_deref() != Some(address) {
                update.insert("address".to_string(), json!(address));
            }
        }

        if let Some(email) = contact.email.as_deref() {
            if existing.email.as_deref() != Some(email) {
                match self.identities.find_by_email(email).await? {
                    Some(owner) if owner.id != existing.id => {
                        debug!("Email already owned by {}, skipping merge", owner.id);
                    }
                    _ => {
                        update.insert("email".to_string(), json!(email));
                    }
                }
            }
        }

        if let Some(phone) = contact.phone.as_deref() {
            if existing.phone.as_deref() != Some(phone) {
                match self.identities.find_by_phone(phone).await? {
                    Some(owner) if owner.id != existing.id => {
                        debug!("Phone already owned by {}, skipping merge", owner.id);
                    }
                    _ => {
                        update.insert("phone".to_string(), json!(phone));
                    }
                }
            }
        }

        if update.is_empty() {
            return Ok(existing);
        }

        self.identities.update_fields(existing.id, update).await
    }
}

fn normalized(contact: &ContactDetails) -> ContactDetails {
    ContactDetails {
        email: contact
            .email
            .as_deref()
            .map(IdentityService::normalize_email)
            .filter(|e| !e.is_empty()),
        phone: contact
            .phone
            .as_deref()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        full_name: contact.full_name.clone().filter(|n| !n.trim().is_empty()),
        age: contact.age,
        address: contact.address.clone(),
    }
}

/// Marker stored for identities created without registration. Not a valid
/// argon2 hash, so password verification always fails against it.
fn placeholder_credential() -> String {
    format!("unusable:{}", Uuid::new_v4())
}

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{StoreError, SupabaseClient};
use shared_models::auth::Role;

use crate::models::{ContactDetails, Identity, IdentityError};

pub struct IdentityService {
    supabase: SupabaseClient,
}

impl IdentityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Emails are stored trimmed and lowercased so lookups are case-insensitive.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, IdentityError> {
        let path = format!("/rest/v1/identities?id=eq.{}", id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Self::first_identity(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<Identity, IdentityError> {
        self.find_by_id(id).await?.ok_or(IdentityError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, IdentityError> {
        let normalized = Self::normalize_email(email);
        let path = format!(
            "/rest/v1/identities?email=eq.{}",
            urlencoding::encode(&normalized)
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Self::first_identity(rows)
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<Identity>, IdentityError> {
        let path = format!(
            "/rest/v1/identities?phone=eq.{}",
            urlencoding::encode(phone.trim())
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Self::first_identity(rows)
    }

    pub async fn create_identity(
        &self,
        contact: &ContactDetails,
        role: Role,
        password_hash: Option<String>,
    ) -> Result<Identity, IdentityError> {
        debug!(
            "Creating identity for email={:?} phone={:?}",
            contact.email, contact.phone
        );

        let payload = json!({
            "email": contact.email.as_deref().map(Self::normalize_email),
            "phone": contact.phone.as_deref().map(str::trim),
            "full_name": contact.full_name,
            "age": contact.age,
            "address": contact.address,
            "role": role.to_string(),
            "password_hash": password_hash,
            "prescriptions": [],
            "bookings": [],
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let rows: Vec<Value> = self
            .supabase
            .insert("/rest/v1/identities", payload)
            .await
            .map_err(Self::map_unique_violation)?;

        let row = rows.into_iter().next().ok_or_else(|| {
            IdentityError::ValidationError("Failed to create identity".to_string())
        })?;

        Ok(serde_json::from_value(row)?)
    }

    /// Patch only the given columns. Empty result means the id matched nothing.
    pub async fn update_fields(
        &self,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Identity, IdentityError> {
        debug!("Updating identity {}: {:?}", id, fields.keys());

        let mut update_data = fields;
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/identities?id=eq.{}", id);
        let rows: Vec<Value> = self
            .supabase
            .update(&path, Value::Object(update_data))
            .await
            .map_err(Self::map_unique_violation)?;

        let row = rows.into_iter().next().ok_or(IdentityError::NotFound)?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn list_doctors(&self) -> Result<Vec<Identity>, IdentityError> {
        let path = "/rest/v1/identities?role=eq.doctor&order=full_name.asc";
        let rows: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;

        let doctors = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Identity>, _>>()?;

        Ok(doctors)
    }

    pub async fn update_role(&self, id: Uuid, role: Role) -> Result<Identity, IdentityError> {
        let mut fields = Map::new();
        fields.insert("role".to_string(), json!(role.to_string()));
        self.update_fields(id, fields).await
    }

    /// Append a prescription reference onto a doctor record. The store has no
    /// push primitive, so this is a read-modify-write on the caller's copy.
    pub async fn append_prescription(
        &self,
        doctor: &Identity,
        prescription_id: Uuid,
    ) -> Result<(), IdentityError> {
        let mut ids = doctor.prescriptions.clone();
        ids.push(prescription_id);

        let mut fields = Map::new();
        fields.insert("prescriptions".to_string(), json!(ids));
        self.update_fields(doctor.id, fields).await?;

        Ok(())
    }

    fn map_unique_violation(err: StoreError) -> IdentityError {
        match err {
            StoreError::Conflict(msg) if msg.contains("phone") => IdentityError::PhoneTaken,
            StoreError::Conflict(_) => IdentityError::EmailTaken,
            other => IdentityError::Store(other),
        }
    }

    fn first_identity(rows: Vec<Value>) -> Result<Option<Identity>, IdentityError> {
        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }
}

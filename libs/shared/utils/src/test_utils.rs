use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub admin_password: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            admin_password: "test-admin-password".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing the store client at a wiremock server.
    pub fn with_store_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            admin_password: self.admin_password.clone(),
            port: 4000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: Role::Patient,
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, Role::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::Patient)
    }

    pub fn unassigned(email: &str) -> Self {
        Self::new(email, Role::Unassigned)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: Some(self.email.clone()),
            full_name: Some("Test User".to_string()),
            role: self.role,
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        Self::build_token(user, &user.role.to_string(), secret, exp_hours.unwrap_or(24))
    }

    /// Token with an arbitrary role claim string, for exercising legacy claims.
    pub fn create_token_with_role_claim(user: &TestUser, role_claim: &str, secret: &str) -> String {
        Self::build_token(user, role_claim, secret, 24)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::build_token(user, &user.role.to_string(), secret, -1)
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::build_token(user, &user.role.to_string(), "wrong-secret", 24)
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    fn build_token(user: &TestUser, role_claim: &str, secret: &str, exp_hours: i64) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours);

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id.to_string(),
            "email": user.email,
            "role": role_claim,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }
}

pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn identity_row(
        id: Uuid,
        email: Option<&str>,
        phone: Option<&str>,
        role: Role,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "email": email,
            "phone": phone,
            "full_name": "Test User",
            "age": 30,
            "address": "12 Clinic Road",
            "password_hash": null,
            "role": role.to_string(),
            "prescriptions": [],
            "bookings": [],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_row(id: Uuid, email: &str) -> serde_json::Value {
        Self::identity_row(id, Some(email), None, Role::Doctor)
    }

    pub fn patient_row(id: Uuid, email: &str) -> serde_json::Value {
        Self::identity_row(id, Some(email), None, Role::Patient)
    }

    pub fn booking_row(
        id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        date: &str,
        time: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "date": date,
            "time": time,
            "status": "pending",
            "issue": "",
            "patient_name": "Test User",
            "patient_email": "test@example.com",
            "patient_phone": null,
            "patient_age": null,
            "patient_address": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn prescription_row(
        id: Uuid,
        doctor_id: Uuid,
        patient_id: Uuid,
        shareable_id: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "prescription_text": "Rest and fluids",
            "medications": [
                {
                    "name": "Paracetamol",
                    "dosage": "500mg",
                    "frequency": "twice daily",
                    "duration": "5 days",
                    "instructions": "after meals"
                }
            ],
            "diagnosis": "Viral fever",
            "notes": "",
            "vitals": "",
            "complaints": "",
            "tests": "",
            "investigation": "",
            "patient_history": "",
            "treatment_plan": "",
            "physical_examiner": null,
            "booking_id": null,
            "date_issued": "2024-01-01T00:00:00Z",
            "expiry_date": null,
            "follow_up_date": null,
            "shareable_id": shareable_id,
            "payment_status": "pending",
            "payment_date": null,
            "payment_amount": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn unique_violation(constraint: &str) -> serde_json::Value {
        json!({
            "code": "23505",
            "message": format!("duplicate key value violates unique constraint \"{}\"", constraint)
        })
    }
}

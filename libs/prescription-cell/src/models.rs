use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use booking_cell::models::BookingStatus;
use identity_cell::IdentityError;
use shared_database::supabase::StoreError;

/// An issued prescription. `shareable_id` grants anonymous read access, so it
/// must stay unguessable for the lifetime of the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    #[serde(default)]
    pub prescription_text: String,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub vitals: String,
    #[serde(default)]
    pub complaints: String,
    #[serde(default)]
    pub tests: String,
    #[serde(default)]
    pub investigation: String,
    #[serde(default)]
    pub patient_history: String,
    #[serde(default)]
    pub treatment_plan: String,
    pub physical_examiner: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub date_issued: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub shareable_id: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_amount: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One medication line. Rows arriving without a name are dropped at
/// create/update time rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    #[serde(default)]
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
        }
    }
}

/// Issuance request. The patient is either referenced directly or described
/// by contact fields, which are resolved to an identity with the same dedup
/// rules the booking flow uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePrescriptionRequest {
    pub prescription_text: Option<String>,
    pub medications: Option<Vec<Medication>>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub vitals: Option<String>,
    pub complaints: Option<String>,
    pub tests: Option<String>,
    pub investigation: Option<String>,
    pub patient_history: Option<String>,
    pub treatment_plan: Option<String>,
    pub patient_id: Option<Uuid>,
    pub physical_examiner: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub payment_amount: Option<f64>,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub patient_age: Option<i32>,
    pub patient_address: Option<String>,
}

/// Full update. Doctor and patient references are never changed by an update;
/// omitted text fields reset to empty, omitted optional fields clear.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePrescriptionRequest {
    pub prescription_text: Option<String>,
    pub medications: Option<Vec<Medication>>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub vitals: Option<String>,
    pub complaints: Option<String>,
    pub tests: Option<String>,
    pub investigation: Option<String>,
    pub patient_history: Option<String>,
    pub treatment_plan: Option<String>,
    pub physical_examiner: Option<Uuid>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub payment_amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentUpdateRequest {
    pub payment_status: PaymentStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_amount: Option<f64>,
}

/// Roster row for a doctor's patient list: the patient plus their most recent
/// booking with that doctor.
#[derive(Debug, Clone, Serialize)]
pub struct PatientAppointmentSummary {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub appointment_status: BookingStatus,
}

#[derive(Error, Debug)]
pub enum PrescriptionError {
    #[error("Prescription not found")]
    NotFound,

    #[error("User not found")]
    DoctorNotFound,

    #[error("Forbidden - doctor access required")]
    NotADoctor,

    #[error("Invalid patient information")]
    MissingPatient,

    #[error("No prescriptions found for this patient")]
    NoPayments,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

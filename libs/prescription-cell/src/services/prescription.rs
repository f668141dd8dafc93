use chrono::Utc;
use rand::RngCore;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use identity_cell::models::{ContactDetails, Identity};
use identity_cell::{IdentityResolver, IdentityService};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    CreatePrescriptionRequest, Medication, PaymentStatus, PaymentUpdateRequest, Prescription,
    PrescriptionError, UpdatePrescriptionRequest,
};

/// Load the acting doctor's identity and verify it actually holds the doctor
/// role. Prescription writes are attributed to this identity, so the stored
/// role is what counts, not the token claim.
pub(crate) async fn ensure_doctor(
    identities: &IdentityService,
    doctor_id: Uuid,
) -> Result<Identity, PrescriptionError> {
    let identity = identities
        .find_by_id(doctor_id)
        .await?
        .ok_or(PrescriptionError::DoctorNotFound)?;

    if !identity.role.is_doctor() {
        return Err(PrescriptionError::NotADoctor);
    }

    Ok(identity)
}

/// 10 random bytes, hex-encoded. Unguessable for the lifetime of the record.
fn generate_shareable_id() -> String {
    let mut bytes = [0u8; 10];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Entries without a name are silently dropped, not rejected; the clinic UI
/// submits blank trailing rows.
fn filter_medications(medications: Option<Vec<Medication>>) -> Vec<Medication> {
    medications
        .unwrap_or_default()
        .into_iter()
        .filter(|m| !m.name.trim().is_empty())
        .collect()
}

pub struct PrescriptionService {
    supabase: SupabaseClient,
    identities: IdentityService,
    resolver: IdentityResolver,
}

impl PrescriptionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            identities: IdentityService::new(config),
            resolver: IdentityResolver::new(config),
        }
    }

    /// Issue a prescription on behalf of `doctor_id`. The patient is resolved
    /// through the shared dedup rules; the prescription is durably created
    /// before the doctor back-reference is appended, and a back-reference
    /// failure does not undo the issuance.
    pub async fn create_prescription(
        &self,
        doctor_id: Uuid,
        request: CreatePrescriptionRequest,
    ) -> Result<Prescription, PrescriptionError> {
        let doctor = ensure_doctor(&self.identities, doctor_id).await?;

        let patient_id = match request.patient_id {
            Some(id) => id,
            None => {
                if request.patient_name.is_none()
                    && request.patient_email.is_none()
                    && request.patient_phone.is_none()
                {
                    return Err(PrescriptionError::MissingPatient);
                }

                let contact = ContactDetails {
                    email: request.patient_email.clone(),
                    phone: request.patient_phone.clone(),
                    full_name: request.patient_name.clone(),
                    age: request.patient_age,
                    address: request.patient_address.clone(),
                };
                let resolved = self.resolver.find_or_create(&contact).await?;
                if resolved.created {
                    info!(
                        "Created patient record {} while issuing prescription",
                        resolved.identity.id
                    );
                }
                resolved.identity.id
            }
        };

        let medications = filter_medications(request.medications);
        let shareable_id = generate_shareable_id();
        let now = Utc::now().to_rfc3339();

        let payload = json!({
            "doctor_id": doctor.id,
            "patient_id": patient_id,
            "prescription_text": request.prescription_text.unwrap_or_default(),
            "medications": medications,
            "diagnosis": request.diagnosis.unwrap_or_default(),
            "notes": request.notes.unwrap_or_default(),
            "vitals": request.vitals.unwrap_or_default(),
            "complaints": request.complaints.unwrap_or_default(),
            "tests": request.tests.unwrap_or_default(),
            "investigation": request.investigation.unwrap_or_default(),
            "patient_history": request.patient_history.unwrap_or_default(),
            "treatment_plan": request.treatment_plan.unwrap_or_default(),
            "physical_examiner": request.physical_examiner,
            "booking_id": request.booking_id,
            "date_issued": now,
            "expiry_date": request.expiry_date,
            "follow_up_date": request.follow_up_date,
            "shareable_id": shareable_id,
            "payment_status": PaymentStatus::Pending.to_string(),
            "payment_date": null,
            "payment_amount": request.payment_amount,
            "created_at": now,
            "updated_at": now
        });

        let rows: Vec<Value> = self
            .supabase
            .insert("/rest/v1/prescriptions", payload)
            .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or(PrescriptionError::Store(
                shared_database::supabase::StoreError::Api {
                    status: 500,
                    message: "Insert returned no representation".to_string(),
                },
            ))?;
        let prescription: Prescription = serde_json::from_value(row)?;

        // Best-effort back-reference. The prescription is already durable and
        // reachable by id and shareable id, so a failure here is logged and
        // accepted rather than rolled back.
        if let Err(e) = self
            .identities
            .append_prescription(&doctor, prescription.id)
            .await
        {
            warn!(
                "Prescription {} created but doctor back-reference failed: {}",
                prescription.id, e
            );
        }

        info!(
            "Issued prescription {} by doctor {} for patient {}",
            prescription.id, doctor.id, patient_id
        );

        Ok(prescription)
    }

    /// Anonymous fetch by shareable token.
    pub async fn get_by_shareable_id(
        &self,
        shareable_id: &str,
    ) -> Result<Prescription, PrescriptionError> {
        let path = format!(
            "/rest/v1/prescriptions?shareable_id=eq.{}",
            urlencoding::encode(shareable_id)
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let row = rows.into_iter().next().ok_or(PrescriptionError::NotFound)?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn get_prescription(&self, id: Uuid) -> Result<Prescription, PrescriptionError> {
        let path = format!("/rest/v1/prescriptions?id=eq.{}", id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let row = rows.into_iter().next().ok_or(PrescriptionError::NotFound)?;
        Ok(serde_json::from_value(row)?)
    }

    /// A doctor's issued prescriptions, newest first.
    pub async fn list_doctor_prescriptions(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Prescription>, PrescriptionError> {
        ensure_doctor(&self.identities, doctor_id).await?;

        let path = format!(
            "/rest/v1/prescriptions?doctor_id=eq.{}&order=date_issued.desc",
            doctor_id
        );
        self.fetch_prescriptions(&path).await
    }

    /// A patient's prescriptions, newest first. No prescriptions is an empty
    /// list, not an error.
    pub async fn list_user_prescriptions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Prescription>, PrescriptionError> {
        let path = format!(
            "/rest/v1/prescriptions?patient_id=eq.{}&order=date_issued.desc",
            user_id
        );
        self.fetch_prescriptions(&path).await
    }

    /// Replace the clinical content of a prescription. Doctor and patient
    /// references and the shareable token are left untouched.
    pub async fn update_prescription(
        &self,
        doctor_id: Uuid,
        prescription_id: Uuid,
        request: UpdatePrescriptionRequest,
    ) -> Result<Prescription, PrescriptionError> {
        ensure_doctor(&self.identities, doctor_id).await?;

        let medications = filter_medications(request.medications);

        let payload = json!({
            "prescription_text": request.prescription_text.unwrap_or_default(),
            "medications": medications,
            "diagnosis": request.diagnosis.unwrap_or_default(),
            "notes": request.notes.unwrap_or_default(),
            "vitals": request.vitals.unwrap_or_default(),
            "complaints": request.complaints.unwrap_or_default(),
            "tests": request.tests.unwrap_or_default(),
            "investigation": request.investigation.unwrap_or_default(),
            "patient_history": request.patient_history.unwrap_or_default(),
            "treatment_plan": request.treatment_plan.unwrap_or_default(),
            "physical_examiner": request.physical_examiner,
            "expiry_date": request.expiry_date,
            "follow_up_date": request.follow_up_date,
            "payment_amount": request.payment_amount,
            "updated_at": Utc::now().to_rfc3339()
        });

        debug!("Updating prescription {}", prescription_id);
        self.patch_prescription(prescription_id, payload).await
    }

    /// Update payment state. When marking paid without an explicit date the
    /// payment date defaults to now; reverting to pending clears it.
    pub async fn update_payment(
        &self,
        doctor_id: Uuid,
        prescription_id: Uuid,
        request: PaymentUpdateRequest,
    ) -> Result<Prescription, PrescriptionError> {
        ensure_doctor(&self.identities, doctor_id).await?;

        let payment_date = request.payment_date.or_else(|| {
            if request.payment_status == PaymentStatus::Paid {
                Some(Utc::now())
            } else {
                None
            }
        });

        let payload = json!({
            "payment_status": request.payment_status.to_string(),
            "payment_date": payment_date,
            "payment_amount": request.payment_amount,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.patch_prescription(prescription_id, payload).await
    }

    /// All of a doctor's prescriptions for one patient, used as the payment
    /// history view. A patient with no prescriptions reports not-found.
    pub async fn list_patient_payments(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
    ) -> Result<Vec<Prescription>, PrescriptionError> {
        ensure_doctor(&self.identities, doctor_id).await?;

        let path = format!(
            "/rest/v1/prescriptions?doctor_id=eq.{}&patient_id=eq.{}",
            doctor_id, patient_id
        );
        let prescriptions = self.fetch_prescriptions(&path).await?;

        if prescriptions.is_empty() {
            return Err(PrescriptionError::NoPayments);
        }

        Ok(prescriptions)
    }

    async fn patch_prescription(
        &self,
        id: Uuid,
        payload: Value,
    ) -> Result<Prescription, PrescriptionError> {
        let path = format!("/rest/v1/prescriptions?id=eq.{}", id);
        let rows: Vec<Value> = self.supabase.update(&path, payload).await?;

        let row = rows.into_iter().next().ok_or(PrescriptionError::NotFound)?;
        Ok(serde_json::from_value(row)?)
    }

    async fn fetch_prescriptions(
        &self,
        path: &str,
    ) -> Result<Vec<Prescription>, PrescriptionError> {
        let rows: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;

        let prescriptions = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Prescription>, _>>()?;

        Ok(prescriptions)
    }
}

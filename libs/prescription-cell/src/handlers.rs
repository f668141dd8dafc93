use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use identity_cell::IdentityError;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_doctor;

use crate::models::{
    CreatePrescriptionRequest, PaymentUpdateRequest, PrescriptionError, UpdatePrescriptionRequest,
};
use crate::services::{PatientRosterService, PrescriptionService};

fn to_app_error(err: PrescriptionError) -> AppError {
    match err {
        PrescriptionError::NotFound => AppError::NotFound("Prescription not found".to_string()),
        PrescriptionError::DoctorNotFound => AppError::NotFound("User not found".to_string()),
        PrescriptionError::NotADoctor => {
            AppError::Forbidden("Forbidden - doctor access required".to_string())
        }
        PrescriptionError::MissingPatient => {
            AppError::ValidationError("Invalid patient information".to_string())
        }
        PrescriptionError::NoPayments => {
            AppError::NotFound("No prescriptions found for this patient".to_string())
        }
        PrescriptionError::Identity(IdentityError::EmailTaken) => AppError::Conflict(
            "A user with this email already exists. Please use a different email or contact support.".to_string(),
        ),
        PrescriptionError::Identity(IdentityError::PhoneTaken) => AppError::Conflict(
            "A user with this phone number already exists. Please use a different phone number or contact support.".to_string(),
        ),
        PrescriptionError::Identity(IdentityError::MissingContact) => {
            AppError::ValidationError("Invalid patient information".to_string())
        }
        PrescriptionError::Identity(IdentityError::NotFound) => {
            AppError::NotFound("No user found".to_string())
        }
        PrescriptionError::Identity(IdentityError::ValidationError(msg)) => {
            AppError::ValidationError(msg)
        }
        PrescriptionError::Identity(IdentityError::Store(e)) => AppError::Database(e.to_string()),
        PrescriptionError::Identity(IdentityError::Serialization(e)) => {
            AppError::Internal(e.to_string())
        }
        PrescriptionError::Store(e) => AppError::Database(e.to_string()),
        PrescriptionError::Serialization(e) => AppError::Internal(e.to_string()),
    }
}

/// Anonymous access by shareable token. The token is the only credential.
#[axum::debug_handler]
pub async fn share_prescription(
    State(state): State<Arc<AppConfig>>,
    Path(shareable_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let prescription_service = PrescriptionService::new(&state);

    let prescription = prescription_service
        .get_by_shareable_id(&shareable_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(prescription)))
}

#[axum::debug_handler]
pub async fn create_prescription(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_doctor(&user)?;

    let prescription_service = PrescriptionService::new(&state);

    let prescription = prescription_service
        .create_prescription(doctor_id, request)
        .await
        .map_err(to_app_error)?;

    let shareable_url = format!("/prescription/share/{}", prescription.shareable_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Prescription created successfully",
            "prescription": prescription,
            "shareable_url": shareable_url
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_prescriptions(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let prescription_service = PrescriptionService::new(&state);

    let prescriptions = prescription_service
        .list_doctor_prescriptions(doctor_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(prescriptions)))
}

#[axum::debug_handler]
pub async fn get_user_prescriptions(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let prescription_service = PrescriptionService::new(&state);

    let prescriptions = prescription_service
        .list_user_prescriptions(user_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(prescriptions)))
}

#[axum::debug_handler]
pub async fn get_single_prescription(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(prescription_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let prescription_service = PrescriptionService::new(&state);

    let prescription = prescription_service
        .get_prescription(prescription_id)
        .await
        .map_err(|e| match e {
            PrescriptionError::NotFound => {
                AppError::NotFound("Prescription not found. It may have been deleted.".to_string())
            }
            other => to_app_error(other),
        })?;

    Ok(Json(json!(prescription)))
}

#[axum::debug_handler]
pub async fn update_prescription(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((doctor_id, prescription_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdatePrescriptionRequest>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let prescription_service = PrescriptionService::new(&state);

    let prescription = prescription_service
        .update_prescription(doctor_id, prescription_id, request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "message": "Prescription updated successfully",
        "prescription": prescription
    })))
}

#[axum::debug_handler]
pub async fn update_payment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((doctor_id, prescription_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<PaymentUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let prescription_service = PrescriptionService::new(&state);

    let prescription = prescription_service
        .update_payment(doctor_id, prescription_id, request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "message": "Payment status updated successfully",
        "prescription": prescription
    })))
}

#[axum::debug_handler]
pub async fn get_patient_payments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((doctor_id, patient_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let prescription_service = PrescriptionService::new(&state);

    let prescriptions = prescription_service
        .list_patient_payments(doctor_id, patient_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(prescriptions)))
}

#[axum::debug_handler]
pub async fn get_patients_with_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let roster_service = PatientRosterService::new(&state);

    let roster = roster_service
        .patients_with_appointments(doctor_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(roster)))
}

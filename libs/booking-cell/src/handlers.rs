use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use identity_cell::IdentityError;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{BookingError, CreateBookingRequest, SlotQuery};
use crate::services::booking::BookingService;
use shared_utils::extractor::require_doctor;

fn to_app_error(err: BookingError) -> AppError {
    match err {
        BookingError::NotFound => AppError::NotFound("No booking found".to_string()),
        BookingError::NoBookings => AppError::NotFound("No bookings found".to_string()),
        BookingError::DuplicateBooking => AppError::Conflict(
            "You already have a booking with this doctor on this date and time".to_string(),
        ),
        BookingError::SlotTaken => AppError::Conflict("Slot is not available".to_string()),
        BookingError::MissingDoctor => AppError::BadRequest("Doctor ID is required".to_string()),
        BookingError::Identity(IdentityError::MissingContact) => AppError::ValidationError(
            "Email or phone number is required for booking".to_string(),
        ),
        BookingError::Identity(IdentityError::EmailTaken) => AppError::Conflict(
            "A user with this email already exists. Please use a different email or contact support.".to_string(),
        ),
        BookingError::Identity(IdentityError::PhoneTaken) => AppError::Conflict(
            "A user with this phone number already exists. Please use a different phone number or contact support.".to_string(),
        ),
        BookingError::Identity(IdentityError::NotFound) => {
            AppError::NotFound("No user found".to_string())
        }
        BookingError::Identity(IdentityError::ValidationError(msg)) => {
            AppError::ValidationError(msg)
        }
        BookingError::Identity(IdentityError::Store(e)) => AppError::Database(e.to_string()),
        BookingError::Identity(IdentityError::Serialization(e)) => {
            AppError::Internal(e.to_string())
        }
        BookingError::Store(e) => AppError::Database(e.to_string()),
        BookingError::Serialization(e) => AppError::Internal(e.to_string()),
    }
}

/// Public booking endpoint. Unauthenticated visitors book by contact details;
/// the service resolves them to an identity before the slot is checked.
#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking_service = BookingService::new(&state);

    let booking = booking_service
        .create_booking(request)
        .await
        .map_err(to_app_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Booking created successfully",
            "booking": booking
        })),
    ))
}

/// Public availability probe for the booking page. Rejects with 409 whenever
/// anyone holds the slot, regardless of patient.
#[axum::debug_handler]
pub async fn check_time_slot(
    State(state): State<Arc<AppConfig>>,
    Json(query): Json<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = query
        .doctor_id
        .ok_or_else(|| to_app_error(BookingError::MissingDoctor))?;

    let booking_service = BookingService::new(&state);

    let available = booking_service
        .slots()
        .is_available(doctor_id, query.date, &query.time)
        .await
        .map_err(to_app_error)?;

    if !available {
        return Err(to_app_error(BookingError::SlotTaken));
    }

    Ok(Json(json!({ "message": "Slot is available" })))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let booking = booking_service
        .get_booking(id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn get_user_bookings(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let bookings = booking_service
        .list_user_bookings(user_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(bookings)))
}

#[axum::debug_handler]
pub async fn get_all_bookings(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let booking_service = BookingService::new(&state);

    let bookings = booking_service
        .list_all_bookings()
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(bookings)))
}

#[axum::debug_handler]
pub async fn get_doctor_bookings(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let booking_service = BookingService::new(&state);

    let bookings = booking_service
        .list_doctor_bookings(doctor_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(bookings)))
}

#[axum::debug_handler]
pub async fn update_booking(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let booking = booking_service
        .update_booking(id, fields)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn delete_booking(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    booking_service
        .delete_booking(id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({ "message": "Booking deleted successfully." })))
}

#[axum::debug_handler]
pub async fn get_booking_id(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path((doctor_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let booking_id = booking_service
        .find_booking_id(user_id, doctor_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({ "booking_id": booking_id })))
}

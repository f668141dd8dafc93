use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use identity_cell::IdentityError;
use shared_database::supabase::StoreError;

/// A booked slot. Patient contact details are snapshotted onto the record so a
/// booking stays readable even when the identity is later enriched or merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    /// Opaque slot token ("10:00", "4:30 PM", ...). Compared verbatim, no
    /// duration semantics.
    pub time: String,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub issue: String,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub patient_age: Option<i32>,
    pub patient_address: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Scheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Scheduled => write!(f, "scheduled"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Booking request as sent by the public booking page. `patient` is set when
/// an already signed-in patient books; otherwise contact fields are used to
/// resolve (or create) the patient identity.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub date: NaiveDate,
    pub time: String,
    pub doctor: Uuid,
    pub patient: Option<Uuid>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub age: Option<i32>,
    pub address: Option<String>,
    pub issue: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub doctor_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: String,
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("No booking found")]
    NotFound,

    #[error("No bookings found")]
    NoBookings,

    /// Same patient, same (doctor, date, time). Distinct from `SlotTaken` so
    /// callers can tell a re-submission from a genuinely occupied slot.
    #[error("You already have a booking with this doctor on this date and time")]
    DuplicateBooking,

    #[error("Slot is not available")]
    SlotTaken,

    #[error("Doctor ID is required")]
    MissingDoctor,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

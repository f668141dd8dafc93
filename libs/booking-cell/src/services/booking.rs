use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use identity_cell::models::ContactDetails;
use identity_cell::IdentityResolver;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Booking, BookingError, BookingStatus, CreateBookingRequest};
use crate::services::slots::SlotChecker;

pub struct BookingService {
    supabase: SupabaseClient,
    resolver: IdentityResolver,
    slots: SlotChecker,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            resolver: IdentityResolver::new(config),
            slots: SlotChecker::new(config),
        }
    }

    /// Book a slot. Anonymous visitors are resolved to an identity by contact
    /// details; signed-in patients pass their id directly. The same patient
    /// re-submitting the same slot gets a duplicate rejection, a slot held by
    /// anyone else gets a slot-taken rejection.
    ///
    /// The existence check and the insert are two store round-trips, so two
    /// concurrent requests can both pass the check. Accepted race.
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        let patient_id = match request.patient {
            Some(id) => id,
            None => {
                let contact = ContactDetails {
                    email: request.email.clone(),
                    phone: request.phone.clone(),
                    full_name: request.full_name.clone(),
                    age: request.age,
                    address: request.address.clone(),
                };
                let resolved = self.resolver.resolve(&contact).await?;
                if resolved.created {
                    info!(
                        "Created walk-in patient {} for booking request",
                        resolved.identity.id
                    );
                }
                resolved.identity.id
            }
        };

        if let Some(holder) = self
            .slots
            .slot_holder(request.doctor, request.date, &request.time)
            .await?
        {
            if holder.patient_id == patient_id {
                return Err(BookingError::DuplicateBooking);
            }
            return Err(BookingError::SlotTaken);
        }

        let payload = json!({
            "patient_id": patient_id,
            "doctor_id": request.doctor,
            "date": request.date,
            "time": request.time.trim(),
            "status": BookingStatus::Pending.to_string(),
            "issue": request.issue.unwrap_or_default(),
            // Contact snapshot is stored as submitted, not as merged onto the
            // identity, so the booking reflects what the visitor typed.
            "patient_name": request.full_name,
            "patient_email": request.email,
            "patient_phone": request.phone,
            "patient_age": request.age,
            "patient_address": request.address,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let rows: Vec<Value> = self.supabase.insert("/rest/v1/bookings", payload).await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or(BookingError::Store(shared_database::supabase::StoreError::Api {
                status: 500,
                message: "Insert returned no representation".to_string(),
            }))?;

        let booking: Booking = serde_json::from_value(row)?;
        info!(
            "Booked slot {} {} with doctor {} for patient {}",
            booking.date, booking.time, booking.doctor_id, booking.patient_id
        );

        Ok(booking)
    }

    pub async fn get_booking(&self, id: Uuid) -> Result<Booking, BookingError> {
        let path = format!("/rest/v1/bookings?id=eq.{}", id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let row = rows.into_iter().next().ok_or(BookingError::NotFound)?;
        Ok(serde_json::from_value(row)?)
    }

    /// A patient's bookings, newest first. No bookings is an empty list, not
    /// an error.
    pub async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>, BookingError> {
        let path = format!(
            "/rest/v1/bookings?patient_id=eq.{}&order=date.desc,time.desc",
            user_id
        );
        self.fetch_bookings(&path).await
    }

    /// A doctor's bookings, newest first. An empty schedule reports not-found.
    pub async fn list_doctor_bookings(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Booking>, BookingError> {
        let path = format!(
            "/rest/v1/bookings?doctor_id=eq.{}&order=date.desc,time.desc",
            doctor_id
        );
        let bookings = self.fetch_bookings(&path).await?;

        if bookings.is_empty() {
            return Err(BookingError::NoBookings);
        }

        Ok(bookings)
    }

    pub async fn list_all_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        self.fetch_bookings("/rest/v1/bookings?order=date.desc,time.desc")
            .await
    }

    /// Arbitrary field patch. Identifier and creation columns are not
    /// patchable; everything else is written as given.
    pub async fn update_booking(
        &self,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Booking, BookingError> {
        let mut update_data = fields;
        update_data.remove("id");
        update_data.remove("created_at");
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        debug!("Updating booking {}: {:?}", id, update_data.keys());

        let path = format!("/rest/v1/bookings?id=eq.{}", id);
        let rows: Vec<Value> = self
            .supabase
            .update(&path, Value::Object(update_data))
            .await?;

        let row = rows.into_iter().next().ok_or(BookingError::NotFound)?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn delete_booking(&self, id: Uuid) -> Result<(), BookingError> {
        let path = format!("/rest/v1/bookings?id=eq.{}", id);
        let rows: Vec<Value> = self.supabase.delete(&path).await?;

        if rows.is_empty() {
            return Err(BookingError::NotFound);
        }

        info!("Deleted booking {}", id);
        Ok(())
    }

    /// Booking id for a (patient, doctor) pair, used by the prescription page
    /// to link a prescription back to the visit.
    pub async fn find_booking_id(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<Uuid, BookingError> {
        let path = format!(
            "/rest/v1/bookings?patient_id=eq.{}&doctor_id=eq.{}",
            patient_id, doctor_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let row = rows.into_iter().next().ok_or(BookingError::NotFound)?;
        let booking: Booking = serde_json::from_value(row)?;
        Ok(booking.id)
    }

    pub fn slots(&self) -> &SlotChecker {
        &self.slots
    }

    async fn fetch_bookings(&self, path: &str) -> Result<Vec<Booking>, BookingError> {
        let rows: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;

        let bookings = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Booking>, _>>()?;

        Ok(bookings)
    }
}

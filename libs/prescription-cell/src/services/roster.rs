use std::collections::{HashMap, HashSet};

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use booking_cell::models::Booking;
use identity_cell::IdentityService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{PatientAppointmentSummary, PrescriptionError};
use crate::services::prescription::ensure_doctor;

#[derive(Debug, Deserialize)]
struct RosterIdentityRow {
    id: Uuid,
    full_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

/// Builds a doctor's patient roster out of their bookings.
pub struct PatientRosterService {
    supabase: SupabaseClient,
    identities: IdentityService,
}

impl PatientRosterService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            identities: IdentityService::new(config),
        }
    }

    /// Unique patients who have booked with the doctor, each carrying their
    /// most recent booking's date, time and status. No bookings means an
    /// empty roster, not an error.
    pub async fn patients_with_appointments(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<PatientAppointmentSummary>, PrescriptionError> {
        ensure_doctor(&self.identities, doctor_id).await?;

        let path = format!(
            "/rest/v1/bookings?doctor_id=eq.{}&order=date.desc",
            doctor_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let bookings = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Booking>, serde_json::Error>>()?;

        if bookings.is_empty() {
            return Ok(Vec::new());
        }

        // Date-descending order means the first booking seen per patient is
        // their latest one.
        let mut seen = HashSet::new();
        let mut latest: Vec<&Booking> = Vec::new();
        for booking in &bookings {
            if seen.insert(booking.patient_id) {
                latest.push(booking);
            }
        }

        let patients = self.fetch_patients(&latest).await?;

        let roster = latest
            .into_iter()
            .filter_map(|booking| {
                let Some(patient) = patients.get(&booking.patient_id) else {
                    warn!(
                        "Booking {} references missing patient {}",
                        booking.id, booking.patient_id
                    );
                    return None;
                };
                Some(PatientAppointmentSummary {
                    id: patient.id,
                    full_name: patient.full_name.clone(),
                    email: patient.email.clone(),
                    phone: patient.phone.clone(),
                    appointment_date: booking.date,
                    appointment_time: booking.time.clone(),
                    appointment_status: booking.status,
                })
            })
            .collect();

        Ok(roster)
    }

    async fn fetch_patients(
        &self,
        bookings: &[&Booking],
    ) -> Result<HashMap<Uuid, RosterIdentityRow>, PrescriptionError> {
        let ids = bookings
            .iter()
            .map(|b| b.patient_id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let path = format!(
            "/rest/v1/identities?id=in.({})&select=id,full_name,email,phone",
            ids
        );
        let rows: Vec<RosterIdentityRow> =
            self.supabase.request(Method::GET, &path, None).await?;

        Ok(rows.into_iter().map(|row| (row.id, row)).collect())
    }
}

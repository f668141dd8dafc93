use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Booking, BookingError};

/// Exact-match slot occupancy checks. A slot is the (doctor, date, time)
/// tuple; time tokens are compared verbatim with no interval logic.
pub struct SlotChecker {
    supabase: SupabaseClient,
}

impl SlotChecker {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Current holder of a slot, if any, regardless of which patient holds it.
    pub async fn slot_holder(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: &str,
    ) -> Result<Option<Booking>, BookingError> {
        let path = format!(
            "/rest/v1/bookings?doctor_id=eq.{}&date=eq.{}&time=eq.{}",
            doctor_id,
            date,
            urlencoding::encode(time.trim())
        );

        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    pub async fn is_available(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: &str,
    ) -> Result<bool, BookingError> {
        Ok(self.slot_holder(doctor_id, date, time).await?.is_none())
    }
}

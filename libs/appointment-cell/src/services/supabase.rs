use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseError, SupabaseClient};

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus, BlockingAppointment, TimeBlock,
};
use crate::services::conflict::{is_block_free, search_dates};
use crate::services::store::{AppointmentChanges, AppointmentStore, NewAppointment};

const BLOCKING_SELECT: &str =
    "id,appointment_date,appointment_time,appointment_types(duration_minutes,buffer_before_min,buffer_after_min)";

#[derive(Debug, Deserialize)]
struct TypeTiming {
    duration_minutes: i32,
    buffer_before_min: i32,
    buffer_after_min: i32,
}

#[derive(Debug, Deserialize)]
struct BlockingRow {
    id: Uuid,
    appointment_date: NaiveDate,
    appointment_time: NaiveTime,
    appointment_types: TypeTiming,
}

impl From<BlockingRow> for BlockingAppointment {
    fn from(row: BlockingRow) -> Self {
        BlockingAppointment {
            appointment_id: row.id,
            starts_at: row.appointment_date.and_time(row.appointment_time),
            duration_minutes: row.appointment_types.duration_minutes,
            buffer_before_min: row.appointment_types.buffer_before_min,
            buffer_after_min: row.appointment_types.buffer_after_min,
        }
    }
}

/// Appointment store backed by the PostgREST `appointments` table.
///
/// The table must carry an exclusion constraint over the occupied block of
/// non-cancelled rows per (provider_id, location_id); PostgREST reports a
/// violation as 409, which surfaces here as `SlotNoLongerAvailable`.
pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn list_blocking_appointments(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<BlockingAppointment>, AppointmentError> {
        debug!(
            "Fetching blocking appointments for provider {} at {} from {} to {}",
            provider_id, location_id, from_date, to_date
        );

        let path = format!(
            "/rest/v1/appointments?provider_id=eq.{}&location_id=eq.{}&appointment_date=gte.{}&appointment_date=lte.{}&status=neq.cancelled&select={}",
            provider_id, location_id, from_date, to_date, BLOCKING_SELECT
        );
        let rows: Vec<BlockingRow> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(rows.into_iter().map(BlockingAppointment::from).collect())
    }

    async fn insert_if_free(
        &self,
        appointment: NewAppointment,
        block: TimeBlock,
    ) -> Result<Appointment, AppointmentError> {
        let (from_date, to_date) = search_dates(&block);
        let existing = self
            .list_blocking_appointments(appointment.provider_id, appointment.location_id, from_date, to_date)
            .await?;
        if !is_block_free(&block, &existing) {
            return Err(AppointmentError::SlotNoLongerAvailable);
        }

        let now = Utc::now().to_rfc3339();
        let row = json!({
            "patient_id": appointment.patient_id,
            "provider_id": appointment.provider_id,
            "location_id": appointment.location_id,
            "appointment_type_id": appointment.appointment_type_id,
            "appointment_date": appointment.appointment_date,
            "appointment_time": appointment.appointment_time.format("%H:%M:%S").to_string(),
            "status": AppointmentStatus::Scheduled,
            "notes": appointment.notes,
            "created_at": now,
            "updated_at": now,
        });

        let mut created: Vec<Appointment> = self
            .supabase
            .write_returning(Method::POST, "/rest/v1/appointments", row)
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => AppointmentError::SlotNoLongerAvailable,
                other => other.into(),
            })?;

        if created.is_empty() {
            return Err(AppointmentError::DatabaseError("Failed to create appointment".to_string()));
        }

        let created = created.swap_remove(0);
        info!("Appointment {} stored", created.id);
        Ok(created)
    }

    async fn update_if_free(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        changes: AppointmentChanges,
        block: Option<TimeBlock>,
    ) -> Result<Appointment, AppointmentError> {
        if let Some(block) = block {
            let current = self.get_appointment(appointment_id).await?;
            let (from_date, to_date) = search_dates(&block);
            let existing: Vec<BlockingAppointment> = self
                .list_blocking_appointments(current.provider_id, current.location_id, from_date, to_date)
                .await?
                .into_iter()
                .filter(|appointment| appointment.appointment_id != appointment_id)
                .collect();
            if !is_block_free(&block, &existing) {
                return Err(AppointmentError::SlotNoLongerAvailable);
            }
        }

        let path = format!("/rest/v1/appointments?id=eq.{}&status=eq.{}", appointment_id, expected);
        let body = json!({
            "appointment_date": changes.appointment_date,
            "appointment_time": changes.appointment_time.format("%H:%M:%S").to_string(),
            "notes": changes.notes,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let mut updated: Vec<Appointment> = self
            .supabase
            .write_returning(Method::PATCH, &path, body)
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => AppointmentError::SlotNoLongerAvailable,
                other => other.into(),
            })?;

        if updated.is_empty() {
            let current = self.get_appointment(appointment_id).await?;
            warn!("Appointment {} is {} not {}", appointment_id, current.status, expected);
            return Err(AppointmentError::InvalidStatusTransition(current.status));
        }

        let updated = updated.swap_remove(0);
        info!("Appointment {} updated", updated.id);
        Ok(updated)
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;

        if rows.is_empty() {
            return Err(AppointmentError::NotFound);
        }
        Ok(rows.swap_remove(0))
    }

    async fn search_appointments(
        &self,
        query: &AppointmentSearchQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut query_parts = Vec::new();

        if let Some(patient_id) = query.patient_id {
            query_parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(provider_id) = query.provider_id {
            query_parts.push(format!("provider_id=eq.{}", provider_id));
        }
        if let Some(location_id) = query.location_id {
            query_parts.push(format!("location_id=eq.{}", location_id));
        }
        if let Some(status) = query.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(from_date) = query.from_date {
            query_parts.push(format!("appointment_date=gte.{}", from_date));
        }
        if let Some(before_date) = query.before_date {
            query_parts.push(format!("appointment_date=lt.{}", before_date));
        }

        let path = if query_parts.is_empty() {
            "/rest/v1/appointments".to_string()
        } else {
            format!("/rest/v1/appointments?{}", query_parts.join("&"))
        };

        Ok(self.supabase.request(Method::GET, &path, None).await?)
    }

    async fn update_status(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&status=eq.{}", appointment_id, expected);
        let body = json!({
            "status": new_status,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let mut updated: Vec<Appointment> = self.supabase.write_returning(Method::PATCH, &path, body).await?;

        if updated.is_empty() {
            // Either the row is gone or another request moved it first.
            let current = self.get_appointment(appointment_id).await?;
            warn!("Appointment {} is {} not {}", appointment_id, current.status, expected);
            return Err(AppointmentError::InvalidStatusTransition(current.status));
        }

        Ok(updated.swap_remove(0))
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use provider_cell::services::ProviderDirectory;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus, BlockingAppointment, TimeBlock,
};
use crate::services::conflict::{is_block_free, search_dates};
use crate::services::store::{AppointmentChanges, AppointmentStore, NewAppointment};

/// Process-local appointment store. Appointment types are resolved through the
/// directory so each appointment blocks with its own type's buffers.
pub struct InMemoryAppointmentStore {
    directory: Arc<dyn ProviderDirectory>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new(directory: Arc<dyn ProviderDirectory>) -> Self {
        Self {
            directory,
            appointments: RwLock::new(HashMap::new()),
        }
    }

    async fn to_blocking(&self, rows: Vec<Appointment>) -> Result<Vec<BlockingAppointment>, AppointmentError> {
        let mut blocking = Vec::with_capacity(rows.len());
        for row in rows {
            let appointment_type = self.directory.get_appointment_type(row.appointment_type_id).await?;
            blocking.push(BlockingAppointment {
                appointment_id: row.id,
                starts_at: row.starts_at(),
                duration_minutes: appointment_type.duration_minutes,
                buffer_before_min: appointment_type.buffer_before_min,
                buffer_after_min: appointment_type.buffer_after_min,
            });
        }
        Ok(blocking)
    }
}

fn blocking_rows(
    appointments: &HashMap<Uuid, Appointment>,
    provider_id: Uuid,
    location_id: Uuid,
    (from_date, to_date): (NaiveDate, NaiveDate),
) -> Vec<Appointment> {
    appointments
        .values()
        .filter(|appointment| {
            appointment.provider_id == provider_id
                && appointment.location_id == location_id
                && appointment.appointment_date >= from_date
                && appointment.appointment_date <= to_date
                && appointment.status.is_blocking()
        })
        .cloned()
        .collect()
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn list_blocking_appointments(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<BlockingAppointment>, AppointmentError> {
        debug!(
            "Listing blocking appointments for provider {} at {} from {} to {}",
            provider_id, location_id, from_date, to_date
        );

        let rows = blocking_rows(
            &*self.appointments.read().await,
            provider_id,
            location_id,
            (from_date, to_date),
        );
        self.to_blocking(rows).await
    }

    async fn insert_if_free(
        &self,
        appointment: NewAppointment,
        block: TimeBlock,
    ) -> Result<Appointment, AppointmentError> {
        // Held across the check and the insert so concurrent bookings serialize.
        let mut appointments = self.appointments.write().await;

        let rows = blocking_rows(
            &appointments,
            appointment.provider_id,
            appointment.location_id,
            search_dates(&block),
        );
        let existing = self.to_blocking(rows).await?;

        if !is_block_free(&block, &existing) {
            return Err(AppointmentError::SlotNoLongerAvailable);
        }

        let now = Utc::now();
        let created = Appointment {
            id: Uuid::new_v4(),
            patient_id: appointment.patient_id,
            provider_id: appointment.provider_id,
            location_id: appointment.location_id,
            appointment_type_id: appointment.appointment_type_id,
            appointment_date: appointment.appointment_date,
            appointment_time: appointment.appointment_time,
            status: AppointmentStatus::Scheduled,
            notes: appointment.notes,
            created_at: now,
            updated_at: now,
        };
        appointments.insert(created.id, created.clone());

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
        let mut appointments = self.appointments.write().await;

        let current = appointments
            .get(&appointment_id)
            .ok_or(AppointmentError::NotFound)?;
        if current.status != expected {
            return Err(AppointmentError::InvalidStatusTransition(current.status));
        }

        if let Some(block) = block {
            let rows: Vec<Appointment> = blocking_rows(
                &appointments,
                current.provider_id,
                current.location_id,
                search_dates(&block),
            )
            .into_iter()
            .filter(|row| row.id != appointment_id)
            .collect();
            let existing = self.to_blocking(rows).await?;

            if !is_block_free(&block, &existing) {
                return Err(AppointmentError::SlotNoLongerAvailable);
            }
        }

        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(AppointmentError::NotFound)?;
        appointment.appointment_date = changes.appointment_date;
        appointment.appointment_time = changes.appointment_time;
        appointment.notes = changes.notes;
        appointment.updated_at = Utc::now();

        info!("Appointment {} updated", appointment_id);
        Ok(appointment.clone())
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.appointments
            .read()
            .await
            .get(&appointment_id)
            .cloned()
            .ok_or(AppointmentError::NotFound)
    }

    async fn search_appointments(
        &self,
        query: &AppointmentSearchQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self
            .appointments
            .read()
            .await
            .values()
            .filter(|appointment| query.matches(appointment))
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(AppointmentError::NotFound)?;

        if appointment.status != expected {
            return Err(AppointmentError::InvalidStatusTransition(appointment.status));
        }

        appointment.status = new_status;
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }
}

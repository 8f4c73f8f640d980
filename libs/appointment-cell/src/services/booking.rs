// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use provider_cell::models::{weekday_index, weekday_name, AppointmentType};
use provider_cell::services::ProviderDirectory;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus, BookAppointmentRequest,
    UpdateAppointmentRequest,
};
use crate::services::conflict::{occupied_block, ConflictCheckResponse, ConflictDetectionService};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::store::{AppointmentChanges, AppointmentStore, NewAppointment};

pub struct AppointmentBookingService {
    directory: Arc<dyn ProviderDirectory>,
    store: Arc<dyn AppointmentStore>,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(directory: Arc<dyn ProviderDirectory>, store: Arc<dyn AppointmentStore>) -> Self {
        Self {
            conflict_service: ConflictDetectionService::new(store.clone()),
            lifecycle_service: AppointmentLifecycleService::new(),
            directory,
            store,
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn ensure_not_past(date: NaiveDate) -> Result<(), AppointmentError> {
        if date < Self::today() {
            return Err(AppointmentError::ValidationError(
                "Appointment date cannot be in the past".to_string(),
            ));
        }
        Ok(())
    }

    /// The whole buffered block must sit inside the day's working hours,
    /// the same window the slot engine walks.
    async fn ensure_within_working_hours(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        starts_at: NaiveDateTime,
        appointment_type: &AppointmentType,
    ) -> Result<(), AppointmentError> {
        let date = starts_at.date();
        let weekday = weekday_index(date);
        let block = occupied_block(starts_at, appointment_type);

        let within = self
            .directory
            .find_working_hours(provider_id, location_id, weekday)
            .await?
            .is_some_and(|hours| block.start >= date.and_time(hours.start) && block.end <= date.and_time(hours.end));

        if !within {
            debug!(
                "Block {}-{} outside working hours for provider {} on {}",
                block.start, block.end, provider_id, weekday_name(weekday)
            );
            return Err(AppointmentError::ValidationError(
                "Appointment time is outside the provider's working hours".to_string(),
            ));
        }
        Ok(())
    }

    // ==============================================================================
    // BOOKING
    // ==============================================================================

    /// Book a slot previously offered by the slot engine.
    ///
    /// The offered slot may be stale, so the calendar is checked again and the
    /// store re-checks atomically while persisting.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Booking appointment for patient {} with provider {} on {} at {}",
            request.patient_id, request.provider_id, request.appointment_date, request.appointment_time
        );

        let appointment_type = self.directory.get_appointment_type(request.appointment_type_id).await?;
        self.directory.get_provider(request.provider_id).await?;
        self.directory.get_location(request.location_id).await?;

        if !self
            .directory
            .provider_serves_location(request.provider_id, request.location_id)
            .await?
        {
            return Err(AppointmentError::ProviderLocationMismatch);
        }

        Self::ensure_not_past(request.appointment_date)?;

        let starts_at = request.appointment_date.and_time(request.appointment_time);
        self.ensure_within_working_hours(request.provider_id, request.location_id, starts_at, &appointment_type)
            .await?;

        let conflict_check = self
            .conflict_service
            .check_conflicts(request.provider_id, request.location_id, starts_at, &appointment_type, None)
            .await?;
        if conflict_check.has_conflict {
            return Err(AppointmentError::SlotNoLongerAvailable);
        }

        let new_appointment = NewAppointment {
            patient_id: request.patient_id,
            provider_id: request.provider_id,
            location_id: request.location_id,
            appointment_type_id: request.appointment_type_id,
            appointment_date: request.appointment_date,
            appointment_time: request.appointment_time,
            notes: request.notes,
        };

        let appointment = self
            .store
            .insert_if_free(new_appointment, occupied_block(starts_at, &appointment_type))
            .await
            .inspect_err(|e| {
                if matches!(e, AppointmentError::SlotNoLongerAvailable) {
                    warn!("Slot at {} taken by a concurrent booking", starts_at);
                }
            })?;

        info!("Appointment {} booked for patient {}", appointment.id, appointment.patient_id);
        Ok(appointment)
    }

    pub async fn check_conflicts(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        appointment_type_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        let appointment_type = self.directory.get_appointment_type(appointment_type_id).await?;

        self.conflict_service
            .check_conflicts(provider_id, location_id, date.and_time(time), &appointment_type, None)
            .await
    }

    /// Move an appointment and/or replace its notes.
    ///
    /// A new date or time goes through the same checks as a booking, with the
    /// appointment's own block left out of the conflict search.
    pub async fn update_appointment(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.store.get_appointment(appointment_id).await?;

        if self.lifecycle_service.is_terminal(&current.status) {
            warn!("Edit attempted on {} appointment {}", current.status, appointment_id);
            return Err(AppointmentError::InvalidStatusTransition(current.status));
        }

        let appointment_date = request.appointment_date.unwrap_or(current.appointment_date);
        let appointment_time = request.appointment_time.unwrap_or(current.appointment_time);
        let starts_at = appointment_date.and_time(appointment_time);

        let block = if starts_at != current.starts_at() {
            Self::ensure_not_past(appointment_date)?;

            let appointment_type = self.directory.get_appointment_type(current.appointment_type_id).await?;
            self.ensure_within_working_hours(current.provider_id, current.location_id, starts_at, &appointment_type)
                .await?;

            let conflict_check = self
                .conflict_service
                .check_conflicts(
                    current.provider_id,
                    current.location_id,
                    starts_at,
                    &appointment_type,
                    Some(appointment_id),
                )
                .await?;
            if conflict_check.has_conflict {
                return Err(AppointmentError::SlotNoLongerAvailable);
            }

            Some(occupied_block(starts_at, &appointment_type))
        } else {
            None
        };

        let changes = AppointmentChanges {
            appointment_date,
            appointment_time,
            notes: request.notes.or(current.notes),
        };

        let updated = self
            .store
            .update_if_free(appointment_id, current.status, changes, block)
            .await?;

        info!("Appointment {} now at {}", updated.id, updated.starts_at());
        Ok(updated)
    }

    // ==============================================================================
    // RETRIEVAL
    // ==============================================================================

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store.get_appointment(appointment_id).await
    }

    /// Filtered listing, newest first
    pub async fn search_appointments(
        &self,
        query: AppointmentSearchQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut appointments = self.store.search_appointments(&query).await?;
        appointments.sort_by(|a, b| b.starts_at().cmp(&a.starts_at()));
        Ok(appointments)
    }

    /// Scheduled appointments from today on, soonest first
    pub async fn get_upcoming_appointments(
        &self,
        patient_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let query = AppointmentSearchQuery {
            patient_id,
            status: Some(AppointmentStatus::Scheduled),
            from_date: Some(Self::today()),
            ..Default::default()
        };

        let mut appointments = self.store.search_appointments(&query).await?;
        appointments.sort_by_key(|appointment| appointment.starts_at());
        Ok(appointments)
    }

    /// Appointments dated before today regardless of status, most recent first
    pub async fn get_past_appointments(
        &self,
        patient_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.search_appointments(AppointmentSearchQuery {
            patient_id,
            before_date: Some(Self::today()),
            ..Default::default()
        })
        .await
    }

    // ==============================================================================
    // STATUS TRANSITIONS
    // ==============================================================================

    pub async fn cancel_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::Cancelled).await
    }

    pub async fn complete_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::Completed).await
    }

    async fn transition(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.store.get_appointment(appointment_id).await?;

        self.lifecycle_service
            .validate_status_transition(&current.status, &new_status)?;

        let updated = self
            .store
            .update_status(appointment_id, current.status, new_status)
            .await?;

        info!("Appointment {} moved from {} to {}", appointment_id, current.status, updated.status);
        Ok(updated)
    }
}

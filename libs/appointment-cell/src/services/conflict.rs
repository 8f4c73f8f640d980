use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use provider_cell::models::AppointmentType;

use crate::models::{AppointmentError, BlockingAppointment, TimeBlock};
use crate::services::store::AppointmentStore;

/// Span an appointment of `appointment_type` starting at `starts_at` reserves,
/// buffers included.
pub fn occupied_block(starts_at: NaiveDateTime, appointment_type: &AppointmentType) -> TimeBlock {
    TimeBlock {
        start: starts_at - appointment_type.buffer_before(),
        end: starts_at + appointment_type.duration() + appointment_type.buffer_after(),
    }
}

/// Appointment dates that can hold something overlapping `block`.
///
/// Buffers let a block spill past midnight in either direction, so the days
/// either side are searched too.
pub fn search_dates(block: &TimeBlock) -> (NaiveDate, NaiveDate) {
    (
        block.start.date() - Duration::days(1),
        block.end.date() + Duration::days(1),
    )
}

pub fn conflicting_appointments<'a>(
    block: &TimeBlock,
    existing: &'a [BlockingAppointment],
) -> Vec<&'a BlockingAppointment> {
    existing
        .iter()
        .filter(|appointment| block.overlaps(&appointment.occupied_block()))
        .collect()
}

pub fn is_block_free(block: &TimeBlock, existing: &[BlockingAppointment]) -> bool {
    !existing
        .iter()
        .any(|appointment| block.overlaps(&appointment.occupied_block()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicting_appointment_ids: Vec<Uuid>,
}

pub struct ConflictDetectionService {
    store: Arc<dyn AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Check whether an appointment of `appointment_type` at `starts_at` would
    /// collide with the provider's current calendar at that location.
    /// `exclude` leaves one appointment out, for edits of an existing booking.
    pub async fn check_conflicts(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        starts_at: NaiveDateTime,
        appointment_type: &AppointmentType,
        exclude: Option<Uuid>,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        debug!("Checking conflicts for provider {} at {} from {}", provider_id, location_id, starts_at);

        let block = occupied_block(starts_at, appointment_type);
        let (from_date, to_date) = search_dates(&block);

        let existing: Vec<BlockingAppointment> = self
            .store
            .list_blocking_appointments(provider_id, location_id, from_date, to_date)
            .await?
            .into_iter()
            .filter(|appointment| Some(appointment.appointment_id) != exclude)
            .collect();

        let conflicting_appointment_ids: Vec<Uuid> = conflicting_appointments(&block, &existing)
            .into_iter()
            .map(|appointment| appointment.appointment_id)
            .collect();

        let has_conflict = !conflicting_appointment_ids.is_empty();
        if has_conflict {
            warn!(
                "Conflict detected for provider {} - {} conflicting appointments",
                provider_id,
                conflicting_appointment_ids.len()
            );
        }

        Ok(ConflictCheckResponse {
            has_conflict,
            conflicting_appointment_ids,
        })
    }
}

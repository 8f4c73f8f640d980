use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus, BlockingAppointment, TimeBlock,
};

/// Fields of an appointment that is about to be persisted.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub appointment_type_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub notes: Option<String>,
}

/// Resolved values written by an edit; every field replaces the stored one.
#[derive(Debug, Clone)]
pub struct AppointmentChanges {
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub notes: Option<String>,
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Non-cancelled appointments for a provider at a location dated
    /// `from_date..=to_date`.
    async fn list_blocking_appointments(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<BlockingAppointment>, AppointmentError>;

    /// Persists `appointment` as `scheduled` unless `block` overlaps a blocking
    /// appointment. Check and write happen atomically; the loser of a race gets
    /// `SlotNoLongerAvailable`.
    async fn insert_if_free(
        &self,
        appointment: NewAppointment,
        block: TimeBlock,
    ) -> Result<Appointment, AppointmentError>;

    /// Applies `changes` while the row is still `expected`. With a `block`, the
    /// write only happens if no other blocking appointment overlaps it; the
    /// appointment being edited never conflicts with itself.
    async fn update_if_free(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        changes: AppointmentChanges,
        block: Option<TimeBlock>,
    ) -> Result<Appointment, AppointmentError>;

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError>;

    async fn search_appointments(
        &self,
        query: &AppointmentSearchQuery,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    /// Compare-and-set on the status column. Fails with
    /// `InvalidStatusTransition(current)` when the row is no longer `expected`.
    async fn update_status(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError>;
}

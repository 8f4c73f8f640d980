use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::models::{AppointmentType, Location, Provider, ProviderError, WorkingHours};

/// Read side of providers, locations, appointment types and weekly working hours.
///
/// The slot engine only ever calls `find_working_hours` and the lookup
/// methods; writes go through [`crate::services::ScheduleService`].
#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    async fn get_provider(&self, provider_id: Uuid) -> Result<Provider, ProviderError>;

    async fn list_providers(&self) -> Result<Vec<Provider>, ProviderError>;

    async fn provider_locations(&self, provider_id: Uuid) -> Result<Vec<Location>, ProviderError>;

    async fn get_location(&self, location_id: Uuid) -> Result<Location, ProviderError>;

    async fn list_locations(&self) -> Result<Vec<Location>, ProviderError>;

    async fn get_appointment_type(&self, type_id: Uuid) -> Result<AppointmentType, ProviderError>;

    async fn list_appointment_types(&self, bookable_only: bool) -> Result<Vec<AppointmentType>, ProviderError>;

    async fn provider_serves_location(&self, provider_id: Uuid, location_id: Uuid) -> Result<bool, ProviderError>;

    /// Active working hours for (provider, location, weekday), if any.
    async fn find_working_hours(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        weekday: u8,
    ) -> Result<Option<WorkingHours>, ProviderError>;

    async fn list_working_hours(&self, provider_id: Uuid) -> Result<Vec<WorkingHours>, ProviderError>;

    /// Persists a row. Implementations reject a second active row for the
    /// same (provider, location, weekday) with `DuplicateActiveSchedule`.
    async fn insert_working_hours(&self, hours: WorkingHours) -> Result<WorkingHours, ProviderError>;
}

/// Picks the row consulted for a weekday out of whatever active rows a store returned.
///
/// Stores written through this crate never hold more than one, but rows
/// imported from elsewhere might; the most recently updated one wins, ties
/// broken by the greater id.
pub fn select_active_schedule(rows: Vec<WorkingHours>) -> Option<WorkingHours> {
    let active: Vec<WorkingHours> = rows.into_iter().filter(|row| row.is_active).collect();

    if active.len() > 1 {
        let first = &active[0];
        warn!(
            "{} active schedules for provider {} at location {} on {}; using the most recently updated",
            active.len(),
            first.provider_id,
            first.location_id,
            first.weekday_name()
        );
    }

    active
        .into_iter()
        .max_by(|a, b| a.updated_at.cmp(&b.updated_at).then_with(|| a.id.cmp(&b.id)))
}

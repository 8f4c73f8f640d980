use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseError, SupabaseClient};

use crate::models::{weekday_name, AppointmentType, Location, Provider, ProviderError, WorkingHours};
use crate::services::directory::{select_active_schedule, ProviderDirectory};

#[derive(Debug, Deserialize)]
struct LocationLink {
    locations: Location,
}

/// Directory backed by PostgREST tables `providers`, `locations`,
/// `provider_locations`, `appointment_types` and `provider_schedules`.
///
/// `provider_schedules` is expected to carry a partial unique index on
/// `(provider_id, location_id, weekday) WHERE is_active`.
pub struct SupabaseProviderDirectory {
    supabase: SupabaseClient,
}

impl SupabaseProviderDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn fetch_one<T>(&self, path: &str, missing: ProviderError) -> Result<T, ProviderError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut rows: Vec<T> = self.supabase.request(Method::GET, path, None).await?;
        if rows.is_empty() {
            return Err(missing);
        }
        Ok(rows.swap_remove(0))
    }
}

#[async_trait]
impl ProviderDirectory for SupabaseProviderDirectory {
    async fn get_provider(&self, provider_id: Uuid) -> Result<Provider, ProviderError> {
        let path = format!("/rest/v1/providers?id=eq.{}", provider_id);
        self.fetch_one(&path, ProviderError::ProviderNotFound).await
    }

    async fn list_providers(&self) -> Result<Vec<Provider>, ProviderError> {
        Ok(self
            .supabase
            .request(Method::GET, "/rest/v1/providers?order=name.asc", None)
            .await?)
    }

    async fn provider_locations(&self, provider_id: Uuid) -> Result<Vec<Location>, ProviderError> {
        let path = format!(
            "/rest/v1/provider_locations?provider_id=eq.{}&select=locations(*)",
            provider_id
        );
        let links: Vec<LocationLink> = self.supabase.request(Method::GET, &path, None).await?;

        let mut locations: Vec<Location> = links.into_iter().map(|link| link.locations).collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn get_location(&self, location_id: Uuid) -> Result<Location, ProviderError> {
        let path = format!("/rest/v1/locations?id=eq.{}", location_id);
        self.fetch_one(&path, ProviderError::LocationNotFound).await
    }

    async fn list_locations(&self) -> Result<Vec<Location>, ProviderError> {
        Ok(self
            .supabase
            .request(Method::GET, "/rest/v1/locations?order=name.asc", None)
            .await?)
    }

    async fn get_appointment_type(&self, type_id: Uuid) -> Result<AppointmentType, ProviderError> {
        let path = format!("/rest/v1/appointment_types?id=eq.{}", type_id);
        self.fetch_one(&path, ProviderError::AppointmentTypeNotFound).await
    }

    async fn list_appointment_types(&self, bookable_only: bool) -> Result<Vec<AppointmentType>, ProviderError> {
        let path = if bookable_only {
            "/rest/v1/appointment_types?allow_patient_booking=eq.true&order=name.asc"
        } else {
            "/rest/v1/appointment_types?order=name.asc"
        };
        Ok(self.supabase.request(Method::GET, path, None).await?)
    }

    async fn provider_serves_location(&self, provider_id: Uuid, location_id: Uuid) -> Result<bool, ProviderError> {
        let path = format!(
            "/rest/v1/provider_locations?provider_id=eq.{}&location_id=eq.{}&select=provider_id",
            provider_id, location_id
        );
        let rows: Vec<serde_json::Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(!rows.is_empty())
    }

    async fn find_working_hours(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        weekday: u8,
    ) -> Result<Option<WorkingHours>, ProviderError> {
        debug!("Fetching working hours for provider {} at {} on {}", provider_id, location_id, weekday_name(weekday));

        let path = format!(
            "/rest/v1/provider_schedules?provider_id=eq.{}&location_id=eq.{}&weekday=eq.{}&is_active=eq.true",
            provider_id, location_id, weekday
        );
        let rows: Vec<WorkingHours> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(select_active_schedule(rows))
    }

    async fn list_working_hours(&self, provider_id: Uuid) -> Result<Vec<WorkingHours>, ProviderError> {
        let path = format!(
            "/rest/v1/provider_schedules?provider_id=eq.{}&order=weekday.asc,start_time.asc",
            provider_id
        );
        Ok(self.supabase.request(Method::GET, &path, None).await?)
    }

    async fn insert_working_hours(&self, hours: WorkingHours) -> Result<WorkingHours, ProviderError> {
        let row = json!({
            "id": hours.id,
            "provider_id": hours.provider_id,
            "location_id": hours.location_id,
            "weekday": hours.weekday,
            "start_time": hours.start.format("%H:%M:%S").to_string(),
            "end_time": hours.end.format("%H:%M:%S").to_string(),
            "is_active": hours.is_active,
            "created_at": hours.created_at.to_rfc3339(),
            "updated_at": hours.updated_at.to_rfc3339(),
        });

        let mut created: Vec<WorkingHours> = self
            .supabase
            .write_returning(Method::POST, "/rest/v1/provider_schedules", row)
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => ProviderError::DuplicateActiveSchedule {
                    weekday: weekday_name(hours.weekday),
                },
                other => other.into(),
            })?;

        if created.is_empty() {
            return Err(ProviderError::Database("Failed to create working hours".to_string()));
        }

        Ok(created.swap_remove(0))
    }
}

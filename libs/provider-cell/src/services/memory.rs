use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{weekday_name, AppointmentType, Location, Provider, ProviderError, WorkingHours};
use crate::services::directory::{select_active_schedule, ProviderDirectory};

#[derive(Default)]
struct DirectoryData {
    providers: HashMap<Uuid, Provider>,
    locations: HashMap<Uuid, Location>,
    links: HashSet<(Uuid, Uuid)>,
    appointment_types: HashMap<Uuid, AppointmentType>,
    working_hours: Vec<WorkingHours>,
}

/// Process-local directory used for development, demos and tests.
#[derive(Default)]
pub struct InMemoryDirectory {
    data: RwLock<DirectoryData>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_provider(&self, provider: Provider) {
        self.data.write().await.providers.insert(provider.id, provider);
    }

    pub async fn add_location(&self, location: Location) {
        self.data.write().await.locations.insert(location.id, location);
    }

    pub async fn link_provider_location(&self, provider_id: Uuid, location_id: Uuid) {
        self.data.write().await.links.insert((provider_id, location_id));
    }

    pub async fn add_appointment_type(&self, appointment_type: AppointmentType) {
        self.data
            .write()
            .await
            .appointment_types
            .insert(appointment_type.id, appointment_type);
    }
}

#[async_trait]
impl ProviderDirectory for InMemoryDirectory {
    async fn get_provider(&self, provider_id: Uuid) -> Result<Provider, ProviderError> {
        self.data
            .read()
            .await
            .providers
            .get(&provider_id)
            .cloned()
            .ok_or(ProviderError::ProviderNotFound)
    }

    async fn list_providers(&self) -> Result<Vec<Provider>, ProviderError> {
        let mut providers: Vec<Provider> = self.data.read().await.providers.values().cloned().collect();
        providers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(providers)
    }

    async fn provider_locations(&self, provider_id: Uuid) -> Result<Vec<Location>, ProviderError> {
        let data = self.data.read().await;
        let mut locations: Vec<Location> = data
            .links
            .iter()
            .filter(|(provider, _)| *provider == provider_id)
            .filter_map(|(_, location)| data.locations.get(location).cloned())
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn get_location(&self, location_id: Uuid) -> Result<Location, ProviderError> {
        self.data
            .read()
            .await
            .locations
            .get(&location_id)
            .cloned()
            .ok_or(ProviderError::LocationNotFound)
    }

    async fn list_locations(&self) -> Result<Vec<Location>, ProviderError> {
        let mut locations: Vec<Location> = self.data.read().await.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn get_appointment_type(&self, type_id: Uuid) -> Result<AppointmentType, ProviderError> {
        self.data
            .read()
            .await
            .appointment_types
            .get(&type_id)
            .cloned()
            .ok_or(ProviderError::AppointmentTypeNotFound)
    }

    async fn list_appointment_types(&self, bookable_only: bool) -> Result<Vec<AppointmentType>, ProviderError> {
        let mut types: Vec<AppointmentType> = self
            .data
            .read()
            .await
            .appointment_types
            .values()
            .filter(|t| !bookable_only || t.allow_patient_booking)
            .cloned()
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn provider_serves_location(&self, provider_id: Uuid, location_id: Uuid) -> Result<bool, ProviderError> {
        Ok(self.data.read().await.links.contains(&(provider_id, location_id)))
    }

    async fn find_working_hours(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        weekday: u8,
    ) -> Result<Option<WorkingHours>, ProviderError> {
        debug!("Looking up working hours for provider {} at {} on {}", provider_id, location_id, weekday_name(weekday));

        let rows: Vec<WorkingHours> = self
            .data
            .read()
            .await
            .working_hours
            .iter()
            .filter(|row| {
                row.provider_id == provider_id && row.location_id == location_id && row.weekday == weekday
            })
            .cloned()
            .collect();

        Ok(select_active_schedule(rows))
    }

    async fn list_working_hours(&self, provider_id: Uuid) -> Result<Vec<WorkingHours>, ProviderError> {
        Ok(self
            .data
            .read()
            .await
            .working_hours
            .iter()
            .filter(|row| row.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn insert_working_hours(&self, hours: WorkingHours) -> Result<WorkingHours, ProviderError> {
        let mut data = self.data.write().await;

        if hours.is_active {
            let duplicate = data.working_hours.iter().any(|row| {
                row.is_active
                    && row.provider_id == hours.provider_id
                    && row.location_id == hours.location_id
                    && row.weekday == hours.weekday
            });
            if duplicate {
                return Err(ProviderError::DuplicateActiveSchedule {
                    weekday: weekday_name(hours.weekday),
                });
            }
        }

        data.working_hours.push(hours.clone());
        Ok(hours)
    }
}

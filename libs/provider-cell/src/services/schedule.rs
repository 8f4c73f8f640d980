use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{CreateWorkingHoursRequest, ProviderError, WorkingHours};
use crate::services::directory::ProviderDirectory;

pub struct ScheduleService {
    directory: Arc<dyn ProviderDirectory>,
}

impl ScheduleService {
    pub fn new(directory: Arc<dyn ProviderDirectory>) -> Self {
        Self { directory }
    }

    /// Create a weekly working-hours row for a provider at one of their locations
    pub async fn create_working_hours(
        &self,
        provider_id: Uuid,
        request: CreateWorkingHoursRequest,
    ) -> Result<WorkingHours, ProviderError> {
        debug!("Creating working hours for provider {} on weekday {}", provider_id, request.weekday);

        if request.weekday > 6 {
            return Err(ProviderError::InvalidSchedule(
                "Weekday must be between 0 (Monday) and 6 (Sunday)".to_string(),
            ));
        }

        if request.start >= request.end {
            return Err(ProviderError::InvalidSchedule(
                "Start time must be before end time".to_string(),
            ));
        }

        let provider = self.directory.get_provider(provider_id).await?;
        self.directory.get_location(request.location_id).await?;

        if !self.directory.provider_serves_location(provider_id, request.location_id).await? {
            return Err(ProviderError::ProviderLocationMismatch);
        }

        let now = Utc::now();
        let hours = WorkingHours {
            id: Uuid::new_v4(),
            provider_id,
            location_id: request.location_id,
            weekday: request.weekday,
            start: request.start,
            end: request.end,
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created = self.directory.insert_working_hours(hours).await?;
        info!(
            "Working hours {} created for {}: {} {}-{}",
            created.id,
            provider.display_name(),
            created.weekday_name(),
            created.start,
            created.end
        );

        Ok(created)
    }

    pub async fn list_working_hours(&self, provider_id: Uuid) -> Result<Vec<WorkingHours>, ProviderError> {
        self.directory.get_provider(provider_id).await?;

        let mut rows = self.directory.list_working_hours(provider_id).await?;
        rows.sort_by(|a, b| (a.weekday, a.start).cmp(&(b.weekday, b.start)));

        Ok(rows)
    }
}

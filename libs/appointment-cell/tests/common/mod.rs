#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use appointment_cell::models::BookAppointmentRequest;
use appointment_cell::services::{AppointmentBookingService, AppointmentStore, InMemoryAppointmentStore, SlotService};
use provider_cell::models::{AppointmentType, CreateWorkingHoursRequest, Location, Provider};
use provider_cell::services::{InMemoryDirectory, ProviderDirectory, ScheduleService};

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_time(time(hour, minute))
}

pub fn appointment_type(minutes: i32, before: i32, after: i32) -> AppointmentType {
    AppointmentType {
        id: Uuid::new_v4(),
        name: format!("{} minute visit", minutes),
        duration_minutes: minutes,
        allow_patient_booking: true,
        buffer_before_min: before,
        buffer_after_min: after,
        description: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Provider working Mondays 09:00-12:00 at `location_id`; `other_location_id`
/// exists but is not served by the provider.
pub struct TestClinic {
    pub directory: Arc<InMemoryDirectory>,
    pub store: Arc<InMemoryAppointmentStore>,
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub other_location_id: Uuid,
    /// 30 minutes, no buffers
    pub checkup: AppointmentType,
    /// 30 minutes, 5 minutes either side
    pub buffered: AppointmentType,
}

impl TestClinic {
    pub async fn new() -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let now = Utc::now();

        let provider = Provider {
            id: Uuid::new_v4(),
            name: "Trivedi".to_string(),
            specialty: "Family Medicine".to_string(),
            phone: None,
            email: None,
            bio: None,
            created_at: now,
            updated_at: now,
        };
        let emory = Location {
            id: Uuid::new_v4(),
            name: "Emory".to_string(),
            address: "East Cobb".to_string(),
            city: "Marietta".to_string(),
            state: "GA".to_string(),
            zip_code: "30458".to_string(),
            phone: None,
            created_at: now,
            updated_at: now,
        };
        let northside = Location {
            id: Uuid::new_v4(),
            name: "Northside Hospital".to_string(),
            ..emory.clone()
        };

        let checkup = appointment_type(30, 0, 0);
        let buffered = appointment_type(30, 5, 5);

        let provider_id = provider.id;
        let location_id = emory.id;
        let other_location_id = northside.id;

        directory.add_provider(provider).await;
        directory.add_location(emory).await;
        directory.add_location(northside).await;
        directory.link_provider_location(provider_id, location_id).await;
        directory.add_appointment_type(checkup.clone()).await;
        directory.add_appointment_type(buffered.clone()).await;

        ScheduleService::new(directory.clone())
            .create_working_hours(
                provider_id,
                CreateWorkingHoursRequest {
                    location_id,
                    weekday: 0,
                    start: time(9, 0),
                    end: time(12, 0),
                    is_active: Some(true),
                },
            )
            .await
            .unwrap();

        let store = Arc::new(InMemoryAppointmentStore::new(directory.clone()));

        Self {
            directory,
            store,
            provider_id,
            location_id,
            other_location_id,
            checkup,
            buffered,
        }
    }

    pub fn directory(&self) -> Arc<dyn ProviderDirectory> {
        self.directory.clone()
    }

    pub fn appointments(&self) -> Arc<dyn AppointmentStore> {
        self.store.clone()
    }

    pub fn slot_service(&self) -> SlotService {
        SlotService::new(self.directory(), self.appointments(), 31)
    }

    pub fn booking_service(&self) -> AppointmentBookingService {
        AppointmentBookingService::new(self.directory(), self.appointments())
    }

    pub fn booking_request(&self, type_id: Uuid, date: NaiveDate, start: NaiveTime) -> BookAppointmentRequest {
        BookAppointmentRequest {
            patient_id: Uuid::new_v4(),
            provider_id: self.provider_id,
            location_id: self.location_id,
            appointment_type_id: type_id,
            appointment_date: date,
            appointment_time: start,
            notes: None,
        }
    }
}

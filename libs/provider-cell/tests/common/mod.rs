#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use uuid::Uuid;

use provider_cell::models::{AppointmentType, CreateWorkingHoursRequest, Location, Provider};
use provider_cell::services::InMemoryDirectory;

/// One provider linked to `location`, plus an unlinked `other_location`.
pub struct TestClinic {
    pub directory: Arc<InMemoryDirectory>,
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub other_location_id: Uuid,
    pub bookable_type_id: Uuid,
    pub internal_type_id: Uuid,
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn provider(name: &str) -> Provider {
    Provider {
        id: Uuid::new_v4(),
        name: name.to_string(),
        specialty: "Family Medicine".to_string(),
        phone: None,
        email: None,
        bio: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn location(name: &str) -> Location {
    Location {
        id: Uuid::new_v4(),
        name: name.to_string(),
        address: "1 Main St".to_string(),
        city: "Atlanta".to_string(),
        state: "GA".to_string(),
        zip_code: "30301".to_string(),
        phone: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn appointment_type(name: &str, minutes: i32, bookable: bool) -> AppointmentType {
    AppointmentType {
        id: Uuid::new_v4(),
        name: name.to_string(),
        duration_minutes: minutes,
        allow_patient_booking: bookable,
        buffer_before_min: 0,
        buffer_after_min: 0,
        description: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn working_hours_request(location_id: Uuid, weekday: u8) -> CreateWorkingHoursRequest {
    CreateWorkingHoursRequest {
        location_id,
        weekday,
        start: time(9, 0),
        end: time(17, 0),
        is_active: None,
    }
}

impl TestClinic {
    pub async fn new() -> Self {
        let directory = Arc::new(InMemoryDirectory::new());

        let trivedi = provider("Trivedi");
        let emory = location("Emory");
        let northside = location("Northside Hospital");
        let bookable = appointment_type("General Checkup", 30, true);
        let internal = appointment_type("Staff Review", 60, false);

        let clinic = Self {
            directory: directory.clone(),
            provider_id: trivedi.id,
            location_id: emory.id,
            other_location_id: northside.id,
            bookable_type_id: bookable.id,
            internal_type_id: internal.id,
        };

        directory.add_provider(trivedi).await;
        directory.add_location(emory).await;
        directory.add_location(northside).await;
        directory.link_provider_location(clinic.provider_id, clinic.location_id).await;
        directory.add_appointment_type(bookable).await;
        directory.add_appointment_type(internal).await;

        clinic
    }
}

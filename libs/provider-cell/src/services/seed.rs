use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::models::{AppointmentType, CreateWorkingHoursRequest, Location, Provider, ProviderError};
use crate::services::memory::InMemoryDirectory;
use crate::services::schedule::ScheduleService;

/// Populates an empty in-memory directory with the demo clinic.
pub async fn seed_demo_data(directory: Arc<InMemoryDirectory>) -> Result<(), ProviderError> {
    info!("Seeding demo providers, locations and appointment types");

    let now = Utc::now();

    let trivedi = demo_provider("Trivedi", "Family Medicine", "34343434", "dr.trivedi@example.com");
    let johnson = demo_provider("Johnson", "Cardiology", "55555555", "dr.johnson@example.com");

    let emory = Location {
        id: Uuid::new_v4(),
        name: "Emory".to_string(),
        address: "East Cobb".to_string(),
        city: "Marietta".to_string(),
        state: "GA".to_string(),
        zip_code: "30458".to_string(),
        phone: Some("1234567890".to_string()),
        created_at: now,
        updated_at: now,
    };
    let northside = Location {
        id: Uuid::new_v4(),
        name: "Northside Hospital".to_string(),
        address: "1000 Johnson Ferry Rd".to_string(),
        city: "Atlanta".to_string(),
        state: "GA".to_string(),
        zip_code: "30342".to_string(),
        phone: Some("0987654321".to_string()),
        created_at: now,
        updated_at: now,
    };

    let links = [
        (trivedi.id, emory.id),
        (johnson.id, emory.id),
        (johnson.id, northside.id),
    ];

    directory.add_provider(trivedi).await;
    directory.add_provider(johnson).await;
    directory.add_location(emory).await;
    directory.add_location(northside).await;
    for (provider_id, location_id) in links {
        directory.link_provider_location(provider_id, location_id).await;
    }

    for (name, minutes, description) in [
        ("General Checkup", 30, "Regular health checkup"),
        ("Follow-up", 15, "Follow-up appointment"),
        ("Consultation", 45, "Initial consultation"),
    ] {
        directory
            .add_appointment_type(AppointmentType {
                id: Uuid::new_v4(),
                name: name.to_string(),
                duration_minutes: minutes,
                allow_patient_booking: true,
                buffer_before_min: 0,
                buffer_after_min: 0,
                description: Some(description.to_string()),
                created_at: now,
                updated_at: now,
            })
            .await;
    }

    let (Some(open), Some(close)) = (NaiveTime::from_hms_opt(9, 0, 0), NaiveTime::from_hms_opt(17, 0, 0)) else {
        return Err(ProviderError::InvalidSchedule("Invalid demo working hours".to_string()));
    };

    let schedules = ScheduleService::new(directory.clone());
    for (provider_id, location_id) in links {
        for weekday in 0..5 {
            schedules
                .create_working_hours(
                    provider_id,
                    CreateWorkingHoursRequest {
                        location_id,
                        weekday,
                        start: open,
                        end: close,
                        is_active: Some(true),
                    },
                )
                .await?;
        }
    }

    info!("Demo data seeded");
    Ok(())
}

fn demo_provider(name: &str, specialty: &str, phone: &str, email: &str) -> Provider {
    let now = Utc::now();
    Provider {
        id: Uuid::new_v4(),
        name: name.to_string(),
        specialty: specialty.to_string(),
        phone: Some(phone.to_string()),
        email: Some(email.to_string()),
        bio: None,
        created_at: now,
        updated_at: now,
    }
}

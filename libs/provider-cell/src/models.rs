use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// Monday = 0 … Sunday = 6.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

pub fn weekday_name(weekday: u8) -> &'static str {
    WEEKDAY_NAMES.get(weekday as usize).copied().unwrap_or("Unknown")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provider {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Provider {
    pub fn display_name(&self) -> String {
        format!("Dr. {}", self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// DTO for provider listings, locations nested the way clients render them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderWithLocations {
    #[serde(flatten)]
    pub provider: Provider,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentType {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub allow_patient_booking: bool,
    pub buffer_before_min: i32,
    pub buffer_after_min: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentType {
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes as i64)
    }

    pub fn buffer_before(&self) -> Duration {
        Duration::minutes(self.buffer_before_min as i64)
    }

    pub fn buffer_after(&self) -> Duration {
        Duration::minutes(self.buffer_after_min as i64)
    }

    /// Full span the appointment reserves on the provider's calendar.
    pub fn total_block(&self) -> Duration {
        self.buffer_before() + self.duration() + self.buffer_after()
    }
}

/// Weekly working-hours row for a provider at one location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkingHours {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub weekday: u8, // 0 = Monday, 6 = Sunday
    #[serde(alias = "start_time")]
    pub start: NaiveTime,
    #[serde(alias = "end_time")]
    pub end: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkingHours {
    pub fn weekday_name(&self) -> &'static str {
        weekday_name(self.weekday)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkingHoursRequest {
    pub location_id: Uuid,
    pub weekday: u8,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider not found")]
    ProviderNotFound,

    #[error("Location not found")]
    LocationNotFound,

    #[error("Appointment type not found")]
    AppointmentTypeNotFound,

    #[error("Provider does not work at this location")]
    ProviderLocationMismatch,

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("An active schedule already exists for this provider on {weekday}")]
    DuplicateActiveSchedule { weekday: &'static str },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<shared_database::DatabaseError> for ProviderError {
    fn from(error: shared_database::DatabaseError) -> Self {
        ProviderError::Database(error.to_string())
    }
}

// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;

use provider_cell::models::ProviderError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub appointment_type_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.appointment_date.and_time(self.appointment_time)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Scheduled and completed appointments occupy the provider's calendar.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A non-cancelled appointment reduced to the timing data conflict checks need.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockingAppointment {
    pub appointment_id: Uuid,
    pub starts_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub buffer_before_min: i32,
    pub buffer_after_min: i32,
}

impl BlockingAppointment {
    pub fn occupied_block(&self) -> TimeBlock {
        TimeBlock {
            start: self.starts_at - Duration::minutes(self.buffer_before_min as i64),
            end: self.starts_at
                + Duration::minutes((self.duration_minutes + self.buffer_after_min) as i64),
        }
    }
}

/// Half-open span `[start, end)` on a provider's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBlock {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeBlock {
    pub fn overlaps(&self, other: &TimeBlock) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Bookable interval offered to a patient; buffers are never part of it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotQuery {
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub type_id: Uuid,
    #[serde(deserialize_with = "wall_clock::deserialize")]
    pub start: NaiveDateTime,
    #[serde(deserialize_with = "wall_clock::deserialize")]
    pub end: NaiveDateTime,
}

/// ISO 8601 datetimes read as clinic wall-clock time.
///
/// A trailing `Z` or UTC offset is accepted and dropped without converting,
/// so `09:00:00Z` and `09:00:00+05:00` both mean 09:00 on the clinic's clock.
pub mod wall_clock {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    pub fn parse(value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();

        if let Some(parsed) = NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        {
            return Some(parsed);
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Some(parsed.naive_local());
        }

        // An unescaped `+` in a query string arrives as a space.
        let (datetime, offset) = value.rsplit_once(' ')?;
        DateTime::parse_from_rfc3339(&format!("{}+{}", datetime, offset))
            .ok()
            .map(|parsed| parsed.naive_local())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        parse(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid datetime `{}`, expected ISO 8601", value))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotsResponse {
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub type_id: Uuid,
    pub slots: Vec<Slot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub appointment_type_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub notes: Option<String>,
}

/// Reschedule and/or edit notes. Omitted fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAppointmentRequest {
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<NaiveTime>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppointmentSearchQuery {
    pub patient_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<NaiveDate>,
    pub before_date: Option<NaiveDate>,
}

impl AppointmentSearchQuery {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.provider_id.map_or(true, |id| appointment.provider_id == id)
            && self.location_id.map_or(true, |id| appointment.location_id == id)
            && self.status.map_or(true, |status| appointment.status == status)
            && self.from_date.map_or(true, |date| appointment.appointment_date >= date)
            && self.before_date.map_or(true, |date| appointment.appointment_date < date)
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Provider not found")]
    ProviderNotFound,

    #[error("Location not found")]
    LocationNotFound,

    #[error("Appointment type not found")]
    AppointmentTypeNotFound,

    #[error("Provider does not work at this location")]
    ProviderLocationMismatch,

    #[error("Range end must not be before range start")]
    InvalidRange,

    #[error("Requested range spans more than {max_days} days")]
    RangeTooLarge { max_days: i64 },

    #[error("Appointment slot no longer available")]
    SlotNoLongerAvailable,

    #[error("Appointment is already {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AppointmentError {
    /// Lookup failures the slot endpoint reports inside a 200 payload.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            AppointmentError::ProviderNotFound
                | AppointmentError::LocationNotFound
                | AppointmentError::AppointmentTypeNotFound
                | AppointmentError::ProviderLocationMismatch
        )
    }
}

impl From<ProviderError> for AppointmentError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::ProviderNotFound => AppointmentError::ProviderNotFound,
            ProviderError::LocationNotFound => AppointmentError::LocationNotFound,
            ProviderError::AppointmentTypeNotFound => AppointmentError::AppointmentTypeNotFound,
            ProviderError::ProviderLocationMismatch => AppointmentError::ProviderLocationMismatch,
            ProviderError::InvalidSchedule(msg) => AppointmentError::ValidationError(msg),
            ProviderError::DuplicateActiveSchedule { .. } => AppointmentError::ValidationError(error.to_string()),
            ProviderError::Database(msg) => AppointmentError::DatabaseError(msg),
        }
    }
}

impl From<shared_database::DatabaseError> for AppointmentError {
    fn from(error: shared_database::DatabaseError) -> Self {
        AppointmentError::DatabaseError(error.to_string())
    }
}

use std::sync::Arc;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::{AppConfig, StorageBackend};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub max_slot_range_days: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            max_slot_range_days: 31,
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            storage_backend: StorageBackend::Supabase,
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            max_slot_range_days: self.max_slot_range_days,
            seed_demo_data: false,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// First date strictly after today (UTC) falling on `weekday`, at least a week out.
pub fn upcoming_weekday(weekday: Weekday) -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(7);
    while date.weekday() != weekday {
        date += Duration::days(1);
    }
    date
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn provider_response(provider_id: &str, name: &str, specialty: &str) -> Value {
        json!({
            "id": provider_id,
            "name": name,
            "specialty": specialty,
            "phone": null,
            "email": format!("dr.{}@example.com", name.to_lowercase()),
            "bio": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn location_response(location_id: &str, name: &str) -> Value {
        json!({
            "id": location_id,
            "name": name,
            "address": "1000 Johnson Ferry Rd",
            "city": "Atlanta",
            "state": "GA",
            "zip_code": "30342",
            "phone": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_type_response(
        type_id: &str,
        duration_minutes: i32,
        buffer_before_min: i32,
        buffer_after_min: i32,
    ) -> Value {
        json!({
            "id": type_id,
            "name": "General Checkup",
            "duration_minutes": duration_minutes,
            "allow_patient_booking": true,
            "buffer_before_min": buffer_before_min,
            "buffer_after_min": buffer_after_min,
            "description": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn schedule_response(
        provider_id: &str,
        location_id: &str,
        weekday: u8,
        start_time: &str,
        end_time: &str,
        updated_at: &str,
    ) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "provider_id": provider_id,
            "location_id": location_id,
            "weekday": weekday,
            "start_time": start_time,
            "end_time": end_time,
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": updated_at
        })
    }

    /// Appointment row with its type's timing columns embedded, as returned by
    /// `select=*,appointment_types(...)`.
    pub fn appointment_response(
        appointment_id: &str,
        provider_id: &str,
        location_id: &str,
        date: NaiveDate,
        time: &str,
        status: &str,
        duration_minutes: i32,
    ) -> Value {
        json!({
            "id": appointment_id,
            "patient_id": Uuid::new_v4(),
            "provider_id": provider_id,
            "location_id": location_id,
            "appointment_type_id": Uuid::new_v4(),
            "appointment_date": date.format("%Y-%m-%d").to_string(),
            "appointment_time": time,
            "status": status,
            "notes": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "appointment_types": {
                "duration_minutes": duration_minutes,
                "buffer_before_min": 0,
                "buffer_after_min": 0
            }
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code,
            "details": null,
            "hint": null
        })
    }
}

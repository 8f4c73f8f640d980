// libs/appointment-cell/tests/supabase_test.rs
use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{AppointmentError, AppointmentSearchQuery, AppointmentStatus, TimeBlock};
use appointment_cell::services::{AppointmentChanges, AppointmentStore, NewAppointment, SupabaseAppointmentStore};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn store_for(mock_server: &MockServer) -> SupabaseAppointmentStore {
    SupabaseAppointmentStore::new(&TestConfig::with_supabase_url(&mock_server.uri()).to_app_config())
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
}

fn new_appointment(provider_id: Uuid, location_id: Uuid, start: NaiveTime) -> NewAppointment {
    NewAppointment {
        patient_id: Uuid::new_v4(),
        provider_id,
        location_id,
        appointment_type_id: Uuid::new_v4(),
        appointment_date: date(),
        appointment_time: start,
        notes: None,
    }
}

fn block(start: NaiveTime, minutes: i64) -> TimeBlock {
    let start = date().and_time(start);
    TimeBlock {
        start,
        end: start + chrono::Duration::minutes(minutes),
    }
}

#[tokio::test]
async fn test_list_blocking_appointments_reads_embedded_timing() {
    let mock_server = MockServer::start().await;
    let provider_id = Uuid::new_v4().to_string();
    let location_id = Uuid::new_v4().to_string();
    let appointment_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("provider_id", format!("eq.{}", provider_id)))
        .and(query_param("appointment_date", "gte.2030-01-06"))
        .and(query_param("appointment_date", "lte.2030-01-08"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &appointment_id, &provider_id, &location_id, date(), "10:00:00", "scheduled", 45
            )
        ])))
        .mount(&mock_server)
        .await;

    let blocking = store_for(&mock_server)
        .list_blocking_appointments(
            provider_id.parse().unwrap(),
            location_id.parse().unwrap(),
            date().pred_opt().unwrap(),
            date().succ_opt().unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(blocking.len(), 1);
    assert_eq!(blocking[0].appointment_id.to_string(), appointment_id);
    assert_eq!(blocking[0].duration_minutes, 45);
    assert_eq!(
        blocking[0].occupied_block().end,
        date().and_hms_opt(10, 45, 0).unwrap()
    );
}

#[tokio::test]
async fn test_insert_if_free_posts_scheduled_row() {
    let mock_server = MockServer::start().await;
    let provider_id = Uuid::new_v4();
    let location_id = Uuid::new_v4();
    let created_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({
            "status": "scheduled",
            "appointment_time": "09:00:00"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &created_id, &provider_id.to_string(), &location_id.to_string(), date(), "09:00:00", "scheduled", 30
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let created = store_for(&mock_server)
        .insert_if_free(new_appointment(provider_id, location_id, time), block(time, 30))
        .await
        .unwrap();

    assert_eq!(created.id.to_string(), created_id);
    assert_eq!(created.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn test_insert_if_free_prechecks_existing_rows() {
    let mock_server = MockServer::start().await;
    let provider_id = Uuid::new_v4();
    let location_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(), &provider_id.to_string(), &location_id.to_string(), date(), "09:15:00", "scheduled", 30
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let result = store_for(&mock_server)
        .insert_if_free(new_appointment(provider_id, location_id, time), block(time, 30))
        .await;

    assert_matches!(result, Err(AppointmentError::SlotNoLongerAvailable));
}

#[tokio::test]
async fn test_exclusion_violation_maps_to_slot_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::error_response(
            "conflicting key value violates exclusion constraint",
            "23P01",
        )))
        .mount(&mock_server)
        .await;

    let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let result = store_for(&mock_server)
        .insert_if_free(new_appointment(Uuid::new_v4(), Uuid::new_v4(), time), block(time, 30))
        .await;

    assert_matches!(result, Err(AppointmentError::SlotNoLongerAvailable));
}

#[tokio::test]
async fn test_search_appointments_builds_filters() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .and(query_param("status", "eq.scheduled"))
        .and(query_param("appointment_date", "gte.2030-01-07"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let query = AppointmentSearchQuery {
        patient_id: Some(patient_id),
        status: Some(AppointmentStatus::Scheduled),
        from_date: Some(date()),
        ..Default::default()
    };

    let rows = store_for(&mock_server).search_appointments(&query).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_update_status_lost_race_reports_current_status() {
    let mock_server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let id = appointment_id.to_string();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("status", "eq.scheduled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &id, &Uuid::new_v4().to_string(), &Uuid::new_v4().to_string(), date(), "09:00:00", "completed", 30
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = store_for(&mock_server)
        .update_status(appointment_id, AppointmentStatus::Scheduled, AppointmentStatus::Cancelled)
        .await;

    assert_matches!(result, Err(AppointmentError::InvalidStatusTransition(AppointmentStatus::Completed)));
}

#[tokio::test]
async fn test_reschedule_skips_own_row_and_maps_exclusion_violation() {
    let mock_server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let id = appointment_id.to_string();
    let provider_id = Uuid::new_v4().to_string();
    let location_id = Uuid::new_v4().to_string();
    let current = MockSupabaseResponses::appointment_response(
        &id, &provider_id, &location_id, date(), "09:00:00", "scheduled", 30,
    );

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([current.clone()])))
        .mount(&mock_server)
        .await;

    // Only the appointment being moved overlaps the new time.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("provider_id", format!("eq.{}", provider_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([current])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("status", "eq.scheduled"))
        .and(body_partial_json(json!({ "appointment_time": "09:15:00" })))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::error_response(
            "conflicting key value violates exclusion constraint",
            "23P01",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let time = NaiveTime::from_hms_opt(9, 15, 0).unwrap();
    let changes = AppointmentChanges {
        appointment_date: date(),
        appointment_time: time,
        notes: None,
    };
    let result = store_for(&mock_server)
        .update_if_free(appointment_id, AppointmentStatus::Scheduled, changes, Some(block(time, 30)))
        .await;

    assert_matches!(result, Err(AppointmentError::SlotNoLongerAvailable));
}

#[tokio::test]
async fn test_update_lost_race_reports_current_status() {
    let mock_server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let id = appointment_id.to_string();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(body_partial_json(json!({ "notes": "bring referral" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &id, &Uuid::new_v4().to_string(), &Uuid::new_v4().to_string(), date(), "09:00:00", "cancelled", 30
            )
        ])))
        .mount(&mock_server)
        .await;

    let changes = AppointmentChanges {
        appointment_date: date(),
        appointment_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        notes: Some("bring referral".to_string()),
    };
    let result = store_for(&mock_server)
        .update_if_free(appointment_id, AppointmentStatus::Scheduled, changes, None)
        .await;

    assert_matches!(result, Err(AppointmentError::InvalidStatusTransition(AppointmentStatus::Cancelled)));
}

#[tokio::test]
async fn test_get_appointment_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = store_for(&mock_server).get_appointment(Uuid::new_v4()).await;
    assert_matches!(result, Err(AppointmentError::NotFound));
}

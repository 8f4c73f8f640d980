// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentSearchQuery, AppointmentStatus, BookAppointmentRequest, SlotQuery,
    UpdateAppointmentRequest,
};
use crate::router::AppointmentCellState;
use crate::services::{AppointmentBookingService, SlotService};

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::NotFound
            | AppointmentError::ProviderNotFound
            | AppointmentError::LocationNotFound
            | AppointmentError::AppointmentTypeNotFound => AppError::NotFound(error.to_string()),
            AppointmentError::ProviderLocationMismatch
            | AppointmentError::InvalidRange
            | AppointmentError::RangeTooLarge { .. }
            | AppointmentError::InvalidStatusTransition(_) => AppError::BadRequest(error.to_string()),
            AppointmentError::SlotNoLongerAvailable => AppError::Conflict(error.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub patient_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct PatientFilterQuery {
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ConflictCheckQuery {
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub type_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

fn booking_service(state: &AppointmentCellState) -> AppointmentBookingService {
    AppointmentBookingService::new(state.directory.clone(), state.appointments.clone())
}

/// Malformed query strings get the JSON error body like every other 400.
fn query_or_bad_request<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

// ==============================================================================
// SLOTS
// ==============================================================================

/// Lookup failures come back as 200 `{ error, slots: [] }` so existing
/// clients keep working; range problems are real 400s.
pub async fn get_available_slots(
    State(state): State<Arc<AppointmentCellState>>,
    query: Result<Query<SlotQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let query = query_or_bad_request(query)?;
    let slot_service = SlotService::new(
        state.directory.clone(),
        state.appointments.clone(),
        state.config.max_slot_range_days,
    );

    match slot_service.get_slots(query).await {
        Ok(response) => Ok(Json(json!(response))),
        Err(e) if e.is_soft() => {
            debug!("Slot request rejected: {}", e);
            Ok(Json(json!({
                "error": e.to_string(),
                "slots": []
            })))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn check_appointment_conflicts(
    State(state): State<Arc<AppointmentCellState>>,
    query: Result<Query<ConflictCheckQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let query = query_or_bad_request(query)?;
    let conflict_check = booking_service(&state)
        .check_conflicts(query.provider_id, query.location_id, query.type_id, query.date, query.time)
        .await?;

    Ok(Json(json!(conflict_check)))
}

// ==============================================================================
// APPOINTMENT BOOKING AND LISTINGS
// ==============================================================================

pub async fn book_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = booking_service(&state).book_appointment(request).await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

pub async fn list_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<Json<Value>, AppError> {
    let query = AppointmentSearchQuery {
        patient_id: params.patient_id,
        provider_id: params.provider_id,
        location_id: params.location_id,
        status: params.status,
        ..Default::default()
    };

    let appointments = booking_service(&state).search_appointments(query).await?;
    Ok(Json(json!(appointments)))
}

pub async fn get_upcoming_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    Query(params): Query<PatientFilterQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = booking_service(&state)
        .get_upcoming_appointments(params.patient_id)
        .await?;
    Ok(Json(json!(appointments)))
}

pub async fn get_past_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    Query(params): Query<PatientFilterQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = booking_service(&state)
        .get_past_appointments(params.patient_id)
        .await?;
    Ok(Json(json!(appointments)))
}

pub async fn get_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = booking_service(&state).get_appointment(appointment_id).await?;
    Ok(Json(json!(appointment)))
}

pub async fn update_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = booking_service(&state)
        .update_appointment(appointment_id, request)
        .await?;
    Ok(Json(json!(appointment)))
}

// ==============================================================================
// STATUS TRANSITIONS
// ==============================================================================

pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = booking_service(&state).cancel_appointment(appointment_id).await?;
    Ok(Json(json!(appointment)))
}

pub async fn complete_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = booking_service(&state).complete_appointment(appointment_id).await?;
    Ok(Json(json!(appointment)))
}

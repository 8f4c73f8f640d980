use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{CreateWorkingHoursRequest, ProviderError, ProviderWithLocations};
use crate::router::ProviderCellState;
use crate::services::ScheduleService;

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::ProviderNotFound
            | ProviderError::LocationNotFound
            | ProviderError::AppointmentTypeNotFound => AppError::NotFound(error.to_string()),
            ProviderError::ProviderLocationMismatch | ProviderError::InvalidSchedule(_) => {
                AppError::ValidationError(error.to_string())
            }
            ProviderError::DuplicateActiveSchedule { .. } => AppError::Conflict(error.to_string()),
            ProviderError::Database(msg) => AppError::Database(msg),
        }
    }
}

// ==============================================================================
// PROVIDERS
// ==============================================================================

pub async fn list_providers(
    State(state): State<Arc<ProviderCellState>>,
) -> Result<Json<Value>, AppError> {
    let providers = state.directory.list_providers().await?;

    let mut results = Vec::with_capacity(providers.len());
    for provider in providers {
        let locations = state.directory.provider_locations(provider.id).await?;
        results.push(ProviderWithLocations { provider, locations });
    }

    Ok(Json(json!(results)))
}

pub async fn get_provider(
    State(state): State<Arc<ProviderCellState>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<ProviderWithLocations>, AppError> {
    let provider = state.directory.get_provider(provider_id).await?;
    let locations = state.directory.provider_locations(provider_id).await?;

    Ok(Json(ProviderWithLocations { provider, locations }))
}

pub async fn list_provider_schedules(
    State(state): State<Arc<ProviderCellState>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(state.directory.clone());
    let schedules = schedule_service.list_working_hours(provider_id).await?;

    Ok(Json(json!(schedules)))
}

pub async fn create_provider_schedule(
    State(state): State<Arc<ProviderCellState>>,
    Path(provider_id): Path<Uuid>,
    Json(request): Json<CreateWorkingHoursRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let schedule_service = ScheduleService::new(state.directory.clone());
    let created = schedule_service.create_working_hours(provider_id, request).await?;

    Ok((StatusCode::CREATED, Json(json!(created))))
}

// ==============================================================================
// LOCATIONS AND APPOINTMENT TYPES
// ==============================================================================

pub async fn list_locations(
    State(state): State<Arc<ProviderCellState>>,
) -> Result<Json<Value>, AppError> {
    let locations = state.directory.list_locations().await?;
    Ok(Json(json!(locations)))
}

pub async fn get_location(
    State(state): State<Arc<ProviderCellState>>,
    Path(location_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let location = state.directory.get_location(location_id).await?;
    Ok(Json(json!(location)))
}

/// Only types patients may book themselves are listed.
pub async fn list_appointment_types(
    State(state): State<Arc<ProviderCellState>>,
) -> Result<Json<Value>, AppError> {
    let types = state.directory.list_appointment_types(true).await?;
    Ok(Json(json!(types)))
}

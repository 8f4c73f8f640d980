use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use crate::handlers;
use crate::services::ProviderDirectory;

pub struct ProviderCellState {
    pub directory: Arc<dyn ProviderDirectory>,
}

pub fn provider_routes(state: Arc<ProviderCellState>) -> Router {
    Router::new()
        .route("/providers", get(handlers::list_providers))
        .route("/providers/{provider_id}", get(handlers::get_provider))
        .route(
            "/providers/{provider_id}/schedules",
            get(handlers::list_provider_schedules).post(handlers::create_provider_schedule),
        )
        .route("/locations", get(handlers::list_locations))
        .route("/locations/{location_id}", get(handlers::get_location))
        .route("/appointment-types", get(handlers::list_appointment_types))
        .with_state(state)
}

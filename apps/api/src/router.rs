use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::{appointment_routes, AppointmentCellState};
use appointment_cell::services::AppointmentStore;
use provider_cell::router::{provider_routes, ProviderCellState};
use provider_cell::services::ProviderDirectory;
use shared_config::AppConfig;

pub fn create_router(
    config: Arc<AppConfig>,
    directory: Arc<dyn ProviderDirectory>,
    appointments: Arc<dyn AppointmentStore>,
) -> Router {
    let provider_state = Arc::new(ProviderCellState {
        directory: directory.clone(),
    });
    let appointment_state = Arc::new(AppointmentCellState {
        config,
        directory,
        appointments,
    });

    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest(
            "/api",
            provider_routes(provider_state).merge(appointment_routes(appointment_state)),
        )
}

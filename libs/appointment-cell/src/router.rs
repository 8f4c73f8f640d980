// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch},
};

use provider_cell::services::ProviderDirectory;
use shared_config::AppConfig;

use crate::handlers;
use crate::services::AppointmentStore;

pub struct AppointmentCellState {
    pub config: Arc<AppConfig>,
    pub directory: Arc<dyn ProviderDirectory>,
    pub appointments: Arc<dyn AppointmentStore>,
}

pub fn appointment_routes(state: Arc<AppointmentCellState>) -> Router {
    Router::new()
        .route(
            "/appointments",
            get(handlers::list_appointments).post(handlers::book_appointment),
        )
        .route("/appointments/slots", get(handlers::get_available_slots))
        .route("/appointments/conflicts/check", get(handlers::check_appointment_conflicts))
        .route("/appointments/upcoming", get(handlers::get_upcoming_appointments))
        .route("/appointments/past", get(handlers::get_past_appointments))
        .route(
            "/appointments/{appointment_id}",
            get(handlers::get_appointment).patch(handlers::update_appointment),
        )
        .route("/appointments/{appointment_id}/cancel", patch(handlers::cancel_appointment))
        .route("/appointments/{appointment_id}/complete", patch(handlers::complete_appointment))
        .with_state(state)
}

use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::services::{AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore};
use provider_cell::services::{seed_demo_data, InMemoryDirectory, ProviderDirectory, SupabaseProviderDirectory};
use shared_config::{AppConfig, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic scheduling API server");

    let config = Arc::new(AppConfig::from_env());

    let (directory, appointments) = build_stores(&config).await?;

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(config.clone(), directory, appointments)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn build_stores(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn ProviderDirectory>, Arc<dyn AppointmentStore>)> {
    match config.effective_backend() {
        StorageBackend::Supabase => {
            info!("Using Supabase storage at {}", config.supabase_url);
            let directory: Arc<dyn ProviderDirectory> = Arc::new(SupabaseProviderDirectory::new(config));
            let appointments: Arc<dyn AppointmentStore> = Arc::new(SupabaseAppointmentStore::new(config));
            Ok((directory, appointments))
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            let directory = Arc::new(InMemoryDirectory::new());
            if config.seed_demo_data {
                seed_demo_data(directory.clone())
                    .await
                    .context("failed to seed demo data")?;
            }

            let directory: Arc<dyn ProviderDirectory> = directory;
            let appointments: Arc<dyn AppointmentStore> =
                Arc::new(InMemoryAppointmentStore::new(directory.clone()));
            Ok((directory, appointments))
        }
    }
}

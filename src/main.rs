//! Volunteer Management Backend server.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use volunteer_backend::config::Config;
use volunteer_backend::engine::Engine;
use volunteer_backend::store::JsonFileStore;
use volunteer_backend::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Volunteer Management Backend");
    tracing::info!("Data path: {:?}", config.data_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (VMS_API_PSK). Authentication is disabled!");
    }

    let engine = Engine::open(config.rules.clone(), JsonFileStore::new(&config.data_path))?;
    let bind_addr = config.bind_addr;
    let app = create_router(AppState::new(engine, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

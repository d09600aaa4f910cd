mod error;
mod logging;
mod routes;
mod state;

use log::info;

use dentflow::{config, Database, Services};

use error::StartupError;
use state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        log::error!("{}", e);
        eprintln!("dentflow-server: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = config::load_from_env()?;
    logging::init(config.log_format)?;

    info!("Starting dentflow-server v{}", env!("CARGO_PKG_VERSION"));

    let db_path = config
        .resolved_database_path()
        .ok_or(StartupError::NoDatabasePath)?;
    let db = Database::open(&db_path)?;

    let state = AppState::new(Services::new(db, &config));
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;
    info!(
        "Listening on {} (participant matching: {:?})",
        config.bind_address, config.participant_matching
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    info!("dentflow-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => log::warn!("Failed to listen for Ctrl-C: {}", e),
    }
}

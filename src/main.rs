use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use meditrack::api::start_server_on;
use meditrack::config;
use meditrack::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let state = match AppState::open(&config::db_path()) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("database initialization failed: {e}");
            std::process::exit(1);
        }
    };

    let mut server = match start_server_on(state, config::bind_addr()).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    server.shutdown();
}

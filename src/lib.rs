pub mod api;
pub mod appointment;
pub mod billing;
pub mod config;
pub mod core_state;
pub mod dashboard;
pub mod db;
pub mod demo;
pub mod format;
pub mod models;
pub mod pharmacy;
pub mod staff;
pub mod status_style;
pub mod waiting_list;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::core_state::CoreState;
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Could not open the document store: {0}")]
    Store(#[from] DatabaseError),

    #[error("{0}")]
    Server(String),

    #[error("Signal handler failed: {0}")]
    Signal(#[from] std::io::Error),
}

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Open the store, serve the API on `config.bind`, and run until Ctrl-C.
pub async fn run(config: Config) -> Result<(), StartupError> {
    tracing::info!(
        "{} starting v{} (demo: {})",
        crate::config::APP_NAME,
        crate::config::APP_VERSION,
        config.demo
    );

    let bind = config.bind;
    let core = Arc::new(CoreState::open(config)?);
    let mut server = api::start_api_server_on(core, bind)
        .await
        .map_err(StartupError::Server)?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, shutting down");
    server.shutdown();
    server.stopped().await;
    Ok(())
}

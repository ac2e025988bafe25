//! searchsim tracking sink entrypoint.
//!
//! A small HTTP service that accepts tracking events on `POST /track`,
//! validates them against the shared protocol crate, and appends them to a
//! SQLite-backed document log.

use searchsim_sink::{Db, SinkConfig};
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();

    let config = match SinkConfig::load() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Failed to load sink configuration");
            std::process::exit(1);
        }
    };

    let db = match Db::new(config.db_path.clone()) {
        Ok(db) => db,
        Err(err) => {
            error!(
                error = %err,
                path = %config.db_path.display(),
                "Failed to initialize sink database"
            );
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "Failed to start async runtime");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(config, db)) {
        error!(error = %err, "Sink stopped with an error");
        std::process::exit(1);
    }
}

async fn run(config: SinkConfig, db: Db) -> Result<(), String> {
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| format!("Failed to bind {}: {}", config.bind, err))?;

    info!(
        addr = %config.bind,
        db = %config.db_path.display(),
        "searchsim sink started"
    );

    searchsim_sink::serve(listener, db, shutdown_signal()).await?;

    info!("searchsim sink stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn init_logging() {
    let debug_enabled = env::var("SEARCHSIM_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

//! searchsim-sink: tracking ingestion endpoint.
//!
//! The binary in `main.rs` wires configuration and logging around [`serve`];
//! tests and embedders can run the same router on a listener of their own.

pub mod config;
pub mod db;
pub mod routes;

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use config::SinkConfig;
pub use db::Db;
pub use routes::{router, AppState};

/// Serves the sink on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, db: Db, shutdown: F) -> Result<(), String>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(AppState { db: Arc::new(db) });
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| format!("Server error: {}", err))
}

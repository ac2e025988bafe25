//! Logging setup for the CLI.
//!
//! Logs go to a daily file under `~/.searchsim/logs` so they never mix with
//! the rendered page on stdout. If that directory can't be created, stderr is
//! used instead. `RUST_LOG` filters as usual; `SEARCHSIM_DEBUG_LOG=1` forces
//! debug.

use std::env;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "searchsim.log";

/// Installs the global subscriber. Keep the returned guard alive for the
/// whole process or buffered lines are lost on exit.
pub fn init() -> Option<WorkerGuard> {
    let filter = if debug_enabled() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let log_dir = searchsim_core::get_searchsim_dir()
        .map(|dir| dir.join("logs"))
        .filter(|dir| fs_err::create_dir_all(dir).is_ok());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

fn debug_enabled() -> bool {
    env::var("SEARCHSIM_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

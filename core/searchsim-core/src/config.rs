//! Configuration loading for simulation clients.
//!
//! Handles paths and persistence for:
//! - Simulation config (`~/.searchsim/config.json`)
//! - Tab-scoped session storage (`~/.searchsim/tabs/<tab>/`)
//!
//! Environment overrides win over the file:
//! - `SEARCHSIM_ENDPOINT`: tracking ingestion URL
//! - `SEARCHSIM_TRACKING_ENABLED`: `1`/`true`/`yes` to enable, anything else disables

use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Result, SimError};
use crate::projector::RESULTS_PER_PAGE;
use crate::tracking::DeliveryMode;

pub const ENDPOINT_ENV: &str = "SEARCHSIM_ENDPOINT";
pub const TRACKING_ENABLED_ENV: &str = "SEARCHSIM_TRACKING_ENABLED";
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8787/track";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimConfig {
    pub endpoint: String,
    pub page_size: usize,
    pub tracking_enabled: bool,
    pub delivery_mode: DeliveryMode,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            page_size: RESULTS_PER_PAGE,
            tracking_enabled: true,
            delivery_mode: DeliveryMode::Background,
        }
    }
}

impl SimConfig {
    /// Applies environment overrides on top of file or default values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint.trim().to_string();
            }
        }
        if let Ok(value) = env::var(TRACKING_ENABLED_ENV) {
            self.tracking_enabled = parse_flag(&value);
        }
        if self.page_size == 0 {
            self.page_size = RESULTS_PER_PAGE;
        }
        self
    }
}

/// Returns the searchsim home directory (~/.searchsim).
pub fn get_searchsim_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".searchsim"))
}

/// Returns the path to the simulation config file.
pub fn get_sim_config_path() -> Option<PathBuf> {
    get_searchsim_dir().map(|d| d.join("config.json"))
}

/// Returns the storage directory for one simulated browser tab.
pub fn get_tab_dir(tab_id: &str) -> Option<PathBuf> {
    get_searchsim_dir().map(|d| d.join("tabs").join(tab_id))
}

/// Loads the simulation config, returning defaults if the file doesn't exist
/// or can't be parsed.
pub fn load_sim_config() -> SimConfig {
    let loaded = match get_sim_config_path() {
        Some(path) if path.exists() => load_sim_config_from(&path).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Ignoring unreadable simulation config");
            SimConfig::default()
        }),
        _ => SimConfig::default(),
    };
    loaded.with_env_overrides()
}

/// Loads a config file strictly; malformed content is an error.
pub fn load_sim_config_from(path: &Path) -> Result<SimConfig> {
    let content = fs::read_to_string(path).map_err(|source| SimError::Io {
        context: format!("reading {}", path.display()),
        source,
    })?;
    serde_json::from_str(&content).map_err(|err| SimError::ConfigMalformed {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

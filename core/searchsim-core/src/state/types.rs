//! Navigation state types: the view snapshot, tabs, and the history payload.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_TAB_LABEL: &str = "All";

// -----------------------------------------------------------------------------
// Tab labels
//
// All            -> pass-through (default, omitted from URLs)
// Videos         -> pass-through
// Images         -> pass-through
// News           -> pass-through
// Short videos   -> pass-through
// Shopping       -> pass-through
// anything else  -> platform filter, exact match on SimResult::platform
// -----------------------------------------------------------------------------

/// The filter dimension applied to results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tab {
    #[default]
    All,
    Videos,
    Images,
    News,
    ShortVideos,
    Shopping,
    Platform(String),
}

impl Tab {
    /// Parses a tab label. Blank labels mean the default tab.
    pub fn from_label(label: &str) -> Self {
        match label {
            "" | "All" => Tab::All,
            "Videos" => Tab::Videos,
            "Images" => Tab::Images,
            "News" => Tab::News,
            "Short videos" => Tab::ShortVideos,
            "Shopping" => Tab::Shopping,
            other => Tab::Platform(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Tab::All => DEFAULT_TAB_LABEL,
            Tab::Videos => "Videos",
            Tab::Images => "Images",
            Tab::News => "News",
            Tab::ShortVideos => "Short videos",
            Tab::Shopping => "Shopping",
            Tab::Platform(name) => name,
        }
    }

    /// Pass-through tabs always draw from the unfiltered result set.
    pub fn is_pass_through(&self) -> bool {
        !matches!(self, Tab::Platform(_))
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Tab::All)
    }

    pub fn platform(&self) -> Option<&str> {
        match self {
            Tab::Platform(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Tab {
    fn from(label: String) -> Self {
        Tab::from_label(&label)
    }
}

impl From<Tab> for String {
    fn from(tab: Tab) -> Self {
        tab.label().to_string()
    }
}

/// The authoritative navigation snapshot.
///
/// Only `Transition::apply` produces new values, which keeps `current_page`
/// inside `[1, total_pages]` for the active tab and `selected_result_id`
/// pointing at an existing result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub search_query: String,
    pub active_tab: Tab,
    pub current_page: u32,
    pub selected_result_id: Option<String>,
}

impl ViewState {
    pub fn new(search_query: impl Into<String>) -> Self {
        Self {
            search_query: search_query.into(),
            active_tab: Tab::All,
            current_page: 1,
            selected_result_id: None,
        }
    }
}

/// Structured payload attached to each pushed navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub page: u32,
    pub tab: String,
    pub result_id: Option<String>,
}

impl HistoryEntry {
    pub fn from_state(state: &ViewState) -> Self {
        Self {
            page: state.current_page,
            tab: state.active_tab.label().to_string(),
            result_id: state.selected_result_id.clone(),
        }
    }
}

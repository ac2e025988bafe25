//! Navigation State
//!
//! Keeps the in-memory view (query, tab, page, selected result) and the
//! browser-visible URL/history in agreement.
//!
//! ```text
//! user action → Transition → ViewState → HistorySync::reconcile → push (if URL differs)
//! back/forward → NavEntry → HistorySync::restore_transition → Transition → ViewState
//!              → HistorySync::canonicalize_current → replace (if URL differs)
//! ```
//!
//! # Module Structure
//!
//! - [`types`]: `ViewState`, `Tab`, and the `HistoryEntry` payload
//! - [`transition`]: the transition set and its clamping/resolution rules
//! - [`query`]: canonical query encoding and tolerant decoding
//! - [`history`]: the navigation stack and reconciliation
//!
//! Nothing in this module fails. Manually edited URLs are clamped or
//! resolved to defaults, and unresolvable result ids become "no selection".

mod history;
mod query;
mod transition;
pub(crate) mod types;

pub use history::{HistorySync, NavEntry, NavigationStack};
pub use query::{
    canonical_query, normalize_query, UrlParams, PAGE_PARAM, RESULT_PARAM, TAB_PARAM,
};
pub use transition::{NavContext, Transition};
pub use types::{HistoryEntry, Tab, ViewState, DEFAULT_TAB_LABEL};

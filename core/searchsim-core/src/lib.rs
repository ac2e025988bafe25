//! # searchsim-core
//!
//! Core library for searchsim: a persona-scoped simulated search results page
//! whose every interaction is reported to a tracking sink.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Tracking sends run on
//!   worker threads, never on the caller's; the client joins them on drop.
//! - **Single-threaded state**: `ViewState` and the session id live on the
//!   thread that owns the [`SimulationEngine`]; nothing locks them.
//! - **Graceful degradation**: Bad URLs are clamped, unknown ids are
//!   dropped, failed tracking is logged. Navigation never errors.
//! - **Single source of truth**: Wire types come from
//!   `searchsim-tracking-protocol`, shared with the sink.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use searchsim_core::{Dataset, SimulationEngine, TrackingClient, UserAction};
//!
//! let dataset = Dataset::load(path)?;
//! let config = searchsim_core::load_sim_config();
//! let tracker = TrackingClient::from_config(&dataset.persona, session, &config);
//! let mut engine = SimulationEngine::mount(dataset, "?tab=LinkedIn", tracker, &config);
//! engine.dispatch(UserAction::NextPage);
//! ```

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod projector;
pub mod state;
pub mod tracking;

pub use config::*;
pub use dataset::{Dataset, SimResult};
pub use engine::{Dispatched, Effect, PageView, SimulationEngine, UserAction};
pub use error::{Result, SimError, TransportError};
pub use projector::{page_tokens, PageToken, Projection, MAX_VISIBLE_PAGES, RESULTS_PER_PAGE};
pub use state::{HistoryEntry, HistorySync, NavEntry, Tab, Transition, UrlParams, ViewState};
pub use tracking::{
    generate_session_id, DeliveryMode, EventDraft, HttpTransport, MemoryTransport, SessionStore,
    TrackingClient, Transport, SESSION_FILE_NAME,
};

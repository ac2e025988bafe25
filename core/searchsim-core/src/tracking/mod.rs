//! Tracking dispatch.
//!
//! ```text
//! adapter (track_*) → EventDraft → emit → stamp persona/timestamp/session → Transport::send
//! ```
//!
//! Delivery is best effort. A failed send is logged and dropped; no retry,
//! no queue, and nothing flows back into navigation.

mod client;
mod session;
mod transport;

pub use client::{
    DeliveryMode, EventDraft, TrackingClient, ELEMENT_IMAGE, ELEMENT_PAGE, ELEMENT_PAGINATION,
    ELEMENT_RESULT_CARD, ELEMENT_SEARCH, ELEMENT_TAB,
};
pub use session::{generate_session_id, SessionStore, SESSION_FILE_NAME};
pub use transport::{HttpTransport, MemoryTransport, Transport};

use chrono::Utc;
use searchsim_tracking_protocol::{EventType, TrackingEvent};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::session::SessionStore;
use super::transport::{HttpTransport, Transport};
use crate::config::SimConfig;

pub const ELEMENT_RESULT_CARD: &str = "result_card";
pub const ELEMENT_IMAGE: &str = "image";
pub const ELEMENT_TAB: &str = "tab";
pub const ELEMENT_PAGINATION: &str = "pagination";
pub const ELEMENT_SEARCH: &str = "search";
pub const ELEMENT_PAGE: &str = "page";

/// Where a send runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// On a worker thread; `emit` returns before the request starts.
    /// Outstanding sends are joined by [`TrackingClient::flush`] and on drop.
    #[default]
    Background,
    /// On the caller's thread. Failures are still swallowed.
    Inline,
}

/// A tracking event before the client stamps persona, time and session.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub event_type: EventType,
    pub element_type: String,
    pub element_id: Option<String>,
    pub element_text: Option<String>,
    pub url: Option<String>,
    pub platform: Option<String>,
    pub page: Option<u32>,
    pub tab: Option<String>,
    pub search_query: Option<String>,
}

impl EventDraft {
    pub fn new(event_type: EventType, element_type: &str) -> Self {
        Self {
            event_type,
            element_type: element_type.to_string(),
            element_id: None,
            element_text: None,
            url: None,
            platform: None,
            page: None,
            tab: None,
            search_query: None,
        }
    }

    fn into_event(self, persona: &str, session_id: String) -> TrackingEvent {
        TrackingEvent {
            event_type: self.event_type,
            element_type: self.element_type,
            element_id: self.element_id,
            element_text: self.element_text,
            url: self.url,
            platform: self.platform,
            persona: persona.to_string(),
            timestamp: Utc::now(),
            session_id,
            page: self.page,
            tab: self.tab,
            search_query: self.search_query,
        }
    }
}

/// Fire-and-forget reporting of user interactions.
///
/// Every adapter builds an [`EventDraft`] and hands it to [`TrackingClient::emit`];
/// none of them does I/O itself. Nothing here returns an error: delivery
/// failures are logged and dropped.
///
/// Background sends are not abandoned when the client goes away: dropping the
/// client waits for them, bounded by the transport's own timeout.
pub struct TrackingClient {
    persona: String,
    session: Rc<SessionStore>,
    transport: Option<Arc<dyn Transport>>,
    mode: DeliveryMode,
    in_flight: RefCell<Vec<JoinHandle<()>>>,
}

impl TrackingClient {
    pub fn new(
        persona: impl Into<String>,
        session: Rc<SessionStore>,
        transport: Arc<dyn Transport>,
        mode: DeliveryMode,
    ) -> Self {
        Self {
            persona: persona.into(),
            session,
            transport: Some(transport),
            mode,
            in_flight: RefCell::new(Vec::new()),
        }
    }

    /// A client that drops every event without I/O.
    pub fn disabled(persona: impl Into<String>, session: Rc<SessionStore>) -> Self {
        Self {
            persona: persona.into(),
            session,
            transport: None,
            mode: DeliveryMode::Inline,
            in_flight: RefCell::new(Vec::new()),
        }
    }

    /// Builds an HTTP client from config. A bad endpoint disables tracking
    /// rather than failing the caller.
    pub fn from_config(
        persona: impl Into<String>,
        session: Rc<SessionStore>,
        config: &SimConfig,
    ) -> Self {
        if !config.tracking_enabled {
            tracing::info!("Tracking disabled by configuration");
            return Self::disabled(persona, session);
        }
        match HttpTransport::new(&config.endpoint) {
            Ok(transport) => {
                Self::new(persona, session, Arc::new(transport), config.delivery_mode)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Tracking endpoint invalid; tracking disabled");
                Self::disabled(persona, session)
            }
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    pub fn track_result_click(&self, result_id: &str, platform: &str, title: &str) {
        self.emit(EventDraft {
            element_id: Some(result_id.to_string()),
            element_text: Some(title.to_string()),
            platform: Some(platform.to_string()),
            ..EventDraft::new(EventType::Click, ELEMENT_RESULT_CARD)
        });
    }

    pub fn track_image_click(&self, image_id: &str, title: &str) {
        self.emit(EventDraft {
            element_id: Some(image_id.to_string()),
            element_text: Some(title.to_string()),
            ..EventDraft::new(EventType::Click, ELEMENT_IMAGE)
        });
    }

    pub fn track_tab_change(&self, tab: &str) {
        self.emit(EventDraft {
            element_text: Some(tab.to_string()),
            tab: Some(tab.to_string()),
            ..EventDraft::new(EventType::TabChange, ELEMENT_TAB)
        });
    }

    pub fn track_pagination(&self, page: u32) {
        self.emit(EventDraft {
            element_text: Some(page.to_string()),
            page: Some(page),
            ..EventDraft::new(EventType::Pagination, ELEMENT_PAGINATION)
        });
    }

    pub fn track_search(&self, query: &str) {
        self.emit(EventDraft {
            element_text: Some(query.to_string()),
            search_query: Some(query.to_string()),
            ..EventDraft::new(EventType::Search, ELEMENT_SEARCH)
        });
    }

    pub fn track_page_view(&self, page: Option<u32>, tab: Option<&str>) {
        self.emit(EventDraft {
            page,
            tab: tab.map(str::to_string),
            ..EventDraft::new(EventType::PageView, ELEMENT_PAGE)
        });
    }

    /// Stamps and dispatches one event. Returns once the send has been handed
    /// off (background) or attempted (inline); never fails.
    pub fn emit(&self, draft: EventDraft) {
        let Some(transport) = &self.transport else {
            tracing::trace!(
                event_type = draft.event_type.as_str(),
                "Tracking disabled; event dropped"
            );
            return;
        };

        let event = draft.into_event(&self.persona, self.session.get());
        match self.mode {
            DeliveryMode::Inline => deliver(transport.as_ref(), &event),
            DeliveryMode::Background => {
                let transport = Arc::clone(transport);
                let spawned = thread::Builder::new()
                    .name("searchsim-track".to_string())
                    .spawn(move || deliver(transport.as_ref(), &event));
                match spawned {
                    Ok(handle) => {
                        let mut in_flight = self.in_flight.borrow_mut();
                        in_flight.retain(|handle| !handle.is_finished());
                        in_flight.push(handle);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Failed to spawn tracking thread; event dropped")
                    }
                }
            }
        }
    }

    /// Sends still running on background threads.
    pub fn pending(&self) -> usize {
        self.in_flight
            .borrow()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Waits for every background send started so far. Failures were already
    /// logged by the sending thread.
    pub fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = self.in_flight.borrow_mut().drain(..).collect();
        if handles.is_empty() {
            return;
        }
        tracing::debug!(pending = handles.len(), "Waiting for tracking sends");
        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!("Tracking thread panicked; event dropped");
            }
        }
    }
}

impl Drop for TrackingClient {
    fn drop(&mut self) {
        self.flush();
    }
}

fn deliver(transport: &dyn Transport, event: &TrackingEvent) {
    match transport.send(event) {
        Ok(ack) => tracing::debug!(
            event_type = event.event_type.as_str(),
            inserted_id = ?ack.inserted_id,
            "Tracking event delivered"
        ),
        Err(err) => tracing::warn!(
            event_type = event.event_type.as_str(),
            error = %err,
            "Tracking event not delivered"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::MemoryTransport;

    fn inline_client(transport: Arc<MemoryTransport>) -> TrackingClient {
        TrackingClient::new(
            "greg",
            Rc::new(SessionStore::in_memory()),
            transport,
            DeliveryMode::Inline,
        )
    }

    #[test]
    fn adapters_fill_expected_fields() {
        let transport = Arc::new(MemoryTransport::new());
        let client = inline_client(transport.clone());

        client.track_result_click("li-1", "LinkedIn", "Greg Krieger - Engineer");
        client.track_tab_change("LinkedIn");
        client.track_pagination(3);
        client.track_page_view(Some(1), Some("All"));

        let events = transport.events();
        assert_eq!(events.len(), 4);

        assert_eq!(events[0].event_type, EventType::Click);
        assert_eq!(events[0].element_type, ELEMENT_RESULT_CARD);
        assert_eq!(events[0].element_id.as_deref(), Some("li-1"));
        assert_eq!(events[0].platform.as_deref(), Some("LinkedIn"));

        assert_eq!(events[1].tab.as_deref(), Some("LinkedIn"));
        assert_eq!(events[2].page, Some(3));
        assert_eq!(events[3].element_type, ELEMENT_PAGE);
        assert!(events.iter().all(|e| e.persona == "greg"));
    }

    #[test]
    fn session_id_is_shared_until_reset() {
        let transport = Arc::new(MemoryTransport::new());
        let client = inline_client(transport.clone());

        client.track_search("Greg Krieger");
        client.track_image_click("img-1", "Headshot");
        client.session().reset();
        client.track_pagination(2);

        let events = transport.events();
        assert_eq!(events[0].session_id, events[1].session_id);
        assert_ne!(events[1].session_id, events[2].session_id);
        assert!(events[0].session_id.starts_with("session_"));
    }

    #[test]
    fn failing_transport_does_not_propagate() {
        let transport = Arc::new(MemoryTransport::new());
        transport.set_failing(true);
        let client = inline_client(transport.clone());

        client.track_tab_change("Facebook");
        assert!(transport.events().is_empty());
    }

    #[test]
    fn disabled_client_drops_events() {
        let client = TrackingClient::disabled("greg", Rc::new(SessionStore::in_memory()));
        assert!(!client.is_enabled());
        client.track_search("anything");
        assert_eq!(client.session().peek(), None);
    }

    #[test]
    fn invalid_endpoint_disables_tracking() {
        let config = SimConfig {
            endpoint: "not a url".to_string(),
            ..SimConfig::default()
        };
        let client =
            TrackingClient::from_config("greg", Rc::new(SessionStore::in_memory()), &config);
        assert!(!client.is_enabled());
    }

    #[test]
    fn background_delivery_reaches_transport() {
        let transport = Arc::new(MemoryTransport::new());
        let client = TrackingClient::new(
            "greg",
            Rc::new(SessionStore::in_memory()),
            transport.clone(),
            DeliveryMode::Background,
        );
        client.track_pagination(2);
        client.flush();

        assert_eq!(transport.events().len(), 1);
        assert_eq!(client.pending(), 0);
    }

    /// Holds every send until released, so a test can observe sends in flight.
    struct GatedTransport {
        inner: MemoryTransport,
        open: std::sync::Mutex<bool>,
        opened: std::sync::Condvar,
    }

    impl GatedTransport {
        fn new() -> Self {
            Self {
                inner: MemoryTransport::new(),
                open: std::sync::Mutex::new(false),
                opened: std::sync::Condvar::new(),
            }
        }

        fn release(&self) {
            *self.open.lock().expect("gate lock") = true;
            self.opened.notify_all();
        }
    }

    impl Transport for GatedTransport {
        fn send(
            &self,
            event: &TrackingEvent,
        ) -> Result<searchsim_tracking_protocol::TrackAck, crate::error::TransportError> {
            let mut open = self.open.lock().expect("gate lock");
            while !*open {
                open = self.opened.wait(open).expect("gate wait");
            }
            drop(open);
            self.inner.send(event)
        }
    }

    #[test]
    fn dropping_client_waits_for_background_sends() {
        let transport = Arc::new(GatedTransport::new());
        let client = TrackingClient::new(
            "greg",
            Rc::new(SessionStore::in_memory()),
            transport.clone(),
            DeliveryMode::Background,
        );
        client.track_search("Greg Krieger");
        client.track_pagination(2);
        client.track_tab_change("LinkedIn");
        assert_eq!(client.pending(), 3);
        assert!(transport.inner.events().is_empty());

        let releaser = {
            let transport = Arc::clone(&transport);
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(50));
                transport.release();
            })
        };
        drop(client);

        assert_eq!(transport.inner.events().len(), 3);
        releaser.join().expect("releaser");
    }
}

//! Delivery of a single tracking event to the sink.

use reqwest::blocking::Client;
use searchsim_tracking_protocol::{TrackAck, TrackingEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use url::Url;

use crate::error::{SimError, TransportError};

/// Sends one event and reports what the sink said.
///
/// Implementations are called from background threads, so they must be
/// `Send + Sync`. One call is one attempt; retrying is not a transport concern.
pub trait Transport: Send + Sync {
    fn send(&self, event: &TrackingEvent) -> Result<TrackAck, TransportError>;
}

/// `POST <endpoint>` with the event as a JSON body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Result<Self, SimError> {
        let invalid = |reason: String| SimError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let endpoint_url = Url::parse(endpoint).map_err(|err| invalid(err.to_string()))?;
        if !matches!(endpoint_url.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "unsupported scheme {}",
                endpoint_url.scheme()
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("searchsim/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| invalid(format!("failed to build HTTP client: {}", err)))?;

        Ok(Self {
            client,
            endpoint: endpoint_url,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn send(&self, event: &TrackingEvent) -> Result<TrackAck, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(event)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<TrackAck>()
            .map_err(|err| TransportError::BadResponse(err.to_string()))
    }
}

/// Keeps events in memory instead of sending them.
///
/// Used for dry runs and tests. `set_failing(true)` makes every send fail the
/// way an unreachable sink would, without recording the event.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    events: Mutex<Vec<TrackingEvent>>,
    failing: AtomicBool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<TrackingEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<TrackingEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl Transport for MemoryTransport {
    fn send(&self, event: &TrackingEvent) -> Result<TrackAck, TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable(
                "memory transport set to fail".to_string(),
            ));
        }
        let mut events = self
            .events
            .lock()
            .map_err(|_| TransportError::Unavailable("event buffer poisoned".to_string()))?;
        events.push(event.clone());
        Ok(TrackAck::inserted(events.len().to_string()))
    }
}

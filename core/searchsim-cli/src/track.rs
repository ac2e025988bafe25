//! `searchsim track`: send one hand-built event to the sink.
//!
//! Useful for checking a sink deployment. The event goes through the same
//! transport the browser simulation uses, inline, and the sink's reply is
//! printed.

use chrono::Utc;
use searchsim_core::{generate_session_id, load_sim_config, HttpTransport, Transport};
use searchsim_tracking_protocol::{EventType, TrackingEvent};

pub struct TrackOptions {
    pub event_type: String,
    pub persona: String,
    pub element_type: String,
    pub element_id: Option<String>,
    pub element_text: Option<String>,
    pub url: Option<String>,
    pub platform: Option<String>,
    pub page: Option<u32>,
    pub tab: Option<String>,
    pub search_query: Option<String>,
    pub session_id: Option<String>,
    pub endpoint: Option<String>,
}

pub fn run(options: TrackOptions) -> Result<String, String> {
    let event_type = EventType::parse(&options.event_type)
        .ok_or_else(|| format!("Unknown event type: {}", options.event_type))?;

    let endpoint = options
        .endpoint
        .clone()
        .unwrap_or_else(|| load_sim_config().endpoint);
    let transport = HttpTransport::new(&endpoint)?;

    let event = build_event(event_type, options);
    event
        .validate()
        .map_err(|info| format!("Invalid event: {}", info.message))?;

    tracing::debug!(endpoint = %endpoint, event_type = event_type.as_str(), "Sending event");
    let ack = transport.send(&event).map_err(|err| err.to_string())?;
    Ok(format!(
        "stored {} as {}",
        event_type.as_str(),
        ack.inserted_id.as_deref().unwrap_or("?")
    ))
}

fn build_event(event_type: EventType, options: TrackOptions) -> TrackingEvent {
    TrackingEvent {
        event_type,
        element_type: options.element_type,
        element_id: options.element_id,
        element_text: options.element_text,
        url: options.url,
        platform: options.platform,
        persona: options.persona,
        timestamp: Utc::now(),
        session_id: options.session_id.unwrap_or_else(generate_session_id),
        page: options.page,
        tab: options.tab,
        search_query: options.search_query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(event_type: &str) -> TrackOptions {
        TrackOptions {
            event_type: event_type.to_string(),
            persona: "greg".to_string(),
            element_type: "tab".to_string(),
            element_id: None,
            element_text: None,
            url: None,
            platform: None,
            page: None,
            tab: Some("LinkedIn".to_string()),
            search_query: None,
            session_id: None,
            endpoint: Some("http://127.0.0.1:9/track".to_string()),
        }
    }

    #[test]
    fn build_event_stamps_session_when_missing() {
        let event = build_event(EventType::TabChange, options("tab_change"));
        assert!(event.session_id.starts_with("session_"));
        assert_eq!(event.tab.as_deref(), Some("LinkedIn"));
        assert!(event.validate().is_ok());
    }

    #[test]
    fn unknown_event_type_is_rejected_before_sending() {
        let err = run(options("hover")).err().expect("unknown type");
        assert!(err.contains("Unknown event type"));
    }

    #[test]
    fn invalid_endpoint_is_reported() {
        let mut opts = options("click");
        opts.endpoint = Some("not a url".to_string());
        let err = run(opts).err().expect("bad endpoint");
        assert!(err.contains("Invalid tracking endpoint"));
    }
}

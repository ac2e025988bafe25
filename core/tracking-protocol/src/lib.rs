//! Wire types and validation for the searchsim tracking endpoint.
//!
//! This crate is shared by the tracking client and the sink to prevent schema
//! drift. The sink remains the authority on validation, but clients reuse the
//! same types to construct valid events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TRACK_PATH: &str = "/track";
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024; // 1MB

pub const CODE_MISSING_FIELD: &str = "missing_field";
pub const CODE_INVALID_PARAMS: &str = "invalid_params";
pub const CODE_INVALID_EVENT_TYPE: &str = "invalid_event_type";
pub const CODE_STORAGE_ERROR: &str = "storage_error";
pub const CODE_METHOD_NOT_ALLOWED: &str = "method_not_allowed";
pub const CODE_PAYLOAD_TOO_LARGE: &str = "payload_too_large";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Click,
    Search,
    PageView,
    TabChange,
    Pagination,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::Search => "search",
            EventType::PageView => "page_view",
            EventType::TabChange => "tab_change",
            EventType::Pagination => "pagination",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "click" => Some(EventType::Click),
            "search" => Some(EventType::Search),
            "page_view" => Some(EventType::PageView),
            "tab_change" => Some(EventType::TabChange),
            "pagination" => Some(EventType::Pagination),
            _ => None,
        }
    }
}

/// One tracked interaction, as posted to the sink.
///
/// `timestamp` and `session_id` are stamped by the emitting client; callers
/// never supply them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub event_type: EventType,
    #[serde(default)]
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default)]
    pub persona: String,
    #[serde(default = "chrono::Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

impl TrackingEvent {
    pub fn validate(&self) -> Result<(), ErrorInfo> {
        if self.persona.trim().is_empty() {
            return Err(ErrorInfo::new(CODE_MISSING_FIELD, "persona is required"));
        }
        if self.page == Some(0) {
            return Err(ErrorInfo::new(
                CODE_INVALID_PARAMS,
                "page must be a positive integer",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Successful ingestion acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted_id: Option<String>,
}

impl TrackAck {
    pub fn inserted(id: impl Into<String>) -> Self {
        Self {
            success: true,
            inserted_id: Some(id.into()),
        }
    }
}

/// Body of every non-2xx response from the sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<Value>,
}

impl ErrorBody {
    pub fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.to_string(),
            received: None,
        }
    }

    pub fn with_received(mut self, received: Value) -> Self {
        self.received = Some(received);
        self
    }
}

impl From<ErrorInfo> for ErrorBody {
    fn from(info: ErrorInfo) -> Self {
        ErrorBody::new(&info.code, info.message)
    }
}

/// Summary row returned by the sink's recent-events query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentEvent {
    pub id: String,
    pub event_type: String,
    pub persona: String,
    pub timestamp: String,
    pub created_at: String,
}

/// Parses and validates a raw request body.
///
/// `eventType` and `persona` must be present before anything else is checked;
/// their absence is reported as a single "Missing required fields" error.
pub fn parse_event(body: Value) -> Result<TrackingEvent, ErrorInfo> {
    let object = body
        .as_object()
        .ok_or_else(|| ErrorInfo::new(CODE_INVALID_PARAMS, "event payload must be an object"))?;

    let event_type = non_empty_str(object.get("eventType"));
    let persona = non_empty_str(object.get("persona"));
    if event_type.is_none() || persona.is_none() {
        return Err(ErrorInfo::new(CODE_MISSING_FIELD, "Missing required fields"));
    }

    if let Some(value) = event_type {
        if EventType::parse(value).is_none() {
            return Err(ErrorInfo::new(
                CODE_INVALID_EVENT_TYPE,
                format!("unknown eventType: {}", value),
            ));
        }
    }

    let event: TrackingEvent = serde_json::from_value(body).map_err(|err| {
        ErrorInfo::new(
            CODE_INVALID_PARAMS,
            format!("event payload is invalid: {}", err),
        )
    })?;
    event.validate()?;
    Ok(event)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|candidate| !candidate.trim().is_empty())
}

//! HTTP surface of the sink.
//!
//! - `POST /track` (+ `OPTIONS` preflight; anything else is 405)
//! - `GET /health`
//! - `GET /events/count`
//! - `GET /events/recent?limit=N`
//!
//! Status codes are accurate: 400 for payloads that fail validation, 500 when
//! the store fails. Clients are expected to ignore both.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use searchsim_tracking_protocol::{
    parse_event, ErrorBody, RecentEvent, TrackAck, TrackingEvent, CODE_INVALID_PARAMS,
    CODE_METHOD_NOT_ALLOWED, CODE_MISSING_FIELD, CODE_PAYLOAD_TOO_LARGE, CODE_STORAGE_ERROR,
    MAX_REQUEST_BYTES, TRACK_PATH,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::db::{format_timestamp, Db};

const DEFAULT_RECENT_LIMIT: usize = 5;
const MAX_RECENT_LIMIT: usize = 100;

const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    total_documents: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountResponse {
    total_documents: u64,
}

#[derive(Debug, Serialize)]
struct RecentResponse {
    events: Vec<RecentEvent>,
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<usize>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            TRACK_PATH,
            post(track).options(preflight).fallback(method_not_allowed),
        )
        .route("/health", get(health))
        .route("/events/count", get(count))
        .route("/events/recent", get(recent))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .with_state(state)
}

async fn preflight() -> Response {
    (StatusCode::OK, CORS_HEADERS).into_response()
}

async fn method_not_allowed() -> Response {
    reject(
        StatusCode::METHOD_NOT_ALLOWED,
        ErrorBody::new(CODE_METHOD_NOT_ALLOWED, "Method not allowed"),
    )
}

async fn track(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return unreadable_body(rejection),
    };

    let raw: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "Rejected tracking request with unreadable body");
            return reject(
                StatusCode::BAD_REQUEST,
                ErrorBody::new(CODE_INVALID_PARAMS, format!("invalid JSON body: {}", err)),
            );
        }
    };

    let event = match parse_event(raw.clone()) {
        Ok(event) => event,
        Err(info) => {
            warn!(code = %info.code, message = %info.message, "Rejected tracking event");
            let missing = info.code == CODE_MISSING_FIELD;
            let mut body = ErrorBody::from(info);
            if missing {
                body = body.with_received(raw);
            }
            return reject(StatusCode::BAD_REQUEST, body);
        }
    };

    let created_at = Utc::now();
    let event_type = event.event_type.as_str();
    let document = build_document(raw, &event, created_at);
    let db = Arc::clone(&state.db);
    let stored = tokio::task::spawn_blocking(move || db.insert_event(&event, &document, created_at))
        .await
        .map_err(|err| format!("Storage task failed: {}", err))
        .and_then(|result| result);

    match stored {
        Ok(inserted_id) => {
            debug!(event_type, inserted_id = %inserted_id, "Tracking event stored");
            (StatusCode::OK, CORS_HEADERS, Json(TrackAck::inserted(inserted_id))).into_response()
        }
        Err(err) => {
            error!(event_type, error = %err, "Failed to store tracking event");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new(CODE_STORAGE_ERROR, "Failed to store event"),
            )
        }
    }
}

async fn health(State(state): State<AppState>) -> Response {
    match total_documents(&state).await {
        Ok(total_documents) => Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            total_documents,
        })
        .into_response(),
        Err(err) => {
            error!(error = %err, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody::new(CODE_STORAGE_ERROR, err)),
            )
                .into_response()
        }
    }
}

async fn count(State(state): State<AppState>) -> Response {
    match total_documents(&state).await {
        Ok(total_documents) => Json(CountResponse { total_documents }).into_response(),
        Err(err) => {
            error!(error = %err, "Failed to count events");
            storage_failure(err)
        }
    }
}

async fn recent(State(state): State<AppState>, Query(query): Query<RecentQuery>) -> Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    let db = Arc::clone(&state.db);
    let events = tokio::task::spawn_blocking(move || db.recent_events(limit))
        .await
        .map_err(|err| format!("Storage task failed: {}", err))
        .and_then(|result| result);

    match events {
        Ok(events) => Json(RecentResponse { events }).into_response(),
        Err(err) => {
            error!(error = %err, "Failed to list recent events");
            storage_failure(err)
        }
    }
}

async fn total_documents(state: &AppState) -> Result<u64, String> {
    let db = Arc::clone(&state.db);
    tokio::task::spawn_blocking(move || db.count_events())
        .await
        .map_err(|err| format!("Storage task failed: {}", err))
        .and_then(|result| result)
}

/// The stored document: everything the client sent, with the timestamp
/// normalized and the receive time added.
fn build_document(raw: Value, event: &TrackingEvent, created_at: DateTime<Utc>) -> Value {
    let mut document = match raw {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    document.insert(
        "timestamp".to_string(),
        Value::String(format_timestamp(event.timestamp)),
    );
    document.insert(
        "createdAt".to_string(),
        Value::String(format_timestamp(created_at)),
    );
    Value::Object(document)
}

/// Body extraction failures (over the size limit, broken stream) still answer
/// with the `/track` CORS headers.
fn unreadable_body(rejection: BytesRejection) -> Response {
    let status = rejection.status();
    let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
        CODE_PAYLOAD_TOO_LARGE
    } else {
        CODE_INVALID_PARAMS
    };
    warn!(
        status = status.as_u16(),
        error = %rejection.body_text(),
        "Rejected tracking request body"
    );
    reject(status, ErrorBody::new(code, rejection.body_text()))
}

fn reject(status: StatusCode, body: ErrorBody) -> Response {
    (status, CORS_HEADERS, Json(body)).into_response()
}

fn storage_failure(err: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new(CODE_STORAGE_ERROR, err)),
    )
        .into_response()
}

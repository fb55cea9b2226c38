//! Stub save endpoint
//!
//! `POST /api/save` accepts a JSON document and acknowledges it. Nothing is
//! stored. Body parsing yields `Result<Value, SaveError>`, which
//! [`handle_save`] maps onto a status code and JSON envelope.

use std::fmt::Display;
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, CONTENT_LENGTH};
use hyper::{Request, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::config::AppState;
use crate::http;
use crate::logger;

pub const SAVE_PATH: &str = "/api/save";

/// Why a save request body could not be accepted
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("missing Content-Length header")]
    MissingContentLength,

    #[error("invalid Content-Length header: '{value}'")]
    InvalidContentLength { value: String },

    #[error("request body of {size} bytes exceeds the limit of {max} bytes")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("failed to read request body: {reason}")]
    BodyRead { reason: String },

    #[error("request body ended after {received} of {expected} bytes")]
    IncompleteBody { expected: u64, received: usize },

    #[error("timed out after {secs}s reading request body")]
    ReadTimeout { secs: u64 },

    #[error("request body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl SaveError {
    pub fn invalid_content_length<S: ToString>(value: S) -> Self {
        Self::InvalidContentLength {
            value: value.to_string(),
        }
    }

    pub fn body_read<S: ToString>(reason: S) -> Self {
        Self::BodyRead {
            reason: reason.to_string(),
        }
    }
}

/// Parse the `Content-Length` header as a byte count
pub fn parse_content_length(headers: &HeaderMap) -> Result<u64, SaveError> {
    let value = headers
        .get(CONTENT_LENGTH)
        .ok_or(SaveError::MissingContentLength)?;
    let text = value
        .to_str()
        .map_err(|_| SaveError::invalid_content_length(String::from_utf8_lossy(value.as_bytes())))?;
    parse_length_value(text).ok_or_else(|| SaveError::invalid_content_length(text))
}

/// Parse a raw `Content-Length` value.
///
/// Only ASCII digits are accepted. A comma-separated list is accepted when
/// every entry carries the same length.
pub fn parse_length_value(text: &str) -> Option<u64> {
    let mut length = None;
    for part in text.split(',').map(str::trim) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value = part.parse::<u64>().ok()?;
        match length {
            Some(seen) if seen != value => return None,
            _ => length = Some(value),
        }
    }
    length
}

/// Read exactly `Content-Length` bytes and parse them as UTF-8 JSON
pub async fn read_payload<B>(
    headers: &HeaderMap,
    body: B,
    max_body_size: u64,
    read_timeout: Duration,
) -> Result<Value, SaveError>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let expected = parse_content_length(headers)?;
    if expected > max_body_size {
        return Err(SaveError::PayloadTooLarge {
            size: expected,
            max: max_body_size,
        });
    }

    let collected = tokio::time::timeout(read_timeout, body.collect())
        .await
        .map_err(|_| SaveError::ReadTimeout {
            secs: read_timeout.as_secs(),
        })?
        .map_err(SaveError::body_read)?
        .to_bytes();

    // expected <= max_body_size, which came from a u64 that fits in memory
    let wanted = usize::try_from(expected).unwrap_or(usize::MAX);
    if collected.len() < wanted {
        return Err(SaveError::IncompleteBody {
            expected,
            received: collected.len(),
        });
    }

    let text = std::str::from_utf8(&collected[..wanted])?;
    Ok(serde_json::from_str(text)?)
}

/// Handle `POST /api/save`
pub async fn handle_save<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let (parts, body) = req.into_parts();
    let read_timeout = Duration::from_secs(state.config.performance.read_timeout);

    match read_payload(
        &parts.headers,
        body,
        state.config.http.max_body_size,
        read_timeout,
    )
    .await
    {
        Ok(_payload) => {
            http::build_json_response(StatusCode::OK, &serde_json::json!({"status": "success"}))
        }
        Err(e) => {
            logger::log_warning(&format!("Rejected {SAVE_PATH} payload: {e}"));
            http::build_json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &serde_json::json!({"error": e.to_string()}),
            )
        }
    }
}

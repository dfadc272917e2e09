//! Bounded JSON decoding, encoding and error envelopes
//!
//! Decoding is strict: a body larger than the limit, a body holding more
//! than one value, or a body with keys the target type does not declare is
//! rejected with a distinct [`ToolkitError`] kind, each with a message fit
//! for the client. Undeclared keys can be let through with
//! [`decode_json_with`] / [`read_json_with`].
//!
//! # Examples
//!
//! ```rust
//! use serde::Deserialize;
//! use toolkit::{error::ToolkitError, json::decode_json};
//!
//! #[derive(Debug, Deserialize)]
//! struct Ping {
//!     message: String,
//! }
//!
//! let ping: Ping = decode_json(br#"{"message":"hi"}"#, 1024).unwrap();
//! assert_eq!(ping.message, "hi");
//!
//! let err = decode_json::<Ping>(br#"{"message":"hi","extra":1}"#, 1024).unwrap_err();
//! assert!(matches!(err, ToolkitError::UnknownField(_)));
//! ```

use crate::error::{ToolkitError, ToolkitResult};
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::error::Category;
use std::fmt::Display;

/// Default ceiling for JSON request bodies (1 MiB)
pub const DEFAULT_MAX_JSON_BYTES: usize = 1024 * 1024;

/// Uniform `{success, message, data}` response body
///
/// `data` is left out of the JSON entirely when it is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonEnvelope<T> {
    /// Whether the operation succeeded
    pub success: bool,

    /// Human readable outcome
    pub message: String,

    /// Optional payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> JsonEnvelope<T> {
    /// Successful envelope carrying `data`
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Failed envelope without data
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Reads a request body of at most `max_bytes` and decodes it into `T`
///
/// The body is never buffered past the limit. A body stream that fails
/// before completion yields [`ToolkitError::RequestAborted`]. Keys `T` does
/// not declare are rejected.
pub async fn read_json<T: DeserializeOwned>(body: Body, max_bytes: usize) -> ToolkitResult<T> {
    read_json_with(body, max_bytes, false).await
}

/// [`read_json`], optionally ignoring keys `T` does not declare
pub async fn read_json_with<T: DeserializeOwned>(
    body: Body,
    max_bytes: usize,
    allow_unknown_fields: bool,
) -> ToolkitResult<T> {
    let bytes = match Limited::new(body, max_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(ToolkitError::PayloadTooLarge { limit: max_bytes });
        }
        Err(e) => {
            tracing::debug!(error = %e, "JSON body failed while reading");
            return Err(ToolkitError::RequestAborted);
        }
    };

    decode_json_with(&bytes, max_bytes, allow_unknown_fields)
}

/// Decodes exactly one JSON value from `bytes`
///
/// # Errors
///
/// - [`ToolkitError::PayloadTooLarge`] when `bytes` is longer than `max_bytes`
/// - [`ToolkitError::MalformedJson`] for empty input, bad syntax, truncation
///   or a type mismatch
/// - [`ToolkitError::UnknownField`] for keys the target does not declare,
///   at any nesting depth
/// - [`ToolkitError::MultipleJsonValues`] for anything but whitespace after
///   the first value
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8], max_bytes: usize) -> ToolkitResult<T> {
    decode_json_with(bytes, max_bytes, false)
}

/// [`decode_json`], optionally ignoring keys `T` does not declare
pub fn decode_json_with<T: DeserializeOwned>(
    bytes: &[u8],
    max_bytes: usize,
    allow_unknown_fields: bool,
) -> ToolkitResult<T> {
    if bytes.len() > max_bytes {
        return Err(ToolkitError::PayloadTooLarge { limit: max_bytes });
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ToolkitError::MalformedJson("body must not be empty".to_string()));
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let mut unknown: Option<String> = None;
    let value: T = serde_ignored::deserialize(&mut de, |path| {
        if unknown.is_none() {
            unknown = Some(path.to_string());
        }
    })
    .map_err(classify)?;
    de.end().map_err(|_| ToolkitError::MultipleJsonValues)?;

    match unknown {
        Some(path) if !allow_unknown_fields => {
            Err(ToolkitError::UnknownField(format!("\"{path}\"")))
        }
        _ => Ok(value),
    }
}

fn classify(err: serde_json::Error) -> ToolkitError {
    match err.classify() {
        Category::Syntax => ToolkitError::MalformedJson(format!(
            "body contains badly-formed JSON (at line {} column {})",
            err.line(),
            err.column()
        )),
        Category::Eof => {
            ToolkitError::MalformedJson("body contains badly-formed JSON".to_string())
        }
        Category::Data => {
            let message = err.to_string();
            match unknown_field_name(&message) {
                Some(name) => ToolkitError::UnknownField(format!("\"{name}\"")),
                None => ToolkitError::MalformedJson(format!(
                    "body contains incorrect JSON type: {message}"
                )),
            }
        }
        Category::Io => ToolkitError::MalformedJson(err.to_string()),
    }
}

// Targets with deny_unknown_fields fail inside serde instead:
// "unknown field `name`, expected ...".
fn unknown_field_name(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("unknown field `")?;
    rest.split_once('`').map(|(name, _)| name)
}

/// Serializes `payload` into a JSON response with the given status
///
/// Extra `headers` are copied onto the response; `Content-Type` is always
/// `application/json`.
///
/// # Examples
///
/// ```rust
/// use axum::http::StatusCode;
/// use toolkit::json::write_json;
///
/// let response = write_json(StatusCode::ACCEPTED, &serde_json::json!({"message": "OK"}), None).unwrap();
/// assert_eq!(response.status(), StatusCode::ACCEPTED);
/// assert_eq!(response.headers()["content-type"], "application/json");
/// ```
pub fn write_json<T: Serialize + ?Sized>(
    status: StatusCode,
    payload: &T,
    headers: Option<HeaderMap>,
) -> ToolkitResult<Response> {
    let body = serde_json::to_vec(payload).map_err(ToolkitError::Encode)?;

    let mut response = (status, body).into_response();
    if let Some(extra) = headers {
        response.headers_mut().extend(extra);
    }
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(response)
}

/// Failure envelope carrying `err`'s message, with status 400 unless given
pub fn error_json(err: &impl Display, status: Option<StatusCode>) -> Response {
    let status = status.unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(JsonEnvelope::<()>::failure(err.to_string()))).into_response()
}

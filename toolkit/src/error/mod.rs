//! Error types and error handling
//!
//! Every fallible operation in the crate returns [`ToolkitResult`]. Nothing is
//! retried internally; the caller decides what to do with each kind.
//!
//! [`ToolkitError`] implements [`IntoResponse`], so a handler can return it
//! as-is. The body is a [`JsonEnvelope`] carrying the error message. Server-side
//! failures (5xx) carry a generic message instead, so filesystem details never
//! reach an untrusted client.

use crate::json::JsonEnvelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Toolkit error type
#[derive(Debug, Error)]
pub enum ToolkitError {
    /// An uploaded file is larger than the policy allows
    #[error("file {filename} exceeds the maximum upload size of {limit} bytes")]
    FileTooLarge {
        /// Client-supplied file name
        filename: String,
        /// Maximum allowed size in bytes
        limit: u64,
    },

    /// The sniffed content type of an upload is not in the allowed set
    #[error("file {filename} has unsupported type {detected}")]
    UnsupportedFileType {
        /// Client-supplied file name
        filename: String,
        /// Content type detected from the file's leading bytes
        detected: String,
    },

    /// A single-file upload found no file part
    #[error("no file found in upload")]
    MissingFile,

    /// A file name cannot be placed safely under the destination directory
    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    /// The destination file already exists and overwriting is not allowed
    #[error("file {0} already exists")]
    FileExists(String),

    /// The request body is not a valid multipart form
    #[error("malformed multipart body: {0}")]
    MalformedMultipart(String),

    /// The request body stream failed before the upload completed
    #[error("request body ended before the upload completed")]
    RequestAborted,

    /// A JSON body is larger than the configured ceiling
    #[error("body must not be larger than {limit} bytes")]
    PayloadTooLarge {
        /// Maximum allowed size in bytes
        limit: usize,
    },

    /// A JSON body is empty, badly formed, or has the wrong shape
    #[error("{0}")]
    MalformedJson(String),

    /// A JSON body contains a field the target type does not declare
    #[error("body contains unknown key {0}")]
    UnknownField(String),

    /// A JSON body holds more than one top-level value
    #[error("body must contain only one JSON value")]
    MultipleJsonValues,

    /// A payload could not be serialized to JSON
    #[error("error encoding JSON: {0}")]
    Encode(#[source] serde_json::Error),

    /// The remote JSON peer could not be reached
    #[error("remote service is unreachable: {reason}")]
    RemoteUnreachable {
        /// Target URL
        url: String,
        /// Transport-level failure description
        reason: String,
    },

    /// The remote JSON peer answered with a non-2xx status
    #[error("remote service responded with status {status}")]
    RemoteRejected {
        /// Status code returned by the peer
        status: StatusCode,
    },

    /// The outbound HTTP client could not be built
    #[error("cannot build HTTP client: {0}")]
    HttpClient(String),

    /// The remote JSON peer answered 2xx with a body that does not decode
    #[error("remote service returned an invalid response: {0}")]
    RemoteResponseInvalid(String),

    /// Slug generation removed every character of the input
    #[error("slug is empty after removing disallowed characters")]
    EmptySlug,

    /// A requested file does not exist
    #[error("file not found: {0}")]
    NotFound(String),

    /// The operating system randomness source failed
    #[error("randomness source unavailable: {0}")]
    RandomSource(String),

    /// Directory creation, file creation or copy failure
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for toolkit operations
pub type ToolkitResult<T> = Result<T, ToolkitError>;

impl ToolkitError {
    /// HTTP status a handler should answer with for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::FileTooLarge { .. } | Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedFileType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::MissingFile
            | Self::InvalidFileName(_)
            | Self::MalformedMultipart(_)
            | Self::RequestAborted
            | Self::MalformedJson(_)
            | Self::UnknownField(_)
            | Self::MultipleJsonValues
            | Self::EmptySlug => StatusCode::BAD_REQUEST,
            Self::FileExists(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RemoteUnreachable { .. }
            | Self::RemoteRejected { .. }
            | Self::RemoteResponseInvalid(_) => StatusCode::BAD_GATEWAY,
            Self::Encode(_) | Self::HttpClient(_) | Self::RandomSource(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message that is safe to show to an untrusted client
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() && !self.is_remote() {
            "internal server error".to_string()
        } else {
            self.to_string()
        }
    }

    const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnreachable { .. } | Self::RemoteRejected { .. } | Self::RemoteResponseInvalid(_)
        )
    }
}

impl IntoResponse for ToolkitError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let envelope = JsonEnvelope::<()>::failure(self.public_message());
        (status, axum::Json(envelope)).into_response()
    }
}

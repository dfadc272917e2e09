//! Outbound JSON relay
//!
//! Posts a serializable payload to another service and decodes its reply.
//! Transport problems, non-2xx answers and undecodable 2xx bodies are three
//! different [`ToolkitError`] kinds, all mapping to `502 Bad Gateway`.

use crate::error::{ToolkitError, ToolkitResult};
use http::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Request timeout for the relay client unless configured otherwise
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Decoded reply of a remote JSON peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse<R> {
    /// Decoded response body
    pub body: R,

    /// Status the peer answered with (always 2xx)
    pub status: StatusCode,
}

/// Builds the HTTP client used for relaying, with a request timeout
///
/// Fails with [`ToolkitError::HttpClient`]; no request is made.
pub fn client_with_timeout(timeout: Duration) -> ToolkitResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ToolkitError::HttpClient(e.to_string()))
}

/// POSTs `payload` as JSON to `url` and decodes the reply into `R`
///
/// An empty reply body decodes as JSON `null`, so `R = ()` or `Option<_>`
/// accept peers that answer without content.
pub async fn push_json<T, R>(
    client: &reqwest::Client,
    url: &str,
    payload: &T,
) -> ToolkitResult<RemoteResponse<R>>
where
    T: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let body = serde_json::to_vec(payload).map_err(ToolkitError::Encode)?;

    tracing::debug!(url = %url, bytes = body.len(), "Pushing JSON to remote service");

    let unreachable = |e: reqwest::Error| ToolkitError::RemoteUnreachable {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let response = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(unreachable)?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url = %url, status = %status, "Remote service rejected payload");
        return Err(ToolkitError::RemoteRejected { status });
    }

    let bytes = response.bytes().await.map_err(unreachable)?;
    let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &bytes
    };
    let body = serde_json::from_slice(raw)
        .map_err(|e| ToolkitError::RemoteResponseInvalid(e.to_string()))?;

    tracing::info!(url = %url, status = %status, "Remote service accepted payload");
    Ok(RemoteResponse { body, status })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_port_is_unreachable_not_setup_failure() {
        let client = client_with_timeout(Duration::from_millis(500)).unwrap();

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = push_json::<_, serde_json::Value>(&client, &format!("http://{addr}/"), &1)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolkitError::RemoteUnreachable { ref url, .. } if !url.is_empty()));
    }
}

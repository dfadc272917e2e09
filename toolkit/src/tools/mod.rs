//! Handler-facing toolkit value
//!
//! [`Tools`] bundles the settings shared by every call (JSON size ceiling,
//! unknown-key handling and the relay HTTP client) and exposes the toolkit operations as methods. It
//! is cheap to clone and meant to live in axum state:
//!
//! ```rust
//! use axum::{extract::{Request, State}, routing::post, Router};
//! use toolkit::prelude::*;
//!
//! async fn echo(State(tools): State<Tools>, request: Request) -> ToolkitResult<axum::response::Response> {
//!     let value: serde_json::Value = tools.read_json(request.into_body()).await?;
//!     tools.write_json(axum::http::StatusCode::OK, &value, None)
//! }
//!
//! let app: Router = Router::new()
//!     .route("/echo", post(echo))
//!     .with_state(Tools::default().with_max_json_size(64 * 1024));
//! ```

use crate::{
    config::JsonSettings,
    error::ToolkitResult,
    files, json,
    json::DEFAULT_MAX_JSON_BYTES,
    naming, remote,
    remote::{RemoteResponse, DEFAULT_REMOTE_TIMEOUT},
    slug,
    upload::{self, UploadPolicy, UploadedFile},
};
use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Display, path::Path, time::Duration};

/// Shared toolkit settings plus the operations that use them
#[derive(Debug, Clone)]
pub struct Tools {
    max_json_size: usize,
    allow_unknown_fields: bool,
    client: reqwest::Client,
}

impl Default for Tools {
    fn default() -> Self {
        let client = remote::client_with_timeout(DEFAULT_REMOTE_TIMEOUT).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Relay client without request timeout");
            reqwest::Client::new()
        });

        Self {
            max_json_size: DEFAULT_MAX_JSON_BYTES,
            allow_unknown_fields: false,
            client,
        }
    }
}

#[allow(clippy::unused_self)]
impl Tools {
    /// Toolkit with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toolkit configured from the `[json]` settings section
    pub fn from_settings(settings: &JsonSettings) -> ToolkitResult<Self> {
        Ok(Self {
            max_json_size: settings.max_body_bytes,
            allow_unknown_fields: settings.allow_unknown_fields,
            client: remote::client_with_timeout(settings.remote_timeout())?,
        })
    }

    /// Sets the JSON request body ceiling
    #[must_use]
    pub const fn with_max_json_size(mut self, max_bytes: usize) -> Self {
        self.max_json_size = max_bytes;
        self
    }

    /// Lets [`Tools::read_json`] ignore keys the target type does not declare
    #[must_use]
    pub const fn with_allow_unknown_fields(mut self, allow: bool) -> Self {
        self.allow_unknown_fields = allow;
        self
    }

    /// Replaces the relay HTTP client
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Rebuilds the relay HTTP client with a request timeout
    pub fn with_timeout(self, timeout: Duration) -> ToolkitResult<Self> {
        Ok(self.with_client(remote::client_with_timeout(timeout)?))
    }

    /// JSON request body ceiling in bytes
    #[must_use]
    pub const fn max_json_size(&self) -> usize {
        self.max_json_size
    }

    /// See [`upload::upload_files`]
    pub async fn upload_files(
        &self,
        request: Request,
        dest_dir: impl AsRef<Path>,
        policy: &UploadPolicy,
        rename_output: bool,
    ) -> ToolkitResult<Vec<UploadedFile>> {
        upload::upload_files(request, dest_dir, policy, rename_output).await
    }

    /// See [`upload::upload_one_file`]
    pub async fn upload_one_file(
        &self,
        request: Request,
        dest_dir: impl AsRef<Path>,
        policy: &UploadPolicy,
        rename_output: bool,
    ) -> ToolkitResult<UploadedFile> {
        upload::upload_one_file(request, dest_dir, policy, rename_output).await
    }

    /// Decodes a JSON body no larger than [`Tools::max_json_size`]
    ///
    /// Undeclared keys fail with [`ToolkitError::UnknownField`] unless
    /// [`Tools::with_allow_unknown_fields`] was set.
    ///
    /// [`ToolkitError::UnknownField`]: crate::error::ToolkitError::UnknownField
    pub async fn read_json<T: DeserializeOwned>(&self, body: Body) -> ToolkitResult<T> {
        json::read_json_with(body, self.max_json_size, self.allow_unknown_fields).await
    }

    /// See [`json::write_json`]
    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        status: StatusCode,
        payload: &T,
        headers: Option<HeaderMap>,
    ) -> ToolkitResult<Response> {
        json::write_json(status, payload, headers)
    }

    /// See [`json::error_json`]
    pub fn error_json(&self, err: &impl Display, status: Option<StatusCode>) -> Response {
        json::error_json(err, status)
    }

    /// POSTs `payload` to `url` with the configured client
    pub async fn push_json_to_remote<T, R>(
        &self,
        url: &str,
        payload: &T,
    ) -> ToolkitResult<RemoteResponse<R>>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        remote::push_json(&self.client, url, payload).await
    }

    /// See [`files::download_static_file`]
    pub async fn download_static_file(
        &self,
        dir: impl AsRef<Path>,
        file: &str,
        display_name: &str,
    ) -> ToolkitResult<Response> {
        files::download_static_file(dir, file, display_name).await
    }

    /// See [`files::create_dir_if_not_exist`]
    pub async fn create_dir_if_not_exist(&self, path: impl AsRef<Path>) -> ToolkitResult<()> {
        files::create_dir_if_not_exist(path).await
    }

    /// See [`slug::slugify`]
    pub fn slugify(&self, text: &str) -> ToolkitResult<String> {
        slug::slugify(text)
    }

    /// See [`naming::random_string`]
    pub fn random_string(&self, n: usize) -> ToolkitResult<String> {
        naming::random_string(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let tools = Tools::default();
        assert_eq!(tools.max_json_size(), DEFAULT_MAX_JSON_BYTES);
        assert_eq!(tools.random_string(10).unwrap().len(), 10);
    }

    #[test]
    fn test_from_settings() {
        let settings = JsonSettings {
            max_body_bytes: 4096,
            ..JsonSettings::default()
        };
        let tools = Tools::from_settings(&settings).unwrap();
        assert_eq!(tools.max_json_size(), 4096);
    }

    #[tokio::test]
    async fn test_read_json_uses_configured_limit() {
        let tools = Tools::new().with_max_json_size(4);
        let err = tools
            .read_json::<serde_json::Value>(Body::from(r#"{"a":1}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::ToolkitError::PayloadTooLarge { limit: 4 }));
    }

    #[derive(Debug, serde::Deserialize)]
    struct Note {
        message: String,
    }

    #[tokio::test]
    async fn test_read_json_unknown_keys_follow_settings() {
        let body = r#"{"message":"hi","extra":true}"#;

        let err = Tools::new()
            .read_json::<Note>(Body::from(body))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::ToolkitError::UnknownField(_)));

        let settings = JsonSettings {
            allow_unknown_fields: true,
            ..JsonSettings::default()
        };
        let note: Note = Tools::from_settings(&settings)
            .unwrap()
            .read_json(Body::from(body))
            .await
            .unwrap();
        assert_eq!(note.message, "hi");
    }
}

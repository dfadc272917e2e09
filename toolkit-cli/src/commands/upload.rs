//! Upload demo server
//!
//! `POST /upload` stores every file of a multipart form, `POST /upload-one`
//! only the first. Both answer with one line per stored file.

use crate::server;
use anyhow::Result;
use axum::{
    extract::{Request, State},
    routing::post,
    Router,
};
use std::{path::PathBuf, sync::Arc};
use toolkit::{
    config::ToolkitConfig,
    error::ToolkitResult,
    tools::Tools,
    upload::{UploadPolicy, UploadedFile},
};
use tower_http::limit::RequestBodyLimitLayer;

/// Port used when neither the command line nor the config names one
pub const DEFAULT_PORT: u16 = 8080;

/// Files accepted in one request at the maximum per-file size
const MAX_FILES_PER_REQUEST: u64 = 10;

// Room for part headers and boundaries on top of the file bytes.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

#[derive(Clone)]
struct UploadState {
    tools: Tools,
    policy: Arc<UploadPolicy>,
    dir: Arc<PathBuf>,
    rename_output: bool,
}

/// Builds the upload demo router from `config`
pub fn router(config: &ToolkitConfig) -> Result<Router> {
    let policy = UploadPolicy::from(&config.upload);
    let state = UploadState {
        tools: Tools::from_settings(&config.json)?,
        dir: Arc::new(config.upload.dir.clone()),
        rename_output: config.upload.rename_output,
        policy: Arc::new(policy.clone()),
    };

    let routes = Router::new()
        .route("/upload", post(upload_files))
        .route("/upload-one", post(upload_one_file))
        .layer(RequestBodyLimitLayer::new(body_limit(&policy)))
        .with_state(state);

    Ok(server::finish_router(routes, &config.static_files.root))
}

/// Request body ceiling for the upload routes
#[must_use]
pub fn body_limit(policy: &UploadPolicy) -> usize {
    let limit = policy
        .max_file_size()
        .saturating_mul(MAX_FILES_PER_REQUEST)
        .saturating_add(MULTIPART_OVERHEAD);
    usize::try_from(limit).unwrap_or(usize::MAX)
}

async fn upload_files(State(state): State<UploadState>, request: Request) -> ToolkitResult<String> {
    tracing::info!("Uploading files");
    let files = state
        .tools
        .upload_files(request, state.dir.as_path(), &state.policy, state.rename_output)
        .await?;

    Ok(report(&files))
}

async fn upload_one_file(
    State(state): State<UploadState>,
    request: Request,
) -> ToolkitResult<String> {
    tracing::info!("Uploading one file");
    let file = state
        .tools
        .upload_one_file(request, state.dir.as_path(), &state.policy, state.rename_output)
        .await?;

    Ok(report(std::slice::from_ref(&file)))
}

fn report(files: &[UploadedFile]) -> String {
    files.iter().map(|f| format!("{}\n", f.summary())).collect()
}

/// `toolkit-demo upload`
pub struct UploadCommand {
    config: ToolkitConfig,
    port: Option<u16>,
}

impl UploadCommand {
    /// Create a new command instance
    pub const fn new(config: ToolkitConfig, port: Option<u16>) -> Self {
        Self { config, port }
    }

    /// Execute the command
    pub async fn execute(self) -> Result<()> {
        let port = self
            .port
            .or(self.config.server.port)
            .unwrap_or(DEFAULT_PORT);

        tracing::info!(
            dir = %self.config.upload.dir.display(),
            max_file_size = self.config.upload.max_file_size,
            allowed = ?self.config.upload.allowed_file_types,
            "Upload demo configured"
        );

        server::serve(router(&self.config)?, &self.config.server.host, port).await
    }
}

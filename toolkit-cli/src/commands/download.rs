//! Download demo server

use crate::server;
use anyhow::Result;
use axum::{extract::State, response::Response, routing::get, Router};
use std::sync::Arc;
use toolkit::{
    config::{DownloadSettings, ToolkitConfig},
    error::ToolkitResult,
    tools::Tools,
};

/// Port used when neither the command line nor the config names one
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Clone)]
struct DownloadState {
    tools: Tools,
    settings: Arc<DownloadSettings>,
}

/// Builds the download demo router; `GET /download` sends the configured file
pub fn router(config: &ToolkitConfig) -> Result<Router> {
    let state = DownloadState {
        tools: Tools::from_settings(&config.json)?,
        settings: Arc::new(config.download.clone()),
    };

    let routes = Router::new()
        .route("/download", get(download))
        .with_state(state);

    Ok(server::finish_router(routes, &config.static_files.root))
}

async fn download(State(state): State<DownloadState>) -> ToolkitResult<Response> {
    let settings = &state.settings;
    tracing::info!(file = %settings.file, as_name = %settings.display_name, "Download requested");

    state
        .tools
        .download_static_file(&settings.dir, &settings.file, &settings.display_name)
        .await
}

/// `toolkit-demo download`
pub struct DownloadCommand {
    config: ToolkitConfig,
    port: Option<u16>,
}

impl DownloadCommand {
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

        server::serve(router(&self.config)?, &self.config.server.host, port).await
    }
}

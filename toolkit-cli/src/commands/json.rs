//! JSON demo server
//!
//! - `POST /api/receive-post` reads a [`RequestBody`] and acknowledges it
//! - `POST /api/remote-service` relays the request to the configured peer
//! - `POST /api/simulated-service` stands in for that peer

use crate::server;
use anyhow::Result;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::Response,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use toolkit::{config::ToolkitConfig, error::ToolkitResult, remote::RemoteResponse, tools::Tools};

/// Port used when neither the command line nor the config names one
pub const DEFAULT_PORT: u16 = 8081;

/// Payload accepted by the demo endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestBody {
    /// What the client wants done
    pub action: String,
    /// Free-form text echoed back
    pub message: String,
}

/// Reply of the demo endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody {
    /// Outcome text
    pub message: String,
    /// Status the remote peer answered with, when relayed
    #[serde(default, skip_serializing_if = "is_zero")]
    pub status_code: u16,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(code: &u16) -> bool {
    *code == 0
}

#[derive(Clone)]
struct JsonState {
    tools: Tools,
    remote_url: Arc<str>,
}

/// Builds the JSON demo router from `config`
pub fn router(config: &ToolkitConfig) -> Result<Router> {
    let state = JsonState {
        tools: Tools::from_settings(&config.json)?,
        remote_url: Arc::from(config.json.remote_url.as_str()),
    };

    let api = Router::new()
        .route("/receive-post", post(receive_post))
        .route("/remote-service", post(remote_service))
        .route("/simulated-service", post(simulated_service))
        .with_state(state);

    Ok(server::finish_router(
        Router::new().nest("/api", api),
        &config.static_files.root,
    ))
}

fn acknowledge(message: &str) -> String {
    format!("Hit the handler okay, now sending the response - {message}")
}

async fn receive_post(State(state): State<JsonState>, request: Request) -> ToolkitResult<Response> {
    tracing::info!("Receive post called");
    let body: RequestBody = state.tools.read_json(request.into_body()).await?;

    let reply = ResponseBody {
        message: acknowledge(&body.message),
        status_code: 0,
    };
    state.tools.write_json(StatusCode::ACCEPTED, &reply, None)
}

async fn remote_service(State(state): State<JsonState>, request: Request) -> ToolkitResult<Response> {
    tracing::info!(remote = %state.remote_url, "Remote service called");
    let body: RequestBody = state.tools.read_json(request.into_body()).await?;

    let remote: RemoteResponse<ResponseBody> = state
        .tools
        .push_json_to_remote(&state.remote_url, &body)
        .await?;
    tracing::debug!(reply = ?remote.body, "Remote service replied");

    let reply = ResponseBody {
        message: acknowledge(&body.message),
        status_code: remote.status.as_u16(),
    };
    state.tools.write_json(StatusCode::ACCEPTED, &reply, None)
}

async fn simulated_service(State(state): State<JsonState>) -> ToolkitResult<Response> {
    tracing::info!("Simulated service called");
    let reply = ResponseBody {
        message: "OK".to_string(),
        status_code: 0,
    };
    state.tools.write_json(StatusCode::OK, &reply, None)
}

/// `toolkit-demo json`
pub struct JsonCommand {
    config: ToolkitConfig,
    port: Option<u16>,
}

impl JsonCommand {
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

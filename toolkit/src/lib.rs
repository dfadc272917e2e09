//! toolkit: file transfer and JSON exchange helpers for axum handlers
//!
//! The crate is a set of building blocks a handler calls into. It never binds
//! sockets or defines routes itself.
//!
//! - [`upload`]: multipart upload engine with size and content-type policy
//! - [`sniff`]: content-type detection that peeks without consuming
//! - [`naming`]: collision-resistant random file names
//! - [`json`]: bounded JSON decoding, encoding and error envelopes
//! - [`remote`]: outbound JSON relay to another service
//! - [`files`]: downloads, static serving and directory helpers
//! - [`slug`]: URL-safe slugs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum::{extract::{Request, State}, routing::post, Json, Router};
//! use toolkit::prelude::*;
//!
//! async fn upload(
//!     State(tools): State<Tools>,
//!     request: Request,
//! ) -> Result<Json<Vec<UploadedFile>>, ToolkitError> {
//!     let policy = UploadPolicy::builder()
//!         .max_file_size(5 * 1024 * 1024)
//!         .allowed_file_types(["image/jpeg", "image/png"])
//!         .build();
//!
//!     let files = tools.upload_files(request, "./uploads", &policy, true).await?;
//!     Ok(Json(files))
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     toolkit::observability::init()?;
//!
//!     let app = Router::new()
//!         .route("/upload", post(upload))
//!         .with_state(Tools::default());
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod files;
pub mod json;
pub mod naming;
pub mod observability;
pub mod remote;
pub mod slug;
pub mod sniff;
pub mod tools;
pub mod upload;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! ```rust
    //! use toolkit::prelude::*;
    //! ```

    pub use crate::config::ToolkitConfig;
    pub use crate::error::{ToolkitError, ToolkitResult};
    pub use crate::json::JsonEnvelope;
    pub use crate::remote::RemoteResponse;
    pub use crate::tools::Tools;
    pub use crate::upload::{UploadPolicy, UploadedFile};
}

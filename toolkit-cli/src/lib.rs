//! toolkit demo library
//!
//! Router builders for the demo servers, shared by the `toolkit-demo` binary
//! and the integration tests.

pub mod commands;
pub mod server;

pub use commands::{DownloadCommand, JsonCommand, SlugCommand, UploadCommand};

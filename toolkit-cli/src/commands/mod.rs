//! CLI command implementations

pub mod download;
pub mod json;
pub mod slug;
pub mod upload;

pub use download::DownloadCommand;
pub use json::JsonCommand;
pub use slug::SlugCommand;
pub use upload::UploadCommand;

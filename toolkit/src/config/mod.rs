//! Configuration management
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `TOOLKIT_` prefix, `__` for nesting)
//! 2. `./config.toml` (development)
//! 3. `~/.config/toolkit/<service>/config.toml` (user config)
//! 4. `/etc/toolkit/<service>/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! Environment variable format: `TOOLKIT_SECTION__FIELD_NAME`, for example
//! `TOOLKIT_UPLOAD__MAX_FILE_SIZE=5242880`.
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [upload]
//! dir = "./uploads"
//! max_file_size = 1073741824
//! allowed_file_types = ["image/jpeg", "image/png", "image/gif"]
//! rename_output = true
//!
//! [json]
//! max_body_bytes = 1048576
//! remote_url = "http://localhost:8081/api/simulated-service"
//! remote_timeout_secs = 30
//! allow_unknown_fields = false
//!
//! [download]
//! dir = "./files"
//! file = "img.jpg"
//! display_name = "rowdy-cat.jpg"
//! ```

use crate::{
    json::DEFAULT_MAX_JSON_BYTES, observability::ObservabilityConfig, remote::DEFAULT_REMOTE_TIMEOUT,
    upload::DEFAULT_MAX_FILE_SIZE,
};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Listener settings for the demo servers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind
    pub host: String,

    /// Port to bind; each demo has its own default when unset
    pub port: Option<u16>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: None,
        }
    }
}

/// Upload engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UploadSettings {
    /// Destination directory
    pub dir: PathBuf,

    /// Per-file ceiling in bytes (0 = 1 GiB)
    pub max_file_size: u64,

    /// Accepted sniffed content types (empty = all)
    pub allowed_file_types: Vec<String>,

    /// Store files under random names
    pub rename_output: bool,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./uploads"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_file_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
            ],
            rename_output: true,
        }
    }
}

/// JSON exchange settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JsonSettings {
    /// Ceiling for JSON request bodies in bytes
    pub max_body_bytes: usize,

    /// Peer the relay endpoint pushes to
    pub remote_url: String,

    /// Request timeout for the relay client
    pub remote_timeout_secs: u64,

    /// Ignore request keys the target type does not declare
    pub allow_unknown_fields: bool,
}

impl Default for JsonSettings {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_JSON_BYTES,
            remote_url: "http://localhost:8081/api/simulated-service".to_string(),
            remote_timeout_secs: DEFAULT_REMOTE_TIMEOUT.as_secs(),
            allow_unknown_fields: false,
        }
    }
}

impl JsonSettings {
    /// Relay timeout as a [`Duration`]
    #[must_use]
    pub const fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }
}

/// Single-file download settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DownloadSettings {
    /// Directory holding the file
    pub dir: PathBuf,

    /// File name inside `dir`
    pub file: String,

    /// Name the browser saves the file as
    pub display_name: String,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./files"),
            file: "img.jpg".to_string(),
            display_name: "rowdy-cat.jpg".to_string(),
        }
    }
}

/// Static file serving settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StaticSettings {
    /// Directory served at `/`
    pub root: PathBuf,
}

impl Default for StaticSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

/// Complete toolkit configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ToolkitConfig {
    /// Listener settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Upload settings
    #[serde(default)]
    pub upload: UploadSettings,

    /// JSON settings
    #[serde(default)]
    pub json: JsonSettings,

    /// Download settings
    #[serde(default)]
    pub download: DownloadSettings,

    /// Static file settings
    #[serde(default)]
    pub static_files: StaticSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: ObservabilityConfig,
}

impl ToolkitConfig {
    /// Load configuration for a specific service
    ///
    /// Searches, lowest priority first: defaults,
    /// `/etc/toolkit/{service_name}/config.toml`, the user config path from
    /// [`ToolkitConfig::recommended_path`], `./config.toml`, then `TOOLKIT_*`
    /// environment variables.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use toolkit::config::ToolkitConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = ToolkitConfig::load_for_service("upload")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_for_service(service_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::string(&toml::to_string(&Self::default())?));

        let system_config = PathBuf::from("/etc/toolkit")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        let user_config = Self::recommended_path(service_name);
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        figment = figment.merge(Env::prefixed("TOOLKIT_").split("__").lowercase(true));

        Ok(figment.extract()?)
    }

    /// Load configuration from a specific file over the defaults
    ///
    /// A missing file leaves the defaults in place; environment variables
    /// still override both.
    pub fn load_from(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let config = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            .merge(Toml::file(path.into()))
            .merge(Env::prefixed("TOOLKIT_").split("__").lowercase(true))
            .extract()?;

        Ok(config)
    }

    /// Get the recommended user config path for a service
    ///
    /// ```rust
    /// use toolkit::config::ToolkitConfig;
    ///
    /// let path = ToolkitConfig::recommended_path("upload");
    /// assert!(path.ends_with("config.toml"));
    /// ```
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| config_dir.join("toolkit").join(service_name).join("config.toml"),
        )
    }
}

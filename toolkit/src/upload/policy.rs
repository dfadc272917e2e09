//! Per-call upload constraints
//!
//! A policy carries the two limits the engine enforces: a per-file byte
//! ceiling and an allow-list of sniffed content types.
//!
//! # Examples
//!
//! ```rust
//! use toolkit::upload::UploadPolicy;
//!
//! let policy = UploadPolicy::builder()
//!     .max_file_size(10 * 1024 * 1024)
//!     .allowed_file_types(["image/jpeg", "image/png", "image/gif"])
//!     .build();
//!
//! assert!(policy.allows_type("image/png"));
//! assert!(!policy.allows_type("application/pdf"));
//! ```

use crate::config::UploadSettings;

/// Size ceiling applied when a policy leaves `max_file_size` at zero (1 GiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Constraints applied to every file of one upload call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Maximum file size in bytes (0 = [`DEFAULT_MAX_FILE_SIZE`])
    max_file_size: u64,

    /// Allowed content types (empty = all allowed)
    allowed_file_types: Vec<String>,
}

impl UploadPolicy {
    /// Creates a new policy builder
    #[must_use]
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::new()
    }

    /// Byte ceiling actually enforced per file
    ///
    /// # Examples
    ///
    /// ```rust
    /// use toolkit::upload::{UploadPolicy, DEFAULT_MAX_FILE_SIZE};
    ///
    /// assert_eq!(UploadPolicy::default().max_file_size(), DEFAULT_MAX_FILE_SIZE);
    /// ```
    #[must_use]
    pub const fn max_file_size(&self) -> u64 {
        if self.max_file_size == 0 {
            DEFAULT_MAX_FILE_SIZE
        } else {
            self.max_file_size
        }
    }

    /// Allowed content types as configured
    #[must_use]
    pub fn allowed_file_types(&self) -> &[String] {
        &self.allowed_file_types
    }

    /// Whether a sniffed content type passes the allow-list
    ///
    /// Types are compared by essence: parameters such as `charset` are ignored
    /// and the comparison is case-insensitive. An empty allow-list accepts
    /// everything.
    #[must_use]
    pub fn allows_type(&self, detected: &str) -> bool {
        if self.allowed_file_types.is_empty() {
            return true;
        }

        let detected = essence(detected);
        self.allowed_file_types
            .iter()
            .any(|allowed| essence(allowed) == detected)
    }
}

impl From<&UploadSettings> for UploadPolicy {
    fn from(settings: &UploadSettings) -> Self {
        Self::builder()
            .max_file_size(settings.max_file_size)
            .allowed_file_types(settings.allowed_file_types.iter().cloned())
            .build()
    }
}

fn essence(content_type: &str) -> String {
    content_type.parse::<mime::Mime>().map_or_else(
        |_| content_type.trim().to_ascii_lowercase(),
        |m| m.essence_str().to_ascii_lowercase(),
    )
}

/// Builder for [`UploadPolicy`]
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    max_file_size: u64,
    allowed_file_types: Vec<String>,
}

impl PolicyBuilder {
    /// Creates a builder for an unrestricted type policy with the default size
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum file size in bytes
    #[must_use]
    pub const fn max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Sets the allowed content types
    #[must_use]
    pub fn allowed_file_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_file_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Builds the upload policy
    #[must_use]
    pub fn build(self) -> UploadPolicy {
        UploadPolicy {
            max_file_size: self.max_file_size,
            allowed_file_types: self.allowed_file_types,
        }
    }
}

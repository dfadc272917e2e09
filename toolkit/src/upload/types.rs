//! Metadata returned for stored uploads

use serde::{Deserialize, Serialize};

/// A file the engine has written under the destination directory
///
/// # Examples
///
/// ```rust
/// use toolkit::upload::UploadedFile;
///
/// let file = UploadedFile::new("cat.jpg", "Xb3kQ9zT0aPq7LmN2cVw8RyUe.jpg", 2048);
/// assert_eq!(
///     file.summary(),
///     "Uploaded cat.jpg to the uploads folder, renamed to Xb3kQ9zT0aPq7LmN2cVw8RyUe.jpg"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// File name as sent by the client
    pub original_file_name: String,

    /// Name of the file on disk
    pub new_file_name: String,

    /// Number of bytes written
    pub file_size: u64,
}

impl UploadedFile {
    /// Creates upload metadata
    #[must_use]
    pub fn new(
        original_file_name: impl Into<String>,
        new_file_name: impl Into<String>,
        file_size: u64,
    ) -> Self {
        Self {
            original_file_name: original_file_name.into(),
            new_file_name: new_file_name.into(),
            file_size,
        }
    }

    /// One-line human readable report of where the file went
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Uploaded {} to the uploads folder, renamed to {}",
            self.original_file_name, self.new_file_name
        )
    }
}

//! Multipart upload engine
//!
//! The engine streams each file part of a `multipart/form-data` body straight
//! to disk. Every part goes through the same pipeline:
//!
//! 1. the content type is sniffed from the leading bytes (see [`Sniffer`]);
//!    a type outside the policy's allow-list fails before anything is created,
//!    with `FileTooLarge` taking precedence when the part is also oversized
//! 2. an output name is chosen: a random token plus the original extension,
//!    or the client's name reduced to its final path component
//! 3. the file is created with create-new semantics and the part is copied
//!    into it while bytes are counted against the policy's ceiling
//!
//! A file that is not fully written (size ceiling crossed, client gone,
//! future dropped) is removed again. Files committed before a later part
//! fails stay on disk.
//!
//! Parts without a file name (plain form fields) are skipped.

mod policy;
mod types;

pub use policy::{PolicyBuilder, UploadPolicy, DEFAULT_MAX_FILE_SIZE};
pub use types::UploadedFile;

use crate::{
    error::{ToolkitError, ToolkitResult},
    files::create_dir_if_not_exist,
    naming::generate_file_name,
    sniff::Sniffer,
};
use axum::{extract::Request, http::header::CONTENT_TYPE};
use futures_util::StreamExt;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
};

// Fresh names drawn before giving up on a (practically impossible) collision.
const NAME_ATTEMPTS: usize = 3;

/// Stores every file part of a multipart request under `dest_dir`
///
/// `dest_dir` is created if missing. With `rename_output` each file gets a
/// random name that keeps the original extension; without it the client's
/// file name is used and an existing file of that name is never overwritten.
///
/// Processing stops at the first failing part. Files stored before it are
/// kept and not reported.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::extract::Request;
/// use toolkit::upload::{upload_files, UploadPolicy};
///
/// # async fn handler(request: Request) -> toolkit::error::ToolkitResult<()> {
/// let policy = UploadPolicy::builder()
///     .allowed_file_types(["image/jpeg", "image/png", "image/gif"])
///     .build();
///
/// for file in upload_files(request, "./uploads", &policy, true).await? {
///     println!("{}", file.summary());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn upload_files(
    request: Request,
    dest_dir: impl AsRef<Path>,
    policy: &UploadPolicy,
    rename_output: bool,
) -> ToolkitResult<Vec<UploadedFile>> {
    let dest_dir = dest_dir.as_ref();
    let mut multipart = open_multipart(request)?;
    create_dir_if_not_exist(dest_dir).await?;

    let mut uploaded = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if let Some(file) = store_field(field, dest_dir, policy, rename_output).await? {
            uploaded.push(file);
        }
    }

    tracing::debug!(count = uploaded.len(), dest = %dest_dir.display(), "Upload finished");
    Ok(uploaded)
}

/// Stores the first file part of a multipart request under `dest_dir`
///
/// Same rules as [`upload_files`]; parts after the first file are never read.
/// A body without any file part fails with [`ToolkitError::MissingFile`].
pub async fn upload_one_file(
    request: Request,
    dest_dir: impl AsRef<Path>,
    policy: &UploadPolicy,
    rename_output: bool,
) -> ToolkitResult<UploadedFile> {
    let dest_dir = dest_dir.as_ref();
    let mut multipart = open_multipart(request)?;
    create_dir_if_not_exist(dest_dir).await?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if let Some(file) = store_field(field, dest_dir, policy, rename_output).await? {
            return Ok(file);
        }
    }

    Err(ToolkitError::MissingFile)
}

fn open_multipart(request: Request) -> ToolkitResult<multer::Multipart<'static>> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ToolkitError::MalformedMultipart("missing content type".to_string()))?;

    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| ToolkitError::MalformedMultipart(e.to_string()))?;

    Ok(multer::Multipart::new(
        request.into_body().into_data_stream(),
        boundary,
    ))
}

fn multipart_error(err: multer::Error) -> ToolkitError {
    match err {
        multer::Error::StreamReadFailed(source) => {
            tracing::debug!(error = %source, "Request body failed during upload");
            ToolkitError::RequestAborted
        }
        other => ToolkitError::MalformedMultipart(other.to_string()),
    }
}

async fn store_field(
    field: multer::Field<'static>,
    dest_dir: &Path,
    policy: &UploadPolicy,
    rename_output: bool,
) -> ToolkitResult<Option<UploadedFile>> {
    let Some(original) = field
        .file_name()
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
    else {
        tracing::trace!(field = ?field.name(), "Skipping part without file name");
        return Ok(None);
    };

    let limit = policy.max_file_size();
    let mut content = Sniffer::new(Box::pin(field));
    let detected = content.sniff().await.map_err(multipart_error)?;
    if !policy.allows_type(detected) {
        return Err(reject_type(content, original, detected, limit).await);
    }

    let (new_name, mut target) = create_target(dest_dir, &original, rename_output).await?;

    let mut written: u64 = 0;
    while let Some(chunk) = content.next().await {
        let chunk = chunk.map_err(multipart_error)?;
        written += chunk.len() as u64;
        if written > limit {
            tracing::debug!(file = %original, limit, "Upload exceeds size limit");
            return Err(ToolkitError::FileTooLarge {
                filename: original,
                limit,
            });
        }
        target.write_all(&chunk).await?;
    }
    target.commit().await?;

    tracing::info!(
        original = %original,
        stored = %new_name,
        size = written,
        content_type = detected,
        "Stored upload"
    );

    Ok(Some(UploadedFile::new(original, new_name, written)))
}

// Size outranks type: a disallowed part is still counted (never written) so
// that an oversized one reports `FileTooLarge`.
async fn reject_type<S>(
    mut content: Sniffer<S>,
    original: String,
    detected: &str,
    limit: u64,
) -> ToolkitError
where
    S: futures_util::Stream<Item = Result<bytes::Bytes, multer::Error>> + Unpin,
{
    let mut seen: u64 = 0;
    while let Some(chunk) = content.next().await {
        match chunk {
            Ok(chunk) => seen += chunk.len() as u64,
            Err(e) => return multipart_error(e),
        }
        if seen > limit {
            tracing::debug!(file = %original, limit, "Rejected upload exceeds size limit");
            return ToolkitError::FileTooLarge {
                filename: original,
                limit,
            };
        }
    }

    tracing::debug!(file = %original, detected, "Rejected upload type");
    ToolkitError::UnsupportedFileType {
        filename: original,
        detected: detected.to_string(),
    }
}

async fn create_target(
    dest_dir: &Path,
    original: &str,
    rename_output: bool,
) -> ToolkitResult<(String, PartialFile)> {
    if !rename_output {
        let name = verbatim_name(original)?;
        let path = dest_dir.join(&name);
        return match create_new(&path).await {
            Ok(file) => Ok((name, PartialFile::new(file, path))),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(ToolkitError::FileExists(name)),
            Err(e) => Err(e.into()),
        };
    }

    let mut attempt = 1;
    loop {
        let name = generate_file_name(original)?;
        let path = dest_dir.join(&name);
        match create_new(&path).await {
            Ok(file) => return Ok((name, PartialFile::new(file, path))),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < NAME_ATTEMPTS => {
                tracing::warn!(name = %name, "Generated file name collided, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn create_new(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

// Final path component of a client-supplied name. Both separators count, so
// Windows-style names cannot smuggle a directory either.
fn verbatim_name(original: &str) -> ToolkitResult<String> {
    let name = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        return Err(ToolkitError::InvalidFileName(original.to_string()));
    }

    Ok(name.to_string())
}

/// Destination file that is deleted unless committed
struct PartialFile {
    file: Option<File>,
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    const fn new(file: File, path: PathBuf) -> Self {
        Self {
            file: Some(file),
            path,
            committed: false,
        }
    }

    async fn write_all(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(chunk).await,
            None => Err(ErrorKind::BrokenPipe.into()),
        }
    }

    async fn commit(mut self) -> std::io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        // Close before unlinking; an open handle blocks removal on Windows.
        drop(self.file.take());
        if self.committed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove partial upload");
        } else {
            tracing::debug!(path = %self.path.display(), "Removed partial upload");
        }
    }
}

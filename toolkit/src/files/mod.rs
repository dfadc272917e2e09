//! Downloads, static serving and directory helpers

use crate::error::{ToolkitError, ToolkitResult};
use axum::{
    body::Body,
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED},
        StatusCode,
    },
    response::Response,
};
use std::{
    io::ErrorKind,
    path::{Component, Path},
};
use tower_http::services::ServeDir;

/// Creates `path` and any missing parents
///
/// An existing directory is not an error.
pub async fn create_dir_if_not_exist(path: impl AsRef<Path>) -> ToolkitResult<()> {
    let path = path.as_ref();
    match tokio::fs::create_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Builds a response that makes the browser save `dir/file` as `display_name`
///
/// `file` must be a plain file name; anything with a directory part is
/// rejected with [`ToolkitError::InvalidFileName`]. The content type is
/// guessed from the file name.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::response::Response;
/// use toolkit::{error::ToolkitResult, files::download_static_file};
///
/// async fn download() -> ToolkitResult<Response> {
///     download_static_file("files", "img.jpg", "rowdy-cat.jpg").await
/// }
/// ```
pub async fn download_static_file(
    dir: impl AsRef<Path>,
    file: &str,
    display_name: &str,
) -> ToolkitResult<Response> {
    if !is_single_component(file) {
        return Err(ToolkitError::InvalidFileName(file.to_string()));
    }

    let path = dir.as_ref().join(file);
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ToolkitError::NotFound(file.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    let modified = tokio::fs::metadata(&path).await?.modified()?;

    let content_type = mime_guess::from_path(file).first_or_octet_stream();
    let disposition = format!("attachment; filename=\"{}\"", header_safe(display_name));

    tracing::debug!(path = %path.display(), size = data.len(), "Serving download");

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type.as_ref())
        .header(CONTENT_LENGTH, data.len())
        .header(LAST_MODIFIED, httpdate::fmt_http_date(modified))
        .header(CONTENT_DISPOSITION, disposition)
        .body(Body::from(data))
        .map_err(|_| ToolkitError::InvalidFileName(display_name.to_string()))
}

// Quotes, backslashes and control bytes (CR/LF included) cannot appear in a
// quoted header parameter.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_control() || c == '"' || c == '\\' { '_' } else { c })
        .collect()
}

/// Service serving the files under `root`, with `index.html` for directories
///
/// Mount it as a router fallback:
///
/// ```rust
/// use axum::Router;
/// use toolkit::files::static_files;
///
/// let app: Router = Router::new().fallback_service(static_files("."));
/// ```
#[must_use]
pub fn static_files(root: impl AsRef<Path>) -> ServeDir {
    ServeDir::new(root).append_index_html_on_directories(true)
}

fn is_single_component(file: &str) -> bool {
    let mut components = Path::new(file).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !file.contains('\\')
}

//! URL-safe slugs

use crate::error::{ToolkitError, ToolkitResult};
use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^a-z0-9]+").expect("slug pattern is valid"));

/// Lowercases `text` and joins its alphanumeric runs with `-`
///
/// # Examples
///
/// ```rust
/// use toolkit::slug::slugify;
///
/// assert_eq!(slugify("Now is the time 123 ").unwrap(), "now-is-the-time-123");
/// assert!(slugify("!!!").is_err());
/// ```
pub fn slugify(text: &str) -> ToolkitResult<String> {
    let lowered = text.to_lowercase();
    let slug = DISALLOWED.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        return Err(ToolkitError::EmptySlug);
    }

    Ok(slug.to_string())
}

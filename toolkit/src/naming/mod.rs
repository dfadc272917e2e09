//! Random tokens for collision-resistant file names
//!
//! Tokens come straight from the operating system CSPRNG. A failing
//! randomness source surfaces as [`ToolkitError::RandomSource`]; treat it as a
//! broken deployment, not as something to retry.

use crate::error::{ToolkitError, ToolkitResult};
use rand::{rngs::OsRng, RngCore};
use std::path::Path;

/// Length of generated file name stems
pub const DEFAULT_NAME_LENGTH: usize = 25;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

// Largest multiple of the alphabet size that fits in a byte; bytes at or above
// it are rejected so every character is equally likely.
const REJECT_FROM: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// Generates an alphanumeric token of exactly `n` characters
///
/// # Examples
///
/// ```rust
/// use toolkit::naming::random_string;
///
/// let token = random_string(25).unwrap();
/// assert_eq!(token.len(), 25);
/// assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn random_string(n: usize) -> ToolkitResult<String> {
    let mut out = String::with_capacity(n);
    let mut buf = [0u8; 64];

    while out.len() < n {
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| ToolkitError::RandomSource(e.to_string()))?;

        for &byte in buf.iter().filter(|&&b| b < REJECT_FROM) {
            if out.len() == n {
                break;
            }
            out.push(char::from(ALPHABET[usize::from(byte) % ALPHABET.len()]));
        }
    }

    Ok(out)
}

/// Builds a storage name from a random stem and the original file's extension
///
/// The extension is kept only when it is plain ASCII alphanumeric, so the
/// result can never contain separators or traversal sequences.
///
/// # Examples
///
/// ```rust
/// use toolkit::naming::generate_file_name;
///
/// let name = generate_file_name("holiday photo.JPG").unwrap();
/// assert!(name.ends_with(".JPG"));
///
/// let bare = generate_file_name("../../etc/passwd").unwrap();
/// assert!(!bare.contains('.'));
/// ```
pub fn generate_file_name(original: &str) -> ToolkitResult<String> {
    let stem = random_string(DEFAULT_NAME_LENGTH)?;

    let extension = Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    Ok(match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    })
}

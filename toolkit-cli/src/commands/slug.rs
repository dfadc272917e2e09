//! Slug command

use anyhow::{Context, Result};
use console::style;
use toolkit::tools::Tools;

/// Text slugified when none is given
pub const DEFAULT_TEXT: &str = "Now is the time 123 ";

/// `toolkit-demo slug [TEXT]`
pub struct SlugCommand {
    text: String,
}

impl SlugCommand {
    /// Create a new command instance
    pub fn new(text: Option<String>) -> Self {
        Self {
            text: text.unwrap_or_else(|| DEFAULT_TEXT.to_string()),
        }
    }

    /// Slug of the command's text
    pub fn slug(&self) -> Result<String> {
        Tools::new()
            .slugify(&self.text)
            .with_context(|| format!("Cannot slugify {:?}", self.text))
    }

    /// Execute the command
    pub fn execute(&self) -> Result<()> {
        let slug = self.slug()?;
        tracing::info!(input = %self.text, slug = %slug, "Slug generated");
        println!("{}", style(&slug).green().bold());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_text() {
        assert_eq!(SlugCommand::new(None).slug().unwrap(), "now-is-the-time-123");
    }

    #[test]
    fn test_empty_slug_fails() {
        let err = SlugCommand::new(Some("?!".to_string())).slug().unwrap_err();
        assert!(err.to_string().contains("Cannot slugify"));
    }
}

//! # Error Types
//!
//! Everything fallible in the crate funnels into [`QuireError`]. Parse
//! failures keep the underlying `serde_json` error and add a hint so CLI
//! users see *what kind* of mistake they made, not just a byte offset.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuireError {
    /// Input document could not be parsed.
    #[error("parse error: {source} ({hint})")]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: &'static str,
    },

    /// A custom font could not be registered or read.
    #[error("font error: {0}")]
    Font(String),

    /// An image source could not be resolved or decoded.
    #[error("image error: {0}")]
    Image(String),

    /// Sheet markup could not be produced.
    #[error("render error: {0}")]
    Render(String),

    /// Export pipeline failure, including rasterizer errors.
    #[error("export error: {0}")]
    Export(String),
}

impl From<serde_json::Error> for QuireError {
    fn from(source: serde_json::Error) -> Self {
        use serde_json::error::Category;
        let hint = match source.classify() {
            Category::Io => "could not read input",
            Category::Syntax => "input is not valid JSON",
            Category::Data => "JSON is valid but does not match the document schema",
            Category::Eof => "input ended unexpectedly",
        };
        QuireError::Parse { source, hint }
    }
}

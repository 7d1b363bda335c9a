//! Error types for document conversion.
//!
//! Whole-document failures ([`DecodeError`], [`EncodeError`], [`RenderError`])
//! are returned to the caller. Per-node failures ([`UnsupportedNodeError`],
//! [`ImageFetchError`], and [`ColorParseError`] where a fallback exists) are
//! logged at the point of recovery and never propagated.

use std::io;
use thiserror::Error;

/// Malformed input at the document root.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a document: {0}")]
    NotADocument(String),

    #[error("unreadable HTML: {0}")]
    Html(String),
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fatal rendering failure. Everything else degrades the output instead.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to write PDF output: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color '{input}'")]
pub struct ColorParseError {
    pub input: String,
}

impl ColorParseError {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

/// A node, mark, or tag that a converter does not understand.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported {kind} '{name}' in {context}")]
pub struct UnsupportedNodeError {
    /// "node", "mark" or "tag".
    pub kind: &'static str,
    pub name: String,
    /// Where it was found, e.g. "json decode".
    pub context: &'static str,
}

impl UnsupportedNodeError {
    pub fn new(kind: &'static str, name: impl Into<String>, context: &'static str) -> Self {
        Self {
            kind,
            name: name.into(),
            context,
        }
    }

    /// Logs the error as a recovered warning.
    pub fn log(&self) {
        log::warn!("{self}; skipped");
    }
}

#[derive(Error, Debug)]
pub enum ImageFetchError {
    #[error("cannot resolve image source '{0}'")]
    InvalidSource(String),

    #[error("unsupported image source scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("image read failed: {0}")]
    Io(#[from] io::Error),

    #[error("image download failed: {0}")]
    Http(String),

    #[error("image exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("image decode failed: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum FontError {
    #[error("failed to read font file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse font: {0}")]
    Parse(String),
}

/// Errors surfaced through the [`Format`](crate::format::Format) interface.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Format '{0}' not found")]
    FormatNotFound(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

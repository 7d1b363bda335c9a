//! The seam between the document model and its external representations.
//!
//! Importers (legacy HTML), the editor JSON codec, and exporters (PDF,
//! treeviz) all implement [`Format`] and are looked up by name through the
//! [`FormatRegistry`](crate::registry::FormatRegistry).

use crate::error::FormatError;
use crate::model::Document;
use std::collections::HashMap;

/// Output of [`Format::serialize_with_options`].
///
/// The JSON and treeviz formats produce `Text`. The PDF renderer produces
/// `Binary` bytes, which callers must write to a file or sink rather than
/// print.
pub enum SerializedDocument {
    /// UTF-8 output such as an editor JSON tree or a treeviz listing.
    Text(String),
    /// A finished binary file, currently only PDF.
    Binary(Vec<u8>),
}

impl SerializedDocument {
    /// The output as bytes, whatever its kind.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            SerializedDocument::Text(text) => text.into_bytes(),
            SerializedDocument::Binary(bytes) => bytes,
        }
    }
}

/// A named document representation.
///
/// A format can read a source into a [`Document`], write a [`Document`] out,
/// or both. Text-only writers implement [`Format::serialize`]. Binary writers
/// override [`Format::serialize_with_options`] and never return `Text`.
///
/// # Examples
///
/// A binary exporter taking one option, in the shape of the PDF format:
///
/// ```ignore
/// struct Archive;
///
/// impl Format for Archive {
///     fn name(&self) -> &str {
///         "archive"
///     }
///
///     fn supports_serialization(&self) -> bool {
///         true
///     }
///
///     fn serialize_with_options(
///         &self,
///         doc: &Document,
///         options: &HashMap<String, String>,
///     ) -> Result<SerializedDocument, FormatError> {
///         if let Some(key) = options.keys().find(|key| *key != "title") {
///             return Err(FormatError::InvalidOption(key.clone()));
///         }
///         let mut bytes = b"ARCHIVE\n".to_vec();
///         for block in &doc.blocks {
///             bytes.extend_from_slice(block.kind().as_bytes());
///             bytes.push(b'\n');
///         }
///         Ok(SerializedDocument::Binary(bytes))
///     }
/// }
/// ```
pub trait Format: Send + Sync {
    /// Registry key and CLI name, e.g. `html`, `json`, `pdf`, `treeviz`.
    fn name(&self) -> &str;

    /// One line shown by `richdoc --list-formats`.
    fn description(&self) -> &str {
        ""
    }

    /// Extensions without the dot, matched case-insensitively when the CLI
    /// detects a format from a filename.
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    /// Whether [`Format::parse`] is implemented.
    fn supports_parsing(&self) -> bool {
        false
    }

    /// Whether the format can write documents, as text or binary.
    fn supports_serialization(&self) -> bool {
        false
    }

    /// Reads a source into a document. Unreadable input is a
    /// [`FormatError::Decode`]; recoverable problems are logged instead.
    fn parse(&self, _source: &str) -> Result<Document, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support parsing",
            self.name()
        )))
    }

    /// Writes a document as text. Not available for binary formats.
    fn serialize(&self, _doc: &Document) -> Result<String, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support serialization",
            self.name()
        )))
    }

    /// Writes a document using `--extra-*` parameters from the CLI.
    ///
    /// The default accepts no parameters and wraps [`Format::serialize`] in
    /// `Text`. The PDF format overrides it to take `header`, `comments` and
    /// `base-url` and to return `Binary`.
    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &HashMap<String, String>,
    ) -> Result<SerializedDocument, FormatError> {
        if options.is_empty() {
            self.serialize(doc).map(SerializedDocument::Text)
        } else {
            Err(FormatError::NotSupported(format!(
                "Format '{}' does not support extra parameters",
                self.name()
            )))
        }
    }
}

//! Rich-document model, legacy HTML import, editor JSON codec and PDF rendering
//!
//!     Documents are authored in a block-based rich-text editor and stored either as the
//!     editor's JSON node tree or, for older records, as HTML. This crate reads both into one
//!     typed model and renders that model to paginated PDF.
//!
//!     This is a pure lib: it powers richdoc-cli but never assumes a shell environment. It logs
//!     through the `log` facade and leaves installing a logger to the caller.
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── format.rs               # Format trait definition
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── model                   # Document, Block, Inline, Color
//!     ├── formats
//!     │   ├── html                # legacy HTML → model (import only)
//!     │   ├── json                # model ↔ editor JSON
//!     │   ├── pdf                 # model → PDF
//!     │   └── treeviz             # model → indented tree, for inspection
//!     └── lib.rs
//!
//! Testing
//!     tests
//!     └── <format>
//!         └── <testname>.rs
//!
//!     Rust does not discover tests in subdirectories by default, so tests/lib.rs
//!     includes them as modules.
//!
//! Conversion Rules
//!
//!     Import never fails on content it does not understand. Unknown JSON nodes are kept as
//!     opaque values so that a decode/encode cycle preserves them; unknown HTML tags are
//!     skipped or unwrapped. Each skipped item is logged as a warning. Only a document that is
//!     not a document at all (invalid JSON, a root that is not `doc`, unreadable HTML) is an
//!     error.
//!
//!     Rendering has the same policy: an image that can't be fetched or decoded is left out
//!     and the page keeps flowing. The only render failure is the output sink failing.

pub mod error;
pub mod format;
pub mod formats;
pub mod model;
pub mod registry;

pub use error::{DecodeError, EncodeError, FormatError, RenderError};
pub use format::{Format, SerializedDocument};
pub use model::{Block, Color, Document, Inline};
pub use registry::FormatRegistry;

/// Upgrades a legacy HTML record to the editor JSON representation.
///
/// This is the one-time migration path for stored HTML: the fragment is imported into the
/// model and written back with the JSON codec.
pub fn upgrade_html_to_json(html: &str) -> Result<Vec<u8>, FormatError> {
    let doc = formats::html::parse_html(html)?;
    Ok(formats::json::encode(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_html_to_json() {
        let bytes = upgrade_html_to_json("<p><strong>Hi</strong> there</p>").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["type"], "doc");
        assert_eq!(value["content"][0]["type"], "paragraph");
        assert_eq!(value["content"][0]["content"][0]["text"], "Hi");
        assert_eq!(
            value["content"][0]["content"][0]["marks"][0]["type"],
            "bold"
        );
    }

    #[test]
    fn test_upgrade_rejects_unreadable_html() {
        let result = upgrade_html_to_json("<p>a\0b</p>");
        assert!(matches!(result, Err(FormatError::Decode(DecodeError::Html(_)))));
    }
}

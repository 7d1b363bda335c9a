//! JSON wire format
//!
//! Bidirectional conversion between the document model and the editor's JSON
//! tree (`{"type": "doc", "content": [...]}`), the primary persisted form of a
//! document.
//!
//! # Node Mapping
//!
//! | Model            | Wire node                                   | Notes                                   |
//! |------------------|---------------------------------------------|-----------------------------------------|
//! | Paragraph        | `paragraph`                                 | `textAlign`, `indent`                   |
//! | List             | `bulletList` / `orderedList` / `taskList`   | items are `listItem` / `taskItem`       |
//! | Quote            | `blockquote`                                |                                         |
//! | Code             | `codeBlock`                                 | text children concatenated              |
//! | Table            | `table` > `tableRow` > `tableCell`/`tableHeader` | widths from first-row `colwidth`   |
//! | Spoiler          | `spoiler`                                   | `title`, `collapsed`, `bgColor`, `color`|
//! | InfoBlock        | `info-block`                                | `title`, `color`                        |
//! | Image            | `image` (`imageResize` read only)           | block-level images become paragraphs    |
//! | Text             | `text` + marks                              | see below                               |
//! | HardBreak        | `hardBreak`                                 |                                         |
//! | DateNode         | `date-node`                                 |                                         |
//! | Mention          | `mention`                                   |                                         |
//! | IssueLinkMention | `issueLinkMention`                          |                                         |
//! | Unknown          | any other `type`                            | kept verbatim                           |
//!
//! Marks are written in a fixed order: `bold`, `italic`, `underline`, `strike`,
//! `superscript`, `subscript`, `textStyle{color,fontSize}`, `link{href}`,
//! `highlight{color}`.
//!
//! # Lossy Conversions
//!
//! - Text alignment is a paragraph attribute on the wire; text leaves take the
//!   alignment of their paragraph when decoded.
//! - Nested lists inside list items, quotes, cells and panels are flattened
//!   into indented paragraphs.
//! - Column widths beyond the first row's span are dropped.

mod decode;
mod encode;
mod node;

pub use decode::{decode, decode_value};
pub use encode::{encode, encode_value};

use crate::error::FormatError;
use crate::format::Format;
use crate::model::Document;

/// Format implementation for the editor's JSON tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormat;

impl JsonFormat {
    pub fn new() -> Self {
        Self
    }
}

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Rich-text editor JSON tree"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, FormatError> {
        Ok(decode(source.as_bytes())?)
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        let value = encode_value(doc)?;
        serde_json::to_string_pretty(&value)
            .map_err(|err| FormatError::Encode(err.into()))
    }
}

//! HTML format implementation
//!
//! One-directional import of the legacy stored HTML into the document model.
//! Documents are written back as JSON; there is no HTML export.
//!
//! # Library Choice
//!
//! We use `html5ever` + `markup5ever_rcdom` for parsing. The tree builder is
//! error-recovering, so stored fragments with unbalanced or stray tags still
//! produce a usable DOM.
//!
//! # Element Mapping Table
//!
//! | HTML                                   | Model                                      |
//! |----------------------------------------|--------------------------------------------|
//! | `<p>`                                  | Paragraph (`text-align`, `data-indent`)    |
//! | `<ul>` / `<ol>`                        | List (`data-type="taskList"`)              |
//! | `<li>`                                 | ListItem (`data-checked`)                  |
//! | `<blockquote>`                         | Quote                                      |
//! | `<pre>`                                | Code                                       |
//! | `<table>`, `<colgroup>`, `<tr>`        | Table (`min-width`/`width`, `col` widths)  |
//! | `<td>` / `<th>`                        | Cell (`colspan`, `rowspan`, header)        |
//! | `<div data-spoiler>`                   | Spoiler                                    |
//! | `<div data-info-block>`                | InfoBlock                                  |
//! | `<img>`                                | Image (`width`, `float`)                   |
//! | `<strong>`/`<b>`, `<em>`/`<i>`         | Text strong / italic                       |
//! | `<u>`, `<s>`/`<strike>`/`<del>`        | Text underlined / strikethrough            |
//! | `<sub>`, `<sup>`                       | Text sub / sup                             |
//! | `<span>`, `<mark>` with `style`        | Text color, background, size               |
//! | `<a href>`                             | Text url                                   |
//! | `<br>`                                 | HardBreak                                  |
//!
//! Unknown top-level tags are skipped; unknown nested tags are transparent.

mod parser;
pub mod style;

pub use parser::parse_html;

use crate::error::FormatError;
use crate::format::Format;
use crate::model::Document;

/// Format implementation for legacy HTML (import only)
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlFormat;

impl HtmlFormat {
    pub fn new() -> Self {
        Self
    }
}

impl Format for HtmlFormat {
    fn name(&self) -> &str {
        "html"
    }

    fn description(&self) -> &str {
        "Legacy stored HTML (import only)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, FormatError> {
        Ok(parse_html(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_only() {
        let format = HtmlFormat::new();
        assert!(format.supports_parsing());
        assert!(!format.supports_serialization());
        assert!(matches!(
            format.serialize(&Document::default()),
            Err(FormatError::NotSupported(_))
        ));
    }

    #[test]
    fn parses_through_trait() {
        let doc = HtmlFormat.parse("<p>hi</p><pre>x</pre>").unwrap();
        assert_eq!(doc.blocks.len(), 2);
    }
}

//! PDF rendering
//!
//! Lays a [`Document`] out on fixed-size pages and writes the result with
//! `pdf-writer`. Nothing here shells out or touches a browser: layout is a
//! plain synchronous pass over the model.
//!
//! # Pipeline
//!
//! 1. A [`LayoutContext`] walks the blocks ([`blocks`]), wrapping inline
//!    content ([`text`]) and sizing tables ([`table`]). Painting records draw
//!    operations per page instead of emitting PDF directly, so the page count
//!    is known when footers are added.
//! 2. [`writer`] turns the recorded pages into content streams, embeds the
//!    fonts and images that were used, and adds link annotations and the
//!    outline.
//!
//! # Failure Model
//!
//! Unknown nodes, bad colors and images that cannot be fetched or decoded are
//! logged and skipped. The only error a render returns is a failure to write
//! to the output sink.
//!
//! # Options
//!
//! Through the [`Format`] interface the renderer accepts:
//!
//! - `header`: path to a JSON [`DocumentHeader`] shown on every page
//! - `comments`: path to a JSON array of comments rendered after the body
//! - `base-url`: base for relative links and image sources

pub mod blocks;
pub mod fonts;
pub mod header;
pub mod images;
pub mod layout;
mod table;
pub mod text;
mod writer;

pub use blocks::{render_block, render_document};
pub use fonts::{EmbeddedFont, FaceSlot, FontBook};
pub use header::{comments_from_json, Comment, DocumentHeader, Priority, StatusBadge};
pub use images::{DecodedImage, DefaultImageFetcher, ImageFetcher, ImageSource};
pub use layout::{LayoutContext, PageGeometry};
pub use table::column_widths;

use crate::error::{FormatError, RenderError};
use crate::format::{Format, SerializedDocument};
use crate::model::Document;
use layout::{DrawOp, MUTED_COLOR, RULE_COLOR, TEXT_COLOR};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use text::LINE_SPACING;
use url::Url;

/// Everything a render needs besides the document.
#[derive(Clone)]
pub struct RenderContext {
    pub geometry: PageGeometry,
    pub fonts: FontBook,
    /// Body text size in points.
    pub body_size: f32,
    pub base_url: Option<Url>,
    pub header: Option<DocumentHeader>,
    pub comments: Vec<Comment>,
    pub fetcher: Arc<dyn ImageFetcher>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::a4(),
            fonts: FontBook::builtin(),
            body_size: 10.0,
            base_url: None,
            header: None,
            comments: Vec::new(),
            fetcher: Arc::new(DefaultImageFetcher::default()),
        }
    }
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_body_size(mut self, size: f32) -> Self {
        self.body_size = size;
        self
    }

    pub fn with_base_url(mut self, base_url: Option<Url>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_header(mut self, header: DocumentHeader) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }
}

/// What a successful render produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub pages: usize,
    pub images: usize,
    pub bytes: usize,
}

/// Renders `doc` and writes the PDF to `sink`, flushing it afterwards. The
/// sink is neither opened nor closed here.
pub fn render<W: Write>(
    doc: &Document,
    ctx: &RenderContext,
    sink: &mut W,
) -> Result<RenderSummary, RenderError> {
    let (bytes, mut summary) = build(doc, ctx)?;
    sink.write_all(&bytes)?;
    sink.flush()?;
    summary.bytes = bytes.len();
    Ok(summary)
}

/// Renders `doc` into memory.
pub fn render_to_vec(doc: &Document, ctx: &RenderContext) -> Result<Vec<u8>, RenderError> {
    let mut out = Vec::new();
    render(doc, ctx, &mut out)?;
    Ok(out)
}

fn build(doc: &Document, ctx: &RenderContext) -> Result<(Vec<u8>, RenderSummary), RenderError> {
    let mut layout = LayoutContext::new(ctx.geometry, &ctx.fonts, ctx.body_size, ctx.fetcher.as_ref())
        .with_base_url(ctx.base_url.as_ref())
        .with_header(ctx.header.as_ref());
    layout.new_page();
    layout.bookmark("Description");
    render_document(&mut layout, doc);
    if !ctx.comments.is_empty() {
        render_comments(&mut layout, &ctx.comments);
    }
    let finished = layout.finish();
    let title = ctx
        .header
        .as_ref()
        .map(|h| h.title.as_str())
        .filter(|t| !t.is_empty());
    let bytes = writer::write_pdf(&finished, &ctx.fonts, &ctx.geometry, title)?;
    let summary = RenderSummary {
        pages: finished.pages.len(),
        images: finished.images.len(),
        bytes: bytes.len(),
    };
    log::info!(
        "rendered {} block(s) to {} page(s), {} bytes",
        doc.blocks.len(),
        summary.pages,
        summary.bytes
    );
    Ok((bytes, summary))
}

/// Starts a new page with the comment thread.
fn render_comments(layout: &mut LayoutContext, comments: &[Comment]) {
    layout.new_page();
    layout.bookmark("Comments");
    let body = layout.body_size;
    let heading = body * 1.3;
    let baseline = layout.y + heading;
    let left = layout.left;
    layout.text(left, baseline, FaceSlot::Bold, heading, TEXT_COLOR, "Comments");
    layout.advance(heading * 1.6);

    for comment in comments {
        layout.ensure_space(body * LINE_SPACING * 2.0);
        let baseline = layout.y + body * 0.95;
        let author = if comment.author.is_empty() {
            "Unknown"
        } else {
            comment.author.as_str()
        };
        layout.text(left, baseline, FaceSlot::Bold, body, TEXT_COLOR, author);
        if let Some(created) = &comment.created {
            let x = left + layout.text_width(FaceSlot::Bold, author, body) + 8.0;
            layout.text(x, baseline, FaceSlot::Regular, body * 0.85, MUTED_COLOR, created);
        }
        layout.advance(body * LINE_SPACING + 2.0);
        render_document(layout, &comment.body);
        let y = layout.y;
        let right = layout.right;
        layout.push(DrawOp::Line {
            x1: left,
            y1: y,
            x2: right,
            y2: y,
            color: RULE_COLOR,
            width: 0.5,
        });
        layout.advance(body);
    }
}

/// Format implementation for PDF output
#[derive(Clone, Default)]
pub struct PdfFormat {
    context: RenderContext,
}

impl PdfFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: RenderContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    fn context_for(&self, options: &HashMap<String, String>) -> Result<RenderContext, FormatError> {
        let mut context = self.context.clone();
        for (key, value) in options {
            match key.as_str() {
                "header" => {
                    let bytes = read_option_file(key, value)?;
                    context.header = Some(DocumentHeader::from_json(&bytes)?);
                }
                "comments" => {
                    let bytes = read_option_file(key, value)?;
                    context.comments = comments_from_json(&bytes)?;
                }
                "base-url" => {
                    let url = Url::parse(value).map_err(|err| {
                        FormatError::InvalidOption(format!("--extra-base-url '{value}': {err}"))
                    })?;
                    context.base_url = Some(url);
                }
                other => {
                    return Err(FormatError::InvalidOption(format!(
                        "unknown PDF parameter --extra-{other}"
                    )))
                }
            }
        }
        Ok(context)
    }
}

fn read_option_file(key: &str, path: &str) -> Result<Vec<u8>, FormatError> {
    std::fs::read(Path::new(path))
        .map_err(|err| FormatError::InvalidOption(format!("--extra-{key} '{path}': {err}")))
}

impl Format for PdfFormat {
    fn name(&self) -> &str {
        "pdf"
    }

    fn description(&self) -> &str {
        "Paginated PDF rendering"
    }

    fn file_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, _doc: &Document) -> Result<String, FormatError> {
        Err(FormatError::NotSupported(
            "PDF serialization produces binary output".to_string(),
        ))
    }

    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &HashMap<String, String>,
    ) -> Result<SerializedDocument, FormatError> {
        let context = self.context_for(options)?;
        let bytes = render_to_vec(doc, &context)?;
        Ok(SerializedDocument::Binary(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Code, Image, Inline, Paragraph};
    use images::NoImages;
    use std::io;

    fn offline() -> RenderContext {
        RenderContext::new().with_fetcher(Arc::new(NoImages))
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn code_doc() -> Document {
        Document::new(vec![Block::Code(Code {
            content: "let a = 1;\nlet b = 2;\nlet c = a + b;".into(),
        })])
    }

    #[test]
    fn three_line_code_block_is_one_page() {
        let mut out = Vec::new();
        let summary = render(&code_doc(), &offline(), &mut out).unwrap();
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.bytes, out.len());
        assert!(out.starts_with(b"%PDF-"));
    }

    #[test]
    fn failing_sink_is_an_io_error() {
        let result = render(&code_doc(), &offline(), &mut BrokenSink);
        assert!(matches!(result, Err(RenderError::Io(_))));
    }

    #[test]
    fn failed_images_do_not_fail_the_render() {
        let doc = Document::new(vec![
            Block::Paragraph(Paragraph::new(vec![Inline::Image(Image {
                src: "https://images.invalid/a.png".into(),
                ..Image::default()
            })])),
            Block::Paragraph(Paragraph::from_text("still here")),
        ]);
        let mut out = Vec::new();
        let summary = render(&doc, &offline(), &mut out).unwrap();
        assert_eq!(summary.images, 0);
        assert_eq!(summary.pages, 1);
    }

    #[test]
    fn comments_start_a_new_page() {
        let comments = vec![Comment {
            author: "Ana".into(),
            created: Some("2024-03-02".into()),
            body: Document::new(vec![Block::Paragraph(Paragraph::from_text("LGTM"))]),
        }];
        let ctx = offline().with_comments(comments);
        let mut out = Vec::new();
        let summary = render(&code_doc(), &ctx, &mut out).unwrap();
        assert_eq!(summary.pages, 2);
    }

    #[test]
    fn empty_document_still_has_a_page() {
        let bytes = render_to_vec(&Document::default(), &offline()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn format_options() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("header.json");
        std::fs::write(&header, br#"{"identifier":"WEB-1","title":"Login"}"#).unwrap();
        let format = PdfFormat::with_context(offline());

        let mut options = HashMap::new();
        options.insert("header".to_string(), header.display().to_string());
        options.insert("base-url".to_string(), "https://tracker.example/".to_string());
        let context = format.context_for(&options).unwrap();
        assert_eq!(context.header.map(|h| h.identifier), Some("WEB-1".to_string()));
        assert!(context.base_url.is_some());

        let mut bad = HashMap::new();
        bad.insert("size-mobile".to_string(), String::new());
        assert!(matches!(
            format.serialize_with_options(&code_doc(), &bad),
            Err(FormatError::InvalidOption(_))
        ));
    }

    #[test]
    fn serializes_binary() {
        let format = PdfFormat::with_context(offline());
        let output = format
            .serialize_with_options(&code_doc(), &HashMap::new())
            .unwrap();
        assert!(matches!(output, SerializedDocument::Binary(ref b) if b.starts_with(b"%PDF-")));
        assert!(format.serialize(&code_doc()).is_err());
    }
}

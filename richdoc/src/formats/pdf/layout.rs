//! Page geometry, the display list, and the layout cursor.
//!
//! Layout works top-down: `y` is the distance from the top edge of the page.
//! Painting records [`DrawOp`]s on the current [`PageCanvas`]; the writer
//! flips coordinates when it emits content streams.

use super::fonts::{FaceSlot, FontBook};
use super::header::{self, DocumentHeader};
use super::images::{DecodedImage, ImageCache, ImageFetcher};
use crate::model::Color;
use url::Url;

/// Page size and margins in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            margin_top: 42.0,
            margin_bottom: 42.0,
            margin_left: 42.0,
            margin_right: 42.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn content_bottom(&self) -> f32 {
        self.height - self.margin_bottom
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Text with its baseline at `y`.
    Text {
        x: f32,
        y: f32,
        face: FaceSlot,
        size: f32,
        color: Color,
        text: String,
    },
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
    },
    StrokeRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
        width: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
        width: f32,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        color: Color,
    },
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        image: usize,
    },
}

/// A clickable area pointing at an absolute URI.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkArea {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageCanvas {
    pub ops: Vec<DrawOp>,
    pub links: Vec<LinkArea>,
}

/// A document outline entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub title: String,
    pub page: usize,
    pub y: f32,
}

/// Default text color.
pub const TEXT_COLOR: Color = Color::rgb(0x1f, 0x23, 0x28);
/// Secondary text (labels, timestamps, footer).
pub const MUTED_COLOR: Color = Color::rgb(0x6b, 0x72, 0x80);
/// Rules and borders.
pub const RULE_COLOR: Color = Color::rgb(0xd0, 0xd5, 0xdd);

/// The mutable cursor threaded through every render step.
pub struct LayoutContext<'a> {
    pub geometry: PageGeometry,
    pub fonts: &'a FontBook,
    pub body_size: f32,
    pub base_url: Option<&'a Url>,
    /// Horizontal cursor.
    pub x: f32,
    /// Vertical cursor, from the top edge.
    pub y: f32,
    /// Active left margin.
    pub left: f32,
    /// Active right margin.
    pub right: f32,
    header: Option<&'a DocumentHeader>,
    pages: Vec<PageCanvas>,
    bookmarks: Vec<Bookmark>,
    images: ImageCache<'a>,
    body_top: f32,
}

impl<'a> LayoutContext<'a> {
    pub fn new(
        geometry: PageGeometry,
        fonts: &'a FontBook,
        body_size: f32,
        fetcher: &'a dyn ImageFetcher,
    ) -> Self {
        Self {
            geometry,
            fonts,
            body_size,
            base_url: None,
            x: geometry.margin_left,
            y: geometry.margin_top,
            left: geometry.margin_left,
            right: geometry.width - geometry.margin_right,
            header: None,
            pages: Vec::new(),
            bookmarks: Vec::new(),
            images: ImageCache::new(fetcher),
            body_top: geometry.margin_top,
        }
    }

    pub fn with_base_url(mut self, base_url: Option<&'a Url>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Sets the running header repeated at the top of every page.
    pub fn with_header(mut self, header: Option<&'a DocumentHeader>) -> Self {
        self.header = header;
        self
    }

    /// Width between the active margins.
    pub fn available_width(&self) -> f32 {
        self.right - self.left
    }

    pub fn page_index(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Top of the body area below the running header.
    pub fn body_top(&self) -> f32 {
        self.body_top
    }

    pub fn bottom(&self) -> f32 {
        self.geometry.content_bottom()
    }

    pub fn remaining_height(&self) -> f32 {
        self.bottom() - self.y
    }

    /// Whether nothing has been placed on the current page body yet.
    pub fn at_page_top(&self) -> bool {
        self.y <= self.body_top + 0.01
    }

    /// Starts a new page, repainting the running header.
    pub fn new_page(&mut self) {
        self.pages.push(PageCanvas::default());
        self.y = self.geometry.margin_top;
        if let Some(doc_header) = self.header {
            let (left, right) = (self.left, self.right);
            self.left = self.geometry.margin_left;
            self.right = self.geometry.width - self.geometry.margin_right;
            header::paint_running_header(self, doc_header);
            self.left = left;
            self.right = right;
        }
        self.body_top = self.y;
        self.x = self.left;
    }

    /// Makes sure `height` fits below the cursor, breaking the page if it
    /// does not and the page already has content.
    pub fn ensure_space(&mut self, height: f32) {
        if self.pages.is_empty() {
            self.new_page();
        }
        if self.y + height > self.bottom() && !self.at_page_top() {
            self.new_page();
        }
    }

    pub fn advance(&mut self, dy: f32) {
        self.y += dy;
        self.x = self.left;
    }

    /// Runs `f` with the left margin moved right by `indent`.
    pub fn indented<R>(&mut self, indent: f32, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.left;
        self.left = (self.left + indent).min(self.right - 1.0);
        self.x = self.left;
        let result = f(self);
        self.left = saved;
        self.x = saved;
        result
    }

    pub fn push(&mut self, op: DrawOp) {
        if self.pages.is_empty() {
            self.new_page();
        }
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    /// Adds an op to an earlier page, used for decorations whose extent is
    /// only known after their content was laid out.
    pub fn push_on(&mut self, page: usize, op: DrawOp) {
        if let Some(canvas) = self.pages.get_mut(page) {
            canvas.ops.push(op);
        }
    }

    pub fn link(&mut self, area: LinkArea) {
        if let Some(page) = self.pages.last_mut() {
            page.links.push(area);
        }
    }

    /// Resolves a link target against the base URL. `None` when the target is
    /// relative and no base is configured.
    pub fn resolve_link(&self, href: &str) -> Option<String> {
        match Url::parse(href) {
            Ok(url) => Some(url.to_string()),
            Err(url::ParseError::RelativeUrlWithoutBase) => match self.base_url {
                Some(base) => base.join(href).ok().map(|u| u.to_string()),
                None => {
                    log::debug!("relative link '{href}' dropped: no base URL");
                    None
                }
            },
            Err(err) => {
                log::debug!("invalid link '{href}': {err}");
                None
            }
        }
    }

    pub fn bookmark(&mut self, title: &str) {
        if self.pages.is_empty() {
            self.new_page();
        }
        self.bookmarks.push(Bookmark {
            title: title.to_string(),
            page: self.page_index(),
            y: self.y,
        });
    }

    /// Fetches and decodes an image once per render; `None` when it failed.
    pub fn image(&mut self, src: &str) -> Option<(usize, u32, u32)> {
        let base = self.base_url;
        self.images.get(src, base)
    }

    /// Paints `text` on `baseline`.
    pub fn text(&mut self, x: f32, baseline: f32, face: FaceSlot, size: f32, color: Color, text: &str) {
        if text.is_empty() {
            return;
        }
        self.push(DrawOp::Text {
            x,
            y: baseline,
            face,
            size,
            color,
            text: text.to_string(),
        });
    }

    pub fn text_width(&self, face: FaceSlot, text: &str, size: f32) -> f32 {
        self.fonts.text_width(face, text, size)
    }

    /// Cuts `text` to fit `max_width`, ending it with `…` when `ellipsis` is
    /// set and the text had to be shortened.
    pub fn clip(&self, face: FaceSlot, text: &str, size: f32, max_width: f32, ellipsis: bool) -> String {
        if self.text_width(face, text, size) <= max_width {
            return text.to_string();
        }
        let font = self.fonts.face(face);
        let budget = if ellipsis {
            max_width - font.char_width('…', size)
        } else {
            max_width
        };
        let mut out = String::new();
        let mut width = 0.0;
        for ch in text.chars() {
            let w = font.char_width(ch, size);
            if width + w > budget {
                break;
            }
            width += w;
            out.push(ch);
        }
        if ellipsis {
            out.push('…');
        }
        out
    }

    /// Adds the `N / M` footer to every page and hands back the display list.
    pub fn finish(mut self) -> Finished {
        if self.pages.is_empty() {
            self.pages.push(PageCanvas::default());
        }
        let total = self.pages.len();
        let size = (self.body_size * 0.8).max(6.0);
        let baseline = self.geometry.height - self.geometry.margin_bottom / 2.0;
        for (index, page) in self.pages.iter_mut().enumerate() {
            let label = format!("{} / {}", index + 1, total);
            let width = self.fonts.text_width(FaceSlot::Regular, &label, size);
            page.ops.push(DrawOp::Text {
                x: (self.geometry.width - width) / 2.0,
                y: baseline,
                face: FaceSlot::Regular,
                size,
                color: MUTED_COLOR,
                text: label,
            });
        }
        Finished {
            pages: self.pages,
            bookmarks: self.bookmarks,
            images: self.images.into_images(),
        }
    }
}

/// Output of a completed layout.
pub struct Finished {
    pub pages: Vec<PageCanvas>,
    pub bookmarks: Vec<Bookmark>,
    pub images: Vec<DecodedImage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::pdf::images::NoImages;

    #[test]
    fn a4_defaults() {
        let geometry = PageGeometry::default();
        assert_eq!(geometry.content_width(), 511.0);
        assert_eq!(geometry.content_bottom(), 800.0);
    }

    #[test]
    fn ensure_space_breaks_only_after_content() {
        let fonts = FontBook::builtin();
        let mut ctx = LayoutContext::new(PageGeometry::a4(), &fonts, 10.0, &NoImages);
        ctx.ensure_space(2000.0);
        assert_eq!(ctx.page_count(), 1);
        ctx.advance(700.0);
        ctx.ensure_space(200.0);
        assert_eq!(ctx.page_count(), 2);
        assert_eq!(ctx.y, ctx.body_top());
    }

    #[test]
    fn indented_restores_margin() {
        let fonts = FontBook::builtin();
        let mut ctx = LayoutContext::new(PageGeometry::a4(), &fonts, 10.0, &NoImages);
        let inner = ctx.indented(20.0, |ctx| ctx.left);
        assert_eq!(inner, 62.0);
        assert_eq!(ctx.left, 42.0);
    }

    #[test]
    fn footer_numbers_every_page() {
        let fonts = FontBook::builtin();
        let mut ctx = LayoutContext::new(PageGeometry::a4(), &fonts, 10.0, &NoImages);
        ctx.new_page();
        ctx.new_page();
        let finished = ctx.finish();
        let labels: Vec<String> = finished
            .pages
            .iter()
            .filter_map(|p| match p.ops.last() {
                Some(DrawOp::Text { text, .. }) => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["1 / 2", "2 / 2"]);
    }

    #[test]
    fn relative_links_need_a_base() {
        let fonts = FontBook::builtin();
        let base = Url::parse("https://tracker.example/ws/").unwrap();
        let ctx = LayoutContext::new(PageGeometry::a4(), &fonts, 10.0, &NoImages);
        assert_eq!(ctx.resolve_link("/issue/1"), None);
        assert_eq!(
            ctx.resolve_link("mailto:a@b.c").as_deref(),
            Some("mailto:a@b.c")
        );
        let ctx = ctx.with_base_url(Some(&base));
        assert_eq!(
            ctx.resolve_link("issue/1").as_deref(),
            Some("https://tracker.example/ws/issue/1")
        );
    }
}

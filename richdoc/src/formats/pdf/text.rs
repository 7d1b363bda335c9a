//! Inline flow: breaking paragraph content into lines and painting them.
//!
//! Measuring and painting are separate so tables can size rows before any
//! cell is painted. [`layout_lines`] turns inlines into [`Line`]s for a given
//! width; [`paint_line`] places one line at an absolute position.

use super::fonts::FaceSlot;
use super::layout::{DrawOp, LayoutContext, LinkArea, TEXT_COLOR};
use crate::error::UnsupportedNodeError;
use crate::model::{Color, Image, Inline, TextAlign};

/// Points per CSS pixel.
pub const PX_TO_PT: f32 = 0.75;
/// Line height as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.3;

const LINK_COLOR: Color = Color::rgb(0x25, 0x63, 0xeb);
const MENTION_COLOR: Color = Color::rgb(0x1d, 0x4e, 0xd8);

/// Resolved paint attributes of a text run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStyle {
    pub face: FaceSlot,
    pub size: f32,
    pub color: Color,
    pub background: Option<Color>,
    pub underline: bool,
    pub strike: bool,
    /// Baseline shift, positive upwards.
    pub rise: f32,
    pub link: Option<String>,
}

impl RunStyle {
    pub fn plain(face: FaceSlot, size: f32) -> Self {
        Self {
            face,
            size,
            color: TEXT_COLOR,
            background: None,
            underline: false,
            strike: false,
            rise: 0.0,
            link: None,
        }
    }

    fn for_text(ctx: &LayoutContext, text: &crate::model::Text) -> Self {
        let mut size = if text.size > 0 {
            text.size as f32 * PX_TO_PT
        } else {
            ctx.body_size
        };
        let mut rise = 0.0;
        if text.sup {
            rise = size * 0.35;
            size *= 0.7;
        } else if text.sub {
            rise = -size * 0.15;
            size *= 0.7;
        }
        let link = text.url.as_deref().and_then(|href| ctx.resolve_link(href));
        let explicit = text.color.filter(|c| !c.is_transparent());
        let color = match (&link, explicit) {
            (_, Some(color)) => color,
            (Some(_), None) => LINK_COLOR,
            (None, None) => TEXT_COLOR,
        };
        Self {
            face: FaceSlot::for_style(text.strong, text.italic),
            size,
            color,
            background: text.bg_color.filter(|c| !c.is_transparent()),
            underline: text.underlined || link.is_some(),
            strike: text.strikethrough,
            rise,
            link,
        }
    }

    fn ascent(&self) -> f32 {
        self.size * 0.95 + self.rise.max(0.0)
    }

    fn descent(&self) -> f32 {
        self.size * (LINE_SPACING - 0.95) - self.rise.min(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placed {
    Text {
        x: f32,
        width: f32,
        text: String,
        style: RunStyle,
    },
    Image {
        x: f32,
        width: f32,
        height: f32,
        image: usize,
    },
}

/// One laid-out line. Positions are relative to the line's left edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub items: Vec<Placed>,
    /// Width of the content without trailing spaces.
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
    pub align: TextAlign,
}

impl Line {
    fn empty(align: TextAlign) -> Self {
        Self {
            items: Vec::new(),
            width: 0.0,
            ascent: 0.0,
            descent: 0.0,
            align,
        }
    }

    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }

    /// Concatenated text, for tests and diagnostics.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut end = 0.0;
        for item in &self.items {
            if let Placed::Text { x, width, text, .. } = item {
                if !out.is_empty() && *x > end + 0.01 {
                    out.push(' ');
                }
                out.push_str(text);
                end = x + width;
            }
        }
        out
    }
}

enum Atom {
    Word(String, RunStyle),
    Space(RunStyle),
    Break,
    Image {
        image: usize,
        width: f32,
        height: f32,
        align: TextAlign,
    },
}

/// Greedy line breaker state.
struct Breaker<'c, 'a> {
    ctx: &'c LayoutContext<'a>,
    max_width: f32,
    align: TextAlign,
    lines: Vec<Line>,
    current: Line,
    cursor: f32,
    pending_space: Option<(f32, RunStyle)>,
    image_align: Option<TextAlign>,
}

impl<'c, 'a> Breaker<'c, 'a> {
    fn new(ctx: &'c LayoutContext<'a>, max_width: f32, align: TextAlign) -> Self {
        Self {
            ctx,
            max_width: max_width.max(1.0),
            align,
            lines: Vec::new(),
            current: Line::empty(align),
            cursor: 0.0,
            pending_space: None,
            image_align: None,
        }
    }

    fn push(&mut self, atom: Atom) {
        match atom {
            Atom::Break => self.end_line(),
            Atom::Space(style) => {
                if !self.current.items.is_empty() && self.pending_space.is_none() {
                    let width = self.ctx.fonts.face(style.face).char_width(' ', style.size);
                    self.pending_space = Some((width, style));
                }
            }
            Atom::Word(word, style) => self.push_word(word, style),
            Atom::Image {
                image,
                width,
                height,
                align,
            } => {
                self.make_room(width);
                let x = self.cursor + self.take_space();
                self.current.items.push(Placed::Image {
                    x,
                    width,
                    height,
                    image,
                });
                self.cursor = x + width;
                self.current.width = self.cursor;
                self.current.ascent = self.current.ascent.max(height);
                self.image_align = Some(align);
            }
        }
    }

    fn push_word(&mut self, word: String, style: RunStyle) {
        let fonts = self.ctx.fonts;
        let face = fonts.face(style.face);
        let width = face.text_width(&word, style.size);
        if width > self.max_width {
            // Split an over-long word by character.
            let mut chunk = String::new();
            let mut chunk_width = 0.0;
            for ch in word.chars() {
                let w = face.char_width(ch, style.size);
                if !chunk.is_empty() && chunk_width + w > self.max_width {
                    self.place_word(std::mem::take(&mut chunk), chunk_width, &style);
                    chunk_width = 0.0;
                }
                chunk.push(ch);
                chunk_width += w;
            }
            if !chunk.is_empty() {
                self.place_word(chunk, chunk_width, &style);
            }
            return;
        }
        self.place_word(word, width, &style);
    }

    fn place_word(&mut self, word: String, width: f32, style: &RunStyle) {
        self.make_room(width);
        let space = self.pending_space.take();
        let gap = space.as_ref().map(|(w, _)| *w).unwrap_or(0.0);
        let x = self.cursor + gap;
        let merged = match self.current.items.last_mut() {
            Some(Placed::Text {
                text,
                width: run_width,
                style: run_style,
                ..
            }) if run_style == style => {
                if gap > 0.0 {
                    text.push(' ');
                }
                text.push_str(&word);
                *run_width += gap + width;
                true
            }
            _ => false,
        };
        if !merged {
            self.current.items.push(Placed::Text {
                x,
                width,
                text: word,
                style: style.clone(),
            });
        }
        self.cursor = x + width;
        self.current.width = self.cursor;
        self.current.ascent = self.current.ascent.max(style.ascent());
        self.current.descent = self.current.descent.max(style.descent());
    }

    fn take_space(&mut self) -> f32 {
        self.pending_space.take().map(|(w, _)| w).unwrap_or(0.0)
    }

    /// Wraps when an item of `width` does not fit on the current line.
    fn make_room(&mut self, width: f32) {
        if self.current.items.is_empty() {
            return;
        }
        let gap = self.pending_space.as_ref().map(|(w, _)| *w).unwrap_or(0.0);
        if self.cursor + gap + width > self.max_width {
            self.end_line();
        }
    }

    fn end_line(&mut self) {
        let mut line = std::mem::replace(&mut self.current, Line::empty(self.align));
        if line.items.is_empty() {
            let size = self.ctx.body_size;
            line.ascent = size * 0.95;
            line.descent = size * (LINE_SPACING - 0.95);
        }
        if let (Some(align), [Placed::Image { .. }]) = (self.image_align, line.items.as_slice()) {
            line.align = align;
        }
        self.lines.push(line);
        self.cursor = 0.0;
        self.pending_space = None;
        self.image_align = None;
    }

    fn finish(mut self) -> Vec<Line> {
        if !self.current.items.is_empty() || self.lines.is_empty() {
            self.end_line();
        }
        self.lines
    }
}

/// Breaks `content` into lines of at most `max_width`.
pub fn layout_lines(
    ctx: &mut LayoutContext,
    content: &[Inline],
    max_width: f32,
    align: TextAlign,
) -> Vec<Line> {
    let atoms = atomize(ctx, content, max_width);
    let mut breaker = Breaker::new(ctx, max_width, align);
    for atom in atoms {
        breaker.push(atom);
    }
    breaker.finish()
}

fn atomize(ctx: &mut LayoutContext, content: &[Inline], max_width: f32) -> Vec<Atom> {
    let mut atoms = Vec::new();
    let mut after_break = false;
    for inline in content {
        match inline {
            Inline::Text(text) => {
                let style = RunStyle::for_text(ctx, text);
                push_words(&mut atoms, &text.content, &style, &mut after_break);
            }
            Inline::HardBreak => {
                atoms.push(Atom::Break);
                after_break = true;
            }
            Inline::Mention(mention) => {
                let mut style = RunStyle::plain(FaceSlot::Bold, ctx.body_size);
                style.color = MENTION_COLOR;
                let label = format!("@{}", mention.label);
                push_words(&mut atoms, &label, &style, &mut after_break);
            }
            Inline::DateNode(date) => {
                let style = RunStyle::plain(FaceSlot::Regular, ctx.body_size);
                push_words(&mut atoms, &date.date, &style, &mut after_break);
            }
            Inline::IssueLinkMention(link) => {
                let mut style = RunStyle::plain(FaceSlot::Regular, ctx.body_size);
                style.link = ctx.resolve_link(&link.original_url);
                if style.link.is_some() {
                    style.color = LINK_COLOR;
                    style.underline = true;
                }
                push_words(&mut atoms, &link.slug, &style, &mut after_break);
            }
            Inline::Image(image) => {
                if let Some(atom) = image_atom(ctx, image, max_width) {
                    atoms.push(atom);
                    after_break = false;
                }
            }
            Inline::Unknown(raw) => {
                let name = raw.get("type").and_then(|t| t.as_str()).unwrap_or("?");
                UnsupportedNodeError::new("inline", name, "pdf render").log();
            }
        }
    }
    atoms
}

fn push_words(atoms: &mut Vec<Atom>, content: &str, style: &RunStyle, after_break: &mut bool) {
    let mut word = String::new();
    for ch in content.chars() {
        match ch {
            '\n' => {
                flush_word(atoms, &mut word, style, after_break);
                atoms.push(Atom::Break);
                *after_break = true;
            }
            ' ' | '\t' | '\r' => {
                flush_word(atoms, &mut word, style, after_break);
                if !*after_break {
                    atoms.push(Atom::Space(style.clone()));
                }
            }
            _ => word.push(ch),
        }
    }
    flush_word(atoms, &mut word, style, after_break);
}

fn flush_word(atoms: &mut Vec<Atom>, word: &mut String, style: &RunStyle, after_break: &mut bool) {
    if !word.is_empty() {
        atoms.push(Atom::Word(std::mem::take(word), style.clone()));
        *after_break = false;
    }
}

/// Fetches an image and scales it to its declared width, the line width, and
/// the page body height.
fn image_atom(ctx: &mut LayoutContext, image: &Image, max_width: f32) -> Option<Atom> {
    let (index, px_w, px_h) = ctx.image(&image.src)?;
    let natural = px_w as f32 * PX_TO_PT;
    let declared = image.width as f32 * PX_TO_PT;
    let mut width = if image.width > 0 { declared } else { natural };
    width = width.min(max_width).max(1.0);
    let mut height = width * px_h as f32 / px_w as f32;
    let max_height = (ctx.bottom() - ctx.body_top()).max(1.0);
    if height > max_height {
        width *= max_height / height;
        height = max_height;
    }
    Some(Atom::Image {
        image: index,
        width,
        height,
        align: image.align,
    })
}

/// Paints `line` with its top edge at `top`, aligned within `[left, left + width]`.
pub fn paint_line(ctx: &mut LayoutContext, line: &Line, left: f32, top: f32, width: f32) {
    let offset = match line.align {
        TextAlign::Left => 0.0,
        TextAlign::Center => ((width - line.width) / 2.0).max(0.0),
        TextAlign::Right => (width - line.width).max(0.0),
    };
    let baseline = top + line.ascent;
    for item in &line.items {
        match item {
            Placed::Text {
                x,
                width,
                text,
                style,
            } => {
                let x = left + offset + x;
                let y = baseline - style.rise;
                if let Some(background) = style.background {
                    ctx.push(DrawOp::FillRect {
                        x,
                        y: y - style.size * 0.95,
                        w: *width,
                        h: style.size * 1.2,
                        color: background,
                    });
                }
                ctx.text(x, y, style.face, style.size, style.color, text);
                let stroke = (style.size * 0.06).max(0.5);
                if style.underline {
                    let uy = y + style.size * 0.12;
                    ctx.push(DrawOp::Line {
                        x1: x,
                        y1: uy,
                        x2: x + width,
                        y2: uy,
                        color: style.color,
                        width: stroke,
                    });
                }
                if style.strike {
                    let sy = y - style.size * 0.3;
                    ctx.push(DrawOp::Line {
                        x1: x,
                        y1: sy,
                        x2: x + width,
                        y2: sy,
                        color: style.color,
                        width: stroke,
                    });
                }
                if let Some(uri) = &style.link {
                    ctx.link(LinkArea {
                        x,
                        y: y - style.size * 0.95,
                        w: *width,
                        h: style.size * 1.2,
                        uri: uri.clone(),
                    });
                }
            }
            Placed::Image {
                x,
                width,
                height,
                image,
            } => ctx.push(DrawOp::Image {
                x: left + offset + x,
                y: baseline - height,
                w: *width,
                h: *height,
                image: *image,
            }),
        }
    }
}

/// Total height of `lines`.
pub fn lines_height(lines: &[Line]) -> f32 {
    lines.iter().map(Line::height).sum()
}

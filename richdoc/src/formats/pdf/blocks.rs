//! Block renderers. Each one lays out a single block at the cursor of a
//! [`LayoutContext`] and leaves the cursor below it.

use super::fonts::FaceSlot;
use super::layout::{DrawOp, LayoutContext, MUTED_COLOR, RULE_COLOR, TEXT_COLOR};
use super::table::render_table;
use super::text::{layout_lines, paint_line, Line, LINE_SPACING};
use crate::error::UnsupportedNodeError;
use crate::model::{Block, Code, Color, Document, InfoBlock, List, Paragraph, Quote, Spoiler};

/// Left shift per paragraph indent level.
pub const INDENT_STEP: f32 = 18.0;

const LIST_INDENT: f32 = 18.0;
const QUOTE_INDENT: f32 = 14.0;
const PANEL_INDENT: f32 = 12.0;
const CODE_PADDING: f32 = 6.0;
const CODE_BACKGROUND: Color = Color::rgb(0xf6, 0xf8, 0xfa);
const ACCENT_COLOR: Color = Color::rgb(0x25, 0x63, 0xeb);
const CHECK_COLOR: Color = Color::rgb(0x16, 0xa3, 0x4a);

pub fn render_document(ctx: &mut LayoutContext, document: &Document) {
    for block in &document.blocks {
        render_block(ctx, block);
    }
}

pub fn render_block(ctx: &mut LayoutContext, block: &Block) {
    let gap = ctx.body_size * 0.5;
    match block {
        Block::Paragraph(paragraph) => render_paragraph(ctx, paragraph),
        Block::List(list) => render_list(ctx, list),
        Block::Quote(quote) => render_quote(ctx, quote),
        Block::Code(code) => render_code(ctx, code),
        Block::Table(table) => {
            render_table(ctx, table);
            return;
        }
        Block::Spoiler(spoiler) => render_spoiler(ctx, spoiler),
        Block::InfoBlock(info) => render_info_block(ctx, info),
        Block::Unknown(raw) => {
            let name = raw.get("type").and_then(|t| t.as_str()).unwrap_or("?");
            UnsupportedNodeError::new("block", name, "pdf render").log();
            return;
        }
    }
    ctx.advance(gap);
}

/// Places one line at the cursor, breaking the page first if needed.
fn flow_line(ctx: &mut LayoutContext, line: &Line) -> f32 {
    ctx.ensure_space(line.height());
    let (left, top, width) = (ctx.left, ctx.y, ctx.available_width());
    paint_line(ctx, line, left, top, width);
    ctx.advance(line.height());
    top + line.ascent
}

pub fn render_paragraph(ctx: &mut LayoutContext, paragraph: &Paragraph) {
    render_paragraph_with(ctx, paragraph, |_, _| {});
}

/// Renders a paragraph and calls `first_line` with the baseline of its
/// first line once that line is placed.
fn render_paragraph_with(
    ctx: &mut LayoutContext,
    paragraph: &Paragraph,
    first_line: impl FnOnce(&mut LayoutContext, f32),
) {
    let indent = paragraph.indent as f32 * INDENT_STEP;
    ctx.indented(indent, |ctx| {
        let width = ctx.available_width();
        let lines = layout_lines(ctx, &paragraph.content, width, paragraph.align);
        let mut first_line = Some(first_line);
        for line in &lines {
            let baseline = flow_line(ctx, line);
            if let Some(callback) = first_line.take() {
                callback(ctx, baseline);
            }
        }
    });
}

/// Renders paragraphs with a small gap between them.
fn render_paragraphs(ctx: &mut LayoutContext, paragraphs: &[Paragraph]) {
    let gap = ctx.body_size * 0.3;
    for (i, paragraph) in paragraphs.iter().enumerate() {
        if i > 0 {
            ctx.advance(gap);
        }
        render_paragraph(ctx, paragraph);
    }
}

enum Marker {
    Bullet,
    Number(usize),
    Checkbox(bool),
}

pub fn render_list(ctx: &mut LayoutContext, list: &List) {
    let gap = ctx.body_size * 0.2;
    let marker_left = ctx.left;
    for (index, item) in list.items.iter().enumerate() {
        if index > 0 {
            ctx.advance(gap);
        }
        let marker = if list.task_list {
            Marker::Checkbox(item.checked)
        } else if list.numbered {
            Marker::Number(index + 1)
        } else {
            Marker::Bullet
        };
        ctx.indented(LIST_INDENT, |ctx| {
            let mut marker = Some(marker);
            for (i, paragraph) in item.content.iter().enumerate() {
                if i > 0 {
                    ctx.advance(gap);
                }
                match marker.take() {
                    Some(marker) => render_paragraph_with(ctx, paragraph, |ctx, baseline| {
                        paint_marker(ctx, &marker, marker_left, baseline)
                    }),
                    None => render_paragraph(ctx, paragraph),
                }
            }
            if let Some(marker) = marker {
                // An item without content still shows its marker.
                ctx.ensure_space(ctx.body_size * LINE_SPACING);
                let baseline = ctx.y + ctx.body_size * 0.95;
                paint_marker(ctx, &marker, marker_left, baseline);
                ctx.advance(ctx.body_size * LINE_SPACING);
            }
        });
    }
}

fn paint_marker(ctx: &mut LayoutContext, marker: &Marker, left: f32, baseline: f32) {
    let size = ctx.body_size;
    match marker {
        Marker::Bullet => ctx.push(DrawOp::Circle {
            cx: left + LIST_INDENT / 2.0 - 2.0,
            cy: baseline - size * 0.32,
            r: size * 0.18,
            color: TEXT_COLOR,
        }),
        Marker::Number(n) => {
            let label = format!("{n}.");
            let width = ctx.text_width(FaceSlot::Regular, &label, size);
            let x = (left + LIST_INDENT - 4.0 - width).max(left - width);
            ctx.text(x, baseline, FaceSlot::Regular, size, TEXT_COLOR, &label);
        }
        Marker::Checkbox(checked) => {
            let side = size * 0.8;
            let (x, y) = (left + 1.0, baseline - side);
            if *checked {
                ctx.push(DrawOp::FillRect {
                    x,
                    y,
                    w: side,
                    h: side,
                    color: CHECK_COLOR,
                });
                let tick = [
                    (x + side * 0.2, y + side * 0.5),
                    (x + side * 0.42, y + side * 0.72),
                    (x + side * 0.8, y + side * 0.25),
                ];
                for pair in tick.windows(2) {
                    ctx.push(DrawOp::Line {
                        x1: pair[0].0,
                        y1: pair[0].1,
                        x2: pair[1].0,
                        y2: pair[1].1,
                        color: Color::WHITE,
                        width: 1.2,
                    });
                }
            } else {
                ctx.push(DrawOp::StrokeRect {
                    x,
                    y,
                    w: side,
                    h: side,
                    color: MUTED_COLOR,
                    width: 0.75,
                });
            }
        }
    }
}

/// Where a decorated block started.
#[derive(Clone, Copy)]
struct Anchor {
    page: usize,
    y: f32,
}

impl Anchor {
    fn here(ctx: &mut LayoutContext) -> Self {
        ctx.ensure_space(ctx.body_size * LINE_SPACING);
        Self {
            page: ctx.page_index(),
            y: ctx.y,
        }
    }
}

/// Draws a vertical bar at `x` from `start` down to the cursor, one segment
/// per page crossed.
fn paint_bar(ctx: &mut LayoutContext, start: Anchor, x: f32, width: f32, color: Color) {
    let end_page = ctx.page_index();
    for page in start.page..=end_page {
        let top = if page == start.page { start.y } else { ctx.body_top() };
        let bottom = if page == end_page { ctx.y } else { ctx.bottom() };
        if bottom > top {
            ctx.push_on(
                page,
                DrawOp::FillRect {
                    x,
                    y: top,
                    w: width,
                    h: bottom - top,
                    color,
                },
            );
        }
    }
}

pub fn render_quote(ctx: &mut LayoutContext, quote: &Quote) {
    let start = Anchor::here(ctx);
    let x = ctx.left;
    ctx.indented(QUOTE_INDENT, |ctx| render_paragraphs(ctx, &quote.content));
    paint_bar(ctx, start, x, 3.0, RULE_COLOR);
}

pub fn render_code(ctx: &mut LayoutContext, code: &Code) {
    let size = ctx.body_size * 0.9;
    let line_height = size * LINE_SPACING;
    let expanded = code.content.replace('\t', "    ");
    let mut rows: Vec<&str> = expanded.lines().collect();
    if rows.is_empty() {
        rows.push("");
    }
    let mut rest = rows.as_slice();
    while !rest.is_empty() {
        ctx.ensure_space(line_height + 2.0 * CODE_PADDING);
        let room = ctx.remaining_height() - 2.0 * CODE_PADDING;
        let fit = ((room / line_height).floor() as usize).clamp(1, rest.len());
        let (chunk, tail) = rest.split_at(fit);
        let (left, top, width) = (ctx.left, ctx.y, ctx.available_width());
        ctx.push(DrawOp::FillRect {
            x: left,
            y: top,
            w: width,
            h: chunk.len() as f32 * line_height + 2.0 * CODE_PADDING,
            color: CODE_BACKGROUND,
        });
        let mut baseline = top + CODE_PADDING + size * 0.95;
        for row in chunk {
            let shown = ctx.clip(FaceSlot::Monospace, row.trim_end(), size, width - 2.0 * CODE_PADDING, false);
            ctx.text(left + CODE_PADDING, baseline, FaceSlot::Monospace, size, TEXT_COLOR, &shown);
            baseline += line_height;
        }
        ctx.advance(chunk.len() as f32 * line_height + 2.0 * CODE_PADDING);
        rest = tail;
        if !rest.is_empty() {
            ctx.new_page();
        }
    }
}

/// Mixes `color` towards white, `amount` 0 (unchanged) to 1 (white).
fn tint(color: Color, amount: f32) -> Color {
    let mix = |c: u8| (f32::from(c) + (255.0 - f32::from(c)) * amount).round() as u8;
    Color::rgb(mix(color.r), mix(color.g), mix(color.b))
}

/// A titled panel: header band, accent bar, then its paragraphs.
fn render_panel(ctx: &mut LayoutContext, title: &str, band: Color, accent: Color, content: &[Paragraph]) {
    let size = ctx.body_size;
    let band_height = size * LINE_SPACING + 8.0;
    ctx.ensure_space(band_height + size * LINE_SPACING);
    let start = Anchor::here(ctx);
    let (left, width) = (ctx.left, ctx.available_width());
    ctx.push(DrawOp::FillRect {
        x: left,
        y: start.y,
        w: width,
        h: band_height,
        color: band,
    });
    let title = ctx.clip(FaceSlot::Bold, title, size, width - PANEL_INDENT - 4.0, true);
    ctx.text(left + PANEL_INDENT, start.y + 4.0 + size * 0.95, FaceSlot::Bold, size, TEXT_COLOR, &title);
    ctx.advance(band_height + 4.0);
    ctx.indented(PANEL_INDENT, |ctx| render_paragraphs(ctx, content));
    ctx.advance(4.0);
    paint_bar(ctx, start, left, 3.0, accent);
}

pub fn render_spoiler(ctx: &mut LayoutContext, spoiler: &Spoiler) {
    let band = if spoiler.bg_color.is_transparent() {
        tint(MUTED_COLOR, 0.85)
    } else {
        spoiler.bg_color
    };
    let accent = if spoiler.color.is_transparent() {
        MUTED_COLOR
    } else {
        spoiler.color
    };
    render_panel(ctx, &spoiler.title, band, accent, &spoiler.content);
}

pub fn render_info_block(ctx: &mut LayoutContext, info: &InfoBlock) {
    let accent = if info.color.is_transparent() {
        ACCENT_COLOR
    } else {
        info.color
    };
    render_panel(ctx, &info.title, tint(accent, 0.85), accent, &info.content);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::pdf::fonts::FontBook;
    use crate::formats::pdf::images::NoImages;
    use crate::formats::pdf::layout::{Finished, PageGeometry};
    use crate::model::ListItem;

    fn render(blocks: Vec<Block>) -> Finished {
        let fonts = FontBook::builtin();
        let mut ctx = LayoutContext::new(PageGeometry::a4(), &fonts, 10.0, &NoImages);
        render_document(&mut ctx, &Document::new(blocks));
        ctx.finish()
    }

    fn texts(finished: &Finished) -> Vec<String> {
        finished
            .pages
            .iter()
            .flat_map(|p| &p.ops)
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn item(text: &str, checked: bool) -> ListItem {
        ListItem {
            content: vec![Paragraph::from_text(text)],
            checked,
        }
    }

    #[test]
    fn numbered_list_markers() {
        let list = List {
            items: vec![item("a", false), item("b", false)],
            numbered: true,
            task_list: false,
        };
        let out = texts(&render(vec![Block::List(list)]));
        // Markers are painted once their line is placed.
        assert_eq!(&out[..4], &["a", "1.", "b", "2."]);
    }

    #[test]
    fn bullets_are_circles() {
        let list = List {
            items: vec![item("a", false), item("b", false)],
            ..List::default()
        };
        let finished = render(vec![Block::List(list)]);
        let dots = finished.pages[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Circle { .. }))
            .count();
        assert_eq!(dots, 2);
    }

    #[test]
    fn checked_task_gets_a_tick() {
        let list = List {
            items: vec![item("done", true), item("open", false)],
            task_list: true,
            ..List::default()
        };
        let finished = render(vec![Block::List(list)]);
        let ops = &finished.pages[0].ops;
        assert_eq!(ops.iter().filter(|op| matches!(op, DrawOp::Line { .. })).count(), 2);
        assert_eq!(ops.iter().filter(|op| matches!(op, DrawOp::StrokeRect { .. })).count(), 1);
    }

    #[test]
    fn code_expands_tabs_and_keeps_lines() {
        let code = Code {
            content: "fn main() {\n\tprintln!();\n}".into(),
        };
        let finished = render(vec![Block::Code(code)]);
        assert_eq!(finished.pages.len(), 1);
        let out = texts(&finished);
        assert_eq!(&out[..3], &["fn main() {", "    println!();", "}"]);
    }

    #[test]
    fn long_code_splits_across_pages() {
        let content = (0..150).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let finished = render(vec![Block::Code(Code { content })]);
        assert!(finished.pages.len() >= 2);
        let lines = texts(&finished).iter().filter(|t| t.starts_with("line ")).count();
        assert_eq!(lines, 150);
    }

    #[test]
    fn long_code_lines_are_clipped() {
        let code = Code {
            content: "x".repeat(500),
        };
        let finished = render(vec![Block::Code(code)]);
        let first = &texts(&finished)[0];
        assert!(first.len() < 500);
        assert!(!first.ends_with('…'));
    }

    #[test]
    fn spoiler_renders_expanded() {
        let spoiler = Spoiler {
            title: "Details".into(),
            collapsed: true,
            content: vec![Paragraph::from_text("hidden text")],
            ..Spoiler::default()
        };
        let out = texts(&render(vec![Block::Spoiler(spoiler)]));
        assert!(out.contains(&"Details".to_string()));
        assert!(out.contains(&"hidden text".to_string()));
    }

    #[test]
    fn quote_bar_spans_its_content() {
        let quote = Quote {
            content: vec![Paragraph::from_text("quoted"), Paragraph::from_text("twice")],
        };
        let finished = render(vec![Block::Quote(quote)]);
        let bar = finished.pages[0].ops.iter().find_map(|op| match op {
            DrawOp::FillRect { w, h, color, .. } if *color == RULE_COLOR => Some((*w, *h)),
            _ => None,
        });
        let (w, h) = bar.expect("quote bar");
        assert_eq!(w, 3.0);
        assert!(h > 26.0);
    }

    #[test]
    fn indent_shifts_paragraph() {
        let paragraph = Paragraph {
            indent: 2,
            ..Paragraph::from_text("deep")
        };
        let finished = render(vec![Block::Paragraph(paragraph)]);
        match &finished.pages[0].ops[0] {
            DrawOp::Text { x, .. } => assert_eq!(*x, 42.0 + 2.0 * INDENT_STEP),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_blocks_are_skipped() {
        let finished = render(vec![
            Block::Unknown(serde_json::json!({"type": "mermaid"})),
            Block::Paragraph(Paragraph::from_text("after")),
        ]);
        assert_eq!(texts(&finished)[0], "after");
    }
}

//! Legacy HTML import (HTML → document model)
//!
//! The fragment is parsed with html5ever into an `RcDom`, then the `<body>`
//! children are dispatched by tag name. Inline content is collected by a
//! depth-first walk that carries the accumulated mark state down the tree and
//! emits one `Text` leaf per DOM text node.

use super::style::{parse_px, InlineStyle};
use crate::error::{DecodeError, UnsupportedNodeError};
use crate::model::{
    Block, Cell, Code, Color, Document, Image, Inline, InfoBlock, List, ListItem, Paragraph, Quote,
    Spoiler, Table, Text, TextAlign,
};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Parses a stored HTML fragment into a document.
pub fn parse_html(fragment: &str) -> Result<Document, DecodeError> {
    if fragment.contains('\0') {
        return Err(DecodeError::Html("input contains a NUL byte".to_string()));
    }
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(fragment);
    let body = find_element(&dom.document, "html")
        .and_then(|html| find_element(&html, "body"))
        .ok_or_else(|| DecodeError::Html("document has no <body>".to_string()))?;

    let mut blocks = Vec::new();
    let mut pending = InlineRun::new();
    for child in body.children.borrow().iter() {
        match element_name(child) {
            Some(tag) if is_inline_tag(tag) && tag != "img" => {
                collect_inlines(child, &MarkState::default(), &mut pending)
            }
            Some(tag) => {
                flush_paragraph(&mut pending, 0, TextAlign::Left, &mut blocks);
                import_block(child, tag, &mut blocks);
            }
            None => collect_inlines(child, &MarkState::default(), &mut pending),
        }
    }
    flush_paragraph(&mut pending, 0, TextAlign::Left, &mut blocks);
    Ok(Document { blocks })
}

fn flush_paragraph(run: &mut InlineRun, indent: u32, align: TextAlign, blocks: &mut Vec<Block>) {
    if let Some(paragraph) = run.take_paragraph(indent, align) {
        blocks.push(Block::Paragraph(paragraph));
    }
}

fn import_block(node: &Handle, tag: &str, blocks: &mut Vec<Block>) {
    let block = match tag {
        "p" => Block::Paragraph(import_paragraph(node, 0)),
        "ul" | "ol" => Block::List(import_list(node, tag)),
        "blockquote" => Block::Quote(Quote {
            content: collect_paragraphs(node, 0),
        }),
        "table" => Block::Table(import_table(node)),
        "pre" => Block::Code(Code {
            content: raw_text(node),
        }),
        "div" if has_attr(node, "data-spoiler") => Block::Spoiler(import_spoiler(node)),
        "div" if has_attr(node, "data-info-block") => Block::InfoBlock(import_info_block(node)),
        "img" => match import_image(node) {
            Some(image) => Block::Paragraph(Paragraph::new(vec![image])),
            None => return,
        },
        other => {
            log::debug!("skipping top-level <{other}>");
            return;
        }
    };
    blocks.push(block);
}

/// Marks accumulated from the ancestors of a text node.
#[derive(Debug, Clone, Default)]
struct MarkState {
    strong: bool,
    italic: bool,
    underlined: bool,
    strikethrough: bool,
    sub: bool,
    sup: bool,
    color: Option<Color>,
    bg_color: Option<Color>,
    size: u32,
    align: TextAlign,
    url: Option<String>,
}

impl MarkState {
    fn leaf(&self, content: String) -> Text {
        Text {
            content,
            size: self.size,
            strong: self.strong,
            italic: self.italic,
            underlined: self.underlined,
            strikethrough: self.strikethrough,
            sup: self.sup,
            sub: self.sub,
            color: self.color,
            bg_color: self.bg_color,
            align: self.align,
            url: self.url.clone(),
        }
    }

    fn apply_style(&mut self, style: &InlineStyle) {
        if let Some(color) = style.color() {
            self.color = Some(color);
        }
        if let Some(bg) = style.background_color() {
            self.bg_color = Some(bg);
        }
        if let Some(size) = style.font_size() {
            self.size = size;
        }
    }
}

/// Inline content being gathered for one paragraph.
struct InlineRun {
    content: Vec<Inline>,
    /// Whether the last emitted character was collapsible whitespace.
    after_space: bool,
}

impl InlineRun {
    fn new() -> Self {
        Self {
            content: Vec::new(),
            after_space: true,
        }
    }

    fn push_text(&mut self, raw: &str, state: &MarkState) {
        let mut collapsed = String::with_capacity(raw.len());
        for ch in raw.chars() {
            if ch.is_ascii_whitespace() {
                if !self.after_space {
                    collapsed.push(' ');
                    self.after_space = true;
                }
            } else {
                collapsed.push(ch);
                self.after_space = false;
            }
        }
        if !collapsed.is_empty() {
            self.content.push(Inline::Text(state.leaf(collapsed)));
        }
    }

    fn push(&mut self, inline: Inline) {
        self.after_space = matches!(inline, Inline::HardBreak);
        self.content.push(inline);
    }

    fn has_content(&self) -> bool {
        self.content.iter().any(|inline| match inline {
            Inline::Text(text) => !text.content.trim().is_empty(),
            _ => true,
        })
    }

    fn take_paragraph(&mut self, indent: u32, align: TextAlign) -> Option<Paragraph> {
        let has_content = self.has_content();
        let mut content = std::mem::take(&mut self.content);
        self.after_space = true;
        if !has_content {
            return None;
        }
        // The space collapsed from trailing markup is not content.
        if let Some(Inline::Text(last)) = content.last_mut() {
            let trimmed = last.content.trim_end().len();
            last.content.truncate(trimmed);
            if last.content.is_empty() {
                content.pop();
            }
        }
        Some(Paragraph {
            content,
            indent,
            align,
        })
    }
}

fn is_inline_tag(tag: &str) -> bool {
    matches!(
        tag,
        "strong"
            | "b"
            | "em"
            | "i"
            | "u"
            | "s"
            | "strike"
            | "del"
            | "sub"
            | "sup"
            | "span"
            | "mark"
            | "a"
            | "br"
            | "img"
            | "code"
            | "font"
            | "small"
            | "label"
    )
}

fn collect_inlines(node: &Handle, state: &MarkState, run: &mut InlineRun) {
    match &node.data {
        NodeData::Text { contents } => run.push_text(&contents.borrow(), state),
        NodeData::Element { .. } => {
            let Some(tag) = element_name(node) else {
                return;
            };
            match tag {
                "br" => run.push(Inline::HardBreak),
                "img" => {
                    if let Some(image) = import_image(node) {
                        run.push(image);
                    }
                }
                "script" | "style" | "input" => {}
                _ => {
                    let inner = nested_state(node, tag, state);
                    for child in node.children.borrow().iter() {
                        collect_inlines(child, &inner, run);
                    }
                }
            }
        }
        _ => {}
    }
}

fn nested_state(node: &Handle, tag: &str, state: &MarkState) -> MarkState {
    let mut inner = state.clone();
    match tag {
        "strong" | "b" => inner.strong = true,
        "em" | "i" => inner.italic = true,
        "u" => inner.underlined = true,
        "s" | "strike" | "del" => inner.strikethrough = true,
        "sub" => inner.sub = true,
        "sup" => inner.sup = true,
        "a" => {
            if let Some(href) = attr(node, "href").filter(|h| !h.trim().is_empty()) {
                inner.url = Some(href);
            }
        }
        _ => {}
    }
    let style = style_of(node);
    if tag == "mark" && style.background_color().is_none() {
        inner.bg_color = Some(Color::HIGHLIGHT);
    }
    inner.apply_style(&style);
    inner
}

fn import_paragraph(node: &Handle, extra_indent: u32) -> Paragraph {
    let style = style_of(node);
    let align = style.text_align().unwrap_or_default();
    let indent = attr(node, "data-indent")
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(0)
        + extra_indent;

    let state = MarkState {
        align,
        ..MarkState::default()
    };
    let mut run = InlineRun::new();
    for child in node.children.borrow().iter() {
        collect_inlines(child, &state, &mut run);
    }
    run.take_paragraph(indent, align).unwrap_or(Paragraph {
        content: Vec::new(),
        indent,
        align,
    })
}

/// Paragraphs of a paragraph-only container (`li`, `blockquote`, `td`, panels).
/// Loose inline content forms its own paragraph; nested lists are flattened
/// into paragraphs indented by depth.
fn collect_paragraphs(node: &Handle, depth: u32) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut run = InlineRun::new();
    let flush = |run: &mut InlineRun, paragraphs: &mut Vec<Paragraph>| {
        if let Some(paragraph) = run.take_paragraph(depth, TextAlign::Left) {
            paragraphs.push(paragraph);
        }
    };

    for child in node.children.borrow().iter() {
        match element_name(child) {
            Some("p") => {
                flush(&mut run, &mut paragraphs);
                paragraphs.push(import_paragraph(child, depth));
            }
            Some("ul" | "ol") => {
                flush(&mut run, &mut paragraphs);
                for item in child_elements(child, "li") {
                    paragraphs.extend(collect_paragraphs(&item, depth + 1));
                }
            }
            Some("div" | "blockquote" | "section") => {
                flush(&mut run, &mut paragraphs);
                paragraphs.extend(collect_paragraphs(child, depth));
            }
            Some(tag @ ("pre" | "table")) => {
                flush(&mut run, &mut paragraphs);
                UnsupportedNodeError::new("tag", tag, "paragraph container").log();
            }
            _ => collect_inlines(child, &MarkState::default(), &mut run),
        }
    }
    flush(&mut run, &mut paragraphs);
    paragraphs
}

fn import_list(node: &Handle, tag: &str) -> List {
    let task_list = attr(node, "data-type").as_deref() == Some("taskList");
    let items = child_elements(node, "li")
        .iter()
        .map(|item| ListItem {
            checked: attr(item, "data-checked").as_deref() == Some("true"),
            content: collect_paragraphs(item, 0),
        })
        .collect();
    List {
        items,
        numbered: tag == "ol",
        task_list,
    }
}

fn import_table(node: &Handle) -> Table {
    let mut rows = Vec::new();
    let mut col_widths = Vec::new();
    collect_table_parts(node, &mut rows, &mut col_widths);

    let mut table = Table::new(rows, col_widths, 0);
    let style = style_of(node);
    table.min_width = style
        .min_width_px()
        .or_else(|| style.width_px())
        .unwrap_or_else(|| table.col_widths.iter().sum());
    table
}

fn collect_table_parts(node: &Handle, rows: &mut Vec<Vec<Cell>>, col_widths: &mut Vec<u32>) {
    for child in node.children.borrow().iter() {
        match element_name(child) {
            Some("thead" | "tbody" | "tfoot") => collect_table_parts(child, rows, col_widths),
            Some("colgroup") => {
                for col in child_elements(child, "col") {
                    let width = style_of(&col).width_px().unwrap_or(0);
                    let span = span_attr(&col, "span");
                    col_widths.extend(std::iter::repeat(width).take(span as usize));
                }
            }
            Some("tr") => rows.push(import_row(child)),
            Some("caption") | None => {}
            Some(other) => UnsupportedNodeError::new("tag", other, "table").log(),
        }
    }
}

fn import_row(row: &Handle) -> Vec<Cell> {
    row.children
        .borrow()
        .iter()
        .filter_map(|cell| {
            let header = match element_name(cell)? {
                "th" => true,
                "td" => false,
                other => {
                    UnsupportedNodeError::new("tag", other, "table row").log();
                    return None;
                }
            };
            Some(Cell {
                content: collect_paragraphs(cell, 0),
                col_span: span_attr(cell, "colspan"),
                row_span: span_attr(cell, "rowspan"),
                header,
            })
        })
        .collect()
}

fn span_attr(node: &Handle, name: &str) -> u32 {
    attr(node, name)
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}

fn color_data(node: &Handle, name: &str) -> Color {
    attr(node, name)
        .map(|raw| Color::parse_or_default(&raw))
        .unwrap_or_default()
}

fn import_spoiler(node: &Handle) -> Spoiler {
    Spoiler {
        title: attr(node, "data-title").unwrap_or_default(),
        collapsed: attr(node, "data-collapsed").as_deref() == Some("true"),
        bg_color: color_data(node, "data-bg-color"),
        color: color_data(node, "data-color"),
        content: collect_paragraphs(node, 0),
    }
}

fn import_info_block(node: &Handle) -> InfoBlock {
    InfoBlock {
        title: attr(node, "data-title").unwrap_or_default(),
        color: color_data(node, "data-color"),
        content: collect_paragraphs(node, 0),
    }
}

fn import_image(node: &Handle) -> Option<Inline> {
    let Some(src) = attr(node, "src").filter(|s| !s.trim().is_empty()) else {
        log::warn!("<img> without src skipped");
        return None;
    };
    let style = style_of(node);
    let width = style
        .width_px()
        .or_else(|| attr(node, "width").as_deref().and_then(parse_px))
        .unwrap_or(0);
    let align = style.float_align().unwrap_or(TextAlign::Center);
    Some(Inline::Image(Image { src, width, align }))
}

/// Text content of a `<pre>`, with `<br>` as newlines.
fn raw_text(node: &Handle) -> String {
    let mut out = String::new();
    append_raw_text(node, &mut out);
    out
}

fn append_raw_text(node: &Handle, out: &mut String) {
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { .. } if element_name(child) == Some("br") => out.push('\n'),
            NodeData::Element { .. } => append_raw_text(child, out),
            _ => {}
        }
    }
}

fn element_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

fn find_element(node: &Handle, tag: &str) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|child| element_name(child) == Some(tag))
        .cloned()
}

fn child_elements(node: &Handle, tag: &str) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| element_name(child) == Some(tag))
        .cloned()
        .collect()
}

fn attr(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn has_attr(node: &Handle, name: &str) -> bool {
    attr(node, name).is_some()
}

fn style_of(node: &Handle) -> InlineStyle {
    attr(node, "style")
        .map(|raw| InlineStyle::parse(&raw))
        .unwrap_or_default()
}

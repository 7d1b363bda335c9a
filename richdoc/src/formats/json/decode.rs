//! JSON tree → document model.
//!
//! Node types are resolved through static dispatch tables; marks are a
//! separate table of independent transformations over a [`Text`] leaf, so any
//! combination of marks composes. Anything the tables do not know is logged:
//! unknown nodes are kept as `Unknown` values, unknown marks are dropped.

use super::node::{attr_str, attr_u32, WireMark, WireNode};
use crate::error::{DecodeError, UnsupportedNodeError};
use crate::formats::html::style::InlineStyle;
use crate::model::{
    Block, Cell, Code, Color, DateNode, Document, Image, Inline, InfoBlock, IssueLinkMention,
    List, ListItem, Mention, Paragraph, Quote, Spoiler, Table, Text, TextAlign,
};
use serde_json::{Map, Value};

type BlockBuilder = fn(&WireNode) -> Block;
type InlineBuilder = fn(&WireNode) -> Option<Inline>;
type MarkApplier = fn(&mut Text, &Map<String, Value>);

static BLOCK_BUILDERS: &[(&str, BlockBuilder)] = &[
    ("paragraph", build_paragraph_block),
    ("blockquote", build_quote),
    ("codeBlock", build_code),
    ("bulletList", build_list),
    ("orderedList", build_list),
    ("taskList", build_list),
    ("table", build_table),
    ("spoiler", build_spoiler),
    ("info-block", build_info_block),
];

static INLINE_BUILDERS: &[(&str, InlineBuilder)] = &[
    ("text", build_text),
    ("hardBreak", build_hard_break),
    ("image", build_image),
    ("imageResize", build_image),
    ("date-node", build_date),
    ("mention", build_mention),
    ("issueLinkMention", build_issue_link),
];

static MARK_APPLIERS: &[(&str, MarkApplier)] = &[
    ("bold", apply_bold),
    ("italic", apply_italic),
    ("underline", apply_underline),
    ("strike", apply_strike),
    ("superscript", apply_superscript),
    ("subscript", apply_subscript),
    ("textStyle", apply_text_style),
    ("link", apply_link),
    ("highlight", apply_highlight),
];

fn block_builder(kind: &str) -> Option<BlockBuilder> {
    BLOCK_BUILDERS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, builder)| *builder)
}

fn inline_builder(kind: &str) -> Option<InlineBuilder> {
    INLINE_BUILDERS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, builder)| *builder)
}

fn mark_applier(kind: &str) -> Option<MarkApplier> {
    MARK_APPLIERS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, applier)| *applier)
}

/// Decodes a serialized `doc` tree.
pub fn decode(json: &[u8]) -> Result<Document, DecodeError> {
    let value: Value = serde_json::from_slice(json)?;
    decode_value(&value)
}

/// Decodes an already-parsed `doc` tree.
pub fn decode_value(value: &Value) -> Result<Document, DecodeError> {
    let root = value
        .as_object()
        .ok_or_else(|| DecodeError::NotADocument("root is not an object".to_string()))?;
    match attr_str(root, "type") {
        Some("doc") => {}
        Some(other) => {
            return Err(DecodeError::NotADocument(format!(
                "root node type is '{other}', expected 'doc'"
            )))
        }
        None => {
            return Err(DecodeError::NotADocument(
                "root node has no type".to_string(),
            ))
        }
    }
    let root = WireNode::from_value(value)
        .ok_or_else(|| DecodeError::NotADocument("malformed root node".to_string()))?;

    let blocks = root
        .children()
        .filter_map(|(node, raw)| decode_block(&node, raw))
        .collect();
    Ok(Document { blocks })
}

fn decode_block(node: &WireNode, raw: &Value) -> Option<Block> {
    if let Some(builder) = block_builder(&node.kind) {
        return Some(builder(node));
    }
    // Images are block nodes in the editor but inline in the model.
    if let Some(inline) = inline_builder(&node.kind).and_then(|builder| builder(node)) {
        return Some(Block::Paragraph(Paragraph::new(vec![inline])));
    }
    let err = UnsupportedNodeError::new("node", node.kind.clone(), "json decode");
    log::warn!("{err}; preserved verbatim");
    Some(Block::Unknown(raw.clone()))
}

fn decode_inline(node: &WireNode, raw: &Value) -> Option<Inline> {
    match inline_builder(&node.kind) {
        Some(builder) => builder(node),
        None => {
            let err = UnsupportedNodeError::new("node", node.kind.clone(), "json decode");
            log::warn!("{err}; preserved verbatim");
            Some(Inline::Unknown(raw.clone()))
        }
    }
}

fn build_paragraph_block(node: &WireNode) -> Block {
    Block::Paragraph(build_paragraph(node, 0))
}

fn build_paragraph(node: &WireNode, extra_indent: u32) -> Paragraph {
    let align = node
        .attr_str("textAlign")
        .and_then(TextAlign::parse)
        .unwrap_or_default();
    let mut content: Vec<Inline> = node
        .children()
        .filter_map(|(child, raw)| decode_inline(&child, raw))
        .collect();
    for inline in &mut content {
        if let Inline::Text(text) = inline {
            text.align = align;
        }
    }
    Paragraph {
        content,
        indent: node.attr_u32("indent").unwrap_or(0) + extra_indent,
        align,
    }
}

/// Collects the paragraphs of a paragraph-only container. Nested lists are
/// flattened into paragraphs indented by their depth.
fn collect_paragraphs(node: &WireNode, depth: u32) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    for (child, _) in node.children() {
        match child.kind.as_str() {
            "paragraph" => paragraphs.push(build_paragraph(&child, depth)),
            "bulletList" | "orderedList" | "taskList" => {
                for (item, _) in child.children() {
                    paragraphs.extend(collect_paragraphs(&item, depth + 1));
                }
            }
            "image" | "imageResize" => {
                if let Some(image) = build_image(&child) {
                    let mut paragraph = Paragraph::new(vec![image]);
                    paragraph.indent = depth;
                    paragraphs.push(paragraph);
                }
            }
            other => {
                UnsupportedNodeError::new("node", other, "paragraph container").log();
            }
        }
    }
    paragraphs
}

fn build_quote(node: &WireNode) -> Block {
    Block::Quote(Quote {
        content: collect_paragraphs(node, 0),
    })
}

fn build_code(node: &WireNode) -> Block {
    let content = node
        .children()
        .filter_map(|(child, _)| child.text)
        .collect::<String>();
    Block::Code(Code { content })
}

fn build_list(node: &WireNode) -> Block {
    let items = node
        .children()
        .filter_map(|(item, _)| match item.kind.as_str() {
            "listItem" | "taskItem" => Some(ListItem {
                content: collect_paragraphs(&item, 0),
                checked: item.attr_bool("checked").unwrap_or(false),
            }),
            other => {
                UnsupportedNodeError::new("node", other, "list").log();
                None
            }
        })
        .collect();
    Block::List(List {
        items,
        numbered: node.kind == "orderedList",
        task_list: node.kind == "taskList",
    })
}

fn build_table(node: &WireNode) -> Block {
    let mut rows = Vec::new();
    let mut col_widths = Vec::new();

    for (row_node, _) in node.children() {
        if row_node.kind != "tableRow" {
            UnsupportedNodeError::new("node", row_node.kind.clone(), "table").log();
            continue;
        }
        let mut column = 0usize;
        let mut row = Vec::new();
        for (cell_node, _) in row_node.children() {
            let header = match cell_node.kind.as_str() {
                "tableHeader" => true,
                "tableCell" => false,
                other => {
                    UnsupportedNodeError::new("node", other, "table row").log();
                    continue;
                }
            };
            let cell = Cell {
                content: collect_paragraphs(&cell_node, 0),
                col_span: cell_node.attr_u32("colspan").unwrap_or(1).max(1),
                row_span: cell_node.attr_u32("rowspan").unwrap_or(1).max(1),
                header,
            };
            // The first row declares the widths; wider rows add theirs.
            for (offset, width) in declared_widths(&cell_node, cell.col_span).into_iter().enumerate() {
                if column + offset == col_widths.len() {
                    col_widths.push(width);
                }
            }
            column += cell.col_span as usize;
            row.push(cell);
        }
        rows.push(row);
    }

    let mut table = Table::new(rows, col_widths, 0);
    table.min_width = node
        .attr_u32("minWidth")
        .unwrap_or_else(|| table.col_widths.iter().sum());
    Block::Table(table)
}

/// The `colwidth` array of a cell, one entry per spanned column.
fn declared_widths(cell: &WireNode, span: u32) -> Vec<u32> {
    let mut widths: Vec<u32> = match cell.attr("colwidth") {
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| v.as_f64().map(|w| w.max(0.0).round() as u32).unwrap_or(0))
            .collect(),
        _ => Vec::new(),
    };
    widths.resize(span as usize, 0);
    widths
}

fn color_attr(node: &WireNode, key: &str) -> Color {
    node.attr_str(key)
        .map(Color::parse_or_default)
        .unwrap_or_default()
}

fn build_spoiler(node: &WireNode) -> Block {
    Block::Spoiler(Spoiler {
        title: node.attr_string("title").unwrap_or_default(),
        collapsed: node.attr_bool("collapsed").unwrap_or(false),
        bg_color: color_attr(node, "bgColor"),
        color: color_attr(node, "color"),
        content: collect_paragraphs(node, 0),
    })
}

fn build_info_block(node: &WireNode) -> Block {
    Block::InfoBlock(InfoBlock {
        title: node.attr_string("title").unwrap_or_default(),
        color: color_attr(node, "color"),
        content: collect_paragraphs(node, 0),
    })
}

fn build_text(node: &WireNode) -> Option<Inline> {
    let mut text = Text::plain(node.text.clone().unwrap_or_default());
    for mark in &node.marks {
        apply_mark(&mut text, mark);
    }
    Some(Inline::Text(text))
}

fn apply_mark(text: &mut Text, mark: &WireMark) {
    match mark_applier(&mark.kind) {
        Some(apply) => apply(text, &mark.attrs),
        None => UnsupportedNodeError::new("mark", mark.kind.clone(), "json decode").log(),
    }
}

fn apply_bold(text: &mut Text, _: &Map<String, Value>) {
    text.strong = true;
}

fn apply_italic(text: &mut Text, _: &Map<String, Value>) {
    text.italic = true;
}

fn apply_underline(text: &mut Text, _: &Map<String, Value>) {
    text.underlined = true;
}

fn apply_strike(text: &mut Text, _: &Map<String, Value>) {
    text.strikethrough = true;
}

fn apply_superscript(text: &mut Text, _: &Map<String, Value>) {
    text.sup = true;
}

fn apply_subscript(text: &mut Text, _: &Map<String, Value>) {
    text.sub = true;
}

fn apply_text_style(text: &mut Text, attrs: &Map<String, Value>) {
    if let Some(color) = attr_str(attrs, "color") {
        text.color = Some(Color::parse_or_default(color));
    }
    if let Some(size) = attr_u32(attrs, "fontSize") {
        text.size = size;
    }
}

fn apply_link(text: &mut Text, attrs: &Map<String, Value>) {
    match attr_str(attrs, "href") {
        Some(href) => text.url = Some(href.to_string()),
        None => log::debug!("link mark without href ignored"),
    }
}

fn apply_highlight(text: &mut Text, attrs: &Map<String, Value>) {
    let color = attr_str(attrs, "color")
        .map(Color::parse_or_default)
        .unwrap_or(Color::HIGHLIGHT);
    text.bg_color = Some(color);
}

fn build_hard_break(_: &WireNode) -> Option<Inline> {
    Some(Inline::HardBreak)
}

fn build_image(node: &WireNode) -> Option<Inline> {
    let Some(src) = node.attr_string("src").filter(|s| !s.is_empty()) else {
        log::warn!("{} node without src skipped", node.kind);
        return None;
    };
    let style = node.attr_str("style").map(InlineStyle::parse);
    let width = node
        .attr_u32("width")
        .or_else(|| style.as_ref().and_then(|s| s.width_px()))
        .unwrap_or(0);
    let align = node
        .attr_str("align")
        .and_then(TextAlign::parse)
        .or_else(|| style.as_ref().and_then(|s| s.float_align()))
        .unwrap_or_default();
    Some(Inline::Image(Image { src, width, align }))
}

fn build_date(node: &WireNode) -> Option<Inline> {
    Some(Inline::DateNode(DateNode {
        date: node.attr_string("date").unwrap_or_default(),
    }))
}

fn build_mention(node: &WireNode) -> Option<Inline> {
    Some(Inline::Mention(Mention {
        id: node.attr_string("id").unwrap_or_default(),
        label: node.attr_string("label").unwrap_or_default(),
    }))
}

fn build_issue_link(node: &WireNode) -> Option<Inline> {
    Some(Inline::IssueLinkMention(IssueLinkMention {
        slug: node.attr_string("slug").unwrap_or_default(),
        project_identifier: node.attr_string("projectIdentifier").unwrap_or_default(),
        current_issue_id: node.attr_string("currentIssueId").unwrap_or_default(),
        original_url: node.attr_string("originalUrl").unwrap_or_default(),
    }))
}

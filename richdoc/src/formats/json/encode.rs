//! Document model → JSON tree.
//!
//! The structural inverse of [`decode`](super::decode). Attributes holding
//! their default value are left out; marks are derived from the `Text` flags
//! in a fixed order so the output is stable.

use super::node::{WireMark, WireNode};
use crate::error::EncodeError;
use crate::model::{
    Block, Cell, Code, Document, Image, Inline, InfoBlock, List, ListItem, Paragraph, Quote,
    Spoiler, Table, Text, TextAlign,
};
use serde_json::{json, Map, Value};

/// Serializes a document as compact JSON bytes.
pub fn encode(doc: &Document) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec(&encode_value(doc)?)?)
}

/// Builds the `doc` tree for a document.
pub fn encode_value(doc: &Document) -> Result<Value, EncodeError> {
    let content = doc
        .blocks
        .iter()
        .map(encode_block)
        .collect::<Result<Vec<_>, _>>()?;
    to_value(WireNode::new("doc").with_content(content))
}

fn to_value(node: WireNode) -> Result<Value, EncodeError> {
    Ok(serde_json::to_value(node)?)
}

fn encode_block(block: &Block) -> Result<Value, EncodeError> {
    match block {
        Block::Paragraph(paragraph) => encode_paragraph(paragraph),
        Block::List(list) => encode_list(list),
        Block::Quote(quote) => encode_quote(quote),
        Block::Code(code) => encode_code(code),
        Block::Table(table) => encode_table(table),
        Block::Spoiler(spoiler) => encode_spoiler(spoiler),
        Block::InfoBlock(info) => encode_info_block(info),
        Block::Unknown(raw) => Ok(raw.clone()),
    }
}

fn encode_paragraphs(paragraphs: &[Paragraph]) -> Result<Vec<Value>, EncodeError> {
    paragraphs.iter().map(encode_paragraph).collect()
}

fn encode_paragraph(paragraph: &Paragraph) -> Result<Value, EncodeError> {
    let mut node = WireNode::new("paragraph");
    if paragraph.align != TextAlign::Left {
        node = node.with_attr("textAlign", paragraph.align.as_str());
    }
    if paragraph.indent > 0 {
        node = node.with_attr("indent", paragraph.indent);
    }
    let content = paragraph
        .content
        .iter()
        .map(encode_inline)
        .collect::<Result<Vec<_>, _>>()?;
    to_value(node.with_content(content))
}

fn encode_list(list: &List) -> Result<Value, EncodeError> {
    let (list_type, item_type) = if list.task_list {
        ("taskList", "taskItem")
    } else if list.numbered {
        ("orderedList", "listItem")
    } else {
        ("bulletList", "listItem")
    };
    let items = list
        .items
        .iter()
        .map(|item| encode_list_item(item, item_type, list.task_list))
        .collect::<Result<Vec<_>, _>>()?;
    to_value(WireNode::new(list_type).with_content(items))
}

fn encode_list_item(item: &ListItem, item_type: &str, task: bool) -> Result<Value, EncodeError> {
    let mut node = WireNode::new(item_type);
    if task {
        node = node.with_attr("checked", item.checked);
    }
    to_value(node.with_content(encode_paragraphs(&item.content)?))
}

fn encode_quote(quote: &Quote) -> Result<Value, EncodeError> {
    to_value(WireNode::new("blockquote").with_content(encode_paragraphs(&quote.content)?))
}

fn encode_code(code: &Code) -> Result<Value, EncodeError> {
    let mut node = WireNode::new("codeBlock");
    if !code.content.is_empty() {
        let mut text = WireNode::new("text");
        text.text = Some(code.content.clone());
        node = node.with_content(vec![to_value(text)?]);
    }
    to_value(node)
}

fn encode_table(table: &Table) -> Result<Value, EncodeError> {
    let mut node = WireNode::new("table");
    let declared: u32 = table.col_widths.iter().sum();
    if table.min_width != declared {
        node = node.with_attr("minWidth", table.min_width);
    }

    let mut rows = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let mut column = 0usize;
        let mut cells = Vec::with_capacity(row.len());
        for cell in row {
            let widths = if table.col_widths.is_empty() {
                None
            } else {
                Some(span_widths(&table.col_widths, column, cell.col_span))
            };
            column += cell.col_span as usize;
            cells.push(encode_cell(cell, widths)?);
        }
        rows.push(to_value(WireNode::new("tableRow").with_content(cells))?);
    }
    to_value(node.with_content(rows))
}

/// The `colwidth` array for a cell starting at `start`, `null` for auto columns.
fn span_widths(widths: &[u32], start: usize, span: u32) -> Value {
    let slice: Vec<Value> = (start..start + span as usize)
        .map(|i| json!(widths.get(i).copied().unwrap_or(0)))
        .collect();
    if slice.iter().all(|w| w == &json!(0)) {
        Value::Null
    } else {
        Value::Array(slice)
    }
}

fn encode_cell(cell: &Cell, colwidth: Option<Value>) -> Result<Value, EncodeError> {
    let kind = if cell.header { "tableHeader" } else { "tableCell" };
    let mut node = WireNode::new(kind)
        .with_attr("colspan", cell.col_span)
        .with_attr("rowspan", cell.row_span);
    if let Some(widths) = colwidth {
        node = node.with_attr("colwidth", widths);
    }
    to_value(node.with_content(encode_paragraphs(&cell.content)?))
}

fn encode_spoiler(spoiler: &Spoiler) -> Result<Value, EncodeError> {
    let node = WireNode::new("spoiler")
        .with_attr("title", spoiler.title.clone())
        .with_attr("collapsed", spoiler.collapsed)
        .with_attr("bgColor", spoiler.bg_color.to_hex())
        .with_attr("color", spoiler.color.to_hex());
    to_value(node.with_content(encode_paragraphs(&spoiler.content)?))
}

fn encode_info_block(info: &InfoBlock) -> Result<Value, EncodeError> {
    let node = WireNode::new("info-block")
        .with_attr("title", info.title.clone())
        .with_attr("color", info.color.to_hex());
    to_value(node.with_content(encode_paragraphs(&info.content)?))
}

fn encode_inline(inline: &Inline) -> Result<Value, EncodeError> {
    let node = match inline {
        Inline::Text(text) => encode_text(text),
        Inline::Image(image) => encode_image(image),
        Inline::HardBreak => WireNode::new("hardBreak"),
        Inline::DateNode(date) => WireNode::new("date-node").with_attr("date", date.date.clone()),
        Inline::Mention(mention) => WireNode::new("mention")
            .with_attr("id", mention.id.clone())
            .with_attr("label", mention.label.clone()),
        Inline::IssueLinkMention(link) => WireNode::new("issueLinkMention")
            .with_attr("slug", link.slug.clone())
            .with_attr("projectIdentifier", link.project_identifier.clone())
            .with_attr("currentIssueId", link.current_issue_id.clone())
            .with_attr("originalUrl", link.original_url.clone()),
        Inline::Unknown(raw) => return Ok(raw.clone()),
    };
    to_value(node)
}

fn encode_image(image: &Image) -> WireNode {
    let mut node = WireNode::new("image").with_attr("src", image.src.clone());
    if image.width > 0 {
        node = node.with_attr("width", image.width);
    }
    if image.align != TextAlign::Left {
        node = node.with_attr("align", image.align.as_str());
    }
    node
}

fn encode_text(text: &Text) -> WireNode {
    let mut node = WireNode::new("text");
    node.text = Some(text.content.clone());
    node.marks = text_marks(text);
    node
}

fn mark(kind: &str) -> WireMark {
    WireMark {
        kind: kind.to_string(),
        attrs: Map::new(),
    }
}

fn text_marks(text: &Text) -> Vec<WireMark> {
    let mut marks = Vec::new();
    for (set, kind) in [
        (text.strong, "bold"),
        (text.italic, "italic"),
        (text.underlined, "underline"),
        (text.strikethrough, "strike"),
        (text.sup, "superscript"),
        (text.sub, "subscript"),
    ] {
        if set {
            marks.push(mark(kind));
        }
    }

    let mut style = mark("textStyle");
    if let Some(color) = text.color {
        style.attrs.insert("color".into(), json!(color.to_hex()));
    }
    if text.size > 0 {
        style
            .attrs
            .insert("fontSize".into(), json!(format!("{}px", text.size)));
    }
    if !style.attrs.is_empty() {
        marks.push(style);
    }

    if let Some(url) = &text.url {
        let mut link = mark("link");
        link.attrs.insert("href".into(), json!(url));
        marks.push(link);
    }
    if let Some(bg) = text.bg_color {
        let mut highlight = mark("highlight");
        highlight.attrs.insert("color".into(), json!(bg.to_hex()));
        marks.push(highlight);
    }
    marks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::json::decode::decode_value;
    use crate::model::{Color, DateNode, IssueLinkMention, Mention};
    use pretty_assertions::assert_eq;

    fn round_trip(doc: &Document) -> Document {
        decode_value(&encode_value(doc).unwrap()).unwrap()
    }

    fn paragraph_of(text: Text) -> Document {
        Document::new(vec![Block::Paragraph(Paragraph::new(vec![Inline::Text(text)]))])
    }

    #[test]
    fn plain_text_round_trips() {
        let doc = paragraph_of(Text::plain("hello"));
        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn bold_italic_round_trips() {
        let doc = paragraph_of(Text {
            strong: true,
            italic: true,
            ..Text::plain("Hello")
        });
        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn link_round_trips() {
        let doc = paragraph_of(Text {
            url: Some("https://example.com/a?b=c".to_string()),
            underlined: true,
            ..Text::plain("site")
        });
        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn highlight_and_style_round_trip() {
        let doc = paragraph_of(Text {
            bg_color: Some(Color::rgba(0, 255, 0, 128)),
            color: Some(Color::rgb(12, 34, 56)),
            size: 14,
            sup: true,
            ..Text::plain("hot")
        });
        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn marks_follow_fixed_order() {
        let value = encode_value(&paragraph_of(Text {
            url: Some("u".into()),
            strikethrough: true,
            strong: true,
            ..Text::plain("x")
        }))
        .unwrap();
        let marks: Vec<&str> = value["content"][0]["content"][0]["marks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["type"].as_str().unwrap())
            .collect();
        assert_eq!(marks, vec!["bold", "strike", "link"]);
    }

    #[test]
    fn default_attributes_are_omitted() {
        let value = encode_value(&Document::new(vec![Block::Paragraph(Paragraph::from_text(
            "x",
        ))]))
        .unwrap();
        assert_eq!(
            value,
            json!({"type": "doc", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "x"}]}
            ]})
        );
    }

    #[test]
    fn lists_pick_node_type() {
        let list = |numbered, task_list| {
            Block::List(List {
                items: vec![ListItem {
                    content: vec![Paragraph::from_text("item")],
                    checked: true,
                }],
                numbered,
                task_list,
            })
        };
        let value = encode_value(&Document::new(vec![
            list(false, false),
            list(true, false),
            list(false, true),
        ]))
        .unwrap();
        assert_eq!(value["content"][0]["type"], "bulletList");
        assert_eq!(value["content"][1]["type"], "orderedList");
        assert_eq!(value["content"][2]["type"], "taskList");
        assert_eq!(value["content"][2]["content"][0]["attrs"]["checked"], true);
        assert!(value["content"][0]["content"][0].get("attrs").is_none());
    }

    #[test]
    fn block_structures_round_trip() {
        let doc = Document::new(vec![
            Block::Paragraph(Paragraph {
                content: vec![
                    Inline::Text(Text {
                        align: TextAlign::Right,
                        ..Text::plain("due ")
                    }),
                    Inline::DateNode(DateNode {
                        date: "2024-05-01".into(),
                    }),
                    Inline::HardBreak,
                    Inline::Mention(Mention {
                        id: "7".into(),
                        label: "ana".into(),
                    }),
                    Inline::IssueLinkMention(IssueLinkMention {
                        slug: "CORE-1".into(),
                        project_identifier: "CORE".into(),
                        current_issue_id: "42".into(),
                        original_url: "https://tracker/CORE-1".into(),
                    }),
                ],
                indent: 1,
                align: TextAlign::Right,
            }),
            Block::Quote(Quote {
                content: vec![Paragraph::from_text("quoted")],
            }),
            Block::Code(Code {
                content: "fn main() {}\n".into(),
            }),
            Block::Table(Table {
                rows: vec![
                    vec![
                        Cell {
                            header: true,
                            col_span: 2,
                            ..Cell::new(vec![Paragraph::from_text("h")])
                        },
                        Cell::new(vec![]),
                    ],
                    vec![Cell::new(vec![Paragraph::from_text("a")])],
                ],
                min_width: 400,
                col_widths: vec![100, 0, 200],
            }),
            Block::Spoiler(Spoiler {
                title: "More".into(),
                collapsed: true,
                bg_color: Color::rgb(1, 2, 3),
                color: Color::WHITE,
                content: vec![Paragraph::from_text("s")],
            }),
            Block::InfoBlock(InfoBlock {
                title: "Info".into(),
                color: Color::rgba(0, 0, 255, 10),
                content: vec![],
            }),
            Block::Paragraph(Paragraph::new(vec![Inline::Image(Image {
                src: "/a.png".into(),
                width: 120,
                align: TextAlign::Center,
            })])),
        ]);
        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn unknown_nodes_are_emitted_verbatim() {
        let raw = json!({"type": "youtube", "attrs": {"src": "https://v"}, "extra": [1, 2]});
        let inline_raw = json!({"type": "emoji", "attrs": {"name": "tada"}});
        let doc = Document::new(vec![
            Block::Unknown(raw.clone()),
            Block::Paragraph(Paragraph::new(vec![Inline::Unknown(inline_raw.clone())])),
        ]);
        let value = encode_value(&doc).unwrap();
        assert_eq!(value["content"][0], raw);
        assert_eq!(value["content"][1]["content"][0], inline_raw);
        assert_eq!(round_trip(&doc), doc);
    }
}

//! Treeviz formatter for documents
//!
//! Treeviz is a visual representation of the document model, meant for
//! debugging conversions (`richdoc inspect`). Each node is one line:
//!
//! <prefix><connector> <icon> <label> (labels truncated to 30 characters)
//!
//! Example:
//!
//! ```text
//! ⧉ Document (3 blocks)
//! ├─ ¶ Release notes for the sprint…
//! ├─ ☰ 2 items
//! │ ├─ • item 1
//! │ │ └─ ¶ Faster import
//! │ └─ • item 2
//! │   └─ ¶ Fewer crashes
//! └─ ƒ 3 lines
//! ```
//!
//! Icons
//!     Blocks:
//!         Document: ⧉
//!         Paragraph: ¶
//!         List: ☰
//!         ListItem: •
//!         Quote: ❝
//!         Code: ƒ
//!         Table: ▦ (Row: ─, Cell: ▢)
//!         Spoiler: ▸
//!         InfoBlock: ℹ
//!     Inlines (shown with `ast-full`):
//!         Text: ◦
//!         Image: ▣
//!         HardBreak: ↵
//!         DateNode: ◷
//!         Mention: @
//!         IssueLinkMention: #
//!     Unknown nodes: ○

mod icons;

pub use icons::get_icon;

use crate::error::FormatError;
use crate::format::Format;
use crate::model::{Block, Cell, Document, Inline, Paragraph, Text, TextAlign};
use std::collections::HashMap;

const LABEL_WIDTH: usize = 30;

struct TreeNode {
    icon: &'static str,
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(kind: &str, label: impl Into<String>) -> Self {
        Self {
            icon: get_icon(kind),
            label: label.into(),
            children: Vec::new(),
        }
    }

    fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children;
        self
    }
}

fn truncate(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    let flat = flat.trim_end();
    if flat.chars().count() > LABEL_WIDTH {
        let short: String = flat.chars().take(LABEL_WIDTH - 1).collect();
        format!("{}…", short.trim_end())
    } else {
        flat.to_string()
    }
}

fn with_attrs(label: String, attrs: &[String]) -> String {
    if attrs.is_empty() {
        label
    } else {
        format!("{label} [{}]", attrs.join(", "))
    }
}

fn paragraph_node(paragraph: &Paragraph, include_all: bool) -> TreeNode {
    let mut attrs = Vec::new();
    if paragraph.indent > 0 {
        attrs.push(format!("indent {}", paragraph.indent));
    }
    if paragraph.align != TextAlign::Left {
        attrs.push(paragraph.align.as_str().to_string());
    }
    let node = TreeNode::leaf("Paragraph", with_attrs(truncate(&paragraph.plain_text()), &attrs));
    if include_all {
        node.with_children(paragraph.content.iter().map(inline_node).collect())
    } else {
        node
    }
}

fn paragraph_nodes(paragraphs: &[Paragraph], include_all: bool) -> Vec<TreeNode> {
    paragraphs
        .iter()
        .map(|p| paragraph_node(p, include_all))
        .collect()
}

fn text_marks(text: &Text) -> Vec<String> {
    let flags = [
        (text.strong, "bold"),
        (text.italic, "italic"),
        (text.underlined, "underline"),
        (text.strikethrough, "strike"),
        (text.sup, "sup"),
        (text.sub, "sub"),
    ];
    let mut marks: Vec<String> = flags
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| name.to_string())
        .collect();
    if text.size > 0 {
        marks.push(format!("{}px", text.size));
    }
    if let Some(color) = text.color {
        marks.push(format!("color {color}"));
    }
    if let Some(bg) = text.bg_color {
        marks.push(format!("bg {bg}"));
    }
    if let Some(url) = &text.url {
        marks.push(format!("link {}", truncate(url)));
    }
    marks
}

fn inline_node(inline: &Inline) -> TreeNode {
    let kind = inline.kind();
    match inline {
        Inline::Text(text) => TreeNode::leaf(
            kind,
            with_attrs(format!("\"{}\"", truncate(&text.content)), &text_marks(text)),
        ),
        Inline::Image(image) => {
            let mut attrs = Vec::new();
            if image.width > 0 {
                attrs.push(format!("{}px", image.width));
            }
            if image.align != TextAlign::Left {
                attrs.push(image.align.as_str().to_string());
            }
            TreeNode::leaf(kind, with_attrs(truncate(&image.src), &attrs))
        }
        Inline::HardBreak => TreeNode::leaf(kind, "break"),
        Inline::DateNode(date) => TreeNode::leaf(kind, date.date.clone()),
        Inline::Mention(mention) => TreeNode::leaf(kind, mention.label.clone()),
        Inline::IssueLinkMention(link) => TreeNode::leaf(kind, link.slug.clone()),
        Inline::Unknown(raw) => TreeNode::leaf(kind, unknown_label(raw)),
    }
}

fn unknown_label(raw: &serde_json::Value) -> String {
    let name = raw.get("type").and_then(|t| t.as_str()).unwrap_or("?");
    format!("unknown '{name}'")
}

fn cell_node(cell: &Cell, include_all: bool) -> TreeNode {
    let mut attrs = Vec::new();
    if cell.header {
        attrs.push("header".to_string());
    }
    if cell.col_span != 1 || cell.row_span != 1 {
        attrs.push(format!("span {}×{}", cell.col_span, cell.row_span));
    }
    let text = cell
        .content
        .first()
        .map(|p| p.plain_text())
        .unwrap_or_default();
    TreeNode::leaf("Cell", with_attrs(truncate(&text), &attrs))
        .with_children(paragraph_nodes(&cell.content, include_all))
}

fn block_node(block: &Block, include_all: bool) -> TreeNode {
    let kind = block.kind();
    match block {
        Block::Paragraph(paragraph) => paragraph_node(paragraph, include_all),
        Block::List(list) => {
            let mut attrs = Vec::new();
            if list.numbered {
                attrs.push("numbered".to_string());
            }
            if list.task_list {
                attrs.push("tasks".to_string());
            }
            let items = list
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let label = if list.task_list {
                        let check = if item.checked { "[x]" } else { "[ ]" };
                        format!("{check} item {}", i + 1)
                    } else {
                        format!("item {}", i + 1)
                    };
                    TreeNode::leaf("ListItem", label)
                        .with_children(paragraph_nodes(&item.content, include_all))
                })
                .collect();
            TreeNode::leaf(kind, with_attrs(format!("{} items", list.items.len()), &attrs))
                .with_children(items)
        }
        Block::Quote(quote) => TreeNode::leaf(kind, format!("{} paragraphs", quote.content.len()))
            .with_children(paragraph_nodes(&quote.content, include_all)),
        Block::Code(code) => TreeNode::leaf(kind, format!("{} lines", code.content.lines().count())),
        Block::Table(table) => {
            let mut attrs = Vec::new();
            if table.min_width > 0 {
                attrs.push(format!("min {}px", table.min_width));
            }
            if !table.col_widths.is_empty() {
                let widths: Vec<String> = table.col_widths.iter().map(u32::to_string).collect();
                attrs.push(format!("cols {}", widths.join("/")));
            }
            let rows = table
                .rows
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    TreeNode::leaf("Row", format!("row {}", i + 1))
                        .with_children(row.iter().map(|c| cell_node(c, include_all)).collect())
                })
                .collect();
            let label = format!("{}×{}", table.rows.len(), table.column_count());
            TreeNode::leaf(kind, with_attrs(label, &attrs)).with_children(rows)
        }
        Block::Spoiler(spoiler) => {
            let attrs = if spoiler.collapsed {
                vec!["collapsed".to_string()]
            } else {
                Vec::new()
            };
            TreeNode::leaf(kind, with_attrs(format!("\"{}\"", truncate(&spoiler.title)), &attrs))
                .with_children(paragraph_nodes(&spoiler.content, include_all))
        }
        Block::InfoBlock(info) => {
            TreeNode::leaf(kind, format!("\"{}\"", truncate(&info.title)))
                .with_children(paragraph_nodes(&info.content, include_all))
        }
        Block::Unknown(raw) => TreeNode::leaf(kind, unknown_label(raw)),
    }
}

fn format_node(node: &TreeNode, prefix: &str, is_last: bool, output: &mut String) {
    let connector = if is_last { "└─" } else { "├─" };
    output.push_str(&format!("{prefix}{connector} {} {}\n", node.icon, node.label));
    let child_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
    format_children(&node.children, &child_prefix, output);
}

fn format_children(children: &[TreeNode], prefix: &str, output: &mut String) {
    let count = children.len();
    for (i, child) in children.iter().enumerate() {
        format_node(child, prefix, i + 1 == count, output);
    }
}

pub fn to_treeviz_str(doc: &Document) -> String {
    to_treeviz_str_with_params(doc, &HashMap::new())
}

/// Convert a document to treeviz string with optional parameters
///
/// # Parameters
///
/// - `"ast-full"`: When set to `"true"`, paragraphs also list their inline
///   nodes with their marks.
pub fn to_treeviz_str_with_params(doc: &Document, params: &HashMap<String, String>) -> String {
    let include_all = params
        .get("ast-full")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);

    let mut output = format!(
        "{} Document ({} blocks)\n",
        get_icon("Document"),
        doc.blocks.len()
    );
    let nodes: Vec<TreeNode> = doc
        .blocks
        .iter()
        .map(|b| block_node(b, include_all))
        .collect();
    format_children(&nodes, "", &mut output);
    output
}

/// Format implementation for treeviz format
#[derive(Debug, Default, Clone, Copy)]
pub struct TreevizFormat;

impl Format for TreevizFormat {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn description(&self) -> &str {
        "Visual tree representation with indentation and Unicode icons"
    }

    fn file_extensions(&self) -> &[&str] {
        &["tree", "treeviz"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        Ok(to_treeviz_str(doc))
    }

    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &HashMap<String, String>,
    ) -> Result<crate::format::SerializedDocument, FormatError> {
        Ok(crate::format::SerializedDocument::Text(
            to_treeviz_str_with_params(doc, options),
        ))
    }
}

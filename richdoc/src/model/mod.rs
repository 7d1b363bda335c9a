//! The canonical rich-document model.
//!
//! Every conversion in this crate goes through these types: the legacy HTML
//! importer and the wire codec produce a [`Document`], the PDF renderer and
//! the tree visualizer consume one. The model is plain owned data, so a
//! document is always a strict tree.
//!
//! Containers that the editor allows to hold arbitrary blocks (quotes, list
//! items, table cells, spoilers, info blocks) only hold paragraphs here.
//! Importers flatten nested lists into paragraphs whose `indent` is the
//! nesting depth.

mod color;

pub use color::Color;

use serde_json::Value;

/// Root of a rich document: blocks in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Block-level elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    List(List),
    Quote(Quote),
    Code(Code),
    Table(Table),
    Spoiler(Spoiler),
    InfoBlock(InfoBlock),
    /// A wire node whose type is not recognized, kept verbatim for re-encode.
    Unknown(Value),
}

impl Block {
    /// Short variant name, used in logs and in the tree visualizer.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "Paragraph",
            Block::List(_) => "List",
            Block::Quote(_) => "Quote",
            Block::Code(_) => "Code",
            Block::Table(_) => "Table",
            Block::Spoiler(_) => "Spoiler",
            Block::InfoBlock(_) => "InfoBlock",
            Block::Unknown(_) => "Unknown",
        }
    }
}

impl From<Paragraph> for Block {
    fn from(paragraph: Paragraph) -> Self {
        Block::Paragraph(paragraph)
    }
}

/// Horizontal alignment of a paragraph, a text run, or an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Parses a CSS / editor alignment keyword.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" | "justify" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" | "end" => Some(TextAlign::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub content: Vec<Inline>,
    pub indent: u32,
    pub align: TextAlign,
}

impl Paragraph {
    pub fn new(content: Vec<Inline>) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }

    /// Paragraph holding a single unstyled text run.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![Inline::Text(Text::plain(text))])
    }

    /// Concatenated text of the paragraph, without styling.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for inline in &self.content {
            match inline {
                Inline::Text(text) => out.push_str(&text.content),
                Inline::HardBreak => out.push('\n'),
                Inline::DateNode(date) => out.push_str(&date.date),
                Inline::Mention(mention) => {
                    out.push('@');
                    out.push_str(&mention.label);
                }
                Inline::IssueLinkMention(link) => out.push_str(&link.slug),
                Inline::Image(_) | Inline::Unknown(_) => {}
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct List {
    pub items: Vec<ListItem>,
    pub numbered: bool,
    pub task_list: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListItem {
    pub content: Vec<Paragraph>,
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quote {
    pub content: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Code {
    pub content: String,
}

/// A table. Rows are not padded: each row may carry a different number of
/// cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
    /// Declared minimum table width in px, 0 when not declared.
    pub min_width: u32,
    /// Declared column widths in px, 0 for an auto-sized column. Either empty
    /// or one entry per column of the widest row, see [`Table::new`].
    pub col_widths: Vec<u32>,
}

impl Table {
    /// Builds a table, bringing `col_widths` into canonical form: empty when
    /// no column declares a width, otherwise padded with auto columns or cut
    /// to the widest row.
    pub fn new(rows: Vec<Vec<Cell>>, col_widths: Vec<u32>, min_width: u32) -> Self {
        let mut table = Self {
            rows,
            min_width,
            col_widths,
        };
        if table.col_widths.iter().all(|w| *w == 0) {
            table.col_widths.clear();
        } else {
            let columns = table.widest_row();
            table.col_widths.resize(columns, 0);
        }
        table
    }

    fn widest_row(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.col_span.max(1) as usize).sum())
            .max()
            .unwrap_or(0)
    }

    /// Number of grid columns: the wider of the declared widths and the
    /// widest row's span sum.
    pub fn column_count(&self) -> usize {
        self.widest_row().max(self.col_widths.len())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub content: Vec<Paragraph>,
    pub col_span: u32,
    pub row_span: u32,
    pub header: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            col_span: 1,
            row_span: 1,
            header: false,
        }
    }
}

impl Cell {
    pub fn new(content: Vec<Paragraph>) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spoiler {
    pub title: String,
    /// Editor-side disclosure state. Static renderers always expand.
    pub collapsed: bool,
    pub bg_color: Color,
    pub color: Color,
    pub content: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoBlock {
    pub title: String,
    pub color: Color,
    pub content: Vec<Paragraph>,
}

/// Inline elements, flowing within a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(Text),
    Image(Image),
    HardBreak,
    DateNode(DateNode),
    Mention(Mention),
    IssueLinkMention(IssueLinkMention),
    /// A wire node whose type is not recognized, kept verbatim for re-encode.
    Unknown(Value),
}

impl Inline {
    pub fn kind(&self) -> &'static str {
        match self {
            Inline::Text(_) => "Text",
            Inline::Image(_) => "Image",
            Inline::HardBreak => "HardBreak",
            Inline::DateNode(_) => "DateNode",
            Inline::Mention(_) => "Mention",
            Inline::IssueLinkMention(_) => "IssueLinkMention",
            Inline::Unknown(_) => "Unknown",
        }
    }
}

/// A run of text with its full mark state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Text {
    pub content: String,
    /// Font size in px; 0 means the renderer's body size.
    pub size: u32,
    pub strong: bool,
    pub italic: bool,
    pub underlined: bool,
    pub strikethrough: bool,
    pub sup: bool,
    pub sub: bool,
    pub color: Option<Color>,
    pub bg_color: Option<Color>,
    pub align: TextAlign,
    pub url: Option<String>,
}

impl Text {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    pub src: String,
    /// Declared width in px; 0 fits the image to the available width.
    pub width: u32,
    pub align: TextAlign,
}

/// A calendar date (`YYYY-MM-DD`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateNode {
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mention {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueLinkMention {
    pub slug: String,
    pub project_identifier: String,
    pub current_issue_id: String,
    pub original_url: String,
}

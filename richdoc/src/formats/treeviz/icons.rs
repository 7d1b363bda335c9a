//! Icon mapping for the tree visualizer.

/// Get the Unicode icon for a model node kind
///
/// Kinds are the names returned by `Block::kind` and `Inline::kind`, plus the
/// structural nodes the visualizer adds (`Document`, `ListItem`, `Row`,
/// `Cell`).
pub fn get_icon(node_type: &str) -> &'static str {
    match node_type {
        "Document" => "⧉",
        "Paragraph" => "¶",
        "List" => "☰",
        "ListItem" => "•",
        "Quote" => "❝",
        "Code" => "ƒ",
        "Table" => "▦",
        "Row" => "─",
        "Cell" => "▢",
        "Spoiler" => "▸",
        "InfoBlock" => "ℹ",
        "Text" => "◦",
        "Image" => "▣",
        "HardBreak" => "↵",
        "DateNode" => "◷",
        "Mention" => "@",
        "IssueLinkMention" => "#",
        _ => "○",
    }
}

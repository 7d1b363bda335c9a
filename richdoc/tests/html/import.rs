use pretty_assertions::assert_eq;
use richdoc::format::Format;
use richdoc::formats::html::{parse_html, HtmlFormat};
use richdoc::model::{Block, Cell, Color, Inline, Paragraph, Text, TextAlign};

const LEGACY_RECORD: &str = r##"
<p style="text-align: center">Release <strong>notes</strong></p>
<p data-indent="2">Indented <a href="https://example.com/a">link</a></p>
<ul data-type="taskList">
  <li data-checked="true"><p>Ship it</p></li>
  <li data-checked="false"><p>Announce it</p></li>
</ul>
<ol>
  <li><p>First</p><ul><li><p>Nested</p></li></ul></li>
</ol>
<blockquote><p>Quoted</p></blockquote>
<pre>fn main() {}
</pre>
<table style="min-width: 300px">
  <colgroup><col style="width: 100px"><col style="width: 200px"></colgroup>
  <tbody>
    <tr><th>Key</th><th>Value</th></tr>
    <tr><td colspan="2">Both</td></tr>
  </tbody>
</table>
<div data-spoiler data-title="Details" data-collapsed="true" data-bg-color="#fef3c7"><p>Hidden</p></div>
<div data-info-block data-title="Note" data-color="#2563eb"><p>Heads up</p></div>
<marquee>gone</marquee>
"##;

fn texts(paragraph: &Paragraph) -> Vec<&Text> {
    paragraph
        .content
        .iter()
        .filter_map(|inline| match inline {
            Inline::Text(text) => Some(text),
            _ => None,
        })
        .collect()
}

#[test]
fn test_legacy_record_block_sequence() {
    let doc = parse_html(LEGACY_RECORD).unwrap();
    let kinds: Vec<&str> = doc.blocks.iter().map(Block::kind).collect();

    assert_eq!(
        kinds,
        vec![
            "Paragraph",
            "Paragraph",
            "List",
            "List",
            "Quote",
            "Code",
            "Table",
            "Spoiler",
            "InfoBlock"
        ]
    );
}

#[test]
fn test_paragraph_marks_and_alignment() {
    let doc = parse_html(LEGACY_RECORD).unwrap();

    let Block::Paragraph(first) = &doc.blocks[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(first.align, TextAlign::Center);
    assert_eq!(first.plain_text(), "Release notes");
    let runs = texts(first);
    assert!(!runs[0].strong);
    assert!(runs[1].strong);
    assert_eq!(runs[1].align, TextAlign::Center);

    let Block::Paragraph(second) = &doc.blocks[1] else {
        panic!("expected paragraph");
    };
    assert_eq!(second.indent, 2);
    assert_eq!(
        texts(second)[1].url.as_deref(),
        Some("https://example.com/a")
    );
}

#[test]
fn test_lists_flatten_nested_items() {
    let doc = parse_html(LEGACY_RECORD).unwrap();

    let Block::List(tasks) = &doc.blocks[2] else {
        panic!("expected list");
    };
    assert!(tasks.task_list);
    assert_eq!(
        tasks.items.iter().map(|i| i.checked).collect::<Vec<_>>(),
        vec![true, false]
    );

    let Block::List(numbered) = &doc.blocks[3] else {
        panic!("expected list");
    };
    assert!(numbered.numbered);
    let item = &numbered.items[0];
    assert_eq!(item.content.len(), 2);
    assert_eq!(item.content[0].indent, 0);
    assert_eq!(item.content[1].plain_text(), "Nested");
    assert_eq!(item.content[1].indent, 1);
}

#[test]
fn test_table_import() {
    let doc = parse_html(LEGACY_RECORD).unwrap();
    let Block::Table(table) = &doc.blocks[6] else {
        panic!("expected table");
    };

    assert_eq!(table.min_width, 300);
    assert_eq!(table.col_widths, vec![100, 200]);
    assert_eq!(table.rows.len(), 2);
    assert!(table.rows[0].iter().all(|cell| cell.header));
    assert_eq!(
        table.rows[1],
        vec![Cell {
            content: vec![Paragraph::from_text("Both")],
            col_span: 2,
            row_span: 1,
            header: false,
        }]
    );
    assert_eq!(table.column_count(), 2);
}

#[test]
fn test_panels_import() {
    let doc = parse_html(LEGACY_RECORD).unwrap();

    let Block::Spoiler(spoiler) = &doc.blocks[7] else {
        panic!("expected spoiler");
    };
    assert_eq!(spoiler.title, "Details");
    assert!(spoiler.collapsed);
    assert_eq!(spoiler.bg_color, Color::rgb(0xfe, 0xf3, 0xc7));
    assert_eq!(spoiler.content, vec![Paragraph::from_text("Hidden")]);

    let Block::InfoBlock(info) = &doc.blocks[8] else {
        panic!("expected info block");
    };
    assert_eq!(info.title, "Note");
    assert_eq!(info.color, Color::rgb(0x25, 0x63, 0xeb));
}

#[test]
fn test_code_keeps_whitespace() {
    let doc = parse_html("<pre>let a = 1;\n    let b = 2;</pre>").unwrap();
    assert_eq!(doc.blocks.len(), 1);
    let Block::Code(code) = &doc.blocks[0] else {
        panic!("expected code");
    };
    assert_eq!(code.content, "let a = 1;\n    let b = 2;");
}

#[test]
fn test_unbalanced_markup_still_imports() {
    let doc = parse_html("<p>open <em>never closed<p>next").unwrap();
    let plain: Vec<String> = doc
        .blocks
        .iter()
        .filter_map(|block| match block {
            Block::Paragraph(p) => Some(p.plain_text()),
            _ => None,
        })
        .collect();

    assert_eq!(plain, vec!["open never closed", "next"]);
}

#[test]
fn test_format_trait_parse() {
    let format = HtmlFormat;
    assert!(format.supports_parsing());
    assert!(!format.supports_serialization());

    let doc = format.parse("<p>Hi<br>there</p>").unwrap();
    let Block::Paragraph(paragraph) = &doc.blocks[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(paragraph.content[1], Inline::HardBreak);
    assert_eq!(paragraph.plain_text(), "Hi\nthere");
}

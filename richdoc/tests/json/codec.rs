use pretty_assertions::assert_eq;
use richdoc::format::Format;
use richdoc::formats::json::{decode, decode_value, encode_value, JsonFormat};
use richdoc::model::{Block, Color, Inline, IssueLinkMention, Mention, Text};
use richdoc::DecodeError;
use serde_json::{json, Value};

fn stored_document() -> Value {
    json!({
        "type": "doc",
        "content": [
            {
                "type": "paragraph",
                "attrs": {"textAlign": "right", "indent": 1},
                "content": [
                    {"type": "text", "text": "Ping "},
                    {"type": "mention", "attrs": {"id": "u-7", "label": "Ana"}},
                    {"type": "text", "text": " about ", "marks": [
                        {"type": "bold"},
                        {"type": "italic"},
                        {"type": "textStyle", "attrs": {"color": "#dc2626ff", "fontSize": "18px"}}
                    ]},
                    {"type": "issueLinkMention", "attrs": {
                        "slug": "WEB-12",
                        "projectIdentifier": "WEB",
                        "currentIssueId": "12",
                        "originalUrl": "https://tracker.example.com/WEB-12"
                    }},
                    {"type": "hardBreak"},
                    {"type": "date-node", "attrs": {"date": "2024-05-01"}}
                ]
            },
            {
                "type": "mermaid",
                "attrs": {"source": "graph TD; A-->B"}
            },
            {
                "type": "table",
                "content": [
                    {"type": "tableRow", "content": [
                        {"type": "tableHeader", "attrs": {"colspan": 1, "rowspan": 1, "colwidth": [120]},
                         "content": [{"type": "paragraph", "content": [{"type": "text", "text": "Area"}]}]},
                        {"type": "tableHeader", "attrs": {"colspan": 1, "rowspan": 1, "colwidth": null},
                         "content": [{"type": "paragraph", "content": [{"type": "text", "text": "Owner"}]}]}
                    ]}
                ]
            }
        ]
    })
}

#[test]
fn test_decode_stored_document() {
    let doc = decode_value(&stored_document()).unwrap();
    assert_eq!(doc.blocks.len(), 3);

    let Block::Paragraph(paragraph) = &doc.blocks[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(paragraph.indent, 1);
    assert_eq!(
        paragraph.content[1],
        Inline::Mention(Mention {
            id: "u-7".to_string(),
            label: "Ana".to_string(),
        })
    );
    let Inline::Text(styled) = &paragraph.content[2] else {
        panic!("expected text");
    };
    assert!(styled.strong && styled.italic);
    assert_eq!(styled.color, Some(Color::rgb(0xdc, 0x26, 0x26)));
    assert_eq!(styled.size, 18);
    assert_eq!(
        paragraph.content[3],
        Inline::IssueLinkMention(IssueLinkMention {
            slug: "WEB-12".to_string(),
            project_identifier: "WEB".to_string(),
            current_issue_id: "12".to_string(),
            original_url: "https://tracker.example.com/WEB-12".to_string(),
        })
    );
    assert_eq!(paragraph.plain_text(), "Ping @Ana about WEB-12\n2024-05-01");

    let Block::Table(table) = &doc.blocks[2] else {
        panic!("expected table");
    };
    assert_eq!(table.col_widths, vec![120, 0]);
    assert_eq!(table.min_width, 120);
}

#[test]
fn test_unknown_nodes_survive_a_round_trip() {
    let original = stored_document();
    let doc = decode_value(&original).unwrap();
    assert!(matches!(doc.blocks[1], Block::Unknown(_)));

    let encoded = encode_value(&doc).unwrap();
    assert_eq!(encoded["content"][1], original["content"][1]);
    assert_eq!(decode_value(&encoded).unwrap(), doc);
}

#[test]
fn test_unknown_marks_are_dropped() {
    let doc = decode_value(&json!({
        "type": "doc",
        "content": [{"type": "paragraph", "content": [
            {"type": "text", "text": "x", "marks": [{"type": "sparkle"}, {"type": "underline"}]}
        ]}]
    }))
    .unwrap();

    let Block::Paragraph(paragraph) = &doc.blocks[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(
        paragraph.content,
        vec![Inline::Text(Text {
            content: "x".to_string(),
            underlined: true,
            ..Text::default()
        })]
    );
}

#[test]
fn test_root_errors() {
    assert!(matches!(decode(b"{not json"), Err(DecodeError::Json(_))));
    assert!(matches!(
        decode(br#"{"type": "paragraph"}"#),
        Err(DecodeError::NotADocument(_))
    ));
    assert!(matches!(decode(b"[]"), Err(DecodeError::NotADocument(_))));
}

#[test]
fn test_malformed_children_are_skipped() {
    let doc = decode(br#"{"type": "doc", "content": [42, {"type": "paragraph"}, "text"]}"#).unwrap();
    assert_eq!(doc.blocks.len(), 1);
}

#[test]
fn test_malformed_marks_keep_their_text() {
    let doc = decode_value(&json!({
        "type": "doc",
        "content": [{
            "type": "paragraph",
            "content": [
                {"type": "text", "text": "keep me", "marks": [{"type": "bold"}, "oops"]},
                {"type": "text", "text": "also me", "marks": [{"type": "italic", "attrs": [1]}]}
            ]
        }]
    }))
    .unwrap();

    let Block::Paragraph(paragraph) = &doc.blocks[0] else {
        panic!("expected a paragraph, got {:?}", doc.blocks[0]);
    };
    assert_eq!(
        paragraph.content,
        vec![
            Inline::Text(Text {
                strong: true,
                ..Text::plain("keep me")
            }),
            Inline::Text(Text {
                italic: true,
                ..Text::plain("also me")
            }),
        ]
    );
}

#[test]
fn test_non_object_attrs_read_as_empty() {
    let doc = decode(br#"{"type": "doc", "content": [{"type": "paragraph", "attrs": [1, 2], "content": [{"type": "text", "text": "x"}]}]}"#).unwrap();
    let Block::Paragraph(paragraph) = &doc.blocks[0] else {
        panic!("expected a paragraph, got {:?}", doc.blocks[0]);
    };
    assert_eq!(paragraph.indent, 0);
    assert_eq!(paragraph.plain_text(), "x");
}

#[test]
fn test_format_trait_round_trip() {
    let format = JsonFormat;
    let source = serde_json::to_string(&stored_document()).unwrap();

    let doc = format.parse(&source).unwrap();
    let serialized = format.serialize(&doc).unwrap();
    assert_eq!(format.parse(&serialized).unwrap(), doc);
}

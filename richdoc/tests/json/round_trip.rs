use proptest::collection::vec;
use proptest::option;
use proptest::prelude::*;
use richdoc::formats::json::{decode_value, encode_value};
use richdoc::model::{
    Block, Cell, Code, Color, DateNode, Document, Image, InfoBlock, Inline, List, ListItem,
    Mention, Paragraph, Quote, Spoiler, Table, Text, TextAlign,
};

fn align() -> impl Strategy<Value = TextAlign> {
    prop_oneof![
        Just(TextAlign::Left),
        Just(TextAlign::Center),
        Just(TextAlign::Right),
    ]
}

fn color() -> impl Strategy<Value = Color> {
    any::<[u8; 4]>().prop_map(|[r, g, b, a]| Color::rgba(r, g, b, a))
}

prop_compose! {
    fn text()(
        content in "[a-zA-Z0-9 ,.]{0,12}",
        size in prop_oneof![Just(0u32), 8u32..40],
        flags in any::<[bool; 6]>(),
        color in option::of(color()),
        bg_color in option::of(color()),
        url in option::of("https://example\\.com/[a-z]{1,8}"),
    ) -> Text {
        let [strong, italic, underlined, strikethrough, sup, sub] = flags;
        Text {
            content,
            size,
            strong,
            italic,
            underlined,
            strikethrough,
            sup,
            sub,
            color,
            bg_color,
            url,
            ..Text::default()
        }
    }
}

fn inline() -> impl Strategy<Value = Inline> {
    prop_oneof![
        4 => text().prop_map(Inline::Text),
        1 => Just(Inline::HardBreak),
        1 => ("/img/[a-z]{1,6}\\.png", 0u32..800, align())
            .prop_map(|(src, width, align)| Inline::Image(Image { src, width, align })),
        1 => "2024-0[1-9]-[12][0-9]".prop_map(|date| Inline::DateNode(DateNode { date })),
        1 => ("u-[0-9]{1,3}", "[A-Z][a-z]{1,6}")
            .prop_map(|(id, label)| Inline::Mention(Mention { id, label })),
    ]
}

prop_compose! {
    fn paragraph()(content in vec(inline(), 0..4), indent in 0u32..3, align in align()) -> Paragraph {
        // Text runs carry their paragraph's alignment.
        let content = content
            .into_iter()
            .map(|inline| match inline {
                Inline::Text(text) => Inline::Text(Text { align, ..text }),
                other => other,
            })
            .collect();
        Paragraph { content, indent, align }
    }
}

fn list() -> impl Strategy<Value = Block> {
    (0u8..3, vec((vec(paragraph(), 0..3), any::<bool>()), 0..4)).prop_map(|(kind, items)| {
        let task_list = kind == 2;
        Block::List(List {
            items: items
                .into_iter()
                .map(|(content, checked)| ListItem {
                    content,
                    checked: checked && task_list,
                })
                .collect(),
            numbered: kind == 1,
            task_list,
        })
    })
}

prop_compose! {
    fn cell()(
        content in vec(paragraph(), 0..3),
        col_span in 1u32..3,
        row_span in 1u32..3,
        header in any::<bool>(),
    ) -> Cell {
        Cell { content, col_span, row_span, header }
    }
}

prop_compose! {
    fn table()(
        rows in vec(vec(cell(), 0..4), 1..4),
        col_widths in vec(prop_oneof![Just(0u32), 40u32..300], 0..6),
        min_width in option::of(0u32..900),
    ) -> Block {
        let mut table = Table::new(rows, col_widths, 0);
        table.min_width = min_width.unwrap_or_else(|| table.col_widths.iter().sum());
        Block::Table(table)
    }
}

fn block() -> impl Strategy<Value = Block> {
    prop_oneof![
        3 => paragraph().prop_map(Block::Paragraph),
        1 => list(),
        1 => vec(paragraph(), 0..3).prop_map(|content| Block::Quote(Quote { content })),
        1 => "[ -~\n\t]{0,40}".prop_map(|content| Block::Code(Code { content })),
        1 => table(),
        1 => ("[A-Za-z ]{0,10}", any::<bool>(), color(), color(), vec(paragraph(), 0..3)).prop_map(
            |(title, collapsed, bg_color, color, content)| {
                Block::Spoiler(Spoiler { title, collapsed, bg_color, color, content })
            }
        ),
        1 => ("[A-Za-z ]{0,10}", color(), vec(paragraph(), 0..3))
            .prop_map(|(title, color, content)| Block::InfoBlock(InfoBlock { title, color, content })),
    ]
}

proptest! {
    #[test]
    fn test_documents_survive_encode_then_decode(blocks in vec(block(), 0..6)) {
        let doc = Document::new(blocks);
        let encoded = encode_value(&doc).unwrap();
        prop_assert_eq!(decode_value(&encoded).unwrap(), doc);
    }
}

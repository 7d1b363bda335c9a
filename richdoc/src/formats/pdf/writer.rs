//! Serializes a finished layout into PDF bytes with `pdf-writer`.
//!
//! Layout coordinates are top-down; PDF user space is bottom-up, so every y
//! is flipped against the page height here and nowhere else.

use super::fonts::{EmbeddedFont, Face, FaceSlot, FontBook};
use super::images::DecodedImage;
use super::layout::{DrawOp, Finished, PageCanvas, PageGeometry};
use crate::model::Color;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::types::{ActionType, AnnotationType, CidFontType, FontFlags, SystemInfo, UnicodeCmap};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Bezier handle length for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

struct RefAlloc(i32);

impl RefAlloc {
    fn next(&mut self) -> Ref {
        self.0 += 1;
        Ref::new(self.0)
    }
}

fn deflate(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn image_name(index: usize) -> String {
    format!("Im{index}")
}

/// Glyphs of an embedded face that the document actually shows.
type GlyphUse = BTreeMap<u16, char>;

/// Writes the whole document.
pub fn write_pdf(
    finished: &Finished,
    fonts: &FontBook,
    geometry: &PageGeometry,
    title: Option<&str>,
) -> io::Result<Vec<u8>> {
    let mut alloc = RefAlloc(0);
    let catalog_id = alloc.next();
    let page_tree_id = alloc.next();
    let info_id = alloc.next();
    let mut pdf = Pdf::new();

    let mut used: BTreeMap<FaceSlot, GlyphUse> = BTreeMap::new();
    for page in &finished.pages {
        for op in &page.ops {
            if let DrawOp::Text { face, text, .. } = op {
                let glyphs = used.entry(*face).or_default();
                if let Face::Embedded(font) = fonts.face(*face) {
                    for ch in text.chars() {
                        glyphs.entry(font.glyph(ch)).or_insert(ch);
                    }
                }
            }
        }
    }

    let mut font_refs = Vec::new();
    for (slot, glyphs) in &used {
        let font_id = alloc.next();
        match fonts.face(*slot) {
            Face::Builtin(builtin) => {
                pdf.type1_font(font_id)
                    .base_font(Name(builtin.base_font().as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
            }
            Face::Embedded(font) => write_embedded_font(&mut pdf, &mut alloc, font_id, font, glyphs)?,
        }
        font_refs.push((*slot, font_id));
    }

    let image_refs = finished
        .images
        .iter()
        .map(|image| write_image(&mut pdf, &mut alloc, image))
        .collect::<io::Result<Vec<Ref>>>()?;

    let mut page_ids = Vec::with_capacity(finished.pages.len());
    for canvas in &finished.pages {
        let page_id = alloc.next();
        let content_id = alloc.next();
        page_ids.push(page_id);

        let content = deflate(&paint(canvas, fonts, geometry.height))?;
        pdf.stream(content_id, &content).filter(Filter::FlateDecode);

        let mut annotation_ids = Vec::with_capacity(canvas.links.len());
        for link in &canvas.links {
            let annotation_id = alloc.next();
            annotation_ids.push(annotation_id);
            let bottom = geometry.height - link.y - link.h;
            let mut annotation = pdf.annotation(annotation_id);
            annotation
                .subtype(AnnotationType::Link)
                .rect(Rect::new(link.x, bottom, link.x + link.w, bottom + link.h))
                .border(0.0, 0.0, 0.0, None);
            annotation
                .action()
                .action_type(ActionType::Uri)
                .uri(Str(link.uri.as_bytes()));
        }

        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, geometry.width, geometry.height))
            .parent(page_tree_id)
            .contents(content_id);
        if !annotation_ids.is_empty() {
            page.annotations(annotation_ids.iter().copied());
        }
        let mut resources = page.resources();
        let mut font_dict = resources.fonts();
        for (slot, font_id) in &font_refs {
            font_dict.pair(Name(slot.resource_name().as_bytes()), *font_id);
        }
        font_dict.finish();
        if !image_refs.is_empty() {
            let mut x_objects = resources.x_objects();
            for (index, image_id) in image_refs.iter().enumerate() {
                let name = image_name(index);
                x_objects.pair(Name(name.as_bytes()), *image_id);
            }
        }
    }

    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    let outline_id = write_outline(&mut pdf, &mut alloc, finished, &page_ids, geometry);
    let mut catalog = pdf.catalog(catalog_id);
    catalog.pages(page_tree_id);
    if let Some(outline_id) = outline_id {
        catalog.outlines(outline_id);
    }
    catalog.finish();

    let mut info = pdf.document_info(info_id);
    info.producer(TextStr(concat!("richdoc ", env!("CARGO_PKG_VERSION"))));
    if let Some(title) = title {
        info.title(TextStr(title));
    }
    info.finish();

    Ok(pdf.finish())
}

fn write_embedded_font(
    pdf: &mut Pdf,
    alloc: &mut RefAlloc,
    type0_id: Ref,
    font: &EmbeddedFont,
    glyphs: &GlyphUse,
) -> io::Result<()> {
    let cid_id = alloc.next();
    let descriptor_id = alloc.next();
    let cmap_id = alloc.next();
    let file_id = alloc.next();
    let base_font = font.name().to_string();
    let system_info = SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    };

    pdf.type0_font(type0_id)
        .base_font(Name(base_font.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_id)
        .to_unicode(cmap_id);

    let mut cid = pdf.cid_font(cid_id);
    cid.subtype(CidFontType::Type2)
        .base_font(Name(base_font.as_bytes()))
        .system_info(system_info)
        .font_descriptor(descriptor_id)
        .default_width(0.0)
        .cid_to_gid_map_predefined(Name(b"Identity"));
    let mut widths = cid.widths();
    for gid in glyphs.keys() {
        widths.consecutive(*gid, [font.glyph_advance(*gid)]);
    }
    widths.finish();
    cid.finish();

    let mut flags = FontFlags::NON_SYMBOLIC;
    if font.monospaced {
        flags |= FontFlags::FIXED_PITCH;
    }
    if font.italic_angle != 0.0 {
        flags |= FontFlags::ITALIC;
    }
    let [x_min, y_min, x_max, y_max] = font.bbox;
    pdf.font_descriptor(descriptor_id)
        .name(Name(base_font.as_bytes()))
        .flags(flags)
        .bbox(Rect::new(x_min, y_min, x_max, y_max))
        .italic_angle(font.italic_angle)
        .ascent(font.ascent)
        .descent(font.descent)
        .cap_height(font.cap_height)
        .stem_v(80.0)
        .font_file2(file_id);

    let mut cmap = UnicodeCmap::new(Name(b"Custom"), system_info);
    for (gid, ch) in glyphs {
        cmap.pair(*gid, *ch);
    }
    pdf.cmap(cmap_id, &cmap.finish());

    let data = deflate(font.data())?;
    pdf.stream(file_id, &data)
        .filter(Filter::FlateDecode)
        .pair(Name(b"Length1"), font.data().len() as i32);
    Ok(())
}

fn write_image(pdf: &mut Pdf, alloc: &mut RefAlloc, image: &DecodedImage) -> io::Result<Ref> {
    let image_id = alloc.next();
    let mask_id = match &image.alpha {
        Some(alpha) => {
            let mask_id = alloc.next();
            let data = deflate(alpha)?;
            let mut mask = pdf.image_xobject(mask_id, &data);
            mask.filter(Filter::FlateDecode);
            mask.width(image.width as i32);
            mask.height(image.height as i32);
            mask.color_space().device_gray();
            mask.bits_per_component(8);
            mask.finish();
            Some(mask_id)
        }
        None => None,
    };
    let data = deflate(&image.rgb)?;
    let mut xobject = pdf.image_xobject(image_id, &data);
    xobject.filter(Filter::FlateDecode);
    xobject.width(image.width as i32);
    xobject.height(image.height as i32);
    xobject.color_space().device_rgb();
    xobject.bits_per_component(8);
    if let Some(mask_id) = mask_id {
        xobject.s_mask(mask_id);
    }
    xobject.finish();
    Ok(image_id)
}

fn write_outline(
    pdf: &mut Pdf,
    alloc: &mut RefAlloc,
    finished: &Finished,
    page_ids: &[Ref],
    geometry: &PageGeometry,
) -> Option<Ref> {
    if finished.bookmarks.is_empty() {
        return None;
    }
    let outline_id = alloc.next();
    let item_ids: Vec<Ref> = finished.bookmarks.iter().map(|_| alloc.next()).collect();
    for (i, bookmark) in finished.bookmarks.iter().enumerate() {
        let page_id = page_ids.get(bookmark.page).or(page_ids.first()).copied()?;
        let mut item = pdf.outline_item(item_ids[i]);
        item.title(TextStr(&bookmark.title)).parent(outline_id);
        if i > 0 {
            item.prev(item_ids[i - 1]);
        }
        if let Some(next) = item_ids.get(i + 1) {
            item.next(*next);
        }
        item.dest()
            .page(page_id)
            .xyz(0.0, geometry.height - bookmark.y, None);
    }
    let first = *item_ids.first()?;
    let last = *item_ids.last()?;
    pdf.outline(outline_id)
        .first(first)
        .last(last)
        .count(item_ids.len() as i32);
    Some(outline_id)
}

fn set_fill(content: &mut Content, color: Color) {
    let (r, g, b) = color.to_unit_rgb();
    content.set_fill_rgb(r, g, b);
}

fn set_stroke(content: &mut Content, color: Color) {
    let (r, g, b) = color.to_unit_rgb();
    content.set_stroke_rgb(r, g, b);
}

/// Builds the content stream of one page.
fn paint(canvas: &PageCanvas, fonts: &FontBook, height: f32) -> Vec<u8> {
    let mut content = Content::new();
    for op in &canvas.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                face,
                size,
                color,
                text,
            } => {
                set_fill(&mut content, *color);
                let encoded = fonts.face(*face).encode(text);
                content.begin_text();
                content.set_font(Name(face.resource_name().as_bytes()), *size);
                content.next_line(*x, height - y);
                content.show(Str(&encoded));
                content.end_text();
            }
            DrawOp::FillRect { x, y, w, h, color } => {
                set_fill(&mut content, *color);
                content.rect(*x, height - y - h, *w, *h);
                content.fill_nonzero();
            }
            DrawOp::StrokeRect {
                x,
                y,
                w,
                h,
                color,
                width,
            } => {
                set_stroke(&mut content, *color);
                content.set_line_width(*width);
                content.rect(*x, height - y - h, *w, *h);
                content.stroke();
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                width,
            } => {
                set_stroke(&mut content, *color);
                content.set_line_width(*width);
                content.move_to(*x1, height - y1);
                content.line_to(*x2, height - y2);
                content.stroke();
            }
            DrawOp::Circle { cx, cy, r, color } => {
                set_fill(&mut content, *color);
                let (cx, cy, r) = (*cx, height - cy, *r);
                let k = r * KAPPA;
                content.move_to(cx + r, cy);
                content.cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r);
                content.cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy);
                content.cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r);
                content.cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy);
                content.close_path();
                content.fill_nonzero();
            }
            DrawOp::Image { x, y, w, h, image } => {
                let name = image_name(*image);
                content.save_state();
                content.transform([*w, 0.0, 0.0, *h, *x, height - y - h]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
            }
        }
    }
    content.finish()
}

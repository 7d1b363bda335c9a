//! Font faces and text measurement.
//!
//! A [`FontBook`] holds five faces: the four styles of the body family plus a
//! monospace face for code. Each face is either one of the PDF base-14 fonts
//! (no embedding, WinAnsi encoded, built-in metrics) or a TrueType file that
//! is embedded as a `Type0`/`CIDFontType2` font addressed by glyph id.

use crate::error::FontError;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Which face of the book a run of text uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FaceSlot {
    Regular,
    Bold,
    Italic,
    BoldItalic,
    Monospace,
}

impl FaceSlot {
    pub const ALL: [FaceSlot; 5] = [
        FaceSlot::Regular,
        FaceSlot::Bold,
        FaceSlot::Italic,
        FaceSlot::BoldItalic,
        FaceSlot::Monospace,
    ];

    pub fn for_style(strong: bool, italic: bool) -> Self {
        match (strong, italic) {
            (false, false) => FaceSlot::Regular,
            (true, false) => FaceSlot::Bold,
            (false, true) => FaceSlot::Italic,
            (true, true) => FaceSlot::BoldItalic,
        }
    }

    /// Resource name used in page content streams.
    pub fn resource_name(&self) -> &'static str {
        match self {
            FaceSlot::Regular => "F1",
            FaceSlot::Bold => "F2",
            FaceSlot::Italic => "F3",
            FaceSlot::BoldItalic => "F4",
            FaceSlot::Monospace => "F5",
        }
    }
}

/// PDF base-14 fonts used when no font file is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    Courier,
}

impl BuiltinFont {
    pub fn base_font(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
            BuiltinFont::HelveticaOblique => "Helvetica-Oblique",
            BuiltinFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            BuiltinFont::Courier => "Courier",
        }
    }

    /// Advance of a WinAnsi byte in 1/1000 em.
    fn advance(&self, byte: u8) -> u16 {
        let table = match self {
            BuiltinFont::Courier => return 600,
            BuiltinFont::Helvetica | BuiltinFont::HelveticaOblique => &HELVETICA_WIDTHS,
            BuiltinFont::HelveticaBold | BuiltinFont::HelveticaBoldOblique => {
                &HELVETICA_BOLD_WIDTHS
            }
        };
        match byte {
            32..=126 => table[usize::from(byte - 32)],
            // Latin-1 letters are close to the average lowercase advance.
            _ => 556,
        }
    }
}

/// Helvetica advances for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {..~
];

/// Helvetica-Bold advances for ASCII 32..=126.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a-m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n-z
    389, 280, 389, 584, // {..~
];

/// Maps a character to its WinAnsiEncoding byte.
pub fn winansi_byte(ch: char) -> Option<u8> {
    let code = u32::from(ch);
    match code {
        0x20..=0x7e | 0xa0..=0xff => Some(code as u8),
        _ => {
            let byte = match ch {
                '€' => 0x80,
                '‚' => 0x82,
                'ƒ' => 0x83,
                '„' => 0x84,
                '…' => 0x85,
                '†' => 0x86,
                '‡' => 0x87,
                'ˆ' => 0x88,
                '‰' => 0x89,
                'Š' => 0x8a,
                '‹' => 0x8b,
                'Œ' => 0x8c,
                'Ž' => 0x8e,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '˜' => 0x98,
                '™' => 0x99,
                'š' => 0x9a,
                '›' => 0x9b,
                'œ' => 0x9c,
                'ž' => 0x9e,
                'Ÿ' => 0x9f,
                _ => return None,
            };
            Some(byte)
        }
    }
}

/// A parsed TrueType font ready for embedding.
pub struct EmbeddedFont {
    name: String,
    data: Vec<u8>,
    units_per_em: f32,
    glyphs: HashMap<char, u16>,
    advances: Vec<u16>,
    pub(crate) ascent: f32,
    pub(crate) descent: f32,
    pub(crate) cap_height: f32,
    pub(crate) italic_angle: f32,
    pub(crate) bbox: [f32; 4],
    pub(crate) monospaced: bool,
}

impl fmt::Debug for EmbeddedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedFont")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .field("glyphs", &self.glyphs.len())
            .finish()
    }
}

impl EmbeddedFont {
    pub fn from_file(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Embedded");
        Self::from_bytes(stem, data)
    }

    pub fn from_bytes(name: &str, data: Vec<u8>) -> Result<Self, FontError> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|err| FontError::Parse(format!("{name}: {err}")))?;

        let mut glyphs = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|code| {
                    if let (Some(ch), Some(gid)) =
                        (char::from_u32(code), subtable.glyph_index(code))
                    {
                        glyphs.entry(ch).or_insert(gid.0);
                    }
                });
            }
        }
        if glyphs.is_empty() {
            return Err(FontError::Parse(format!("{name}: no Unicode cmap")));
        }

        let advances = (0..face.number_of_glyphs())
            .map(|gid| {
                face.glyph_hor_advance(ttf_parser::GlyphId(gid))
                    .unwrap_or(0)
            })
            .collect();
        let units_per_em = f32::from(face.units_per_em());
        let scale = 1000.0 / units_per_em;
        let bbox = face.global_bounding_box();
        let font = Self {
            name: sanitize_name(name),
            units_per_em,
            glyphs,
            advances,
            ascent: f32::from(face.ascender()) * scale,
            descent: f32::from(face.descender()) * scale,
            cap_height: f32::from(face.capital_height().unwrap_or(face.ascender())) * scale,
            italic_angle: face.italic_angle(),
            bbox: [
                f32::from(bbox.x_min) * scale,
                f32::from(bbox.y_min) * scale,
                f32::from(bbox.x_max) * scale,
                f32::from(bbox.y_max) * scale,
            ],
            monospaced: face.is_monospaced(),
            data,
        };
        log::debug!("loaded font {font:?}");
        Ok(font)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Glyph id for a character, 0 (`.notdef`) when the font lacks it.
    pub fn glyph(&self, ch: char) -> u16 {
        self.glyphs.get(&ch).copied().unwrap_or(0)
    }

    /// Advance of a glyph in 1/1000 em.
    pub fn glyph_advance(&self, gid: u16) -> f32 {
        let units = self.advances.get(usize::from(gid)).copied().unwrap_or(0);
        f32::from(units) * 1000.0 / self.units_per_em
    }
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "Embedded".to_string()
    } else {
        cleaned
    }
}

/// One face of the book.
#[derive(Debug, Clone)]
pub enum Face {
    Builtin(BuiltinFont),
    Embedded(Arc<EmbeddedFont>),
}

impl Face {
    /// Width of `text` at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: f32 = match self {
            Face::Builtin(font) => text
                .chars()
                .map(|ch| f32::from(font.advance(winansi_byte(ch).unwrap_or(b'?'))))
                .sum(),
            Face::Embedded(font) => text
                .chars()
                .map(|ch| font.glyph_advance(font.glyph(ch)))
                .sum(),
        };
        units * size / 1000.0
    }

    pub fn char_width(&self, ch: char, size: f32) -> f32 {
        let mut buf = [0u8; 4];
        self.text_width(ch.encode_utf8(&mut buf), size)
    }

    /// Encodes `text` for a `Tj` operator: WinAnsi bytes for base-14 fonts,
    /// big-endian glyph ids for embedded ones. Characters the face cannot
    /// show become `?` (or `.notdef`).
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Face::Builtin(_) => text
                .chars()
                .map(|ch| winansi_byte(ch).unwrap_or(b'?'))
                .collect(),
            Face::Embedded(font) => text
                .chars()
                .flat_map(|ch| font.glyph(ch).to_be_bytes())
                .collect(),
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Face::Embedded(_))
    }
}

/// The faces used by one render.
#[derive(Debug, Clone)]
pub struct FontBook {
    regular: Face,
    bold: Face,
    italic: Face,
    bold_italic: Face,
    monospace: Face,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FontBook {
    /// Helvetica family with Courier for code.
    pub fn builtin() -> Self {
        Self {
            regular: Face::Builtin(BuiltinFont::Helvetica),
            bold: Face::Builtin(BuiltinFont::HelveticaBold),
            italic: Face::Builtin(BuiltinFont::HelveticaOblique),
            bold_italic: Face::Builtin(BuiltinFont::HelveticaBoldOblique),
            monospace: Face::Builtin(BuiltinFont::Courier),
        }
    }

    /// Replaces one face with an embedded font.
    pub fn with_face(mut self, slot: FaceSlot, font: Arc<EmbeddedFont>) -> Self {
        *self.slot_mut(slot) = Face::Embedded(font);
        self
    }

    /// Loads a TrueType file into `slot`.
    pub fn with_font_file(self, slot: FaceSlot, path: &Path) -> Result<Self, FontError> {
        let font = EmbeddedFont::from_file(path)?;
        Ok(self.with_face(slot, Arc::new(font)))
    }

    pub fn face(&self, slot: FaceSlot) -> &Face {
        match slot {
            FaceSlot::Regular => &self.regular,
            FaceSlot::Bold => &self.bold,
            FaceSlot::Italic => &self.italic,
            FaceSlot::BoldItalic => &self.bold_italic,
            FaceSlot::Monospace => &self.monospace,
        }
    }

    fn slot_mut(&mut self, slot: FaceSlot) -> &mut Face {
        match slot {
            FaceSlot::Regular => &mut self.regular,
            FaceSlot::Bold => &mut self.bold,
            FaceSlot::Italic => &mut self.italic,
            FaceSlot::BoldItalic => &mut self.bold_italic,
            FaceSlot::Monospace => &mut self.monospace,
        }
    }

    pub fn text_width(&self, slot: FaceSlot, text: &str, size: f32) -> f32 {
        self.face(slot).text_width(text, size)
    }
}

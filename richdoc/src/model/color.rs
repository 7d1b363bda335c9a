//! RGBA color value and its textual forms.
//!
//! The wire format always writes `#rrggbbaa`. Parsing is lenient and also
//! accepts what legacy HTML and older editor builds produced: `#rgb`,
//! `#rrggbb`, `rgb(r, g, b)`, `rgba(r, g, b, a)` and `rgb(r, g, b, a)`, where a
//! functional alpha may be a byte (`0..=255`) or a fraction (`0.0..=1.0`).

use crate::error::ColorParseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Default `<mark>` highlight.
    pub const HIGHLIGHT: Color = Color::rgb(255, 255, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let value = input.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorParseError::new(input));
        }
        let lower = value.to_ascii_lowercase();
        let args = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| ColorParseError::new(input))?;
        parse_functional(args).ok_or_else(|| ColorParseError::new(input))
    }

    /// Parses `input`, logging and falling back to the zero color on failure.
    pub fn parse_or_default(input: &str) -> Self {
        Self::parse(input).unwrap_or_else(|err| {
            log::warn!("{err}; using transparent black");
            Color::default()
        })
    }

    /// `#rrggbbaa`, the wire form.
    pub fn to_hex(&self) -> String {
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }

    /// `rgb(r,g,b)` when opaque, `rgba(r,g,b,alpha)` with a fractional alpha
    /// otherwise.
    pub fn to_rgb_string(&self) -> String {
        if self.a == 255 {
            format!("rgb({},{},{})", self.r, self.g, self.b)
        } else {
            let alpha = f32::from(self.a) / 255.0;
            format!("rgba({},{},{},{alpha:.4})", self.r, self.g, self.b)
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Channels scaled to `0.0..=1.0` for PDF color operators.
    pub fn to_unit_rgb(&self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => {
            let nibble = |i: usize| {
                u8::from_str_radix(&hex[i..i + 1], 16)
                    .ok()
                    .map(|v| v * 17)
            };
            Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
        }
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn parse_functional(args: &str) -> Option<Color> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| s.parse::<u8>().ok();
    let alpha = match parts.get(3) {
        None => 255,
        Some(raw) => parse_alpha(raw)?,
    };
    Some(Color::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

fn parse_alpha(raw: &str) -> Option<u8> {
    if let Ok(byte) = raw.parse::<u8>() {
        // "1" is ambiguous; treat it as fully opaque like CSS does.
        return Some(if byte == 1 { 255 } else { byte });
    }
    let fraction = raw.parse::<f32>().ok()?;
    if (0.0..=1.0).contains(&fraction) {
        Some((fraction * 255.0).round() as u8)
    } else {
        None
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Color::parse(&raw).map_err(serde::de::Error::custom)
    }
}

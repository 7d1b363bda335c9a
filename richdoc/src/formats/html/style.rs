//! Inline `style="…"` attribute parsing.
//!
//! Only the handful of properties the legacy editor emitted are interpreted.
//! Values that do not parse are ignored (logged at debug level).

use crate::model::{Color, TextAlign};

/// Declarations of one `style` attribute, property names lowercased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn parse(style: &str) -> Self {
        let declarations = style
            .split(';')
            .filter_map(|decl| {
                let (property, value) = decl.split_once(':')?;
                let property = property.trim().to_ascii_lowercase();
                let value = value.trim();
                let value = value
                    .strip_suffix("!important")
                    .map(str::trim_end)
                    .unwrap_or(value);
                (!property.is_empty() && !value.is_empty())
                    .then(|| (property, value.to_string()))
            })
            .collect();
        Self { declarations }
    }

    /// The last value declared for `property`.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn color(&self) -> Option<Color> {
        self.color_property("color")
    }

    pub fn background_color(&self) -> Option<Color> {
        self.color_property("background-color")
            .or_else(|| self.color_property("background"))
    }

    fn color_property(&self, property: &str) -> Option<Color> {
        let raw = self.get(property)?;
        match Color::parse(raw) {
            Ok(color) => Some(color),
            Err(err) => {
                log::debug!("ignoring {property}: {err}");
                None
            }
        }
    }

    /// `font-size` in pixels: `px` as is, `pt` scaled by 4/3, bare numbers as
    /// pixels.
    pub fn font_size(&self) -> Option<u32> {
        let raw = self.get("font-size")?;
        let size = parse_length(raw);
        if size.is_none() {
            log::debug!("ignoring font-size '{raw}'");
        }
        size
    }

    pub fn text_align(&self) -> Option<TextAlign> {
        self.get("text-align").and_then(TextAlign::parse)
    }

    pub fn width_px(&self) -> Option<u32> {
        self.get("width").and_then(parse_px)
    }

    pub fn min_width_px(&self) -> Option<u32> {
        self.get("min-width").and_then(parse_px)
    }

    /// Image placement from `float`: left and right keep their side, `none`
    /// centers.
    pub fn float_align(&self) -> Option<TextAlign> {
        match self.get("float")?.to_ascii_lowercase().as_str() {
            "left" => Some(TextAlign::Left),
            "right" => Some(TextAlign::Right),
            "none" => Some(TextAlign::Center),
            other => {
                log::debug!("ignoring float '{other}'");
                None
            }
        }
    }
}

/// Parses `"12"`, `"12px"` or `"12.5px"` into whole pixels.
pub fn parse_px(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    let value = number.parse::<f64>().ok()?;
    (value >= 0.0 && value.is_finite()).then(|| value.round() as u32)
}

/// A CSS length in whole pixels. Supports `px`, `pt` and unitless values.
pub fn parse_length(raw: &str) -> Option<u32> {
    let value = raw.trim().to_ascii_lowercase();
    if let Some(points) = value.strip_suffix("pt") {
        let points = points.trim().parse::<f64>().ok()?;
        return (points >= 0.0).then(|| (points * 4.0 / 3.0).round() as u32);
    }
    parse_px(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declarations() {
        let style = InlineStyle::parse("Color: #ff0000; background-color:rgb(0,0,255) ;;width:120px");
        assert_eq!(style.color(), Some(Color::rgb(255, 0, 0)));
        assert_eq!(style.background_color(), Some(Color::rgb(0, 0, 255)));
        assert_eq!(style.width_px(), Some(120));
        assert_eq!(style.get("height"), None);
    }

    #[test]
    fn later_declarations_win() {
        let style = InlineStyle::parse("text-align: left; text-align: right !important");
        assert_eq!(style.text_align(), Some(TextAlign::Right));
    }

    #[test]
    fn font_size_units() {
        assert_eq!(InlineStyle::parse("font-size: 18px").font_size(), Some(18));
        assert_eq!(InlineStyle::parse("font-size: 12pt").font_size(), Some(16));
        assert_eq!(InlineStyle::parse("font-size: 14").font_size(), Some(14));
        assert_eq!(InlineStyle::parse("font-size: large").font_size(), None);
    }

    #[test]
    fn malformed_values_are_ignored() {
        let style = InlineStyle::parse("color: bluish; float: inherit; garbage");
        assert_eq!(style.color(), None);
        assert_eq!(style.float_align(), None);
        assert!(!style.is_empty());
        assert!(InlineStyle::parse("  ").is_empty());
    }

    #[test]
    fn float_maps_to_alignment() {
        assert_eq!(
            InlineStyle::parse("float: right").float_align(),
            Some(TextAlign::Right)
        );
        assert_eq!(
            InlineStyle::parse("float:none").float_align(),
            Some(TextAlign::Center)
        );
    }
}

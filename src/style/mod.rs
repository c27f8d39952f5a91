//! # Style Primitives
//!
//! The small set of visual properties the invoice layout needs: colors,
//! font family and weight, and horizontal alignment inside a cell.
//!
//! There is no cascade here. Every draw call carries its complete
//! [`TextStyle`], so nothing leaks from one primitive (or one page) to the
//! next.

use serde::{Deserialize, Serialize};

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Build a color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// A neutral gray given as a 0-255 channel value (fractional allowed).
    pub fn gray(level: f64) -> Self {
        let v = (level / 255.0).clamp(0.0, 1.0);
        Self { r: v, g: v, b: v }
    }

    /// Parse `#rgb` / `#rrggbb` (the leading `#` is optional).
    ///
    /// Returns `None` for any other length or for non-hex digits.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let (r, g, b) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                (r, g, b)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                (r, g, b)
            }
            _ => return None,
        };
        Some(Self::from_rgb8(r, g, b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// The base-14 families the engine can measure and emit without embedding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Helvetica,
    Times,
    Courier,
}

impl FontFamily {
    /// Case-insensitive lookup by family name. Unknown names fall back to
    /// Helvetica, the same way the PDF writer falls back.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "times" | "times-roman" | "times new roman" => FontFamily::Times,
            "courier" | "courier new" => FontFamily::Courier,
            _ => FontFamily::Helvetica,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Everything needed to measure and paint one run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub family: FontFamily,
    pub weight: FontWeight,
    /// Font size in points.
    pub size: f64,
    pub color: Color,
}

impl TextStyle {
    pub fn regular(family: FontFamily, size: f64, color: Color) -> Self {
        Self {
            family,
            weight: FontWeight::Regular,
            size,
            color,
        }
    }

    pub fn bold(family: FontFamily, size: f64, color: Color) -> Self {
        Self {
            family,
            weight: FontWeight::Bold,
            size,
            color,
        }
    }

    pub fn with_color(self, color: Color) -> Self {
        Self { color, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_six_digits() {
        let c = Color::from_hex("#ff8000").unwrap();
        assert!((c.r - 1.0).abs() < 1e-9);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn hex_three_digits_expands() {
        assert_eq!(Color::from_hex("#222"), Color::from_hex("222222"));
    }

    #[test]
    fn hex_rejects_bad_input() {
        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("#zzzzzz").is_none());
        assert!(Color::from_hex("").is_none());
    }

    #[test]
    fn family_lookup_falls_back() {
        assert_eq!(FontFamily::from_name("Courier"), FontFamily::Courier);
        assert_eq!(FontFamily::from_name("times"), FontFamily::Times);
        assert_eq!(FontFamily::from_name("Comic Sans"), FontFamily::Helvetica);
    }
}

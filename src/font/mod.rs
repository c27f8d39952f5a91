//! # Font Management
//!
//! Resolves a (family, weight) pair to one of the standard PDF fonts and
//! measures strings with its metrics.
//!
//! Only the base-14 faces are supported. They never need embedding, which
//! keeps the output small and byte-for-byte reproducible.

pub mod metrics;

pub use metrics::StandardFontMetrics;

use crate::style::{FontFamily, FontWeight, TextStyle};

/// Identifies a face as used by the layout and the PDF writer.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: FontFamily,
    pub weight: FontWeight,
}

impl FontKey {
    pub fn of(style: &TextStyle) -> Self {
        Self {
            family: style.family,
            weight: style.weight,
        }
    }
}

/// The standard PDF fonts this engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }

    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            Self::Helvetica => StandardFontMetrics::new(&metrics::HELVETICA, 556),
            Self::HelveticaBold => StandardFontMetrics::new(&metrics::HELVETICA_BOLD, 556),
            Self::TimesRoman => StandardFontMetrics::new(&metrics::TIMES_ROMAN, 500),
            Self::TimesBold => StandardFontMetrics::new(&metrics::TIMES_BOLD, 500),
            Self::Courier | Self::CourierBold => StandardFontMetrics::new(&metrics::COURIER, 600),
        }
    }
}

/// Shared font context used by text layout and PDF serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a font key to its standard face.
    pub fn resolve(&self, key: FontKey) -> StandardFont {
        match (key.family, key.weight) {
            (FontFamily::Helvetica, FontWeight::Regular) => StandardFont::Helvetica,
            (FontFamily::Helvetica, FontWeight::Bold) => StandardFont::HelveticaBold,
            (FontFamily::Times, FontWeight::Regular) => StandardFont::TimesRoman,
            (FontFamily::Times, FontWeight::Bold) => StandardFont::TimesBold,
            (FontFamily::Courier, FontWeight::Regular) => StandardFont::Courier,
            (FontFamily::Courier, FontWeight::Bold) => StandardFont::CourierBold,
        }
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, style: &TextStyle) -> f64 {
        self.resolve(FontKey::of(style))
            .metrics()
            .char_width(ch, style.size)
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, style: &TextStyle) -> f64 {
        self.resolve(FontKey::of(style))
            .metrics()
            .measure_string(text, style.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn test_font_context_helvetica() {
        let ctx = FontContext::new();
        let style = TextStyle::regular(FontFamily::Helvetica, 12.0, Color::BLACK);
        let w = ctx.char_width(' ', &style);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::new();
        let regular = TextStyle::regular(FontFamily::Helvetica, 12.0, Color::BLACK);
        let bold = TextStyle::bold(FontFamily::Helvetica, 12.0, Color::BLACK);
        assert!(ctx.measure_string("Invoice", &bold) > ctx.measure_string("Invoice", &regular));
    }

    #[test]
    fn test_resolve_names() {
        let ctx = FontContext::new();
        let key = FontKey {
            family: FontFamily::Times,
            weight: FontWeight::Bold,
        };
        assert_eq!(ctx.resolve(key).pdf_name(), "Times-Bold");
    }
}

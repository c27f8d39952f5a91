//! # Document Model
//!
//! The typed invoice document. Every field is declared up front; setters do
//! plain assignment plus the small normalisations the layout relies on
//! (blank `from` lines dropped, `<br>` turned into newlines, an empty due
//! date treated as absent).
//!
//! A document is built once and can be rendered any number of times;
//! rendering never mutates it.

pub mod input;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::canvas::{Margins, PageSet};
use crate::error::InvoiceError;
use crate::image_loader::{Logo, DEFAULT_MAX_LOGO_PX};
use crate::layout::Composer;
use crate::locale::{Labels, NumberFormat};
use crate::style::{Color, FontFamily};
use crate::text::br_to_newline;

/// Page size selector. Dimensions are in millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    #[serde(rename = "A4", alias = "a4")]
    A4,
    #[serde(rename = "letter", alias = "Letter")]
    Letter,
    #[serde(rename = "legal", alias = "Legal")]
    Legal,
}

impl PageSize {
    /// (width, height) in millimetres.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
        }
    }
}

/// A numeric or free-text value.
///
/// Text that parses as a number is treated as a number; anything else is
/// rendered verbatim wherever a formatted number is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amount::Number(n) => Some(*n).filter(|n| n.is_finite()),
            Amount::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// `"<currency> <formatted>"` for numbers, the raw text otherwise.
    pub fn money(&self, currency: &str, format: &NumberFormat) -> String {
        match (self.as_number(), self) {
            (Some(n), _) => format.money(currency, n),
            (None, Amount::Text(s)) => s.clone(),
            (None, Amount::Number(n)) => n.to_string(),
        }
    }

    /// The value as given; whole numbers without a fraction.
    pub fn raw(&self) -> String {
        match self {
            Amount::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Amount::Number(n) => n.to_string(),
            Amount::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for Amount {
    fn from(v: f64) -> Self {
        Amount::Number(v)
    }
}

impl From<i32> for Amount {
    fn from(v: i32) -> Self {
        Amount::Number(v as f64)
    }
}

impl From<&str> for Amount {
    fn from(v: &str) -> Self {
        Amount::Text(v.to_string())
    }
}

impl From<String> for Amount {
    fn from(v: String) -> Self {
        Amount::Text(v)
    }
}

/// One table row.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub description: Option<String>,
    pub quantity: Amount,
    pub vat: Amount,
    pub price: Amount,
    /// Any item with a discount switches the whole table to six columns.
    pub discount: Option<Amount>,
    pub total: Amount,
}

impl LineItem {
    pub fn new(
        name: impl Into<String>,
        quantity: impl Into<Amount>,
        vat: impl Into<Amount>,
        price: impl Into<Amount>,
        total: impl Into<Amount>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            quantity: quantity.into(),
            vat: vat.into(),
            price: price.into(),
            discount: None,
            total: total.into(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn discount(mut self, discount: impl Into<Amount>) -> Self {
        self.discount = Some(discount.into());
        self
    }

    /// The description, if it has any visible content.
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

/// A row of the totals block.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalLine {
    pub label: String,
    pub value: Amount,
    /// Drawn white on the accent color.
    pub highlighted: bool,
}

/// Free text rendered after the totals, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "lowercase")]
pub enum TextBlock {
    Title(String),
    Paragraph(String),
}

/// The invoice document.
#[derive(Debug, Clone)]
pub struct Invoice {
    pub(crate) page_size: PageSize,
    pub(crate) margins: Margins,
    pub(crate) currency: String,
    pub(crate) labels: &'static Labels,
    pub(crate) color: Color,
    pub(crate) font: FontFamily,
    pub(crate) title: String,
    pub(crate) date: String,
    pub(crate) due: Option<String>,
    pub(crate) reference: String,
    pub(crate) number_format: NumberFormat,
    pub(crate) logo: Option<Logo>,
    pub(crate) from: Vec<String>,
    pub(crate) to: Vec<String>,
    pub(crate) ship: Vec<String>,
    pub(crate) flipped: bool,
    pub(crate) items: Vec<LineItem>,
    pub(crate) totals: Vec<TotalLine>,
    pub(crate) texts: Vec<TextBlock>,
    pub(crate) badge: Option<String>,
    pub(crate) footer_note: String,
}

impl Default for Invoice {
    fn default() -> Self {
        Self::with_labels(PageSize::A4, "€", Labels::english())
    }
}

impl Invoice {
    /// A new document. Fails when `language` has no label table.
    pub fn new(size: PageSize, currency: &str, language: &str) -> Result<Self, InvoiceError> {
        let labels = Labels::for_language(language)?;
        Ok(Self::with_labels(size, currency, labels))
    }

    fn with_labels(size: PageSize, currency: &str, labels: &'static Labels) -> Self {
        Self {
            page_size: size,
            margins: Margins::default(),
            currency: currency.to_string(),
            labels,
            color: Color::from_rgb8(34, 34, 34),
            font: FontFamily::Helvetica,
            title: String::new(),
            date: String::new(),
            due: None,
            reference: String::new(),
            number_format: NumberFormat::default(),
            logo: None,
            from: Vec::new(),
            to: Vec::new(),
            ship: Vec::new(),
            flipped: false,
            items: Vec::new(),
            totals: Vec::new(),
            texts: Vec::new(),
            badge: None,
            footer_note: String::new(),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Accent color as `#rgb` or `#rrggbb`.
    pub fn set_color(&mut self, hex: &str) -> Result<(), InvoiceError> {
        self.color = Color::from_hex(hex).ok_or_else(|| InvoiceError::InvalidColor(hex.to_string()))?;
        Ok(())
    }

    /// Page margins; geometry that leaves no room for the table fails at
    /// layout time.
    pub fn set_margins(&mut self, margins: Margins) {
        self.margins = margins;
    }

    pub fn set_font(&mut self, family: FontFamily) {
        self.font = family;
    }

    pub fn set_date(&mut self, date: impl Into<String>) {
        self.date = date.into();
    }

    /// An empty string clears the due date; its header row is then omitted.
    pub fn set_due(&mut self, due: impl Into<String>) {
        let due = due.into();
        self.due = (!due.is_empty()).then_some(due);
    }

    /// Load the logo from a path or data URI, fitted into `max_px` (or the
    /// default 230 x 130 px box). An unreadable logo leaves the document
    /// without one.
    pub fn set_logo(&mut self, src: &str, max_px: Option<(u32, u32)>) {
        self.logo = Logo::load(src, max_px.unwrap_or(DEFAULT_MAX_LOGO_PX));
    }

    /// Sender lines; blank entries are dropped.
    pub fn set_from<S: AsRef<str>>(&mut self, lines: &[S]) {
        self.from = lines
            .iter()
            .map(|l| l.as_ref())
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();
    }

    pub fn set_to<S: AsRef<str>>(&mut self, lines: &[S]) {
        self.to = lines.iter().map(|l| l.as_ref().to_string()).collect();
    }

    pub fn set_ship<S: AsRef<str>>(&mut self, lines: &[S]) {
        self.ship = lines.iter().map(|l| l.as_ref().to_string()).collect();
    }

    pub fn set_reference(&mut self, reference: impl Into<String>) {
        self.reference = reference.into();
    }

    pub fn set_number_format(&mut self, decimal: &str, thousands: &str) {
        self.number_format = NumberFormat::new(decimal, thousands);
    }

    /// Swap the from/to blocks (labels and values) on the first page.
    pub fn set_flipped(&mut self, flipped: bool) {
        self.flipped = flipped;
    }

    pub fn add_item(&mut self, mut item: LineItem) {
        item.description = item.description.map(|d| br_to_newline(&d));
        self.items.push(item);
    }

    pub fn add_total(&mut self, label: impl Into<String>, value: impl Into<Amount>, highlighted: bool) {
        self.totals.push(TotalLine {
            label: label.into(),
            value: value.into(),
            highlighted,
        });
    }

    pub fn add_title(&mut self, title: impl Into<String>) {
        self.texts.push(TextBlock::Title(title.into()));
    }

    pub fn add_paragraph(&mut self, paragraph: impl Into<String>) {
        self.texts.push(TextBlock::Paragraph(br_to_newline(&paragraph.into())));
    }

    pub fn set_badge(&mut self, badge: impl Into<String>) {
        let badge = badge.into();
        self.badge = (!badge.is_empty()).then_some(badge);
    }

    pub fn set_footer_note(&mut self, note: impl Into<String>) {
        self.footer_note = note.into();
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn has_logo(&self) -> bool {
        self.logo.is_some()
    }

    /// Lay out every page. Geometry errors are reported before anything is
    /// drawn.
    pub fn layout(&self) -> Result<PageSet, InvoiceError> {
        Ok(Composer::new(self)?.compose())
    }

    /// Render to PDF bytes. Identical documents give identical bytes.
    pub fn render(&self) -> Result<Vec<u8>, InvoiceError> {
        let pages = self.layout()?;
        let bytes = crate::pdf::PdfWriter::new().write(&pages, &self.document_title());
        log::info!(
            "rendered invoice '{}': {} page(s), {} bytes",
            self.reference,
            pages.pages.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    pub fn render_to_file(&self, path: impl AsRef<Path>) -> Result<(), InvoiceError> {
        let bytes = self.render()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// `/Title` for the PDF info dictionary.
    fn document_title(&self) -> String {
        match (self.title.is_empty(), self.reference.is_empty()) {
            (false, false) => format!("{} {}", self.title, self.reference),
            (false, true) => self.title.clone(),
            (true, _) => self.reference.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_formats_numbers_and_keeps_text() {
        let f = NumberFormat::new(",", ".");
        assert_eq!(Amount::Number(15.5).money("€", &f), "€ 15,50");
        assert_eq!(Amount::from("21").money("€", &f), "€ 21,00");
        assert_eq!(Amount::from("incl.").money("€", &f), "incl.");
        assert_eq!(Amount::Number(f64::NAN).money("€", &f), "NaN");
    }

    #[test]
    fn quantity_renders_raw() {
        assert_eq!(Amount::Number(3.0).raw(), "3");
        assert_eq!(Amount::Number(1.5).raw(), "1.5");
        assert_eq!(Amount::from("2 h").raw(), "2 h");
    }

    #[test]
    fn amount_deserializes_untagged() {
        let a: Amount = serde_json::from_str("12.5").unwrap();
        assert_eq!(a, Amount::Number(12.5));
        let b: Amount = serde_json::from_str("\"free\"").unwrap();
        assert_eq!(b, Amount::Text("free".into()));
    }

    #[test]
    fn from_drops_blank_lines() {
        let mut inv = Invoice::default();
        inv.set_from(&["Acme", "", "  ", "Main St 1"]);
        assert_eq!(inv.from, vec!["Acme", "Main St 1"]);
        inv.set_to(&["Client", ""]);
        assert_eq!(inv.to.len(), 2);
    }

    #[test]
    fn description_br_normalised() {
        let mut inv = Invoice::default();
        inv.add_item(LineItem::new("A", 1, 0, 1.0, 1.0).description("x<br/>y"));
        assert_eq!(inv.items()[0].description.as_deref(), Some("x\ny"));
    }

    #[test]
    fn empty_due_is_absent() {
        let mut inv = Invoice::default();
        inv.set_due("");
        assert!(inv.due.is_none());
        inv.set_due("2026-11-01");
        assert_eq!(inv.due.as_deref(), Some("2026-11-01"));
    }

    #[test]
    fn bad_color_rejected() {
        let mut inv = Invoice::default();
        assert!(matches!(inv.set_color("#12"), Err(InvoiceError::InvalidColor(_))));
        assert!(inv.set_color("#abc").is_ok());
    }

    #[test]
    fn unknown_language_fails_construction() {
        assert!(matches!(
            Invoice::new(PageSize::A4, "€", "tlh"),
            Err(InvoiceError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn page_sizes() {
        assert_eq!(PageSize::A4.dimensions(), (210.0, 297.0));
        assert_eq!(PageSize::Letter.dimensions(), (215.9, 279.4));
        assert_eq!(PageSize::Legal.dimensions(), (215.9, 355.6));
        let s: PageSize = serde_json::from_str("\"legal\"").unwrap();
        assert_eq!(s, PageSize::Legal);
    }

    #[test]
    fn document_title_combines_title_and_reference() {
        let mut inv = Invoice::default();
        inv.set_title("Invoice");
        inv.set_reference("INV-7");
        assert_eq!(inv.document_title(), "Invoice INV-7");
    }
}

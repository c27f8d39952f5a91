//! JSON description of an invoice.
//!
//! ```json
//! {
//!   "size": "A4", "currency": "€", "language": "en",
//!   "title": "Invoice", "color": "#007fff", "reference": "INV-0001",
//!   "date": "2026-10-18", "due": "2026-11-18",
//!   "numberFormat": { "decimal": ",", "thousands": "." },
//!   "from": ["Acme BV", "Main St 1"], "to": ["Client"],
//!   "items": [{ "name": "Hosting", "quantity": 1, "vat": 21, "price": 10, "total": 10 }],
//!   "totals": [{ "label": "Total", "value": 10, "highlighted": true }],
//!   "texts": [{ "type": "title", "text": "Notes" }],
//!   "badge": "paid", "footerNote": "acme.example"
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::{Amount, Invoice, LineItem, PageSize, TextBlock};
use crate::error::InvoiceError;
use crate::locale::NumberFormat;
use crate::style::FontFamily;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub number_format: Option<NumberFormat>,
    #[serde(default)]
    pub logo: Option<LogoData>,
    #[serde(default)]
    pub from: Vec<String>,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub ship: Vec<String>,
    #[serde(default)]
    pub flip: bool,
    #[serde(default)]
    pub items: Vec<ItemData>,
    #[serde(default)]
    pub totals: Vec<TotalData>,
    #[serde(default)]
    pub texts: Vec<TextBlock>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub footer_note: String,
}

fn default_currency() -> String {
    "€".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

/// Logo source (path or data URI) and an optional pixel bounding box.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoData {
    pub src: String,
    #[serde(default)]
    pub max_width: Option<u32>,
    #[serde(default)]
    pub max_height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: Amount,
    pub vat: Amount,
    pub price: Amount,
    /// `false` or absent means no discount; `true` means an empty one.
    #[serde(default)]
    pub discount: Option<DiscountData>,
    pub total: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiscountData {
    Flag(bool),
    Value(Amount),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalData {
    pub label: String,
    pub value: Amount,
    #[serde(default)]
    pub highlighted: bool,
}

impl TryFrom<InvoiceData> for Invoice {
    type Error = InvoiceError;

    fn try_from(data: InvoiceData) -> Result<Self, Self::Error> {
        let mut invoice = Invoice::new(data.size, &data.currency, &data.language)?;
        invoice.set_title(data.title);
        if let Some(color) = &data.color {
            invoice.set_color(color)?;
        }
        if let Some(font) = &data.font {
            invoice.set_font(FontFamily::from_name(font));
        }
        invoice.set_date(data.date);
        if let Some(due) = data.due {
            invoice.set_due(due);
        }
        invoice.set_reference(data.reference);
        if let Some(format) = data.number_format {
            invoice.number_format = format;
        }
        if let Some(logo) = &data.logo {
            let max = match (logo.max_width, logo.max_height) {
                (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
                _ => None,
            };
            invoice.set_logo(&logo.src, max);
        }
        invoice.set_from(&data.from);
        invoice.set_to(&data.to);
        invoice.set_ship(&data.ship);
        invoice.set_flipped(data.flip);

        for item in data.items {
            let discount = match item.discount {
                Some(DiscountData::Value(v)) => Some(v),
                // a bare `true` still switches on the discount column
                Some(DiscountData::Flag(true)) => Some(Amount::Text(String::new())),
                Some(DiscountData::Flag(false)) | None => None,
            };
            invoice.add_item(LineItem {
                name: item.name,
                description: item.description,
                quantity: item.quantity,
                vat: item.vat,
                price: item.price,
                discount,
                total: item.total,
            });
        }
        for total in data.totals {
            invoice.add_total(total.label, total.value, total.highlighted);
        }
        for text in data.texts {
            match text {
                TextBlock::Title(t) => invoice.add_title(t),
                TextBlock::Paragraph(p) => invoice.add_paragraph(p),
            }
        }
        if let Some(badge) = data.badge {
            invoice.set_badge(badge);
        }
        invoice.set_footer_note(data.footer_note);
        Ok(invoice)
    }
}

impl Invoice {
    /// Build a document from its JSON description.
    pub fn from_json(json: &str) -> Result<Self, InvoiceError> {
        let data: InvoiceData = serde_json::from_str(json)?;
        Invoice::try_from(data)
    }
}

/// A complete sample document, printed by `invoicr --example`.
pub const EXAMPLE_JSON: &str = r##"{
  "size": "A4",
  "currency": "€",
  "language": "en",
  "title": "Invoice",
  "color": "#007fff",
  "reference": "INV-2026-0042",
  "date": "18-10-2026",
  "due": "17-11-2026",
  "numberFormat": { "decimal": ",", "thousands": "." },
  "from": ["Acme Webworks BV", "Keizersgracht 1", "1015 CJ Amsterdam", "The Netherlands"],
  "to": ["Globex Corporation", "Attn. Accounts Payable", "742 Evergreen Terrace", "Springfield"],
  "ship": ["Globex Warehouse", "Dock 4", "Springfield"],
  "items": [
    {
      "name": "Website redesign",
      "description": "Discovery workshop, wireframes<br>and three rounds of design review.",
      "quantity": 1, "vat": 21, "price": 4500, "total": 4500
    },
    {
      "name": "Hosting (12 months)",
      "quantity": 12, "vat": "incl.", "price": 25, "discount": 10, "total": 290
    }
  ],
  "totals": [
    { "label": "Subtotal", "value": 4790 },
    { "label": "VAT 21%", "value": 945 },
    { "label": "Total due", "value": 5735, "highlighted": true }
  ],
  "texts": [
    { "type": "title", "text": "Payment terms" },
    { "type": "paragraph", "text": "Please transfer the amount due within 30 days.<br>Reference the invoice number with your payment." }
  ],
  "badge": "due",
  "footerNote": "acme-webworks.example"
}"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_parses() {
        let invoice = Invoice::from_json(EXAMPLE_JSON).unwrap();
        assert_eq!(invoice.items.len(), 2);
        assert_eq!(invoice.totals.len(), 3);
        assert!(invoice.totals[2].highlighted);
        assert_eq!(invoice.number_format.decimal, ",");
        assert_eq!(invoice.texts.len(), 2);
    }

    #[test]
    fn discount_false_is_no_discount() {
        let json = r#"{"items": [
            {"name": "a", "quantity": 1, "vat": 0, "price": 1, "discount": false, "total": 1},
            {"name": "b", "quantity": 1, "vat": 0, "price": 1, "discount": "5%", "total": 1}
        ]}"#;
        let invoice = Invoice::from_json(json).unwrap();
        assert!(invoice.items[0].discount.is_none());
        assert_eq!(invoice.items[1].discount, Some(Amount::Text("5%".into())));
    }

    #[test]
    fn discount_true_switches_on_discount_column() {
        let json = r#"{"items": [
            {"name": "a", "quantity": 1, "vat": 0, "price": 1, "discount": true, "total": 1}
        ]}"#;
        let invoice = Invoice::from_json(json).unwrap();
        assert_eq!(invoice.items[0].discount, Some(Amount::Text(String::new())));
        assert!(invoice.layout().unwrap().pages[0].has_text("DISCOUNT"));
    }

    #[test]
    fn defaults_apply() {
        let invoice = Invoice::from_json("{}").unwrap();
        assert_eq!(invoice.currency, "€");
        assert_eq!(invoice.page_size, PageSize::A4);
        assert!(invoice.due.is_none());
    }

    #[test]
    fn schema_errors_are_parse_errors() {
        let err = Invoice::from_json(r#"{"items": [{"name": 3}]}"#).unwrap_err();
        assert!(matches!(err, InvoiceError::Parse { .. }));
        assert!(err.to_string().contains("invoice schema"));
    }

    #[test]
    fn unknown_language_from_json() {
        let err = Invoice::from_json(r#"{"language": "xx"}"#).unwrap_err();
        assert!(matches!(err, InvoiceError::UnknownLanguage(_)));
    }
}

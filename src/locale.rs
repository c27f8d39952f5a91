//! # Locale Labels and Number Formatting
//!
//! Label tables for the fixed captions of an invoice, and the
//! decimal/thousands formatting applied to every monetary value.

use serde::{Deserialize, Serialize};

use crate::error::InvoiceError;

/// The captions an invoice needs, in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub number: &'static str,
    pub date: &'static str,
    pub due: &'static str,
    pub from: &'static str,
    pub to: &'static str,
    pub ship: &'static str,
    pub product: &'static str,
    pub amount: &'static str,
    pub vat: &'static str,
    pub price: &'static str,
    pub discount: &'static str,
    pub total: &'static str,
    pub page: &'static str,
    pub page_of: &'static str,
}

const EN: Labels = Labels {
    number: "Invoice number",
    date: "Billing date",
    due: "Due date",
    from: "Our information",
    to: "Billing to",
    ship: "Shipping to",
    product: "Product",
    amount: "Quantity",
    vat: "Vat",
    price: "Price",
    discount: "Discount",
    total: "Total",
    page: "Page",
    page_of: "of",
};

const NL: Labels = Labels {
    number: "Factuurnummer",
    date: "Factuurdatum",
    due: "Vervaldatum",
    from: "Onze gegevens",
    to: "Factuur aan",
    ship: "Verzenden naar",
    product: "Product",
    amount: "Aantal",
    vat: "BTW",
    price: "Prijs",
    discount: "Korting",
    total: "Totaal",
    page: "Pagina",
    page_of: "van",
};

const DE: Labels = Labels {
    number: "Rechnungsnummer",
    date: "Rechnungsdatum",
    due: "Fälligkeitsdatum",
    from: "Unsere Daten",
    to: "Rechnung an",
    ship: "Lieferung an",
    product: "Produkt",
    amount: "Menge",
    vat: "MwSt.",
    price: "Preis",
    discount: "Rabatt",
    total: "Gesamt",
    page: "Seite",
    page_of: "von",
};

const FR: Labels = Labels {
    number: "Numéro de facture",
    date: "Date de facturation",
    due: "Date d'échéance",
    from: "Nos coordonnées",
    to: "Facturé à",
    ship: "Livré à",
    product: "Produit",
    amount: "Quantité",
    vat: "TVA",
    price: "Prix",
    discount: "Remise",
    total: "Total",
    page: "Page",
    page_of: "sur",
};

const ES: Labels = Labels {
    number: "Número de factura",
    date: "Fecha de facturación",
    due: "Fecha de vencimiento",
    from: "Nuestros datos",
    to: "Facturar a",
    ship: "Enviar a",
    product: "Producto",
    amount: "Cantidad",
    vat: "IVA",
    price: "Precio",
    discount: "Descuento",
    total: "Total",
    page: "Página",
    page_of: "de",
};

const IT: Labels = Labels {
    number: "Numero fattura",
    date: "Data fattura",
    due: "Scadenza",
    from: "I nostri dati",
    to: "Fatturato a",
    ship: "Spedire a",
    product: "Prodotto",
    amount: "Quantità",
    vat: "IVA",
    price: "Prezzo",
    discount: "Sconto",
    total: "Totale",
    page: "Pagina",
    page_of: "di",
};

impl Labels {
    pub fn english() -> &'static Labels {
        &EN
    }

    /// Resolve a language code (`"en"`, `"de-AT"`, `"NL"`) to its table.
    ///
    /// Only the primary subtag is significant.
    pub fn for_language(code: &str) -> Result<&'static Labels, InvoiceError> {
        let primary = code.split(['-', '_']).next().unwrap_or(code).trim().to_lowercase();
        match primary.as_str() {
            "en" => Ok(&EN),
            "nl" => Ok(&NL),
            "de" => Ok(&DE),
            "fr" => Ok(&FR),
            "es" => Ok(&ES),
            "it" => Ok(&IT),
            _ => Err(InvoiceError::UnknownLanguage(code.to_string())),
        }
    }
}

/// Decimal and thousands separators used for every formatted number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberFormat {
    pub decimal: String,
    pub thousands: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimal: ".".to_string(),
            thousands: ",".to_string(),
        }
    }
}

impl NumberFormat {
    pub fn new(decimal: &str, thousands: &str) -> Self {
        Self {
            decimal: decimal.to_string(),
            thousands: thousands.to_string(),
        }
    }

    /// Two decimals, half away from zero, grouped by three.
    pub fn format(&self, value: f64) -> String {
        let cents = (value.abs() * 100.0).round() as u64;
        let whole = (cents / 100).to_string();
        let frac = cents % 100;

        let grouped = whole
            .as_bytes()
            .rchunks(3)
            .rev()
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join(&self.thousands);

        let sign = if value < 0.0 && cents != 0 { "-" } else { "" };
        format!("{}{}{}{:02}", sign, grouped, self.decimal, frac)
    }

    /// `"<currency> <number>"`.
    pub fn money(&self, currency: &str, value: f64) -> String {
        format!("{} {}", currency, self.format(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_is_default_table() {
        let l = Labels::for_language("en").unwrap();
        assert_eq!(l.page, "Page");
        assert_eq!(l.page_of, "of");
    }

    #[test]
    fn region_subtag_is_ignored() {
        assert_eq!(Labels::for_language("de-AT").unwrap(), &DE);
        assert_eq!(Labels::for_language("NL").unwrap(), &NL);
    }

    #[test]
    fn unknown_language_is_error() {
        let err = Labels::for_language("xx").unwrap_err();
        assert!(matches!(err, InvoiceError::UnknownLanguage(ref c) if c == "xx"));
    }

    #[test]
    fn formats_with_grouping() {
        let f = NumberFormat::default();
        assert_eq!(f.format(1234567.891), "1,234,567.89");
        assert_eq!(f.format(0.0), "0.00");
        assert_eq!(f.format(999.999), "1,000.00");
    }

    #[test]
    fn formats_european_style() {
        let f = NumberFormat::new(",", ".");
        assert_eq!(f.format(15.5), "15,50");
        assert_eq!(f.money("€", 1500.0), "€ 1.500,00");
    }

    #[test]
    fn negative_values_keep_sign() {
        let f = NumberFormat::default();
        assert_eq!(f.format(-1234.5), "-1,234.50");
        assert_eq!(f.format(-0.001), "0.00");
    }

    #[test]
    fn empty_thousands_separator() {
        let f = NumberFormat::new(",", "");
        assert_eq!(f.format(1234.5), "1234,50");
    }
}

//! # invoicr
//!
//! An invoice layout and pagination engine that writes PDF.
//!
//! An invoice is mostly static labels, except for one part: the item table.
//! Rows grow with their wrapped names and descriptions, so whether the next
//! row fits on the page is only known after measuring it. invoicr measures
//! every row with the same wrapping the canvas draws with, breaks the page
//! *before* a row that would cross the bottom band, repeats the header on
//! every page and resolves "page N of TOTAL" once all pages exist.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON / setters)
//!       ↓
//!   [model]    — typed Invoice document
//!       ↓
//!   [layout]   — column widths, row paginator, document composer
//!       ↓
//!   [canvas]   — recording cell/cursor surface, page count placeholder
//!       ↓
//!   [pdf]      — serialize to PDF bytes
//! ```
//!
//! ```no_run
//! use invoicr::{Invoice, LineItem, PageSize};
//!
//! let mut invoice = Invoice::new(PageSize::A4, "€", "en")?;
//! invoice.set_reference("INV-0001");
//! invoice.add_item(LineItem::new("Consulting", 8, 21, 95.0, 760.0));
//! invoice.add_total("Total", 760.0, true);
//! invoice.render_to_file("invoice.pdf")?;
//! # Ok::<(), invoicr::InvoiceError>(())
//! ```

pub mod canvas;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod locale;
pub mod model;
pub mod pdf;
pub mod style;
pub mod text;

pub use error::InvoiceError;
pub use model::input::{InvoiceData, EXAMPLE_JSON};
pub use model::{Amount, Invoice, LineItem, PageSize, TextBlock, TotalLine};

/// Render an invoice described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>, InvoiceError> {
    Invoice::from_json(json)?.render()
}

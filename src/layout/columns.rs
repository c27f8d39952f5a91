//! Column geometry of the item table.
//!
//! The first column holds the product name and description; every other
//! column (quantity, VAT, price, optional discount, total) shares one width.

use crate::canvas::Margins;
use crate::error::InvoiceError;
use crate::model::LineItem;

/// Gap between adjacent columns, in mm.
pub const COLUMN_SPACING: f64 = 0.3;

const STANDARD_FIRST_COLUMN: f64 = 70.0;
const DISCOUNT_FIRST_COLUMN: f64 = 58.0;

/// Width of each non-first column.
///
/// Fails when the page leaves no positive width for them.
pub fn other_column_width(
    document_width: f64,
    margins: &Margins,
    first_column_width: f64,
    column_count: usize,
    spacing: f64,
) -> Result<f64, InvoiceError> {
    if column_count < 2 {
        return Err(InvoiceError::Layout(format!(
            "item table needs at least 2 columns, got {}",
            column_count
        )));
    }
    let width = (document_width
        - margins.left
        - margins.right
        - first_column_width
        - column_count as f64 * spacing)
        / (column_count - 1) as f64;
    if width <= 0.0 || !width.is_finite() {
        return Err(InvoiceError::Layout(format!(
            "page width {} mm leaves no room for {} table columns (computed width {:.2} mm)",
            document_width, column_count, width
        )));
    }
    Ok(width)
}

/// Resolved table geometry, fixed for the whole document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnLayout {
    /// 5, or 6 when a discount column is shown.
    pub count: usize,
    pub first: f64,
    pub other: f64,
    pub spacing: f64,
}

impl ColumnLayout {
    /// Decide the column set from every item up front: one discount anywhere
    /// in the list turns on the discount column for all pages.
    pub fn for_items(items: &[LineItem], document_width: f64, margins: &Margins) -> Result<Self, InvoiceError> {
        let (count, first) = if items.iter().any(|i| i.discount.is_some()) {
            (6, DISCOUNT_FIRST_COLUMN)
        } else {
            (5, STANDARD_FIRST_COLUMN)
        };
        let other = other_column_width(document_width, margins, first, count, COLUMN_SPACING)?;
        Ok(Self {
            count,
            first,
            other,
            spacing: COLUMN_SPACING,
        })
    }

    pub fn has_discount(&self) -> bool {
        self.count == 6
    }
}

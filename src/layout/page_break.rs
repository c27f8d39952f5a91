//! # Page Break Decisions
//!
//! Per-row pagination of the item table. A row's height depends on how its
//! name and description wrap, so each row goes through a small state
//! machine before anything is drawn:
//!
//! ```text
//! Measuring ──► Fits ─────────────────► Committed
//!     │                                    ▲
//!     └──► PageBreak ──(new page)──► Fits ─┘
//! ```
//!
//! Measuring uses [`measure_wrapped_height`], the same wrapping the canvas
//! commits with, so a row that was measured to fit is exactly as tall when
//! drawn. There is no backtracking once a row is committed.

use crate::model::LineItem;
use crate::style::{Color, FontFamily, TextStyle};
use crate::text::measure_wrapped_height;

/// Line height of the item name column.
pub const NAME_LINE_HEIGHT: f64 = 9.0;
/// Line height of the description under the name.
pub const DESCRIPTION_LINE_HEIGHT: f64 = 3.0;
/// Extra room a row with a description must leave before the page bottom.
pub const DESCRIPTION_PADDING: f64 = 2.0;

const EPSILON: f64 = 1e-6;

pub(crate) fn name_style(family: FontFamily) -> TextStyle {
    TextStyle::bold(family, 8.0, Color::gray(50.0))
}

pub(crate) fn description_style(family: FontFamily) -> TextStyle {
    TextStyle::regular(family, 7.0, Color::gray(120.0))
}

/// What to do with a block that is about to be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// It fits below the cursor on the current page.
    Place,
    /// Start a new page first.
    MoveToNextPage,
}

/// Decide whether a block `required` tall can start at `y`.
///
/// A block at the top of a fresh page is always placed, even when it is
/// taller than the page, so an oversized row cannot loop forever.
pub fn decide_break(y: f64, required: f64, page_bottom: f64, at_page_top: bool) -> BreakDecision {
    if y + required <= page_bottom + EPSILON || at_page_top {
        BreakDecision::Place
    } else {
        BreakDecision::MoveToNextPage
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Measuring,
    Fits,
    PageBreak,
    Committed,
}

/// Pre-commit heights of one item row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMeasure {
    pub name_height: f64,
    pub description_height: Option<f64>,
}

impl RowMeasure {
    /// The height the row occupies once drawn.
    pub fn row_height(&self) -> f64 {
        self.name_height + self.description_height.unwrap_or(0.0)
    }

    /// The room the row needs below the cursor.
    pub fn required_height(&self) -> f64 {
        match self.description_height {
            Some(d) => self.name_height + d + DESCRIPTION_PADDING,
            None => self.name_height,
        }
    }
}

/// A row between measurement and commit.
#[derive(Debug, Clone, Copy)]
pub struct PendingRow {
    pub measure: RowMeasure,
    state: RowState,
}

impl PendingRow {
    pub fn state(&self) -> RowState {
        self.state
    }
}

/// Tracks the usable band of the current page and moves rows through
/// [`RowState`].
#[derive(Debug, Clone, Copy)]
pub struct RowPaginator {
    page_bottom: f64,
    content_top: f64,
}

impl RowPaginator {
    /// `page_bottom` is the lowest y content may reach.
    pub fn new(page_bottom: f64) -> Self {
        Self {
            page_bottom,
            content_top: 0.0,
        }
    }

    pub fn page_bottom(&self) -> f64 {
        self.page_bottom
    }

    /// Record where content starts on a freshly started page (below its
    /// header).
    pub fn start_page(&mut self, content_top: f64) {
        self.content_top = content_top;
    }

    fn at_page_top(&self, y: f64) -> bool {
        y <= self.content_top + EPSILON
    }

    /// Measure an item for a first column `column_width` wide.
    pub fn measure(&self, item: &LineItem, column_width: f64, family: FontFamily) -> PendingRow {
        let name_height = measure_wrapped_height(&item.name, column_width, &name_style(family), NAME_LINE_HEIGHT);
        let description_height = item.description_text().map(|d| {
            measure_wrapped_height(d, column_width, &description_style(family), DESCRIPTION_LINE_HEIGHT)
        });
        PendingRow {
            measure: RowMeasure {
                name_height,
                description_height,
            },
            state: RowState::Measuring,
        }
    }

    /// Decide whether the row fits when started at `y`.
    pub fn resolve(&self, row: &mut PendingRow, y: f64) -> RowState {
        let decision = decide_break(y, row.measure.required_height(), self.page_bottom, self.at_page_top(y));
        row.state = match decision {
            BreakDecision::Place => RowState::Fits,
            BreakDecision::MoveToNextPage => RowState::PageBreak,
        };
        row.state
    }

    /// A placed row that still runs past the page bottom. Only a row taller
    /// than the whole band gets here; it is drawn line by line across pages.
    pub fn overflows(&self, row: &PendingRow, y: f64) -> bool {
        y + row.measure.row_height() > self.page_bottom() + EPSILON
    }

    /// Mark a fitting row as drawn.
    pub fn commit(&self, row: &mut PendingRow) {
        debug_assert_eq!(row.state, RowState::Fits);
        row.state = RowState::Committed;
    }

    /// Fixed-height blocks (totals, titles, paragraph lines).
    pub fn fits(&self, y: f64, height: f64) -> bool {
        decide_break(y, height, self.page_bottom, self.at_page_top(y)) == BreakDecision::Place
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginator() -> RowPaginator {
        let mut p = RowPaginator::new(277.0);
        p.start_page(80.0);
        p
    }

    #[test]
    fn everything_fits() {
        assert_eq!(decide_break(100.0, 20.0, 277.0, false), BreakDecision::Place);
        assert_eq!(decide_break(257.0, 20.0, 277.0, false), BreakDecision::Place);
    }

    #[test]
    fn overflow_moves_to_next_page() {
        assert_eq!(decide_break(260.0, 20.0, 277.0, false), BreakDecision::MoveToNextPage);
    }

    #[test]
    fn page_top_always_places() {
        assert_eq!(decide_break(80.0, 500.0, 277.0, true), BreakDecision::Place);
    }

    #[test]
    fn short_row_fits_and_commits() {
        let p = paginator();
        let mut row = p.measure(&LineItem::new("Hosting", 1, 0, 1.0, 1.0), 70.0, FontFamily::Helvetica);
        assert_eq!(row.state(), RowState::Measuring);
        assert_eq!(row.measure.row_height(), 9.0);
        assert_eq!(p.resolve(&mut row, 100.0), RowState::Fits);
        p.commit(&mut row);
        assert_eq!(row.state(), RowState::Committed);
    }

    #[test]
    fn description_counts_with_padding() {
        let p = paginator();
        let item = LineItem::new("Design", 1, 0, 1.0, 1.0).description("a\nb\nc");
        let mut row = p.measure(&item, 70.0, FontFamily::Helvetica);
        assert_eq!(row.measure.description_height, Some(9.0));
        assert_eq!(row.measure.required_height(), 20.0);
        // 258 + 20 = 278 > 277
        assert_eq!(p.resolve(&mut row, 258.0), RowState::PageBreak);
        assert_eq!(p.resolve(&mut row, 257.0), RowState::Fits);
    }

    #[test]
    fn oversized_row_at_page_top_still_fits() {
        let p = paginator();
        let item = LineItem::new("Long", 1, 0, 1.0, 1.0).description("line\n".repeat(100));
        let mut row = p.measure(&item, 70.0, FontFamily::Helvetica);
        assert_eq!(p.resolve(&mut row, 150.0), RowState::PageBreak);
        assert_eq!(p.resolve(&mut row, 80.0), RowState::Fits);
        assert!(p.overflows(&row, 80.0));
    }

    #[test]
    fn fitting_rows_never_overflow() {
        let p = paginator();
        let item = LineItem::new("Design", 1, 0, 1.0, 1.0).description("a\nb\nc");
        let mut row = p.measure(&item, 70.0, FontFamily::Helvetica);
        assert_eq!(p.resolve(&mut row, 257.0), RowState::Fits);
        assert!(!p.overflows(&row, 257.0));
        // the padding only matters for the break decision
        assert!(!p.overflows(&row, 259.0));
    }

    #[test]
    fn empty_description_is_ignored() {
        let p = paginator();
        let item = LineItem::new("x", 1, 0, 1.0, 1.0).description("");
        let row = p.measure(&item, 70.0, FontFamily::Helvetica);
        assert_eq!(row.measure.description_height, None);
    }
}

//! # Document Composer
//!
//! Drives the canvas through a whole invoice: a header on every page (logo,
//! title, number/date/due block, the party block on page one, the table
//! header until the table is done), the item rows through the
//! [`RowPaginator`], totals, the badge stamp, trailing text blocks, and a
//! footer on every page.
//!
//! The canvas has no automatic page breaks. Every block that can run off
//! the page asks the paginator first and breaks explicitly, which keeps the
//! footer, the next header and the cursor under the composer's control.

pub mod columns;
pub mod page_break;

pub use columns::{other_column_width, ColumnLayout, COLUMN_SPACING};
pub use page_break::{decide_break, BreakDecision, PendingRow, RowMeasure, RowPaginator, RowState};

use crate::canvas::{Canvas, Cell, CellMove, ImageId, PageSet, PAGE_COUNT_ALIAS};
use crate::error::InvoiceError;
use crate::model::{Invoice, LineItem, TextBlock};
use crate::style::{Color, TextAlign, TextStyle};
use page_break::{description_style, name_style, DESCRIPTION_LINE_HEIGHT, NAME_LINE_HEIGHT};

/// Opacity of the gray behind table cells.
const ROW_FILL_OPACITY: f64 = 0.06;
const HEADER_LINE_HEIGHT: f64 = 5.0;
const TOTALS_ROW_HEIGHT: f64 = 9.0;
const TITLE_BLOCK_HEIGHT: f64 = 10.0;
const PARAGRAPH_LINE_HEIGHT: f64 = 4.0;
const RULE_WIDTH: f64 = 0.3;
const BADGE_ANGLE: f64 = 10.0;
const BADGE_LINE_WIDTH: f64 = 0.4;
const BADGE_HEIGHT: f64 = 10.0;

pub struct Composer<'a> {
    invoice: &'a Invoice,
    canvas: Canvas,
    columns: ColumnLayout,
    paginator: RowPaginator,
    logo: Option<ImageId>,
    products_ended: bool,
}

impl<'a> Composer<'a> {
    /// Validate the geometry and prepare an empty canvas.
    pub fn new(invoice: &'a Invoice) -> Result<Self, InvoiceError> {
        let (width, height) = invoice.page_size.dimensions();
        let columns = ColumnLayout::for_items(&invoice.items, width, &invoice.margins)?;
        log::debug!(
            "table uses {} columns (first {:.1} mm, others {:.2} mm)",
            columns.count,
            columns.first,
            columns.other
        );

        let mut canvas = Canvas::new(width, height, invoice.margins);
        let logo = invoice.logo.as_ref().map(|l| canvas.add_image(l.image.clone()));

        Ok(Self {
            invoice,
            canvas,
            columns,
            paginator: RowPaginator::new(height - invoice.margins.top),
            logo,
            products_ended: false,
        })
    }

    /// Lay out the whole document and resolve the page count.
    pub fn compose(mut self) -> PageSet {
        self.start_page();
        self.items();
        self.totals_and_badge();
        self.text_blocks();
        self.footer();
        self.canvas.finish()
    }

    fn accent(&self) -> Color {
        self.invoice.color
    }

    fn regular(&self, size: f64, color: Color) -> TextStyle {
        TextStyle::regular(self.invoice.font, size, color)
    }

    fn bold(&self, size: f64, color: Color) -> TextStyle {
        TextStyle::bold(self.invoice.font, size, color)
    }

    fn row_fill() -> Color {
        Color::gray((1.0 - ROW_FILL_OPACITY) * 255.0)
    }

    fn start_page(&mut self) {
        self.canvas.new_page();
        self.header();
        self.paginator.start_page(self.canvas.y());
    }

    fn page_break(&mut self) {
        log::debug!(
            "page {} full at y={:.1}, starting page {}",
            self.canvas.page_number(),
            self.canvas.y(),
            self.canvas.page_number() + 1
        );
        self.footer();
        self.start_page();
    }

    // ── Header ──────────────────────────────────────────────────

    fn header(&mut self) {
        let inv = self.invoice;
        let labels = inv.labels;
        let margins = self.canvas.margins();

        if let (Some(id), Some(logo)) = (self.logo, &inv.logo) {
            self.canvas.image(id, margins.left, margins.top, logo.width, logo.height);
        }

        let title = inv.title.to_uppercase();
        self.canvas.cell(
            Cell::new(0.0, HEADER_LINE_HEIGHT)
                .text(&title)
                .align(TextAlign::Right)
                .then(CellMove::NextLine),
            &self.bold(20.0, Color::BLACK),
        );
        self.canvas.ln(Some(5.0));

        let label_style = self.bold(9.0, self.accent());
        let value_style = self.regular(9.0, Color::gray(50.0));
        let widest = [labels.number, labels.date, labels.due]
            .iter()
            .map(|l| self.canvas.text_layout().string_width(l, &label_style))
            .fold(0.0, f64::max);
        let position_x = (self.canvas.content_width() - widest - 35.0).max(0.0);

        let mut rows = vec![(labels.number, inv.reference.as_str()), (labels.date, inv.date.as_str())];
        if let Some(due) = &inv.due {
            rows.push((labels.due, due.as_str()));
        }
        for (label, value) in rows {
            self.canvas.set_x(margins.left + position_x);
            let caption = format!("{}:", label.to_uppercase());
            self.canvas.cell(Cell::new(32.0, HEADER_LINE_HEIGHT).text(&caption), &label_style);
            self.canvas.cell(
                Cell::new(0.0, HEADER_LINE_HEIGHT)
                    .text(value)
                    .align(TextAlign::Right)
                    .then(CellMove::NextLine),
                &value_style,
            );
        }

        if self.canvas.page_number() == 1 {
            self.parties();
        }
        self.table_header();
    }

    /// From / to / ship block, first page only.
    fn parties(&mut self) {
        let inv = self.invoice;
        let labels = inv.labels;
        let margins = self.canvas.margins();

        let logo_bottom = margins.top + inv.logo.as_ref().map_or(0.0, |l| l.height);
        if logo_bottom > self.canvas.y() {
            self.canvas.set_y(logo_bottom + 10.0);
        } else {
            self.canvas.set_y(self.canvas.y() + 10.0);
        }
        self.canvas.ln(Some(5.0));

        let (from_label, to_label, from, to) = if inv.flipped {
            (labels.to, labels.from, &inv.to, &inv.from)
        } else {
            (labels.from, labels.to, &inv.from, &inv.to)
        };
        let ship = &inv.ship;

        let captions = [from_label, to_label, labels.ship].map(str::to_uppercase);
        self.party_row(
            [captions[0].as_str(), captions[1].as_str(), captions[2].as_str()],
            &self.bold(10.0, self.accent()),
            CellMove::Right,
        );
        self.canvas.ln(Some(7.0));

        let width = self.canvas.content_width() / 3.0;
        let y = self.canvas.y();
        let accent = self.accent();
        let left = margins.left;
        self.canvas.line(left, y, left + width - 10.0, y, accent, RULE_WIDTH);
        self.canvas.line(left + width, y, left + width * 2.0 - 10.0, y, accent, RULE_WIDTH);
        self.canvas.line(left + width * 2.0, y, left + width * 3.0, y, accent, RULE_WIDTH);
        self.canvas.ln(Some(5.0));

        let line = |party: &'a [String], i: usize| -> &'a str { party.get(i).map_or("", |s| s.as_str()) };
        self.party_row(
            [line(from, 0), line(to, 0), line(ship, 0)],
            &self.bold(10.0, Color::gray(50.0)),
            CellMove::NextLine,
        );

        let address_style = self.regular(8.0, Color::gray(100.0));
        self.canvas.ln(Some(2.0));
        let max_lines = from.len().max(to.len()).max(ship.len());
        for i in 1..max_lines {
            self.party_row([line(from, i), line(to, i), line(ship, i)], &address_style, CellMove::NextLine);
        }
        self.canvas.ln(Some(5.0));
    }

    fn party_row(&mut self, texts: [&str; 3], style: &TextStyle, last: CellMove) {
        let width = self.canvas.content_width() / 3.0;
        self.canvas.cell(Cell::new(width, HEADER_LINE_HEIGHT).text(texts[0]), style);
        self.canvas.cell(Cell::new(width, HEADER_LINE_HEIGHT).text(texts[1]), style);
        self.canvas
            .cell(Cell::new(0.0, HEADER_LINE_HEIGHT).text(texts[2]).then(last), style);
    }

    fn table_header(&mut self) {
        if self.products_ended {
            self.canvas.ln(Some(12.0));
            return;
        }

        let labels = self.invoice.labels;
        let cols = self.columns;
        let style = self.bold(9.0, Color::gray(50.0));
        self.canvas.ln(Some(12.0));

        self.canvas.cell(Cell::new(1.0, 10.0), &style);
        let product = labels.product.to_uppercase();
        self.canvas.cell(Cell::new(cols.first, 10.0).text(&product), &style);

        let mut headings = vec![labels.amount, labels.vat, labels.price];
        if cols.has_discount() {
            headings.push(labels.discount);
        }
        headings.push(labels.total);
        for heading in headings {
            let heading = heading.to_uppercase();
            self.canvas.cell(Cell::new(cols.spacing, 10.0), &style);
            self.canvas.cell(
                Cell::new(cols.other, 10.0).text(&heading).align(TextAlign::Center),
                &style,
            );
        }
        self.canvas.ln(None);

        let margins = self.canvas.margins();
        let y = self.canvas.y();
        self.canvas
            .line(margins.left, y, self.canvas.width() - margins.right, y, self.accent(), RULE_WIDTH);
        self.canvas.ln(Some(2.0));
    }

    // ── Body ────────────────────────────────────────────────────

    fn items(&mut self) {
        let inv = self.invoice;
        for (index, item) in inv.items.iter().enumerate() {
            let mut row = self.paginator.measure(item, self.columns.first, inv.font);
            if self.paginator.resolve(&mut row, self.canvas.y()) == RowState::PageBreak {
                log::debug!(
                    "item {} needs {:.1} mm below y={:.1}, moving it to the next page",
                    index,
                    row.measure.required_height(),
                    self.canvas.y()
                );
                self.page_break();
                self.paginator.resolve(&mut row, self.canvas.y());
            }
            if self.paginator.overflows(&row, self.canvas.y()) {
                log::debug!(
                    "item {} is {:.1} mm tall, continuing it across pages",
                    index,
                    row.measure.row_height()
                );
                self.split_item_row(item);
            } else {
                let drawn = self.item_row(item);
                if (drawn - row.measure.row_height()).abs() > 1e-9 {
                    log::warn!(
                        "item {} measured {:.3} mm but drew {:.3} mm",
                        index,
                        row.measure.row_height(),
                        drawn
                    );
                }
            }
            self.paginator.commit(&mut row);
        }
    }

    /// Draw one item row at the cursor and return its height.
    fn item_row(&mut self, item: &LineItem) -> f64 {
        let inv = self.invoice;
        let cols = self.columns;
        let fill = Self::row_fill();
        let name_style = name_style(inv.font);

        self.canvas.cell(Cell::new(1.0, NAME_LINE_HEIGHT).fill(fill), &name_style);
        let x = self.canvas.x();
        let y = self.canvas.y();
        let name_height = self
            .canvas
            .multi_cell(cols.first, NAME_LINE_HEIGHT, &item.name, &name_style, Some(fill));
        let mut row_height = name_height;
        self.canvas.set_xy(x + cols.first, y);

        if let Some(description) = item.description_text() {
            let resume = self.canvas.snapshot();
            self.canvas.set_xy(x, y + name_height);
            let description_height = self.canvas.multi_cell(
                cols.first,
                DESCRIPTION_LINE_HEIGHT,
                description,
                &description_style(inv.font),
                Some(fill),
            );
            row_height = name_height + description_height;
            // stretch the left spacer over name and description
            self.canvas.set_xy(x - 1.0, y);
            self.canvas.cell(Cell::new(1.0, row_height).fill(fill), &name_style);
            self.canvas.restore(resume);
        }

        self.value_cells(item, row_height);
        self.canvas.ln(Some(row_height));
        self.canvas.ln(Some(cols.spacing));
        row_height
    }

    /// A row taller than the page band, drawn line by line. Whenever the next
    /// line would cross the bottom the page breaks and the row carries on
    /// below the next table header. The value cells sit beside the first part.
    fn split_item_row(&mut self, item: &LineItem) {
        let inv = self.invoice;
        let cols = self.columns;
        let fill = Self::row_fill();
        let name_style = name_style(inv.font);
        let description_style = description_style(inv.font);

        let layout = self.canvas.text_layout();
        let mut lines: Vec<(String, f64, TextStyle)> = layout
            .wrap_cell(&item.name, cols.first, &name_style)
            .into_iter()
            .map(|l| (l.text, NAME_LINE_HEIGHT, name_style))
            .collect();
        if let Some(description) = item.description_text() {
            lines.extend(
                layout
                    .wrap_cell(description, cols.first, &description_style)
                    .into_iter()
                    .map(|l| (l.text, DESCRIPTION_LINE_HEIGHT, description_style)),
            );
        }

        let column_x = self.canvas.margins().left + 1.0;
        let mut top = self.canvas.y();
        let mut values_drawn = false;
        for (text, height, style) in &lines {
            if !self.paginator.fits(self.canvas.y(), *height) {
                self.close_row_part(item, top, &mut values_drawn);
                self.page_break();
                top = self.canvas.y();
            }
            self.canvas.set_xy(column_x, self.canvas.y());
            self.canvas.cell(
                Cell::new(cols.first, *height)
                    .text(text)
                    .fill(fill)
                    .then(CellMove::Below),
                style,
            );
        }
        self.close_row_part(item, top, &mut values_drawn);
        self.canvas.ln(Some(cols.spacing));
    }

    /// Finish the part of a split row that started at `top` on this page:
    /// the left spacer, and the value cells if no earlier part has them.
    fn close_row_part(&mut self, item: &LineItem, top: f64, values_drawn: &mut bool) {
        let left = self.canvas.margins().left;
        let height = self.canvas.y() - top;
        self.canvas.set_xy(left, top);
        self.canvas
            .cell(Cell::new(1.0, height).fill(Self::row_fill()), &name_style(self.invoice.font));
        if !*values_drawn {
            self.canvas.set_x(left + 1.0 + self.columns.first);
            self.value_cells(item, height);
            *values_drawn = true;
        }
        self.canvas.set_xy(left, top + height);
    }

    /// Quantity, VAT, price, the optional discount and the total, each in a
    /// centered cell `height` tall starting at the cursor.
    fn value_cells(&mut self, item: &LineItem, height: f64) {
        let inv = self.invoice;
        let cols = self.columns;
        let fmt = &inv.number_format;
        let currency = inv.currency.as_str();
        let mut values = vec![
            item.quantity.raw(),
            item.vat.money(currency, fmt),
            item.price.money(currency, fmt),
        ];
        if cols.has_discount() {
            values.push(item.discount.as_ref().map(|d| d.money(currency, fmt)).unwrap_or_default());
        }
        values.push(item.total.money(currency, fmt));

        let fill = Self::row_fill();
        let value_style = self.regular(8.0, Color::gray(50.0));
        for value in &values {
            self.canvas.cell(Cell::new(cols.spacing, height), &value_style);
            self.canvas.cell(
                Cell::new(cols.other, height)
                    .text(value)
                    .align(TextAlign::Center)
                    .fill(fill),
                &value_style,
            );
        }
    }

    fn totals_and_badge(&mut self) {
        let inv = self.invoice;
        let cols = self.columns;
        let mut anchor = self.canvas.snapshot();

        for total in &inv.totals {
            if !self.paginator.fits(self.canvas.y(), TOTALS_ROW_HEIGHT + cols.spacing) {
                self.page_break();
                anchor = self.canvas.snapshot();
            }

            let (text_color, fill) = if total.highlighted {
                (Color::WHITE, self.accent())
            } else {
                (Color::gray(50.0), Self::row_fill())
            };
            let style = self.bold(8.0, text_color);
            let value = total.value.money(&inv.currency, &inv.number_format);

            self.canvas.cell(Cell::new(1.0 + cols.first, TOTALS_ROW_HEIGHT), &style);
            for _ in 0..cols.count - 3 {
                self.canvas.cell(Cell::new(cols.other, TOTALS_ROW_HEIGHT), &style);
                self.canvas.cell(Cell::new(cols.spacing, TOTALS_ROW_HEIGHT), &style);
            }
            self.canvas.cell(Cell::new(cols.spacing, TOTALS_ROW_HEIGHT), &style);
            self.canvas.cell(Cell::new(1.0, TOTALS_ROW_HEIGHT).fill(fill), &style);
            self.canvas.cell(
                Cell::new(cols.other - 1.0, TOTALS_ROW_HEIGHT)
                    .text(&total.label)
                    .fill(fill),
                &style,
            );
            self.canvas.cell(Cell::new(cols.spacing, TOTALS_ROW_HEIGHT), &style);
            self.canvas.cell(
                Cell::new(cols.other, TOTALS_ROW_HEIGHT)
                    .text(&value)
                    .align(TextAlign::Center)
                    .fill(fill),
                &style,
            );
            self.canvas.ln(None);
            self.canvas.ln(Some(cols.spacing));
        }

        self.products_ended = true;
        self.canvas.ln(None);
        self.canvas.ln(Some(3.0));

        if let Some(badge) = &inv.badge {
            let text = format!(" {} ", badge.to_uppercase());
            let style = self.bold(15.0, self.accent());
            let resume = self.canvas.snapshot();

            // keep the stamp clear of the footer band
            let by = (anchor.y + 15.0).min(self.paginator.page_bottom() - BADGE_HEIGHT);
            self.canvas.set_xy(anchor.x, by);
            let bx = self.canvas.x();
            let width = self.canvas.text_layout().string_width(&text, &style) + 2.0;
            self.canvas.rotate(BADGE_ANGLE, bx, by);
            self.canvas.rect(bx, by, width, BADGE_HEIGHT, self.accent(), BADGE_LINE_WIDTH);
            self.canvas.write(BADGE_HEIGHT, &text, &style);
            self.canvas.reset_rotation();

            if resume.y > by + 20.0 {
                self.canvas.restore(resume);
            } else {
                self.canvas.set_y(by + 18.0);
            }
        }
    }

    fn text_blocks(&mut self) {
        let inv = self.invoice;
        let margins = self.canvas.margins();

        for block in &inv.texts {
            match block {
                TextBlock::Title(title) => {
                    if !self.paginator.fits(self.canvas.y(), TITLE_BLOCK_HEIGHT + 4.0) {
                        self.page_break();
                    }
                    let title = title.to_uppercase();
                    self.canvas
                        .cell(Cell::new(0.0, TITLE_BLOCK_HEIGHT).text(&title), &self.bold(9.0, Color::gray(50.0)));
                    self.canvas.ln(None);
                    let y = self.canvas.y();
                    self.canvas
                        .line(margins.left, y, self.canvas.width() - margins.right, y, self.accent(), RULE_WIDTH);
                    self.canvas.ln(Some(4.0));
                }
                TextBlock::Paragraph(text) => {
                    let style = self.regular(8.0, Color::gray(80.0));
                    let width = self.canvas.content_width();
                    let lines = self.canvas.text_layout().wrap_cell(text, width, &style);
                    for line in &lines {
                        if !self.paginator.fits(self.canvas.y(), PARAGRAPH_LINE_HEIGHT) {
                            self.page_break();
                        }
                        self.canvas.set_x(margins.left);
                        self.canvas.cell(
                            Cell::new(width, PARAGRAPH_LINE_HEIGHT)
                                .text(&line.text)
                                .then(CellMove::Below),
                            &style,
                        );
                    }
                    self.canvas.ln(Some(4.0));
                }
            }
        }
    }

    fn footer(&mut self) {
        let inv = self.invoice;
        let style = self.regular(8.0, Color::gray(50.0));
        self.canvas.set_y(self.canvas.height() - self.canvas.margins().top);
        self.canvas.cell(Cell::new(0.0, 10.0).text(&inv.footer_note), &style);
        let page = format!(
            "{} {} {} {}",
            inv.labels.page,
            self.canvas.page_number(),
            inv.labels.page_of,
            PAGE_COUNT_ALIAS
        );
        self.canvas
            .cell(Cell::new(0.0, 10.0).text(&page).align(TextAlign::Right), &style);
    }
}

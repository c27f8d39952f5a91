//! Integration tests for the invoicr pipeline.
//!
//! These tests exercise the full path from a built (or JSON) invoice to
//! recorded pages and PDF bytes. They verify:
//! - The column set is chosen from the whole item list
//! - Measured row heights equal committed heights
//! - Page breaks happen before the first row that would overflow
//! - Footers carry the resolved page count
//! - PDF output is structurally valid and deterministic

use invoicr::canvas::{Canvas, CanvasPage, DrawCommand, Margins};
use invoicr::style::{Color, FontFamily, TextStyle};
use invoicr::text::{measure_wrapped_height, PT_PER_MM};
use invoicr::{Invoice, InvoiceError, LineItem, PageSize};

// ─── Helpers ────────────────────────────────────────────────────

/// Lowest y content may reach on A4.
const A4_BAND_BOTTOM: f64 = 297.0 - 20.0;

fn base_invoice() -> Invoice {
    let mut invoice = Invoice::new(PageSize::A4, "€", "en").unwrap();
    invoice.set_title("Invoice");
    invoice.set_reference("INV-0042");
    invoice.set_date("18-10-2026");
    invoice.set_from(&["Acme BV", "Main St 1", "Amsterdam"]);
    invoice.set_to(&["Globex", "Evergreen Terrace 742"]);
    invoice.set_footer_note("acme.example");
    invoice
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(bytes.windows(5).any(|w| w == b"%%EOF"), "Missing %%EOF marker");
    assert!(bytes.windows(4).any(|w| w == b"xref"), "Missing xref table");
    assert!(bytes.windows(7).any(|w| w == b"trailer"), "Missing trailer");
}

/// Top edge of every item row on a page, keyed by the item name.
///
/// Item names are drawn as the first line of a 9 mm cell in bold 8pt, so
/// the row top is the baseline minus half the cell and the ascent offset.
fn item_row_tops(page: &CanvasPage, prefix: &str) -> Vec<(String, f64)> {
    page.commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { text, y, .. } if text.starts_with(prefix) => {
                Some((text.clone(), y - 4.5 - 0.3 * 8.0 / PT_PER_MM))
            }
            _ => None,
        })
        .collect()
}

fn footer_of(page: &CanvasPage) -> Option<&str> {
    page.texts().find(|t| t.starts_with("Page "))
}

// ─── Column Layout ──────────────────────────────────────────────

#[test]
fn test_six_columns_iff_any_discount_regardless_of_order() {
    for position in 0..3 {
        let mut invoice = base_invoice();
        for i in 0..3 {
            let item = LineItem::new(format!("Item {}", i), 1, 21, 10.0, 10.0);
            invoice.add_item(if i == position { item.discount(1.0) } else { item });
        }
        let pages = invoice.layout().unwrap();
        assert!(pages.pages[0].has_text("DISCOUNT"), "discount at {}", position);
    }

    let mut plain = base_invoice();
    plain.add_item(LineItem::new("Item", 1, 21, 10.0, 10.0));
    let pages = plain.layout().unwrap();
    assert!(!pages.pages[0].has_text("DISCOUNT"));
    assert!(pages.pages[0].has_text("TOTAL"));
}

#[test]
fn test_degenerate_column_width_is_rejected_before_drawing() {
    let mut invoice = base_invoice();
    invoice.add_item(LineItem::new("Item", 1, 21, 10.0, 10.0));
    invoice.set_margins(Margins {
        left: 70.0,
        top: 20.0,
        right: 70.0,
    });
    assert!(matches!(invoice.layout(), Err(InvoiceError::Layout(_))));
    assert!(matches!(invoice.render(), Err(InvoiceError::Layout(_))));
}

// ─── Measurement / Commit Parity ────────────────────────────────

#[test]
fn test_measured_height_equals_committed_height() {
    let style = TextStyle::regular(FontFamily::Helvetica, 7.0, Color::BLACK);
    let texts = [
        "",
        "short",
        "a description that is long enough to wrap across several lines of a narrow column",
        "explicit\nline\nbreaks\n",
        "Supercalifragilisticexpialidocious-without-any-spaces-at-all-to-break-on",
        "mixed\n\nblank lines and a rather long trailing sentence that wraps",
    ];
    for width in [20.0, 58.0, 70.0, 170.0] {
        for text in texts {
            let measured = measure_wrapped_height(text, width, &style, 3.0);
            let mut canvas = Canvas::new(210.0, 297.0, Margins::default());
            canvas.new_page();
            let committed = canvas.multi_cell(width, 3.0, text, &style, None);
            assert_eq!(measured, committed, "width {} text {:?}", width, text);
        }
    }
}

// ─── Pagination ─────────────────────────────────────────────────

#[test]
fn test_page_break_at_first_overflowing_row() {
    let mut invoice = base_invoice();
    for i in 0..60 {
        invoice.add_item(LineItem::new(format!("Row {:02}", i), 1, 21, 10.0, 10.0));
    }
    let pages = invoice.layout().unwrap();
    assert!(pages.pages.len() >= 3);

    let per_page: Vec<Vec<(String, f64)>> = pages.pages.iter().map(|p| item_row_tops(p, "Row ")).collect();

    // every row appears once, in order
    let names: Vec<String> = per_page.iter().flatten().map(|(n, _)| n.clone()).collect();
    let expected: Vec<String> = (0..60).map(|i| format!("Row {:02}", i)).collect();
    assert_eq!(names, expected);

    for (index, rows) in per_page.iter().enumerate() {
        for (name, top) in rows {
            assert!(top + 9.0 <= A4_BAND_BOTTOM + 1e-6, "{} crosses the band on page {}", name, index + 1);
        }
        // the next row would not have fit below the last one
        if let (Some((_, last_top)), Some(next)) = (rows.last(), per_page.get(index + 1)) {
            if !next.is_empty() {
                let next_top = last_top + 9.0 + 0.3;
                assert!(next_top + 9.0 > A4_BAND_BOTTOM, "page {} broke early", index + 1);
            }
        }
    }

    // the table is still running, so its header repeats
    assert!(pages.pages[1].has_text("PRODUCT"));
}

#[test]
fn test_no_table_header_after_table_ended() {
    let mut invoice = base_invoice();
    invoice.add_item(LineItem::new("Only row", 1, 21, 10.0, 10.0));
    invoice.add_total("Total", 10.0, true);
    for i in 0..30 {
        invoice.add_title(format!("Section {}", i));
        invoice.add_paragraph("Terms and conditions apply.<br>Payment within thirty days.");
    }
    let pages = invoice.layout().unwrap();
    assert!(pages.pages.len() > 1);
    assert!(pages.pages[0].has_text("PRODUCT"));
    for page in &pages.pages[1..] {
        assert!(!page.has_text("PRODUCT"));
        assert!(page.has_text("INVOICE"), "title header repeats");
    }
}

#[test]
fn test_two_page_scenario_with_long_description() {
    let mut invoice = base_invoice();
    invoice.add_item(LineItem::new("Website hosting", 1, 21, 120.0, 120.0));
    let log: Vec<String> = (1..=50).map(|i| format!("Work log entry {}", i)).collect();
    invoice.add_item(LineItem::new("Development", 40, 21, 95.0, 3800.0).description(log.join("<br>")));
    invoice.add_total("Total", 3920.0, true);
    invoice.set_badge("paid");

    let pages = invoice.layout().unwrap();
    assert_eq!(pages.pages.len(), 2);

    let first = &pages.pages[0];
    let second = &pages.pages[1];
    assert!(first.has_text("Website hosting"));
    assert!(!first.has_text("Development"));
    assert!(second.has_text("Development"));
    assert!(second.has_text("Work log entry 50"));
    assert!(second.has_text(" PAID "));

    assert_eq!(footer_of(first), Some("Page 1 of 2"));
    assert_eq!(footer_of(second), Some("Page 2 of 2"));
    assert!(first.has_text("acme.example"));
    assert!(second.has_text("acme.example"));

    // the row that moved starts right below the repeated table header
    let tops = item_row_tops(second, "Development");
    assert_eq!(tops.len(), 1);
    assert!(tops[0].1 < 80.0);
}

#[test]
fn test_description_longer_than_a_page_continues() {
    let mut invoice = base_invoice();
    let log: Vec<String> = (1..=150).map(|i| format!("Work log entry {}", i)).collect();
    invoice.add_item(LineItem::new("Retainer", 1, 21, 9000.0, 9000.0).description(log.join("\n")));
    invoice.add_total("Total", 9000.0, true);
    invoice.set_badge("paid");
    let pages = invoice.layout().unwrap();
    assert!(pages.pages.len() >= 3);

    for (index, page) in pages.pages.iter().enumerate() {
        for command in &page.commands {
            match command {
                DrawCommand::Text { y, text, .. } if text.starts_with("Work log") || text == "Retainer" => {
                    assert!(*y <= A4_BAND_BOTTOM, "{:?} below the band on page {}", text, index + 1);
                }
                DrawCommand::Rect { y, height, .. } => {
                    assert!(y + height <= A4_BAND_BOTTOM + 1e-6, "box reaches {} on page {}", y + height, index + 1);
                }
                _ => {}
            }
        }
    }

    // every entry is drawn exactly once
    let entries: Vec<&str> = pages
        .pages
        .iter()
        .flat_map(|p| p.texts())
        .filter(|t| t.starts_with("Work log"))
        .collect();
    assert_eq!(entries.len(), 150);
    assert_eq!(entries.last(), Some(&"Work log entry 150"));
    assert!(pages.pages[0].has_text("Retainer"));
}

#[test]
fn test_footer_on_every_page() {
    let mut invoice = base_invoice();
    for i in 0..80 {
        invoice.add_item(LineItem::new(format!("Row {}", i), 1, 21, 10.0, 10.0));
    }
    let pages = invoice.layout().unwrap();
    let total = pages.pages.len();
    for (i, page) in pages.pages.iter().enumerate() {
        let expected = format!("Page {} of {}", i + 1, total);
        assert_eq!(footer_of(page), Some(expected.as_str()));
    }
}

// ─── Formatting ─────────────────────────────────────────────────

#[test]
fn test_discount_with_european_number_format() {
    let mut invoice = base_invoice();
    invoice.set_number_format(",", ".");
    invoice.add_item(LineItem::new("Licence", 1, 21, 1500.0, 1484.5).discount(15.5));
    let page = &invoice.layout().unwrap().pages[0];
    assert!(page.has_text("€ 15,50"));
    assert!(page.has_text("€ 1.500,00"));
    assert!(page.has_text("€ 1.484,50"));
    assert!(page.has_text("DISCOUNT"));
}

#[test]
fn test_free_text_values_render_verbatim() {
    let mut invoice = base_invoice();
    invoice.add_item(LineItem::new("Support", "2 h", "incl.", 50.0, 100.0).discount("n/a"));
    invoice.add_total("VAT", "included", false);
    let page = &invoice.layout().unwrap().pages[0];
    assert!(page.has_text("2 h"));
    assert!(page.has_text("incl."));
    assert!(page.has_text("n/a"));
    assert!(page.has_text("included"));
}

#[test]
fn test_flip_swaps_from_and_to_but_not_ship() {
    let mut invoice = base_invoice();
    invoice.set_ship(&["Warehouse"]);
    invoice.set_flipped(true);
    let page = &invoice.layout().unwrap().pages[0];
    let texts: Vec<&str> = page.texts().collect();
    let pos = |t: &str| texts.iter().position(|x| *x == t).unwrap();

    assert!(pos("BILLING TO") < pos("OUR INFORMATION"));
    assert!(pos("OUR INFORMATION") < pos("SHIPPING TO"));
    assert!(pos("Globex") < pos("Acme BV"));
    assert!(pos("Acme BV") < pos("Warehouse"));
}

#[test]
fn test_language_labels() {
    let mut invoice = Invoice::new(PageSize::A4, "€", "nl").unwrap();
    invoice.add_item(LineItem::new("Item", 1, 21, 10.0, 10.0));
    let pages = invoice.layout().unwrap();
    assert!(pages.pages[0].has_text("FACTUURNUMMER:"));
    assert_eq!(footer_of(&pages.pages[0]), None);
    assert!(pages.pages[0].has_text("Pagina 1 van 1"));
}

// ─── Errors and Degradation ─────────────────────────────────────

#[test]
fn test_unknown_language_is_configuration_error() {
    assert!(matches!(
        Invoice::new(PageSize::A4, "€", "xx"),
        Err(InvoiceError::UnknownLanguage(_))
    ));
}

#[test]
fn test_missing_logo_degrades_to_no_logo() {
    let mut with_missing = base_invoice();
    with_missing.set_logo("/no/such/logo.png", None);
    assert!(!with_missing.has_logo());

    let plain = base_invoice();
    assert_eq!(with_missing.layout().unwrap(), plain.layout().unwrap());
}

#[test]
fn test_logo_from_file_is_embedded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logo.png");
    image::RgbaImage::from_pixel(460, 260, image::Rgba([0, 127, 255, 255]))
        .save(&path)
        .unwrap();

    let mut invoice = base_invoice();
    invoice.set_logo(path.to_str().unwrap(), None);
    assert!(invoice.has_logo());

    let pages = invoice.layout().unwrap();
    let image = pages.pages[0].commands.iter().find_map(|c| match c {
        DrawCommand::Image { x, y, width, height, .. } => Some((*x, *y, *width, *height)),
        _ => None,
    });
    // 460x260 px into 230x130 px -> 60.85 x 34.4 mm, rounded
    assert_eq!(image, Some((20.0, 20.0, 61.0, 34.0)));

    let bytes = invoice.render().unwrap();
    assert_valid_pdf(&bytes);
    assert!(bytes.windows(7).any(|w| w == b"/Im0 Do"));
}

// ─── PDF Output ─────────────────────────────────────────────────

#[test]
fn test_render_is_idempotent() {
    let mut invoice = base_invoice();
    invoice.add_item(LineItem::new("Design", 1, 21, 500.0, 500.0).description("Two rounds<br>of review"));
    invoice.add_total("Total", 500.0, true);
    invoice.set_badge("due");
    invoice.add_title("Notes");
    invoice.add_paragraph("Thank you for your business.");

    let a = invoice.render().unwrap();
    let b = invoice.render().unwrap();
    assert_valid_pdf(&a);
    assert_eq!(a, b);
}

#[test]
fn test_render_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invoice.pdf");
    let mut invoice = base_invoice();
    invoice.add_item(LineItem::new("Item", 1, 21, 10.0, 10.0));
    invoice.render_to_file(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_valid_pdf(&bytes);
    assert!(String::from_utf8_lossy(&bytes).contains("/Title (Invoice INV-0042)"));
}

#[test]
fn test_render_json_example() {
    let bytes = invoicr::render_json(invoicr::EXAMPLE_JSON).unwrap();
    assert_valid_pdf(&bytes);
}

#[test]
fn test_render_json_reports_parse_errors() {
    let err = invoicr::render_json("{ \"items\": [ }").unwrap_err();
    assert!(err.to_string().contains("Failed to parse invoice"));
}

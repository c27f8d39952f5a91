//! # Canvas
//!
//! A recording drawing surface with a mutable cursor, modelled on the
//! cell-based API of classic PDF generators: `cell` draws a box of fixed
//! size at the cursor and moves the cursor, `multi_cell` wraps text into
//! stacked cells, `ln` moves down and back to the left margin.
//!
//! Nothing is rasterized or serialized here. Every primitive appends a
//! [`DrawCommand`] (in millimetres, origin top-left) to the current page and
//! the finished [`PageSet`] is plain data that the PDF writer consumes and
//! tests can inspect.
//!
//! ## Page count placeholder
//!
//! Text containing [`PAGE_COUNT_ALIAS`] cannot be final until the last page
//! exists. Such draws are recorded in a placeholder list, and
//! [`Canvas::finish`] substitutes the real count in a second phase,
//! re-aligning right-anchored and centered text to its new width.

use crate::image_loader::LoadedImage;
use crate::style::{Color, TextAlign, TextStyle};
use crate::text::{TextLayout, CELL_PADDING, PT_PER_MM};

/// Token replaced by the total page count in [`Canvas::finish`].
pub const PAGE_COUNT_ALIAS: &str = "{nb}";

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
}

impl Margins {
    pub fn uniform(v: f64) -> Self {
        Self {
            left: v,
            top: v,
            right: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(20.0)
    }
}

/// Where the cursor goes after a cell is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellMove {
    /// To the right edge of the cell, same line.
    #[default]
    Right,
    /// To the left margin of the next line.
    NextLine,
    /// Directly below the cell, same x.
    Below,
}

/// Geometry and content of one `cell` call.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    /// Width in mm. Zero extends the cell to the right margin.
    pub width: f64,
    pub height: f64,
    pub text: &'a str,
    pub align: TextAlign,
    pub fill: Option<Color>,
    pub then: CellMove,
}

impl<'a> Cell<'a> {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            text: "",
            align: TextAlign::Left,
            fill: None,
            then: CellMove::Right,
        }
    }

    pub fn text(mut self, text: &'a str) -> Self {
        self.text = text;
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    /// Fill only when `color` is `Some`.
    pub fn fill_opt(mut self, color: Option<Color>) -> Self {
        self.fill = color;
        self
    }

    pub fn then(mut self, then: CellMove) -> Self {
        self.then = then;
        self
    }
}

/// Index into [`PageSet::images`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageId(pub usize);

/// A single recorded primitive. Coordinates are millimetres from the top-left
/// corner of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// A single run of text; `y` is the baseline.
    Text {
        x: f64,
        y: f64,
        text: String,
        style: TextStyle,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        /// Outline color and line width.
        stroke: Option<(Color, f64)>,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: Color,
        width: f64,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image: ImageId,
    },
    /// Rotate everything that follows counterclockwise by `angle` degrees
    /// around (`cx`, `cy`) until the next [`DrawCommand::ResetRotation`].
    Rotate { angle: f64, cx: f64, cy: f64 },
    ResetRotation,
}

/// One finished page.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasPage {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
}

impl CanvasPage {
    /// All text runs on the page, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Whether any text run on the page equals `needle`.
    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t == needle)
    }
}

/// The output of a finished canvas: pages plus the images they reference.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSet {
    pub pages: Vec<CanvasPage>,
    pub images: Vec<LoadedImage>,
}

/// A saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorSnapshot {
    /// Zero-based page index the snapshot was taken on.
    pub page: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy)]
struct Placeholder {
    page: usize,
    command: usize,
    align: TextAlign,
    box_x: f64,
    box_width: f64,
}

/// The recording surface.
#[derive(Debug)]
pub struct Canvas {
    width: f64,
    height: f64,
    margins: Margins,
    pages: Vec<CanvasPage>,
    images: Vec<LoadedImage>,
    placeholders: Vec<Placeholder>,
    x: f64,
    y: f64,
    last_height: f64,
    text: TextLayout,
}

impl Canvas {
    /// A canvas with no pages. Call [`Canvas::new_page`] before drawing.
    pub fn new(width: f64, height: f64, margins: Margins) -> Self {
        Self {
            width,
            height,
            margins,
            pages: Vec::new(),
            images: Vec::new(),
            placeholders: Vec::new(),
            x: margins.left,
            y: margins.top,
            last_height: 0.0,
            text: TextLayout::new(),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    /// Width between the left and right margins.
    pub fn content_width(&self) -> f64 {
        self.width - self.margins.horizontal()
    }

    pub fn text_layout(&self) -> &TextLayout {
        &self.text
    }

    // ── Pages ───────────────────────────────────────────────────

    /// Start a new page and put the cursor at the top-left margin corner.
    pub fn new_page(&mut self) {
        self.pages.push(CanvasPage {
            width: self.width,
            height: self.height,
            commands: Vec::new(),
        });
        self.x = self.margins.left;
        self.y = self.margins.top;
    }

    /// One-based number of the page being drawn.
    pub fn page_number(&self) -> usize {
        self.pages.len()
    }

    /// Register an image; draw it with [`Canvas::image`].
    pub fn add_image(&mut self, image: LoadedImage) -> ImageId {
        self.images.push(image);
        ImageId(self.images.len() - 1)
    }

    /// Resolve page count placeholders and hand out the pages.
    pub fn finish(mut self) -> PageSet {
        let total = self.pages.len().to_string();
        for ph in std::mem::take(&mut self.placeholders) {
            let Some(DrawCommand::Text { x, text, style, .. }) = self
                .pages
                .get_mut(ph.page)
                .and_then(|p| p.commands.get_mut(ph.command))
            else {
                continue;
            };
            *text = text.replace(PAGE_COUNT_ALIAS, &total);
            let sw = self.text.string_width(text, style);
            *x = aligned_x(ph.align, ph.box_x, ph.box_width, sw);
        }
        PageSet {
            pages: self.pages,
            images: self.images,
        }
    }

    // ── Cursor ──────────────────────────────────────────────────

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    /// Move to `y` and back to the left margin.
    pub fn set_y(&mut self, y: f64) {
        self.x = self.margins.left;
        self.y = y;
    }

    pub fn set_xy(&mut self, x: f64, y: f64) {
        self.set_y(y);
        self.set_x(x);
    }

    /// Line break: back to the left margin, down by `h` or by the height of
    /// the last cell when `None`.
    pub fn ln(&mut self, h: Option<f64>) {
        self.x = self.margins.left;
        self.y += h.unwrap_or(self.last_height);
    }

    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            page: self.pages.len().saturating_sub(1),
            x: self.x,
            y: self.y,
        }
    }

    /// Put the cursor back where `snap` was taken. The page is not changed.
    pub fn restore(&mut self, snap: CursorSnapshot) {
        self.x = snap.x;
        self.y = snap.y;
    }

    // ── Primitives ──────────────────────────────────────────────

    fn push(&mut self, cmd: DrawCommand) -> Option<usize> {
        let page = self.pages.last_mut()?;
        page.commands.push(cmd);
        Some(page.commands.len() - 1)
    }

    /// Draw a single-line cell at the cursor.
    pub fn cell(&mut self, cell: Cell<'_>, style: &TextStyle) {
        let width = if cell.width == 0.0 {
            self.width - self.margins.right - self.x
        } else {
            cell.width
        };

        if let Some(fill) = cell.fill {
            self.push(DrawCommand::Rect {
                x: self.x,
                y: self.y,
                width,
                height: cell.height,
                fill: Some(fill),
                stroke: None,
            });
        }

        if !cell.text.is_empty() {
            let sw = self.text.string_width(cell.text, style);
            let tx = aligned_x(cell.align, self.x, width, sw);
            let baseline = self.y + 0.5 * cell.height + 0.3 * style.size / PT_PER_MM;
            let idx = self.push(DrawCommand::Text {
                x: tx,
                y: baseline,
                text: cell.text.to_string(),
                style: *style,
            });
            if let Some(command) = idx.filter(|_| cell.text.contains(PAGE_COUNT_ALIAS)) {
                self.placeholders.push(Placeholder {
                    page: self.pages.len() - 1,
                    command,
                    align: cell.align,
                    box_x: self.x,
                    box_width: width,
                });
            }
        }

        self.last_height = cell.height;
        match cell.then {
            CellMove::Right => self.x += width,
            CellMove::NextLine => {
                self.x = self.margins.left;
                self.y += cell.height;
            }
            CellMove::Below => self.y += cell.height,
        }
    }

    /// Wrap `text` into a column `width` wide (zero extends to the right
    /// margin), one cell of `line_height` per line. Leaves the cursor below
    /// the last line at the left margin and returns the height used.
    pub fn multi_cell(
        &mut self,
        width: f64,
        line_height: f64,
        text: &str,
        style: &TextStyle,
        fill: Option<Color>,
    ) -> f64 {
        let width = if width == 0.0 {
            self.width - self.margins.right - self.x
        } else {
            width
        };
        let top = self.y;
        for line in self.text.wrap_cell(text, width, style) {
            self.cell(
                Cell::new(width, line_height)
                    .text(&line.text)
                    .fill_opt(fill)
                    .then(CellMove::Below),
                style,
            );
        }
        self.x = self.margins.left;
        self.y - top
    }

    /// Inline text at the cursor; advances x by the text width.
    pub fn write(&mut self, h: f64, text: &str, style: &TextStyle) {
        let sw = self.text.string_width(text, style);
        self.cell(Cell::new(sw, h).text(text), style);
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color, width: f64) {
        self.push(DrawCommand::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            width,
        });
    }

    /// Outlined rectangle.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, stroke: Color, line_width: f64) {
        self.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
            fill: None,
            stroke: Some((stroke, line_width)),
        });
    }

    pub fn image(&mut self, image: ImageId, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::Image {
            x,
            y,
            width,
            height,
            image,
        });
    }

    pub fn rotate(&mut self, angle: f64, cx: f64, cy: f64) {
        self.push(DrawCommand::Rotate { angle, cx, cy });
    }

    pub fn reset_rotation(&mut self) {
        self.push(DrawCommand::ResetRotation);
    }
}

fn aligned_x(align: TextAlign, box_x: f64, box_width: f64, text_width: f64) -> f64 {
    match align {
        TextAlign::Left => box_x + CELL_PADDING,
        TextAlign::Right => box_x + box_width - CELL_PADDING - text_width,
        TextAlign::Center => box_x + (box_width - text_width) / 2.0,
    }
}

//! # Text Layout
//!
//! Line breaking and text measurement for fixed-width cells.
//!
//! Everything that wraps text goes through [`TextLayout::wrap_cell`]: the
//! canvas when it commits a wrapped cell, and [`measure_wrapped_height`] when
//! the row paginator needs a height *before* committing. Sharing one routine
//! is what makes the estimate and the real draw agree to the last line.

use crate::font::FontContext;
use crate::style::TextStyle;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Points per millimetre. Layout works in millimetres, fonts in points.
pub const PT_PER_MM: f64 = 72.0 / 25.4;

/// Horizontal inset between a cell edge and its text, in millimetres.
pub const CELL_PADDING: f64 = 1.0;

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    /// Width in millimetres, trailing spaces excluded.
    pub width: f64,
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Returns a vec of length `text.chars().count()`. Each entry is the break
/// opportunity *before* that character position. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    let byte_to_char: Vec<usize> = {
        let mut map = vec![0usize; text.len() + 1];
        let mut char_idx = 0;
        for (byte_idx, _) in text.char_indices() {
            map[byte_idx] = char_idx;
            char_idx += 1;
        }
        map[text.len()] = char_idx;
        map
    };

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        // byte_offset == text.len() means "break at end", nothing to record
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayout {
    fonts: FontContext,
}

impl TextLayout {
    pub fn new() -> Self {
        Self {
            fonts: FontContext::new(),
        }
    }

    /// Width of a string in millimetres.
    pub fn string_width(&self, text: &str, style: &TextStyle) -> f64 {
        self.fonts.measure_string(text, style) / PT_PER_MM
    }

    fn char_width(&self, ch: char, style: &TextStyle) -> f64 {
        self.fonts.char_width(ch, style) / PT_PER_MM
    }

    /// Break the contents of a cell `cell_width` wide into lines.
    ///
    /// The usable width is the cell width minus [`CELL_PADDING`] on each side.
    pub fn wrap_cell(&self, text: &str, cell_width: f64, style: &TextStyle) -> Vec<BrokenLine> {
        self.break_into_lines(text, cell_width - 2.0 * CELL_PADDING, style)
    }

    /// Break a string into lines that fit within `max_width` millimetres.
    ///
    /// Greedy: each line takes as many characters as fit, ending at the last
    /// UAX#14 opportunity. Mandatory breaks (`\n`) always end a line; a single
    /// trailing newline does not produce an extra empty line. A word wider
    /// than the whole line is split at the character that overflows.
    pub fn break_into_lines(&self, text: &str, max_width: f64, style: &TextStyle) -> Vec<BrokenLine> {
        if text.is_empty() {
            return vec![BrokenLine {
                text: String::new(),
                width: 0.0,
            }];
        }

        let chars: Vec<char> = text.chars().collect();
        let char_widths: Vec<f64> = chars
            .iter()
            .map(|&c| if is_newline(c) { 0.0 } else { self.char_width(c, style) })
            .collect();
        let break_opps = compute_break_opportunities(text);

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut line_width = 0.0;
        let mut last_break_point: Option<usize> = None;

        for (i, &ch) in chars.iter().enumerate() {
            let char_width = char_widths[i];

            if i > 0 {
                match break_opps[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        lines.push(self.make_line(&chars[line_start..i], &char_widths[line_start..i]));
                        line_start = i;
                        line_width = 0.0;
                        last_break_point = None;
                    }
                    Some(BreakOpportunity::Allowed) => {
                        // the char BEFORE this position ends the candidate line
                        last_break_point = Some(i - 1);
                    }
                    None => {}
                }
            }

            if is_newline(ch) {
                continue;
            }

            if line_width + char_width > max_width && line_start < i {
                if let Some(bp) = last_break_point.filter(|&bp| bp >= line_start) {
                    let break_at = bp + 1;
                    lines.push(self.make_line(
                        &chars[line_start..break_at],
                        &char_widths[line_start..break_at],
                    ));
                    line_start = break_at;
                    line_width = char_widths[line_start..=i].iter().sum();
                    last_break_point = None;
                    continue;
                }

                // No break point on this line: force a split here
                lines.push(self.make_line(&chars[line_start..i], &char_widths[line_start..i]));
                line_start = i;
                line_width = char_width;
                last_break_point = None;
                continue;
            }

            line_width += char_width;
        }

        // The break at end-of-text is never reported, so "abc\n" ends here
        // with "abc" rather than pushing an extra empty line.
        lines.push(self.make_line(&chars[line_start..], &char_widths[line_start..]));

        lines
    }

    /// Create a BrokenLine from characters and their widths, dropping line
    /// terminators and excluding trailing spaces from the width.
    fn make_line(&self, chars: &[char], widths: &[f64]) -> BrokenLine {
        let mut text = String::with_capacity(chars.len());
        let mut kept: Vec<(char, f64)> = Vec::with_capacity(chars.len());
        for (&c, &w) in chars.iter().zip(widths) {
            if !is_newline(c) {
                text.push(c);
                kept.push((c, w));
            }
        }

        let mut width: f64 = kept.iter().map(|(_, w)| w).sum();
        for (c, w) in kept.iter().rev() {
            if *c != ' ' {
                break;
            }
            width -= w;
        }

        BrokenLine { text, width }
    }
}

/// Text Metrics Service: the height `text` occupies when wrapped into a cell
/// `column_width` wide with `line_height` per line.
///
/// Empty text still takes one line. Stateless: nothing is drawn anywhere.
pub fn measure_wrapped_height(text: &str, column_width: f64, style: &TextStyle, line_height: f64) -> f64 {
    let lines = TextLayout::new().wrap_cell(text, column_width, style);
    lines.len() as f64 * line_height
}

/// Turn `<br>`, `<br/>`, `<br />` (any case) into newlines and normalise
/// `\r\n` / `\r` line endings to `\n`.
pub fn br_to_newline(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match match_br_tag(tail) {
            Some(len) => {
                out.push('\n');
                rest = &tail[len..];
            }
            None => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    out.replace("\r\n", "\n").replace('\r', "\n")
}

/// Length in bytes of a `<br\s*/?>` tag at the start of `s`, if any.
fn match_br_tag(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.len() < 4 || !bytes[1].eq_ignore_ascii_case(&b'b') || !bytes[2].eq_ignore_ascii_case(&b'r') {
        return None;
    }
    let mut i = 3;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'/' {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'>' {
        Some(i + 1)
    } else {
        None
    }
}

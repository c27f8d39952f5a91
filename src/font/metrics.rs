//! Advance widths for the standard PDF fonts.
//!
//! Values are in 1/1000 em, taken from the Adobe AFM files for the printable
//! ASCII range (0x20..=0x7E). Latin-1 letters borrow the width of their base
//! letter; anything else uses the family's typical lowercase advance.

/// Width table for one base-14 face.
#[derive(Debug, Clone, Copy)]
pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    default_width: u16,
}

impl StandardFontMetrics {
    pub(crate) const fn new(widths: &'static [u16; 95], default_width: u16) -> Self {
        Self {
            widths,
            default_width,
        }
    }

    /// Advance of one character in 1/1000 em.
    pub fn char_units(&self, ch: char) -> u16 {
        let ch = latin1_base(ch).unwrap_or(ch);
        let code = ch as u32;
        if (0x20..=0x7E).contains(&code) {
            self.widths[(code - 0x20) as usize]
        } else {
            self.default_width
        }
    }

    /// Advance of one character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.char_units(ch) as f64 * font_size / 1000.0
    }

    /// Width of a string in points.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        let units: u32 = text.chars().map(|c| self.char_units(c) as u32).sum();
        units as f64 * font_size / 1000.0
    }
}

/// Map accented Latin-1 letters onto the unaccented letter with the same
/// advance in the base-14 AFMs.
fn latin1_base(ch: char) -> Option<char> {
    let base = match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        '\u{A0}' => ' ',
        _ => return None,
    };
    Some(base)
}

#[rustfmt::skip]
pub(crate) static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
pub(crate) static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

#[rustfmt::skip]
pub(crate) static TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

#[rustfmt::skip]
pub(crate) static TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 930,
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
    722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
    333, 278, 333, 581, 500, 333,
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
    556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
    394, 220, 394, 520,
];

pub(crate) static COURIER: [u16; 95] = [600; 95];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_space_is_278() {
        let m = StandardFontMetrics::new(&HELVETICA, 556);
        assert_eq!(m.char_units(' '), 278);
        assert!((m.char_width(' ', 12.0) - 3.336).abs() < 1e-9);
    }

    #[test]
    fn accented_letters_use_base_width() {
        let m = StandardFontMetrics::new(&HELVETICA, 556);
        assert_eq!(m.char_units('é'), m.char_units('e'));
        assert_eq!(m.char_units('Ü'), m.char_units('U'));
    }

    #[test]
    fn unknown_chars_use_default() {
        let m = StandardFontMetrics::new(&TIMES_ROMAN, 500);
        assert_eq!(m.char_units('€'), 500);
    }

    #[test]
    fn courier_is_monospaced() {
        let m = StandardFontMetrics::new(&COURIER, 600);
        assert_eq!(m.measure_string("iiii", 10.0), m.measure_string("WWWW", 10.0));
    }
}

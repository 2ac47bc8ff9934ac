//! Advance widths for the standard families, in 1/1000 em units.
//!
//! These are the classic core-font metrics. They cover printable ASCII;
//! anything outside the table falls back to a per-family default width,
//! which keeps estimates monotone without shipping full Unicode tables.

/// Families every host can render without registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFamily {
    Helvetica,
    Times,
    Courier,
}

impl StandardFamily {
    /// Map a CSS-ish family name onto a metric table. Unknown names fall
    /// back to Helvetica, the default editor font.
    pub fn from_name(name: &str) -> StandardFamily {
        let lower = name
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .to_ascii_lowercase();
        match lower.as_str() {
            "times" | "times new roman" | "georgia" | "garamond" | "serif" => {
                StandardFamily::Times
            }
            "courier" | "courier new" | "consolas" | "monospace" => StandardFamily::Courier,
            _ => StandardFamily::Helvetica,
        }
    }

    /// Advance width of `ch` in 1/1000 em.
    pub fn advance(self, ch: char, bold: bool) -> u16 {
        let code = ch as u32;
        if !(0x20..=0x7E).contains(&code) {
            return self.default_advance();
        }
        let idx = (code - 0x20) as usize;
        match (self, bold) {
            (StandardFamily::Helvetica, false) => HELVETICA[idx],
            (StandardFamily::Helvetica, true) => HELVETICA_BOLD[idx],
            (StandardFamily::Times, false) => TIMES[idx],
            (StandardFamily::Times, true) => TIMES_BOLD[idx],
            (StandardFamily::Courier, _) => 600,
        }
    }

    /// Width assumed for characters outside the tables.
    pub fn default_advance(self) -> u16 {
        match self {
            StandardFamily::Helvetica => 556,
            StandardFamily::Times => 500,
            StandardFamily::Courier => 600,
        }
    }
}

/// Helvetica, chars 0x20..=0x7E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold, chars 0x20..=0x7E.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, //
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, //
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, //
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Times-Roman, chars 0x20..=0x7E.
const TIMES: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, //
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, //
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, //
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500, //
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, //
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

/// Times-Bold, chars 0x20..=0x7E.
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278, //
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500, //
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778, //
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500, //
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500, //
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_widths_match_the_core_metrics() {
        assert_eq!(StandardFamily::Helvetica.advance(' ', false), 278);
        assert_eq!(StandardFamily::Times.advance(' ', false), 250);
        assert_eq!(StandardFamily::Courier.advance(' ', false), 600);
    }

    #[test]
    fn bold_is_wider_for_typical_lowercase() {
        assert!(
            StandardFamily::Helvetica.advance('n', true)
                > StandardFamily::Helvetica.advance('n', false)
        );
    }

    #[test]
    fn courier_is_fixed_pitch() {
        for ch in ['i', 'm', 'W', '.'] {
            assert_eq!(StandardFamily::Courier.advance(ch, false), 600);
            assert_eq!(StandardFamily::Courier.advance(ch, true), 600);
        }
    }

    #[test]
    fn unknown_family_falls_back_to_helvetica() {
        assert_eq!(StandardFamily::from_name("Comic Sans MS"), StandardFamily::Helvetica);
        assert_eq!(StandardFamily::from_name("'Times New Roman'"), StandardFamily::Times);
    }

    #[test]
    fn non_ascii_uses_the_family_default() {
        assert_eq!(
            StandardFamily::Times.advance('é', false),
            StandardFamily::Times.default_advance()
        );
    }
}

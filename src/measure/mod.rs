//! # Height Estimation
//!
//! The stand-in for the browser's box measurement. [`Measure`] turns a
//! block into an estimated pixel height at a given content width; the
//! balancer is written against the trait so tests can inject exact
//! heights. [`TextMeasurer`] is the production implementation: greedy
//! UAX#14 line estimation over real font metrics, with hyphenation of
//! words too wide for a line.
//!
//! Estimates only have to be *monotone and close* — a sheet whose
//! estimate is slightly off produces a visually early or late break that
//! self-corrects on the next edit, never a wrong document.

pub mod metrics;

pub use metrics::StandardFamily;

use std::cell::RefCell;
use std::collections::HashMap;

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::error::QuireError;
use crate::model::{Block, BlockKind, Run};

/// Estimated pixel height of a block at a content width.
pub trait Measure {
    fn block_height(&self, block: &Block, content_width: f64) -> f64;
}

// ─────────────────────────── Fonts ───────────────────────────

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FaceKey {
    family: String,
    bold: bool,
    italic: bool,
}

/// Advance widths parsed out of a registered TrueType face.
#[derive(Debug, Clone)]
pub struct FaceMetrics {
    units_per_em: u16,
    advances: HashMap<char, u16>,
    default_advance: u16,
}

impl FaceMetrics {
    /// Parse the metrics the estimator needs from raw font data. Samples
    /// the Latin ranges; anything outside falls back to the default
    /// advance, which keeps estimates monotone.
    pub fn parse(data: &[u8]) -> Result<FaceMetrics, QuireError> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| QuireError::Font(format!("could not parse font: {e}")))?;
        let units_per_em = face.units_per_em();

        let mut advances = HashMap::new();
        let mut default_advance = 0u16;
        for code in 0x20u32..=0x24F {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph).unwrap_or(0);
                    advances.insert(ch, advance);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }
        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Ok(FaceMetrics { units_per_em, advances, default_advance })
    }

    /// Advance width of `ch` in pixels at `size`.
    pub fn char_width(&self, ch: char, size: f64) -> f64 {
        let units = self.advances.get(&ch).copied().unwrap_or(self.default_advance);
        units as f64 / self.units_per_em as f64 * size
    }
}

/// Registry of faces available for width estimation. The standard
/// families are always present via the embedded metric tables; custom
/// faces are registered from font data.
#[derive(Debug, Clone, Default)]
pub struct FontLibrary {
    custom: HashMap<FaceKey, FaceMetrics>,
}

impl FontLibrary {
    pub fn new() -> FontLibrary {
        FontLibrary::default()
    }

    /// Register a custom face for a family/weight/slant combination.
    pub fn register(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        data: &[u8],
    ) -> Result<(), QuireError> {
        let metrics = FaceMetrics::parse(data)?;
        let key = FaceKey { family: family.to_ascii_lowercase(), bold, italic };
        self.custom.insert(key, metrics);
        Ok(())
    }

    /// Advance width of `ch` in pixels. Unregistered families resolve to
    /// the embedded standard metrics; italic widths reuse the roman
    /// tables, which is close enough for estimation.
    pub fn char_width(
        &self,
        ch: char,
        family: Option<&str>,
        bold: bool,
        italic: bool,
        size: f64,
    ) -> f64 {
        if let Some(name) = family {
            let key = FaceKey { family: name.to_ascii_lowercase(), bold, italic };
            if let Some(face) = self.custom.get(&key) {
                return face.char_width(ch, size);
            }
            // A registered upright face still beats the standard tables.
            let roman = FaceKey { family: name.to_ascii_lowercase(), bold, italic: false };
            if let Some(face) = self.custom.get(&roman) {
                return face.char_width(ch, size);
            }
        }
        let std = StandardFamily::from_name(family.unwrap_or("Helvetica"));
        std.advance(ch, bold) as f64 / 1000.0 * size
    }
}

// ─────────────────────────── Line estimation ───────────────────────────

/// UAX#14 break opportunities indexed by char position: entry `i` is the
/// opportunity *before* `chars[i]`. Index 0 is always `None`.
fn break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields byte offsets of the char after each break.
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
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

// ─────────────────────────── TextMeasurer ───────────────────────────

/// Production height estimator.
///
/// Paragraphs and list items are estimated by greedy line filling over
/// per-run font metrics; tables as padded cell lines plus borders; images
/// by scaling intrinsic or explicit dimensions to the content width.
pub struct TextMeasurer {
    fonts: FontLibrary,
    /// Font size assumed for runs that do not set one, in pixels.
    pub base_font_size: f64,
    /// Line height as a multiple of font size.
    pub line_height: f64,
    /// Vertical gap after every block.
    pub block_gap: f64,
    /// Marker indent for list items.
    pub list_indent: f64,
    /// Padding inside a table cell, per side.
    pub cell_padding: f64,
    // Image probing touches the filesystem; cache per source string.
    image_dims: RefCell<HashMap<String, Option<(f64, f64)>>>,
}

impl Default for TextMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasurer {
    pub fn new() -> TextMeasurer {
        TextMeasurer {
            fonts: FontLibrary::new(),
            base_font_size: 16.0,
            line_height: 1.5,
            block_gap: 12.0,
            list_indent: 40.0,
            cell_padding: 8.0,
            image_dims: RefCell::new(HashMap::new()),
        }
    }

    pub fn fonts_mut(&mut self) -> &mut FontLibrary {
        &mut self.fonts
    }

    fn line_px(&self, runs: &[Run]) -> f64 {
        let size = runs
            .iter()
            .filter_map(|r| r.marks.font_size)
            .fold(self.base_font_size, f64::max);
        size * self.line_height
    }

    /// Count the lines `runs` occupy at `max_width` with greedy filling.
    /// Words wider than the remaining line try a syllable split first and
    /// force-break only when hyphenation finds nothing that fits.
    fn count_lines(&self, runs: &[Run], max_width: f64) -> usize {
        let mut chars: Vec<char> = Vec::new();
        let mut widths: Vec<f64> = Vec::new();
        for run in runs {
            let size = run.marks.font_size.unwrap_or(self.base_font_size);
            let family = run.marks.font_family.as_deref();
            for ch in run.text.chars() {
                chars.push(ch);
                widths.push(self.fonts.char_width(ch, family, run.marks.bold, run.marks.italic, size));
            }
        }
        if chars.is_empty() {
            return 1;
        }

        let text: String = chars.iter().collect();
        let opps = break_opportunities(&text);
        let hyphen_width =
            self.fonts.char_width('-', None, false, false, self.base_font_size);

        let mut lines = 0usize;
        let mut line_start = 0usize;
        let mut line_width = 0.0f64;
        let mut last_break: Option<usize> = None;

        for i in 0..chars.len() {
            if i > 0 {
                match opps[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        lines += 1;
                        line_start = i;
                        line_width = 0.0;
                        last_break = None;
                    }
                    Some(BreakOpportunity::Allowed) => {
                        last_break = Some(i);
                    }
                    None => {}
                }
            }

            let ch = chars[i];
            if ch == '\n' || ch == '\r' || ch == '\u{2028}' || ch == '\u{2029}' {
                continue;
            }

            let w = widths[i];
            if line_width + w > max_width && line_start < i {
                if let Some(bp) = last_break {
                    if bp > line_start {
                        lines += 1;
                        line_start = bp;
                        line_width = widths[bp..=i].iter().sum();
                        last_break = None;
                        continue;
                    }
                }

                if let Some(split) =
                    self.hyphen_split(&chars, &widths, line_start, i, max_width, hyphen_width)
                {
                    lines += 1;
                    line_start = split;
                    line_width = widths[split..=i].iter().sum();
                    last_break = None;
                    continue;
                }

                // No break opportunity at all on this line.
                lines += 1;
                line_start = i;
                line_width = w;
                last_break = None;
                continue;
            }

            line_width += w;
        }

        if line_start < chars.len() {
            lines += 1;
        }
        lines.max(1)
    }

    /// Find the rightmost syllable boundary of the word overflowing at
    /// `overflow_at` that still fits with a trailing hyphen. Returns the
    /// char index the next line would start at.
    fn hyphen_split(
        &self,
        chars: &[char],
        widths: &[f64],
        line_start: usize,
        overflow_at: usize,
        max_width: f64,
        hyphen_width: f64,
    ) -> Option<usize> {
        if !chars[overflow_at].is_alphabetic() {
            return None;
        }
        let mut word_start = overflow_at;
        while word_start > line_start && chars[word_start - 1].is_alphabetic() {
            word_start -= 1;
        }

        let word: String = chars[word_start..=overflow_at].iter().collect();
        let word_len = word.chars().count();
        if word_len < 4 {
            return None;
        }

        let mut best = None;
        let mut cum = 0usize;
        for syllable in hypher::hyphenate(&word, hypher::Lang::English) {
            cum += syllable.chars().count();
            if cum >= word_len {
                break;
            }
            let used: f64 = widths[line_start..word_start + cum].iter().sum();
            if used + hyphen_width <= max_width {
                best = Some(word_start + cum);
            } else {
                break;
            }
        }
        best.filter(|&s| s > line_start)
    }

    fn paragraph_height(&self, runs: &[Run], width: f64) -> f64 {
        self.count_lines(runs, width) as f64 * self.line_px(runs)
    }

    fn table_height(&self, table: &crate::model::TableBlock, width: f64) -> f64 {
        let cols = table.column_count() as f64;
        let inner = ((width - table.border_width * (cols + 1.0)) / cols
            - 2.0 * self.cell_padding)
            .max(10.0);
        let line = self.base_font_size * self.line_height;

        let row_height = |cells: &[String], bold: bool| -> f64 {
            let mut max_lines = 1usize;
            for text in cells {
                let run = if bold {
                    Run::styled(text.clone(), crate::model::Marks::bold())
                } else {
                    Run::plain(text.clone())
                };
                max_lines = max_lines.max(self.count_lines(&[run], inner));
            }
            max_lines as f64 * line + 2.0 * self.cell_padding + table.border_width
        };

        let mut total = table.border_width;
        total += row_height(&table.header, true);
        for row in &table.rows {
            total += row_height(row, false);
        }
        total
    }

    fn image_height(
        &self,
        src: &str,
        width: Option<f64>,
        height: Option<f64>,
        content_width: f64,
    ) -> f64 {
        if let (Some(w), Some(h)) = (width, height) {
            return if w <= content_width { h } else { h * content_width / w };
        }
        // Remote sources cannot be probed; the rasterizer loads those.
        // Unknown dimensions estimate as a 3:2 box.
        let (iw, ih) = self.probe_cached(src).unwrap_or((300.0, 200.0));
        let display_w = width.unwrap_or(iw).min(content_width);
        height.unwrap_or(display_w * ih / iw)
    }

    fn probe_cached(&self, src: &str) -> Option<(f64, f64)> {
        if crate::image_probe::is_remote(src) {
            return None;
        }
        if let Some(cached) = self.image_dims.borrow().get(src) {
            return *cached;
        }
        let dims = crate::image_probe::probe(src)
            .ok()
            .map(|(w, h)| (w as f64, h as f64));
        self.image_dims.borrow_mut().insert(src.to_string(), dims);
        dims
    }
}

impl Measure for TextMeasurer {
    fn block_height(&self, block: &Block, content_width: f64) -> f64 {
        let body = match &block.kind {
            BlockKind::Paragraph { runs, .. } => self.paragraph_height(runs, content_width),
            BlockKind::List { items, .. } => {
                let item_width = (content_width - self.list_indent).max(10.0);
                items
                    .iter()
                    .map(|runs| self.paragraph_height(runs, item_width))
                    .sum()
            }
            BlockKind::Table(table) => self.table_height(table, content_width),
            BlockKind::Image { src, width, height } => {
                self.image_height(src, *width, *height, content_width)
            }
            BlockKind::Divider => 20.0,
        };
        body + self.block_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Marks, TableBlock};

    fn measurer() -> TextMeasurer {
        TextMeasurer::new()
    }

    #[test]
    fn empty_paragraph_is_one_line() {
        let m = measurer();
        let h = m.paragraph_height(&[], 600.0);
        assert_eq!(h, m.base_font_size * m.line_height);
    }

    #[test]
    fn narrow_width_needs_more_lines() {
        let m = measurer();
        let runs = vec![Run::plain(
            "The quick brown fox jumps over the lazy dog, then does it again and again.",
        )];
        let wide = m.count_lines(&runs, 600.0);
        let narrow = m.count_lines(&runs, 150.0);
        assert!(narrow > wide, "narrow: {narrow}, wide: {wide}");
    }

    #[test]
    fn mandatory_break_adds_a_line() {
        let m = measurer();
        let one = m.count_lines(&[Run::plain("alpha beta")], 600.0);
        let two = m.count_lines(&[Run::plain("alpha\nbeta")], 600.0);
        assert_eq!(one, 1);
        assert_eq!(two, 2);
    }

    #[test]
    fn larger_font_makes_taller_paragraphs() {
        let m = measurer();
        let small = m.paragraph_height(&[Run::plain("hello world")], 600.0);
        let big = m.paragraph_height(
            &[Run::styled("hello world", Marks::default().with_size(32.0))],
            600.0,
        );
        assert!(big > small);
    }

    #[test]
    fn unbreakable_word_still_terminates() {
        let m = measurer();
        let runs = vec![Run::plain("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")];
        let lines = m.count_lines(&runs, 60.0);
        assert!(lines >= 2);
    }

    #[test]
    fn table_grows_with_rows() {
        let m = measurer();
        let two = TableBlock {
            border_width: 1.0,
            border_color: crate::model::Color::BLACK,
            header: vec!["A".into(), "B".into()],
            rows: vec![vec!["1".into(), "2".into()]],
        };
        let mut five = two.clone();
        five.rows = vec![vec!["1".into(), "2".into()]; 4];
        assert!(m.table_height(&five, 600.0) > m.table_height(&two, 600.0));
    }

    #[test]
    fn explicit_image_size_is_respected_and_clamped() {
        let m = measurer();
        assert_eq!(m.image_height("x.png", Some(100.0), Some(80.0), 600.0), 80.0);
        // Wider than the content region: scales down proportionally.
        assert_eq!(m.image_height("x.png", Some(1200.0), Some(600.0), 600.0), 300.0);
    }

    #[test]
    fn divider_height_includes_gap() {
        let m = measurer();
        let h = m.block_height(&Block::divider(), 600.0);
        assert_eq!(h, 20.0 + m.block_gap);
    }
}

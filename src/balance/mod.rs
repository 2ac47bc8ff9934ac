//! # Page Balancer
//!
//! Keeps every sheet's estimated content height within the sheet's fixed
//! content height by migrating whole blocks between adjacent sheets.
//! Overflow spills trailing blocks forward (cascading until no sheet
//! overflows); underflow pulls leading blocks back from the next sheet
//! and destroys the donor when it empties. Blocks move wholesale, in
//! order, by remove-then-insert — a block is never split and never lives
//! in two sheets at once.
//!
//! Balancing never fails: checks against out-of-range sheets are skipped,
//! and the worst outcome of a bad estimate is a visually early or late
//! break that the next edit's checks correct.

pub mod scheduler;

use crate::measure::Measure;
use crate::model::{Block, PagedDocument, Sheet};

/// Slack allowed before a sheet counts as overflowing. Estimates are
/// floating point; without a tolerance a sheet could flap between
/// overflow and underflow on rounding noise.
pub const HEIGHT_EPSILON: f64 = 0.5;

/// What a balancing pass did, for hosts and tests to observe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceReport {
    pub blocks_moved: usize,
    pub sheets_created: usize,
    pub sheets_removed: usize,
    /// Sheets a resolution touched, in visit order.
    pub sheets_visited: Vec<usize>,
}

impl BalanceReport {
    /// True when the pass changed the document at all.
    pub fn migrated(&self) -> bool {
        self.blocks_moved > 0 || self.sheets_created > 0 || self.sheets_removed > 0
    }

    pub fn merge(&mut self, other: BalanceReport) {
        self.blocks_moved += other.blocks_moved;
        self.sheets_created += other.sheets_created;
        self.sheets_removed += other.sheets_removed;
        self.sheets_visited.extend(other.sheets_visited);
    }
}

/// The balancing rules, written against a borrowed [`Measure`].
pub struct Balancer<'m, M: Measure + ?Sized> {
    measure: &'m M,
}

impl<'m, M: Measure + ?Sized> Balancer<'m, M> {
    pub fn new(measure: &'m M) -> Balancer<'m, M> {
        Balancer { measure }
    }

    /// Estimated height of the blocks currently on `sheet`.
    pub fn used_height(&self, doc: &PagedDocument, sheet: usize) -> f64 {
        let (cw, _) = doc.content_size();
        match doc.sheets.get(sheet) {
            Some(s) => s.blocks.iter().map(|b| self.measure.block_height(b, cw)).sum(),
            None => 0.0,
        }
    }

    pub fn is_overflowing(&self, doc: &PagedDocument, sheet: usize) -> bool {
        let (_, ch) = doc.content_size();
        self.used_height(doc, sheet) > ch + HEIGHT_EPSILON
    }

    /// Resolve overflow starting at `sheet`, cascading forward until no
    /// visited sheet overflows. Editing focus (`active`) follows the
    /// spilled content.
    ///
    /// The split point is the first block index at which the running
    /// height exceeds the content height, floored at 1: a single block
    /// taller than the sheet stays put and renders clipped, which is what
    /// bounds the cascade.
    pub fn resolve_overflow(
        &self,
        doc: &mut PagedDocument,
        sheet: usize,
        active: &mut usize,
    ) -> BalanceReport {
        let mut report = BalanceReport::default();
        let (cw, ch) = doc.content_size();
        let mut p = sheet;

        while p < doc.sheets.len() {
            let heights: Vec<f64> = doc.sheets[p]
                .blocks
                .iter()
                .map(|b| self.measure.block_height(b, cw))
                .collect();
            let total: f64 = heights.iter().sum();
            if total <= ch + HEIGHT_EPSILON {
                break;
            }

            let mut split = heights.len();
            let mut running = 0.0;
            for (i, h) in heights.iter().enumerate() {
                running += h;
                if running > ch + HEIGHT_EPSILON {
                    split = i;
                    break;
                }
            }
            let split = split.max(1);
            if split >= doc.sheets[p].blocks.len() {
                // One oversized block, nothing behind it to move.
                break;
            }

            if p + 1 == doc.sheets.len() {
                doc.sheets.push(Sheet::default());
                report.sheets_created += 1;
            }

            let moved: Vec<Block> = doc.sheets[p].blocks.drain(split..).collect();
            report.blocks_moved += moved.len();
            doc.sheets[p + 1].blocks.splice(0..0, moved);
            report.sheets_visited.push(p);

            *active = p + 1;
            p += 1;
        }

        report
    }

    /// Resolve underflow on `sheet`: pull leading blocks from the next
    /// sheet while they fit the spare room, destroying the donor if the
    /// pull empties it. The last sheet never underflows (there is nothing
    /// to pull from), and a donor removal remaps the active pointer —
    /// a pointer on the donor follows the content, a pointer past it
    /// shifts down by one.
    pub fn resolve_underflow(
        &self,
        doc: &mut PagedDocument,
        sheet: usize,
        active: &mut usize,
    ) -> BalanceReport {
        let mut report = BalanceReport::default();
        let p = sheet;
        if p + 1 >= doc.sheets.len() {
            return report;
        }

        let (cw, ch) = doc.content_size();
        let mut available = ch - self.used_height(doc, p);
        let mut moved_any = false;

        while let Some(front) = doc.sheets[p + 1].blocks.first() {
            let h = self.measure.block_height(front, cw);
            if h > available + HEIGHT_EPSILON {
                break;
            }
            let block = doc.sheets[p + 1].blocks.remove(0);
            doc.sheets[p].blocks.push(block);
            available -= h;
            report.blocks_moved += 1;
            moved_any = true;
        }

        if moved_any {
            report.sheets_visited.push(p);
            if doc.sheets[p + 1].is_empty() {
                doc.sheets.remove(p + 1);
                report.sheets_removed += 1;
                if *active == p + 1 {
                    *active = p;
                } else if *active > p + 1 {
                    *active -= 1;
                }
            }
        }

        report
    }

    /// Balance the whole document to a fixed point: spill every
    /// overflowing sheet forward, then pull back until no sheet has
    /// spare room its successor could fill. Used when pouring a draft
    /// into sheets; the editor path instead runs the scheduled checks.
    pub fn balance(&self, doc: &mut PagedDocument, active: &mut usize) -> BalanceReport {
        let mut report = BalanceReport::default();
        doc.normalize();

        let mut p = 0;
        while p < doc.sheets.len() {
            report.merge(self.resolve_overflow(doc, p, active));
            p += 1;
        }

        let mut p = 0;
        while p + 1 < doc.sheets.len() {
            let r = self.resolve_underflow(doc, p, active);
            let moved = r.blocks_moved > 0;
            report.merge(r);
            // A donor deletion exposes a new donor; stay until nothing
            // more fits.
            if !moved {
                p += 1;
            }
        }

        if *active >= doc.sheets.len() {
            *active = doc.sheets.len() - 1;
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SheetChrome, SheetFormat};

    /// Test measurer: a block's height is its paragraph text parsed as a
    /// number of pixels. `Block::text("300")` is 300 px tall.
    struct TaggedMeasure;

    impl Measure for TaggedMeasure {
        fn block_height(&self, block: &Block, _content_width: f64) -> f64 {
            block.plain_text().trim().parse().unwrap_or(10.0)
        }
    }

    fn doc_with(sheets: Vec<Vec<f64>>) -> PagedDocument {
        let mut doc = PagedDocument::new(SheetFormat::Custom { width: 700.0, height: 1000.0 }, SheetChrome::default());
        doc.sheets.clear();
        let mut next_id = 1u64;
        for heights in sheets {
            let mut sheet = Sheet::default();
            for h in heights {
                let mut block = Block::text(format!("{h}"));
                block.id = crate::model::BlockId(next_id);
                next_id += 1;
                sheet.blocks.push(block);
            }
            doc.sheets.push(sheet);
        }
        doc.normalize();
        doc
    }

    fn content_height(doc: &PagedDocument) -> f64 {
        doc.content_size().1
    }

    #[test]
    fn fitting_sheet_is_untouched() {
        let mut doc = doc_with(vec![vec![100.0, 100.0]]);
        assert!(content_height(&doc) > 200.0);
        let mut active = 0;
        let report = Balancer::new(&TaggedMeasure).resolve_overflow(&mut doc, 0, &mut active);
        assert!(!report.migrated());
        assert_eq!(doc.sheets.len(), 1);
        assert_eq!(active, 0);
    }

    #[test]
    fn overflow_spills_trailing_blocks_forward() {
        let ch = content_height(&doc_with(vec![vec![]]));
        // Three blocks fit, the fourth tips the sheet over.
        let h = ch / 3.5;
        let mut doc = doc_with(vec![vec![h, h, h, h, h]]);
        let mut active = 0;
        let report = Balancer::new(&TaggedMeasure).resolve_overflow(&mut doc, 0, &mut active);
        assert_eq!(doc.sheets.len(), 2);
        assert_eq!(doc.sheets[0].blocks.len(), 3);
        assert_eq!(doc.sheets[1].blocks.len(), 2);
        assert_eq!(report.sheets_created, 1);
        assert_eq!(report.blocks_moved, 2);
        assert_eq!(active, 1, "focus follows spilled content");
    }

    #[test]
    fn oversized_first_block_stays_clipped() {
        let ch = content_height(&doc_with(vec![vec![]]));
        let mut doc = doc_with(vec![vec![ch * 2.0]]);
        let mut active = 0;
        let report = Balancer::new(&TaggedMeasure).resolve_overflow(&mut doc, 0, &mut active);
        assert!(!report.migrated());
        assert_eq!(doc.sheets.len(), 1);
    }

    #[test]
    fn oversized_block_behind_content_still_spills() {
        let ch = content_height(&doc_with(vec![vec![]]));
        let mut doc = doc_with(vec![vec![100.0, ch * 2.0]]);
        let mut active = 0;
        Balancer::new(&TaggedMeasure).resolve_overflow(&mut doc, 0, &mut active);
        // The giant block moves to its own sheet and clips there.
        assert_eq!(doc.sheets.len(), 2);
        assert_eq!(doc.sheets[0].blocks.len(), 1);
        assert_eq!(doc.sheets[1].blocks.len(), 1);
    }

    #[test]
    fn underflow_pulls_fitting_blocks_back() {
        let mut doc = doc_with(vec![vec![100.0], vec![50.0, 50.0, 5000.0]]);
        let mut active = 1;
        let report = Balancer::new(&TaggedMeasure).resolve_underflow(&mut doc, 0, &mut active);
        assert_eq!(report.blocks_moved, 2);
        assert_eq!(doc.sheets[0].blocks.len(), 3);
        assert_eq!(doc.sheets[1].blocks.len(), 1, "non-fitting block stays");
        assert_eq!(report.sheets_removed, 0);
    }

    #[test]
    fn emptied_donor_is_removed_and_pointer_remapped() {
        let mut doc = doc_with(vec![vec![100.0], vec![50.0], vec![200.0]]);
        let mut active = 2;
        let report = Balancer::new(&TaggedMeasure).resolve_underflow(&mut doc, 0, &mut active);
        assert_eq!(report.sheets_removed, 1);
        assert_eq!(doc.sheets.len(), 2);
        assert_eq!(doc.sheets[0].blocks.len(), 2);
        assert_eq!(active, 1, "pointer past the donor shifts down");
    }

    #[test]
    fn pointer_on_donor_follows_content() {
        let mut doc = doc_with(vec![vec![100.0], vec![50.0]]);
        let mut active = 1;
        Balancer::new(&TaggedMeasure).resolve_underflow(&mut doc, 0, &mut active);
        assert_eq!(active, 0);
    }

    #[test]
    fn out_of_range_checks_are_skipped() {
        let mut doc = doc_with(vec![vec![100.0]]);
        let mut active = 0;
        let balancer = Balancer::new(&TaggedMeasure);
        assert!(!balancer.resolve_overflow(&mut doc, 7, &mut active).migrated());
        assert!(!balancer.resolve_underflow(&mut doc, 7, &mut active).migrated());
    }

    #[test]
    fn full_balance_reaches_fixed_point() {
        let ch = content_height(&doc_with(vec![vec![]]));
        let h = ch / 2.5; // two per sheet
        let mut doc = doc_with(vec![vec![h; 7]]);
        let mut active = 0;
        let balancer = Balancer::new(&TaggedMeasure);
        balancer.balance(&mut doc, &mut active);
        assert_eq!(doc.sheets.len(), 4);
        for p in 0..doc.sheets.len() {
            assert!(!balancer.is_overflowing(&doc, p), "sheet {p} overflowed");
        }
        // No sheet before the last has room for its successor's front block.
        for p in 0..doc.sheets.len() - 1 {
            let spare = ch - balancer.used_height(&doc, p);
            assert!(spare + HEIGHT_EPSILON < h, "sheet {p} left pullable room");
        }
    }
}

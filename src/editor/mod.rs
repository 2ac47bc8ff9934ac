//! # Editor Facade
//!
//! Owns the document, the measurer, the check scheduler, the selection,
//! and the active-sheet pointer. Every mutation goes through here: text
//! edits and toolbar commands mark the affected sheet content-changed,
//! and [`Editor::poll`] later drains the due checks and runs the
//! balancer.
//!
//! Selections are block-relative: a caret is a ([`BlockId`], char
//! offset) pair, so carets keep pointing at the same content when the
//! balancer migrates blocks between sheets. Stale selections clamp
//! rather than error.

pub mod commands;

use serde::{Deserialize, Serialize};

use crate::balance::scheduler::{Check, CheckKind, CheckScheduler};
use crate::balance::{BalanceReport, Balancer};
use crate::measure::Measure;
use crate::model::{
    Alignment, Block, BlockId, BlockKind, Marks, PagedDocument, Run, Sheet, SheetChrome,
    SheetFormat,
};

// ─────────────────────────── Selection ───────────────────────────

/// A position inside a block's editable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caret {
    pub block: BlockId,
    pub offset: usize,
}

/// Anchor and head carets. Collapsed when they coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub anchor: Caret,
    pub head: Caret,
}

impl Selection {
    pub fn caret(at: Caret) -> Selection {
        Selection { anchor: at, head: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }
}

/// A selection normalized onto one sheet: block indices in document
/// order with char offsets at each end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SelRange {
    pub sheet: usize,
    pub start_block: usize,
    pub start_off: usize,
    pub end_block: usize,
    pub end_off: usize,
}

// ─────────────────────────── Run surgery ───────────────────────────
//
// Shared by text editing and the formatting commands. All offsets are
// char offsets into the concatenation of the runs' text.

/// Split runs at `offset` so it falls on a run boundary; returns the run
/// index of that boundary. Offsets past the end clamp to the end.
pub(crate) fn split_at(runs: &mut Vec<Run>, offset: usize) -> usize {
    let mut consumed = 0usize;
    for i in 0..runs.len() {
        let len = runs[i].char_len();
        if offset <= consumed {
            return i;
        }
        if offset < consumed + len {
            let local = offset - consumed;
            let byte = runs[i]
                .text
                .char_indices()
                .nth(local)
                .map(|(b, _)| b)
                .unwrap_or(runs[i].text.len());
            let tail_text = runs[i].text.split_off(byte);
            let tail = Run { text: tail_text, marks: runs[i].marks.clone() };
            runs.insert(i + 1, tail);
            return i + 1;
        }
        consumed += len;
    }
    runs.len()
}

/// Drop empty runs and join neighbours with identical marks.
pub(crate) fn merge_adjacent(runs: &mut Vec<Run>) {
    runs.retain(|r| !r.text.is_empty());
    let mut i = 1;
    while i < runs.len() {
        if runs[i].marks == runs[i - 1].marks {
            let tail = runs.remove(i);
            runs[i - 1].text.push_str(&tail.text);
        } else {
            i += 1;
        }
    }
}

/// Apply `f` to the marks of every char in `start..end`.
pub(crate) fn apply_marks(runs: &mut Vec<Run>, start: usize, end: usize, f: &dyn Fn(&mut Marks)) {
    if start >= end {
        return;
    }
    let a = split_at(runs, start);
    let b = split_at(runs, end);
    for run in &mut runs[a..b] {
        f(&mut run.marks);
    }
    merge_adjacent(runs);
}

/// True when every char in `start..end` satisfies `pred`. Vacuously true
/// for an empty range.
pub(crate) fn marks_all(runs: &[Run], start: usize, end: usize, pred: &dyn Fn(&Marks) -> bool) -> bool {
    let mut consumed = 0usize;
    for run in runs {
        let len = run.char_len();
        let lo = start.saturating_sub(consumed);
        let hi = end.saturating_sub(consumed).min(len);
        if lo < hi && !pred(&run.marks) {
            return false;
        }
        consumed += len;
    }
    true
}

/// Remove and return the runs covering `start..end`.
pub(crate) fn extract_range(runs: &mut Vec<Run>, start: usize, end: usize) -> Vec<Run> {
    if start >= end {
        return Vec::new();
    }
    let a = split_at(runs, start);
    let b = split_at(runs, end);
    let extracted: Vec<Run> = runs.drain(a..b).collect();
    merge_adjacent(runs);
    extracted
}

/// Insert `text` at `offset`, inheriting the marks of the preceding run.
pub(crate) fn insert_text_at(runs: &mut Vec<Run>, offset: usize, text: &str) {
    let i = split_at(runs, offset);
    let marks = if i > 0 {
        runs[i - 1].marks.clone()
    } else if let Some(first) = runs.first() {
        first.marks.clone()
    } else {
        Marks::default()
    };
    runs.insert(i, Run { text: text.to_string(), marks });
    merge_adjacent(runs);
}

/// Apply `f` over a flattened char range of a block's editable text.
/// For lists the offsets address the concatenation of the items.
pub(crate) fn apply_to_block_range(
    block: &mut Block,
    start: usize,
    end: usize,
    f: &dyn Fn(&mut Marks),
) {
    match &mut block.kind {
        BlockKind::Paragraph { runs, .. } => apply_marks(runs, start, end, f),
        BlockKind::List { items, .. } => {
            let mut base = 0usize;
            for runs in items.iter_mut() {
                let len: usize = runs.iter().map(Run::char_len).sum();
                let lo = start.saturating_sub(base).min(len);
                let hi = end.saturating_sub(base).min(len);
                if lo < hi {
                    apply_marks(runs, lo, hi, f);
                }
                base += len;
            }
        }
        _ => {}
    }
}

pub(crate) fn block_range_all(
    block: &Block,
    start: usize,
    end: usize,
    pred: &dyn Fn(&Marks) -> bool,
) -> bool {
    match &block.kind {
        BlockKind::Paragraph { runs, .. } => marks_all(runs, start, end, pred),
        BlockKind::List { items, .. } => {
            let mut base = 0usize;
            for runs in items {
                let len: usize = runs.iter().map(Run::char_len).sum();
                let lo = start.saturating_sub(base);
                let hi = end.saturating_sub(base).min(len);
                if lo < hi && !marks_all(runs, lo, hi, pred) {
                    return false;
                }
                base += len;
            }
            true
        }
        _ => true,
    }
}

// ─────────────────────────── Editor ───────────────────────────

pub struct Editor<M: Measure> {
    doc: PagedDocument,
    measure: M,
    scheduler: CheckScheduler,
    selection: Option<Selection>,
    active_sheet: usize,
    next_block_id: u64,
}

impl<M: Measure> Editor<M> {
    /// A fresh single-sheet document holding one empty paragraph.
    pub fn new(format: SheetFormat, chrome: SheetChrome, measure: M) -> Editor<M> {
        let doc = PagedDocument::new(format, chrome);
        let mut editor = Editor {
            doc,
            measure,
            scheduler: CheckScheduler::new(),
            selection: None,
            active_sheet: 0,
            next_block_id: 1,
        };
        let id = editor.alloc_id();
        editor.doc.sheets[0].blocks.push(Block {
            id,
            kind: BlockKind::Paragraph { align: Alignment::default(), runs: vec![] },
        });
        editor.selection = Some(Selection::caret(Caret { block: id, offset: 0 }));
        editor
    }

    /// Adopt an existing document, assigning ids to blocks that lack one.
    pub fn from_document(mut doc: PagedDocument, measure: M) -> Editor<M> {
        doc.normalize();
        let mut next = doc
            .sheets
            .iter()
            .flat_map(|s| s.blocks.iter())
            .map(|b| b.id.0)
            .max()
            .unwrap_or(0)
            + 1;
        for sheet in &mut doc.sheets {
            for block in &mut sheet.blocks {
                if !block.id.is_set() {
                    block.id = BlockId(next);
                    next += 1;
                }
            }
            // A blockless sheet would be unreachable for the caret.
            if sheet.blocks.is_empty() {
                sheet.blocks.push(Block {
                    id: BlockId(next),
                    kind: BlockKind::Paragraph { align: Alignment::default(), runs: vec![] },
                });
                next += 1;
            }
        }
        let selection = doc.sheets[0]
            .blocks
            .first()
            .map(|b| Selection::caret(Caret { block: b.id, offset: 0 }));
        Editor {
            doc,
            measure,
            scheduler: CheckScheduler::new(),
            selection,
            active_sheet: 0,
            next_block_id: next,
        }
    }

    fn alloc_id(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        id
    }

    pub fn document(&self) -> &PagedDocument {
        &self.doc
    }

    pub fn into_document(self) -> PagedDocument {
        self.doc
    }

    pub fn measure(&self) -> &M {
        &self.measure
    }

    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
        self.clamp_selection();
    }

    pub fn set_active_sheet(&mut self, sheet: usize) {
        self.active_sheet = sheet.min(self.doc.sheets.len() - 1);
    }

    // ── Sheet management ──

    /// Toolbar "+": append a sheet holding one empty paragraph and move
    /// the caret there. The seed paragraph is what makes the new sheet
    /// editable at all: a caret can only target a block.
    pub fn add_sheet(&mut self, now: u64) {
        let id = self.alloc_id();
        let mut sheet = Sheet::default();
        sheet.blocks.push(Block {
            id,
            kind: BlockKind::Paragraph { align: Alignment::default(), runs: vec![] },
        });
        self.doc.sheets.push(sheet);
        self.active_sheet = self.doc.sheets.len() - 1;
        self.selection = Some(Selection::caret(Caret { block: id, offset: 0 }));
        self.scheduler.note_edit(self.active_sheet, now);
    }

    /// Toolbar "−": remove the active sheet and its blocks. No-op on the
    /// last remaining sheet.
    pub fn remove_sheet(&mut self, now: u64) {
        if self.doc.sheets.len() <= 1 {
            return;
        }
        self.doc.sheets.remove(self.active_sheet);
        self.active_sheet = self.active_sheet.min(self.doc.sheets.len() - 1);
        self.clamp_selection();
        self.scheduler.note_edit(self.active_sheet, now);
    }

    // ── Text editing ──

    /// Insert `text` at the caret. A non-collapsed selection is replaced.
    pub fn insert_text(&mut self, text: &str, now: u64) {
        self.delete_selection_contents();
        let Some((sheet, idx, offset)) = self.caret_position() else { return };
        let inserted = text.chars().count();
        let block = &mut self.doc.sheets[sheet].blocks[idx];
        match &mut block.kind {
            BlockKind::Paragraph { runs, .. } => insert_text_at(runs, offset, text),
            BlockKind::List { items, .. } => {
                let mut base = 0usize;
                for runs in items.iter_mut() {
                    let len: usize = runs.iter().map(Run::char_len).sum();
                    if offset <= base + len {
                        insert_text_at(runs, offset - base, text);
                        break;
                    }
                    base += len;
                }
            }
            _ => return,
        }
        let id = block.id;
        self.selection = Some(Selection::caret(Caret { block: id, offset: offset + inserted }));
        self.content_changed(sheet, now);
    }

    /// Delete up to `count` chars before the caret. At offset zero the
    /// caret's paragraph joins the previous paragraph on the sheet.
    pub fn delete_backward(&mut self, count: usize, now: u64) {
        if self.selection.map(|s| !s.is_collapsed()).unwrap_or(false) {
            self.delete_selection_contents();
            if let Some((sheet, _, _)) = self.caret_position() {
                self.content_changed(sheet, now);
            }
            return;
        }
        let Some((sheet, idx, offset)) = self.caret_position() else { return };

        if offset == 0 {
            if idx == 0 {
                return;
            }
            let joins = matches!(
                (
                    &self.doc.sheets[sheet].blocks[idx - 1].kind,
                    &self.doc.sheets[sheet].blocks[idx].kind
                ),
                (BlockKind::Paragraph { .. }, BlockKind::Paragraph { .. })
            );
            if !joins {
                return;
            }
            let removed = self.doc.sheets[sheet].blocks.remove(idx);
            let BlockKind::Paragraph { runs: tail, .. } = removed.kind else { return };
            let prev = &mut self.doc.sheets[sheet].blocks[idx - 1];
            let prev_id = prev.id;
            let join_at = prev.char_len();
            if let BlockKind::Paragraph { runs, .. } = &mut prev.kind {
                runs.extend(tail);
                merge_adjacent(runs);
            }
            self.selection = Some(Selection::caret(Caret { block: prev_id, offset: join_at }));
            self.content_changed(sheet, now);
            return;
        }

        let start = offset.saturating_sub(count);
        let block = &mut self.doc.sheets[sheet].blocks[idx];
        if let BlockKind::Paragraph { runs, .. } = &mut block.kind {
            extract_range(runs, start, offset);
        }
        let id = block.id;
        self.selection = Some(Selection::caret(Caret { block: id, offset: start }));
        self.content_changed(sheet, now);
    }

    /// Split the caret's paragraph in two, like Enter in the editor.
    pub fn insert_paragraph(&mut self, now: u64) {
        self.delete_selection_contents();
        let Some((sheet, idx, offset)) = self.caret_position() else { return };
        let id = self.alloc_id();
        let block = &mut self.doc.sheets[sheet].blocks[idx];
        let (align, tail) = match &mut block.kind {
            BlockKind::Paragraph { align, runs } => {
                let boundary = split_at(runs, offset);
                (*align, runs.split_off(boundary))
            }
            _ => (Alignment::default(), Vec::new()),
        };
        self.doc.sheets[sheet]
            .blocks
            .insert(idx + 1, Block { id, kind: BlockKind::Paragraph { align, runs: tail } });
        self.selection = Some(Selection::caret(Caret { block: id, offset: 0 }));
        self.content_changed(sheet, now);
    }

    // ── Scheduling ──

    fn content_changed(&mut self, sheet: usize, now: u64) {
        self.active_sheet = sheet;
        self.scheduler.note_edit(sheet, now);
    }

    /// Drain the due checks and run the balancer on each.
    ///
    /// An underflow check never runs in a poll in which an overflow
    /// cascade moved blocks: the cascade invalidated the measurement the
    /// underflow decision would be based on, so the check is re-armed one
    /// debounce later instead. An underflow that itself moved blocks also
    /// re-arms (a removed donor exposes a new one).
    pub fn poll(&mut self, now: u64) -> Vec<BalanceReport> {
        let checks: Vec<Check> = self.scheduler.take_due(now);
        let mut reports = Vec::new();
        let mut cascaded = false;
        for check in checks {
            match check.kind {
                CheckKind::Overflow => {
                    let report = Balancer::new(&self.measure).resolve_overflow(
                        &mut self.doc,
                        check.sheet,
                        &mut self.active_sheet,
                    );
                    cascaded |= report.migrated();
                    reports.push(report);
                }
                CheckKind::Underflow => {
                    if cascaded {
                        self.scheduler.arm(CheckKind::Underflow, check.sheet, now);
                        continue;
                    }
                    let report = Balancer::new(&self.measure).resolve_underflow(
                        &mut self.doc,
                        check.sheet,
                        &mut self.active_sheet,
                    );
                    if report.blocks_moved > 0 {
                        self.scheduler.arm(CheckKind::Underflow, check.sheet, now);
                    }
                    reports.push(report);
                }
            }
        }
        self.clamp_selection();
        reports
    }

    pub fn has_pending_checks(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Teardown: cancel pending checks so nothing fires after close.
    pub fn close(&mut self) {
        self.scheduler.clear();
    }

    // ── Selection plumbing ──

    /// Resolve the caret to `(sheet, block index, offset)`, clamping
    /// first. Focus follows the caret's block.
    fn caret_position(&mut self) -> Option<(usize, usize, usize)> {
        self.clamp_selection();
        let head = self.selection?.head;
        let (sheet, idx) = self.doc.locate(head.block)?;
        self.active_sheet = sheet;
        Some((sheet, idx, head.offset))
    }

    /// Clamp the selection to content that still exists. A caret whose
    /// block is gone falls back to the end of the active sheet; offsets
    /// clamp to the block's text length.
    pub(crate) fn clamp_selection(&mut self) {
        let fallback = |doc: &PagedDocument, sheet: usize| -> Option<Selection> {
            let sheet = sheet.min(doc.sheets.len() - 1);
            doc.sheets[sheet].blocks.last().map(|b| {
                Selection::caret(Caret { block: b.id, offset: b.char_len() })
            })
        };

        let Some(mut sel) = self.selection else {
            self.selection = fallback(&self.doc, self.active_sheet);
            return;
        };

        let head_loc = self.doc.locate(sel.head.block);
        let Some((head_sheet, head_idx)) = head_loc else {
            self.selection = fallback(&self.doc, self.active_sheet);
            return;
        };
        sel.head.offset = sel.head.offset.min(self.doc.sheets[head_sheet].blocks[head_idx].char_len());

        // The anchor must share the head's sheet; otherwise collapse.
        match self.doc.locate(sel.anchor.block) {
            Some((s, i)) if s == head_sheet => {
                sel.anchor.offset = sel.anchor.offset.min(self.doc.sheets[s].blocks[i].char_len());
            }
            _ => sel.anchor = sel.head,
        }

        self.active_sheet = head_sheet;
        self.selection = Some(sel);
    }

    /// The selection in document order on the active sheet.
    pub(crate) fn ordered_selection(&mut self) -> Option<SelRange> {
        self.clamp_selection();
        let sel = self.selection?;
        let (sheet, head_idx) = self.doc.locate(sel.head.block)?;
        let (_, anchor_idx) = self.doc.locate(sel.anchor.block)?;
        let (start_block, start_off, end_block, end_off) =
            if (anchor_idx, sel.anchor.offset) <= (head_idx, sel.head.offset) {
                (anchor_idx, sel.anchor.offset, head_idx, sel.head.offset)
            } else {
                (head_idx, sel.head.offset, anchor_idx, sel.anchor.offset)
            };
        Some(SelRange { sheet, start_block, start_off, end_block, end_off })
    }

    /// Remove the selected text, collapsing the selection to its start.
    /// Whole-covered text blocks lose their text; atomic blocks in the
    /// range are left in place.
    fn delete_selection_contents(&mut self) {
        let Some(range) = self.ordered_selection() else { return };
        if range.start_block == range.end_block && range.start_off == range.end_off {
            return;
        }
        let sheet = range.sheet;
        for idx in range.start_block..=range.end_block {
            let len = self.doc.sheets[sheet].blocks[idx].char_len();
            let (lo, hi) = if range.start_block == range.end_block {
                (range.start_off, range.end_off)
            } else if idx == range.start_block {
                (range.start_off, len)
            } else if idx == range.end_block {
                (0, range.end_off)
            } else {
                (0, len)
            };
            let block = &mut self.doc.sheets[sheet].blocks[idx];
            match &mut block.kind {
                BlockKind::Paragraph { runs, .. } => {
                    extract_range(runs, lo, hi);
                }
                BlockKind::List { items, .. } => {
                    let mut base = 0usize;
                    for runs in items.iter_mut() {
                        let item_len: usize = runs.iter().map(Run::char_len).sum();
                        let s = lo.saturating_sub(base).min(item_len);
                        let e = hi.saturating_sub(base).min(item_len);
                        if s < e {
                            extract_range(runs, s, e);
                        }
                        base += item_len;
                    }
                }
                _ => {}
            }
        }
        let start_id = self.doc.sheets[sheet].blocks[range.start_block].id;
        self.selection =
            Some(Selection::caret(Caret { block: start_id, offset: range.start_off }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatMeasure;

    impl Measure for FlatMeasure {
        fn block_height(&self, _block: &Block, _content_width: f64) -> f64 {
            10.0
        }
    }

    fn editor() -> Editor<FlatMeasure> {
        Editor::new(SheetFormat::A4Portrait, SheetChrome::default(), FlatMeasure)
    }

    #[test]
    fn new_editor_has_one_sheet_and_a_caret() {
        let ed = editor();
        assert_eq!(ed.document().sheets.len(), 1);
        assert!(ed.selection().is_some());
    }

    #[test]
    fn insert_text_advances_the_caret() {
        let mut ed = editor();
        ed.insert_text("hello", 0);
        assert_eq!(ed.document().sheets[0].blocks[0].plain_text(), "hello");
        assert_eq!(ed.selection().unwrap().head.offset, 5);
        assert!(ed.has_pending_checks());
    }

    #[test]
    fn delete_backward_removes_before_the_caret() {
        let mut ed = editor();
        ed.insert_text("hello", 0);
        ed.delete_backward(2, 10);
        assert_eq!(ed.document().sheets[0].blocks[0].plain_text(), "hel");
        assert_eq!(ed.selection().unwrap().head.offset, 3);
    }

    #[test]
    fn enter_splits_the_paragraph_at_the_caret() {
        let mut ed = editor();
        ed.insert_text("headtail", 0);
        let block = ed.document().sheets[0].blocks[0].id;
        ed.set_selection(Selection::caret(Caret { block, offset: 4 }));
        ed.insert_paragraph(10);
        let blocks = &ed.document().sheets[0].blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].plain_text(), "head");
        assert_eq!(blocks[1].plain_text(), "tail");
        assert_eq!(ed.selection().unwrap().head.offset, 0);
    }

    #[test]
    fn backspace_at_start_joins_paragraphs() {
        let mut ed = editor();
        ed.insert_text("ab", 0);
        ed.insert_paragraph(1);
        ed.insert_text("cd", 2);
        let second = ed.document().sheets[0].blocks[1].id;
        ed.set_selection(Selection::caret(Caret { block: second, offset: 0 }));
        ed.delete_backward(1, 3);
        let blocks = &ed.document().sheets[0].blocks;
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].plain_text(), "abcd");
        assert_eq!(ed.selection().unwrap().head.offset, 2);
    }

    #[test]
    fn remove_sheet_is_a_noop_on_the_last_sheet() {
        let mut ed = editor();
        ed.remove_sheet(0);
        assert_eq!(ed.document().sheets.len(), 1);
        ed.add_sheet(1);
        assert_eq!(ed.active_sheet(), 1);
        ed.remove_sheet(2);
        assert_eq!(ed.document().sheets.len(), 1);
        assert_eq!(ed.active_sheet(), 0);
    }

    #[test]
    fn close_cancels_pending_checks() {
        let mut ed = editor();
        ed.insert_text("x", 0);
        assert!(ed.has_pending_checks());
        ed.close();
        assert!(!ed.has_pending_checks());
        assert!(ed.poll(u64::MAX).is_empty());
    }

    #[test]
    fn stale_caret_clamps_to_end_of_sheet() {
        let mut ed = editor();
        ed.insert_text("hello", 0);
        ed.set_selection(Selection::caret(Caret { block: BlockId(999), offset: 3 }));
        let sel = ed.selection().unwrap();
        assert_eq!(sel.head.offset, 5, "falls back to end of last block");
    }

    #[test]
    fn split_at_preserves_marks_on_both_halves() {
        let mut runs = vec![Run::styled("bold", Marks::bold()), Run::plain("plain")];
        let i = split_at(&mut runs, 6);
        assert_eq!(i, 2);
        assert_eq!(runs[1].text, "pl");
        assert_eq!(runs[2].text, "ain");
        assert_eq!(runs[1].marks, runs[2].marks);
    }

    #[test]
    fn merge_adjacent_joins_equal_marks() {
        let mut runs = vec![Run::plain("a"), Run::plain(""), Run::plain("b")];
        merge_adjacent(&mut runs);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "ab");
    }
}

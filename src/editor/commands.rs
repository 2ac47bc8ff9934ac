//! Toolbar command dispatch.
//!
//! Every command runs the same sequence the editor's toolbar does:
//! capture the selection, re-focus the sheet that owns it, clamp the
//! restored selection to content that still exists, apply the formatting
//! primitive, and mark the sheet content-changed so the layout checks
//! run — formatting changes change content height.

use serde::{Deserialize, Serialize};

use crate::measure::Measure;
use crate::model::{
    Alignment, Block, BlockId, BlockKind, Color, ListKind, Marks, Run, TableDraft,
};

use super::{
    apply_to_block_range, block_range_all, split_at, Caret, Editor, SelRange, Selection,
};

/// Everything the toolbar can ask for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    ToggleStrikethrough,
    SetFontFamily { family: String },
    SetFontSize { size: f64 },
    SetTextColor { color: Color },
    SetAlignment { align: Alignment },
    InsertList { kind: ListKind },
    InsertImage { src: String },
    InsertTable { draft: TableDraft },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl MarkKind {
    fn is_set(self, marks: &Marks) -> bool {
        match self {
            MarkKind::Bold => marks.bold,
            MarkKind::Italic => marks.italic,
            MarkKind::Underline => marks.underline,
            MarkKind::Strikethrough => marks.strikethrough,
        }
    }

    fn set(self, marks: &mut Marks, on: bool) {
        match self {
            MarkKind::Bold => marks.bold = on,
            MarkKind::Italic => marks.italic = on,
            MarkKind::Underline => marks.underline = on,
            MarkKind::Strikethrough => marks.strikethrough = on,
        }
    }
}

impl<M: Measure> Editor<M> {
    pub fn apply(&mut self, command: Command, now: u64) {
        self.clamp_selection();
        match command {
            Command::ToggleBold => self.toggle_mark(MarkKind::Bold),
            Command::ToggleItalic => self.toggle_mark(MarkKind::Italic),
            Command::ToggleUnderline => self.toggle_mark(MarkKind::Underline),
            Command::ToggleStrikethrough => self.toggle_mark(MarkKind::Strikethrough),
            Command::SetFontFamily { family } => {
                self.set_marks(&|m| m.font_family = Some(family.clone()))
            }
            Command::SetFontSize { size } => self.set_marks(&|m| m.font_size = Some(size)),
            Command::SetTextColor { color } => self.set_marks(&|m| m.color = Some(color)),
            Command::SetAlignment { align } => self.set_alignment(align),
            Command::InsertList { kind } => self.insert_list(kind),
            Command::InsertImage { src } => self.insert_image(src),
            Command::InsertTable { draft } => self.insert_table(draft),
        }
        let sheet = self.active_sheet();
        self.scheduler.note_edit(sheet, now);
    }

    /// Per-block char ranges the selection covers, in order.
    fn covered_ranges(&mut self) -> Option<(SelRange, Vec<(usize, usize, usize)>)> {
        let range = self.ordered_selection()?;
        let mut out = Vec::new();
        for idx in range.start_block..=range.end_block {
            let len = self.doc.sheets[range.sheet].blocks[idx].char_len();
            let (lo, hi) = if range.start_block == range.end_block {
                (range.start_off, range.end_off)
            } else if idx == range.start_block {
                (range.start_off, len)
            } else if idx == range.end_block {
                (0, range.end_off)
            } else {
                (0, len)
            };
            out.push((idx, lo, hi));
        }
        Some((range, out))
    }

    /// Toggle semantics match `execCommand`: the mark comes off only when
    /// every selected char already carries it, otherwise it goes on.
    fn toggle_mark(&mut self, kind: MarkKind) {
        let Some((range, covered)) = self.covered_ranges() else { return };
        let all_set = covered.iter().all(|&(idx, lo, hi)| {
            block_range_all(&self.doc.sheets[range.sheet].blocks[idx], lo, hi, &|m| {
                kind.is_set(m)
            })
        });
        let on = !all_set;
        for (idx, lo, hi) in covered {
            apply_to_block_range(&mut self.doc.sheets[range.sheet].blocks[idx], lo, hi, &|m| {
                kind.set(m, on)
            });
        }
    }

    fn set_marks(&mut self, f: &dyn Fn(&mut Marks)) {
        let Some((range, covered)) = self.covered_ranges() else { return };
        for (idx, lo, hi) in covered {
            apply_to_block_range(&mut self.doc.sheets[range.sheet].blocks[idx], lo, hi, f);
        }
    }

    /// Alignment is block-level: every paragraph the selection touches
    /// gets it, offsets notwithstanding.
    fn set_alignment(&mut self, align: Alignment) {
        let Some((range, covered)) = self.covered_ranges() else { return };
        for (idx, _, _) in covered {
            if let BlockKind::Paragraph { align: a, .. } =
                &mut self.doc.sheets[range.sheet].blocks[idx].kind
            {
                *a = align;
            }
        }
    }

    /// Wrap the selection's extracted contents in a single list item
    /// inside a new list block, then collapse the selection into that
    /// item. Atomic blocks inside the range stay where they are;
    /// paragraphs the extraction empties are removed.
    fn insert_list(&mut self, kind: ListKind) {
        let Some((range, covered)) = self.covered_ranges() else { return };
        let sheet = range.sheet;

        let mut extracted: Vec<Run> = Vec::new();
        for &(idx, lo, hi) in &covered {
            if let BlockKind::Paragraph { runs, .. } = &mut self.doc.sheets[sheet].blocks[idx].kind
            {
                extracted.extend(super::extract_range(runs, lo, hi));
            }
        }
        super::merge_adjacent(&mut extracted);
        let item_len: usize = extracted.iter().map(Run::char_len).sum();

        // Drop paragraphs the extraction emptied, back to front so the
        // indices stay valid. The caret's landing block is the list.
        for &(idx, _, _) in covered.iter().rev() {
            let block = &self.doc.sheets[sheet].blocks[idx];
            if matches!(block.kind, BlockKind::Paragraph { .. }) && block.char_len() == 0 {
                self.doc.sheets[sheet].blocks.remove(idx);
            }
        }

        let id = self.alloc_id();
        let insert_at = range.start_block.min(self.doc.sheets[sheet].blocks.len());
        self.doc.sheets[sheet].blocks.insert(
            insert_at,
            Block { id, kind: BlockKind::List { kind, items: vec![extracted] } },
        );
        self.selection = Some(Selection::caret(Caret { block: id, offset: item_len }));
    }

    /// Images insert as whole blocks — blocks are the migration unit.
    fn insert_image(&mut self, src: String) {
        let id = self.alloc_id();
        let block = Block { id, kind: BlockKind::Image { src, width: None, height: None } };
        self.insert_block_at_caret(block);
    }

    /// Synthesize the placeholder table from the draft and insert it at
    /// the caret. The draft is consumed.
    fn insert_table(&mut self, draft: TableDraft) {
        let id = self.alloc_id();
        let block = Block { id, kind: draft.into_block() };
        self.insert_block_at_caret(block);
    }

    /// Insert a block at the caret, splitting the caret's paragraph when
    /// the caret sits mid-text. The caret lands after the inserted block.
    fn insert_block_at_caret(&mut self, block: Block) {
        self.clamp_selection();
        let placed = self
            .selection
            .map(|s| s.head)
            .and_then(|head| self.doc.locate(head.block).map(|(s, i)| (s, i, head.offset)));
        let Some((sheet, idx, offset)) = placed else {
            let sheet = self.active_sheet();
            self.doc.sheets[sheet].blocks.push(block);
            return;
        };

        let caret_len = self.doc.sheets[sheet].blocks[idx].char_len();
        let inserted_at = if offset == 0 {
            self.doc.sheets[sheet].blocks.insert(idx, block);
            idx
        } else if offset >= caret_len {
            self.doc.sheets[sheet].blocks.insert(idx + 1, block);
            idx + 1
        } else {
            // Mid-paragraph: split, then slot the block between halves.
            let tail_id = self.alloc_id();
            let host = &mut self.doc.sheets[sheet].blocks[idx];
            if let BlockKind::Paragraph { align, runs } = &mut host.kind {
                let boundary = split_at(runs, offset);
                let tail_runs = runs.split_off(boundary);
                let align = *align;
                self.doc.sheets[sheet].blocks.insert(
                    idx + 1,
                    Block { id: tail_id, kind: BlockKind::Paragraph { align, runs: tail_runs } },
                );
            }
            self.doc.sheets[sheet].blocks.insert(idx + 1, block);
            idx + 1
        };

        // Caret to the start of whatever follows the insertion.
        let after = self.doc.sheets[sheet]
            .blocks
            .get(inserted_at + 1)
            .map(|b| b.id)
            .unwrap_or_else(|| self.doc.sheets[sheet].blocks[inserted_at].id);
        self.selection = Some(Selection::caret(Caret { block: after, offset: 0 }));
    }
}

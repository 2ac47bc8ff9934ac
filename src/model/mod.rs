//! # Document Model
//!
//! The paged document tree. A [`PagedDocument`] is metadata plus a list of
//! [`Sheet`]s; each sheet holds whole [`Block`]s. Blocks are the unit of
//! page balancing: they migrate between sheets intact and are never split
//! mid-block, so everything here is sized and moved as one piece.
//!
//! The model is plain data. Measurement lives in [`crate::measure`], the
//! balancing rules in [`crate::balance`], and markup output in
//! [`crate::render`].

use serde::{Deserialize, Serialize};

// ─────────────────────────── Identity ───────────────────────────

/// Stable identity of a block. Survives migration between sheets, which is
/// what lets selections and carets follow content when pages rebalance.
///
/// `0` means "not yet adopted by an editor"; [`crate::editor::Editor`]
/// assigns real ids starting from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl BlockId {
    pub const UNSET: BlockId = BlockId(0);

    pub fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl Default for BlockId {
    fn default() -> Self {
        BlockId::UNSET
    }
}

// ─────────────────────────── Color ───────────────────────────

/// RGBA color, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "default_alpha")]
    pub a: f64,
}

fn default_alpha() -> f64 {
    1.0
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Color {
        Color {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }

    /// CSS `rgba(...)` form used by the renderer.
    pub fn to_css(&self) -> String {
        format!(
            "rgba({},{},{},{})",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            self.a
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

// ─────────────────────────── Sheet geometry ───────────────────────────

/// Fixed sheet size. Dimensions are CSS pixels at 96 dpi, matching what a
/// browser host renders the sheets at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetFormat {
    A4Portrait,
    A4Landscape,
    Letter,
    Custom { width: f64, height: f64 },
}

impl SheetFormat {
    /// (width, height) in pixels.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            SheetFormat::A4Portrait => (794.0, 1123.0),
            SheetFormat::A4Landscape => (1123.0, 794.0),
            SheetFormat::Letter => (816.0, 1056.0),
            SheetFormat::Custom { width, height } => (*width, *height),
        }
    }
}

impl Default for SheetFormat {
    fn default() -> Self {
        SheetFormat::A4Portrait
    }
}

/// Company letterhead painted in the header band of every sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Letterhead {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub address_lines: Vec<String>,
    /// Image source: data URI, path, or URL.
    #[serde(default)]
    pub logo: Option<String>,
}

/// Signatory rendered in the footer band of the final sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureBlock {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
}

/// Per-sheet furniture shared by every sheet of a document: letterhead,
/// watermark, page numbers, and the verification QR payload. Chrome never
/// participates in balancing; only the content region between the header
/// and footer bands does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetChrome {
    #[serde(default)]
    pub letterhead: Letterhead,
    /// Faint full-page image behind the content, if any.
    #[serde(default)]
    pub watermark: Option<String>,
    #[serde(default)]
    pub signature: Option<SignatureBlock>,
    /// Absolute URL encoded into the footer QR code.
    #[serde(default)]
    pub qr_payload: Option<String>,
    #[serde(default = "default_true")]
    pub show_page_numbers: bool,
    /// Height of the header band, letterhead included.
    #[serde(default = "default_header_band")]
    pub header_band: f64,
    /// Height of the footer band, QR and page number included.
    #[serde(default = "default_footer_band")]
    pub footer_band: f64,
    /// Horizontal padding on each side of the content region.
    #[serde(default = "default_side_padding")]
    pub side_padding: f64,
}

fn default_true() -> bool {
    true
}

fn default_header_band() -> f64 {
    112.0
}

fn default_footer_band() -> f64 {
    92.0
}

fn default_side_padding() -> f64 {
    60.0
}

impl Default for SheetChrome {
    fn default() -> Self {
        SheetChrome {
            letterhead: Letterhead::default(),
            watermark: None,
            signature: None,
            qr_payload: None,
            show_page_numbers: true,
            header_band: default_header_band(),
            footer_band: default_footer_band(),
            side_padding: default_side_padding(),
        }
    }
}

// ─────────────────────────── Rich text ───────────────────────────

/// Character-level formatting carried by a [`Run`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub font_family: Option<String>,
    /// Font size in pixels. `None` inherits the document base size.
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub color: Option<Color>,
}

impl Marks {
    pub fn bold() -> Marks {
        Marks { bold: true, ..Marks::default() }
    }

    pub fn italic() -> Marks {
        Marks { italic: true, ..Marks::default() }
    }

    pub fn with_size(mut self, size: f64) -> Marks {
        self.font_size = Some(size);
        self
    }

    pub fn with_font(mut self, family: &str) -> Marks {
        self.font_family = Some(family.to_string());
        self
    }

    pub fn with_color(mut self, color: Color) -> Marks {
        self.color = Some(color);
        self
    }

    /// True when no formatting is set at all.
    pub fn is_plain(&self) -> bool {
        *self == Marks::default()
    }
}

/// A contiguous span of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Run {
        Run { text: text.into(), marks: Marks::default() }
    }

    pub fn styled(text: impl Into<String>, marks: Marks) -> Run {
        Run { text: text.into(), marks }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Alignment::Left
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListKind {
    Unordered,
    Ordered,
}

impl Default for ListKind {
    fn default() -> Self {
        ListKind::Unordered
    }
}

// ─────────────────────────── Tables ───────────────────────────

/// A grid of plain-text cells with one header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBlock {
    #[serde(default = "default_border_width")]
    pub border_width: f64,
    #[serde(default)]
    pub border_color: Color,
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

fn default_border_width() -> f64 {
    1.0
}

impl TableBlock {
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .fold(self.header.len(), usize::max)
            .max(1)
    }
}

/// Pending table parameters gathered from a dialog before insertion. The
/// draft itself is never part of a document; [`TableDraft::into_block`]
/// turns it into a [`TableBlock`] with placeholder labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDraft {
    /// Total row count, header row included.
    pub rows: u32,
    pub cols: u32,
    #[serde(default = "default_border_width")]
    pub border_width: f64,
    #[serde(default)]
    pub border_color: Color,
}

impl Default for TableDraft {
    fn default() -> Self {
        TableDraft {
            rows: 3,
            cols: 3,
            border_width: default_border_width(),
            border_color: Color::BLACK,
        }
    }
}

impl TableDraft {
    /// Synthesize the placeholder table: one header row labelled
    /// `Header 1..cols`, and `rows - 1` body rows labelled `Cell 1..cols`.
    pub fn into_block(self) -> BlockKind {
        let cols = self.cols.max(1) as usize;
        let body_rows = self.rows.max(1) as usize - 1;
        let header = (1..=cols).map(|c| format!("Header {c}")).collect();
        let row: Vec<String> = (1..=cols).map(|c| format!("Cell {c}")).collect();
        BlockKind::Table(TableBlock {
            border_width: self.border_width,
            border_color: self.border_color,
            header,
            rows: vec![row; body_rows],
        })
    }
}

// ─────────────────────────── Blocks ───────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockKind {
    Paragraph {
        #[serde(default)]
        align: Alignment,
        runs: Vec<Run>,
    },
    List {
        #[serde(default)]
        kind: ListKind,
        items: Vec<Vec<Run>>,
    },
    Table(TableBlock),
    Image {
        src: String,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
    },
    Divider,
}

/// One balanceable unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub id: BlockId,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    pub fn paragraph(runs: Vec<Run>) -> Block {
        Block {
            id: BlockId::UNSET,
            kind: BlockKind::Paragraph { align: Alignment::default(), runs },
        }
    }

    pub fn text(text: impl Into<String>) -> Block {
        Block::paragraph(vec![Run::plain(text)])
    }

    /// Bold paragraph at the given size. Used for section headings.
    pub fn heading(text: impl Into<String>, size: f64) -> Block {
        Block::paragraph(vec![Run::styled(text, Marks::bold().with_size(size))])
    }

    pub fn list(kind: ListKind, items: Vec<Vec<Run>>) -> Block {
        Block { id: BlockId::UNSET, kind: BlockKind::List { kind, items } }
    }

    pub fn table(table: TableBlock) -> Block {
        Block { id: BlockId::UNSET, kind: BlockKind::Table(table) }
    }

    pub fn image(src: impl Into<String>) -> Block {
        Block {
            id: BlockId::UNSET,
            kind: BlockKind::Image { src: src.into(), width: None, height: None },
        }
    }

    pub fn divider() -> Block {
        Block { id: BlockId::UNSET, kind: BlockKind::Divider }
    }

    pub fn with_align(mut self, align: Alignment) -> Block {
        if let BlockKind::Paragraph { align: a, .. } = &mut self.kind {
            *a = align;
        }
        self
    }

    /// Character count of the editable text, used for caret clamping.
    /// Atomic blocks (images, dividers, tables) report zero.
    pub fn char_len(&self) -> usize {
        match &self.kind {
            BlockKind::Paragraph { runs, .. } => runs.iter().map(Run::char_len).sum(),
            BlockKind::List { items, .. } => items
                .iter()
                .map(|runs| runs.iter().map(Run::char_len).sum::<usize>())
                .sum(),
            _ => 0,
        }
    }

    /// Concatenated text content, markup stripped.
    pub fn plain_text(&self) -> String {
        match &self.kind {
            BlockKind::Paragraph { runs, .. } => {
                runs.iter().map(|r| r.text.as_str()).collect()
            }
            BlockKind::List { items, .. } => {
                let mut out = String::new();
                for runs in items {
                    for r in runs {
                        out.push_str(&r.text);
                    }
                    out.push('\n');
                }
                out
            }
            BlockKind::Table(t) => {
                let mut out = String::new();
                for cell in t.header.iter().chain(t.rows.iter().flatten()) {
                    out.push_str(cell);
                    out.push(' ');
                }
                out
            }
            _ => String::new(),
        }
    }
}

// ─────────────────────────── Sheets ───────────────────────────

/// One fixed-size page of content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Sheet {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn position(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }
}

// ─────────────────────────── Document ───────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
}

/// A document already distributed across sheets.
///
/// Invariant: `sheets` is never empty. Constructors and deserialization
/// entry points normalize an empty list to a single blank sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedDocument {
    #[serde(default)]
    pub format: SheetFormat,
    #[serde(default)]
    pub chrome: SheetChrome,
    #[serde(default)]
    pub metadata: Metadata,
    pub sheets: Vec<Sheet>,
}

impl PagedDocument {
    pub fn new(format: SheetFormat, chrome: SheetChrome) -> PagedDocument {
        PagedDocument {
            format,
            chrome,
            metadata: Metadata::default(),
            sheets: vec![Sheet::default()],
        }
    }

    /// Restore the never-empty sheet invariant after deserialization.
    pub fn normalize(&mut self) {
        if self.sheets.is_empty() {
            self.sheets.push(Sheet::default());
        }
    }

    /// Width and height of the balanceable content region, after the
    /// chrome bands and side padding are subtracted.
    pub fn content_size(&self) -> (f64, f64) {
        let (w, h) = self.format.dimensions();
        let cw = (w - 2.0 * self.chrome.side_padding).max(0.0);
        let ch = (h - self.chrome.header_band - self.chrome.footer_band).max(0.0);
        (cw, ch)
    }

    pub fn block_count(&self) -> usize {
        self.sheets.iter().map(|s| s.blocks.len()).sum()
    }

    /// Locate a block by id: `(sheet index, block index)`.
    pub fn locate(&self, id: BlockId) -> Option<(usize, usize)> {
        for (s, sheet) in self.sheets.iter().enumerate() {
            if let Some(b) = sheet.position(id) {
                return Some((s, b));
            }
        }
        None
    }
}

/// Unpaginated input: the shape accepted on the CLI and the wasm boundary.
/// [`crate::compose`] pours its blocks into sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftDocument {
    #[serde(default)]
    pub format: SheetFormat,
    #[serde(default)]
    pub chrome: SheetChrome,
    #[serde(default)]
    pub metadata: Metadata,
    pub blocks: Vec<Block>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_portrait_dimensions_match_96dpi() {
        assert_eq!(SheetFormat::A4Portrait.dimensions(), (794.0, 1123.0));
        assert_eq!(SheetFormat::A4Landscape.dimensions(), (1123.0, 794.0));
    }

    #[test]
    fn content_region_subtracts_chrome_bands() {
        let doc = PagedDocument::new(SheetFormat::A4Portrait, SheetChrome::default());
        let (cw, ch) = doc.content_size();
        assert_eq!(cw, 794.0 - 120.0);
        assert_eq!(ch, 1123.0 - 112.0 - 92.0);
    }

    #[test]
    fn table_draft_counts_header_in_rows() {
        let draft = TableDraft { rows: 3, cols: 2, ..TableDraft::default() };
        match draft.into_block() {
            BlockKind::Table(t) => {
                assert_eq!(t.header, vec!["Header 1", "Header 2"]);
                assert_eq!(t.rows.len(), 2, "3 rows total means 2 body rows");
                assert_eq!(t.rows[0], vec!["Cell 1", "Cell 2"]);
            }
            other => panic!("expected a table, got {other:?}"),
        }
    }

    #[test]
    fn table_draft_single_row_is_header_only() {
        let draft = TableDraft { rows: 1, cols: 4, ..TableDraft::default() };
        match draft.into_block() {
            BlockKind::Table(t) => {
                assert_eq!(t.header.len(), 4);
                assert!(t.rows.is_empty());
            }
            other => panic!("expected a table, got {other:?}"),
        }
    }

    #[test]
    fn block_round_trips_through_json() {
        let block = Block::paragraph(vec![
            Run::plain("plain "),
            Run::styled("loud", Marks::bold().with_size(18.0)),
        ])
        .with_align(Alignment::Center);
        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
    }

    #[test]
    fn empty_sheet_list_normalizes_to_one() {
        let mut doc = PagedDocument {
            format: SheetFormat::default(),
            chrome: SheetChrome::default(),
            metadata: Metadata::default(),
            sheets: vec![],
        };
        doc.normalize();
        assert_eq!(doc.sheets.len(), 1);
    }
}

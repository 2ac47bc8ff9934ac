//! # Quire
//!
//! A page-balancing rich-text document engine.
//!
//! Browser editors that simulate printed pages usually let content run
//! off the page and clip it, or re-slice an infinite canvas after every
//! keystroke. Quire does neither: **the sheet is the fundamental unit of
//! the document.** Content lives as whole blocks on fixed-size sheets,
//! and a balancer migrates blocks between adjacent sheets — overflow
//! spills forward, underflow pulls back — so the document is always a
//! valid stack of full-but-not-overfull pages.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON / editor commands)
//!       ↓
//!   [model]    — Sheets, blocks, runs, chrome
//!       ↓
//!   [measure]  — Estimated block heights (font metrics, line breaking)
//!       ↓
//!   [balance]  — Overflow/underflow migration + check scheduler
//!       ↓
//!   [render]   — Print-ready HTML, one fixed-size sheet per page
//!       ↓
//!   [export]   — External rasterizer boundary → PDF artifact
//! ```
//!
//! The interactive path layers [`editor::Editor`] over the same pieces:
//! edits mark sheets content-changed, the scheduler coalesces the
//! checks, and [`editor::Editor::poll`] runs the balancer.

pub mod balance;
pub mod docs;
pub mod editor;
pub mod error;
pub mod export;
pub mod image_probe;
pub mod measure;
pub mod model;
pub mod render;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use balance::{BalanceReport, Balancer};
pub use error::QuireError;
pub use measure::{Measure, TextMeasurer};
pub use model::{Block, BlockId, DraftDocument, PagedDocument, Sheet, SheetChrome, SheetFormat};

/// Pour a draft's blocks into sheets and balance to a fixed point.
///
/// This is the primary entry point for composed documents: everything
/// starts on one sheet, overflow cascades forward, and the result is a
/// paginated document no sheet of which is overfull.
pub fn compose(draft: DraftDocument, measure: &impl Measure) -> PagedDocument {
    let mut doc = PagedDocument {
        format: draft.format,
        chrome: draft.chrome,
        metadata: draft.metadata,
        sheets: vec![Sheet { blocks: draft.blocks }],
    };
    doc.normalize();
    let mut active = 0;
    Balancer::new(measure).balance(&mut doc, &mut active);
    doc
}

/// Compose a draft described as JSON.
pub fn compose_json(json: &str, measure: &impl Measure) -> Result<PagedDocument, QuireError> {
    let draft: DraftDocument = serde_json::from_str(json)?;
    Ok(compose(draft, measure))
}

/// JSON draft in, print-ready markup out — the one-call pipeline the
/// CLI and the wasm boundary use.
pub fn compose_html(json: &str) -> Result<String, QuireError> {
    let measurer = TextMeasurer::new();
    let doc = compose_json(json, &measurer)?;
    render::render_html(&doc)
}

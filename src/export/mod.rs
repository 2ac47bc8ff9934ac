//! # Export Boundary
//!
//! The hand-off to the external HTML-to-PDF capability. The crate never
//! rasterizes: [`Rasterize`] is implemented by the host (a headless
//! browser, a print service), and [`export`] does everything around it —
//! render the sheets to markup, validate the referenced images, derive
//! the raster options from the document's format, and package the
//! returned bytes as an [`ExportArtifact`] for download or email
//! dispatch. Rasterizer failures come back as errors, not as silently
//! dropped work.

use serde::{Deserialize, Serialize};

use crate::error::QuireError;
use crate::model::{BlockKind, PagedDocument};

/// Options for the external rasterizer: zero margins, one output page
/// per sheet at the sheet's fixed pixel size, JPEG image encoding,
/// cross-origin image loading enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterOptions {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    /// JPEG encoding quality in `0.0..=1.0`.
    pub jpeg_quality: f64,
    pub allow_cross_origin: bool,
}

impl RasterOptions {
    /// Derive the options from a document: the output page size is the
    /// sheet size, margins stay zero so the chrome the renderer painted
    /// is the whole page.
    pub fn for_document(doc: &PagedDocument) -> RasterOptions {
        let (page_width, page_height) = doc.format.dimensions();
        RasterOptions {
            page_width,
            page_height,
            margin: 0.0,
            jpeg_quality: 0.95,
            allow_cross_origin: true,
        }
    }
}

/// The opaque external HTML-to-PDF capability.
pub trait Rasterize {
    fn rasterize(&self, html: &str, options: &RasterOptions) -> Result<Vec<u8>, QuireError>;
}

/// Where the artifact goes after rasterization. The email POST itself is
/// the host API layer's job; the artifact just carries the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Delivery {
    Download,
    Email { recipient: String },
}

/// A finished export: PDF bytes plus the metadata the host needs to
/// save or send them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub delivery: Delivery,
}

/// Render, validate, rasterize, package.
pub fn export(
    doc: &PagedDocument,
    rasterizer: &dyn Rasterize,
    delivery: Delivery,
) -> Result<ExportArtifact, QuireError> {
    validate_images(doc)?;
    let html = crate::render::render_html(doc)?;
    let options = RasterOptions::for_document(doc);
    let bytes = rasterizer.rasterize(&html, &options)?;
    Ok(ExportArtifact {
        filename: filename_for(doc),
        content_type: "application/pdf",
        bytes,
        delivery,
    })
}

/// Probe every local image the document references so a broken source
/// surfaces here rather than inside the rasterizer.
fn validate_images(doc: &PagedDocument) -> Result<(), QuireError> {
    let mut sources: Vec<&str> = Vec::new();
    for sheet in &doc.sheets {
        for block in &sheet.blocks {
            if let BlockKind::Image { src, .. } = &block.kind {
                sources.push(src);
            }
        }
    }
    if let Some(logo) = &doc.chrome.letterhead.logo {
        sources.push(logo);
    }
    if let Some(watermark) = &doc.chrome.watermark {
        sources.push(watermark);
    }
    for src in sources {
        if !crate::image_probe::is_remote(src) {
            crate::image_probe::probe(src)?;
        }
    }
    Ok(())
}

/// `"Employment Agreement"` becomes `employment-agreement.pdf`.
fn filename_for(doc: &PagedDocument) -> String {
    let title = doc.metadata.title.as_deref().unwrap_or("document");
    let mut slug = String::new();
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "document.pdf".to_string()
    } else {
        format!("{slug}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Metadata, Sheet, SheetChrome, SheetFormat};
    use std::cell::RefCell;

    struct CapturingRasterizer {
        seen: RefCell<Option<RasterOptions>>,
    }

    impl Rasterize for CapturingRasterizer {
        fn rasterize(&self, html: &str, options: &RasterOptions) -> Result<Vec<u8>, QuireError> {
            *self.seen.borrow_mut() = Some(options.clone());
            assert!(html.contains("quire-document"));
            Ok(b"%PDF-1.7 fake".to_vec())
        }
    }

    struct FailingRasterizer;

    impl Rasterize for FailingRasterizer {
        fn rasterize(&self, _html: &str, _options: &RasterOptions) -> Result<Vec<u8>, QuireError> {
            Err(QuireError::Export("renderer crashed".to_string()))
        }
    }

    fn doc(title: &str) -> PagedDocument {
        PagedDocument {
            format: SheetFormat::A4Portrait,
            chrome: SheetChrome::default(),
            metadata: Metadata { title: Some(title.to_string()), ..Metadata::default() },
            sheets: vec![Sheet { blocks: vec![Block::text("body")] }],
        }
    }

    #[test]
    fn options_match_the_sheet_size_with_zero_margins() {
        let rasterizer = CapturingRasterizer { seen: RefCell::new(None) };
        let artifact = export(&doc("Payslip March"), &rasterizer, Delivery::Download).unwrap();
        let options = rasterizer.seen.borrow().clone().unwrap();
        assert_eq!(options.margin, 0.0);
        assert_eq!((options.page_width, options.page_height), (794.0, 1123.0));
        assert!(options.allow_cross_origin);
        assert_eq!(artifact.content_type, "application/pdf");
        assert_eq!(artifact.filename, "payslip-march.pdf");
    }

    #[test]
    fn email_delivery_carries_the_recipient() {
        let rasterizer = CapturingRasterizer { seen: RefCell::new(None) };
        let artifact = export(
            &doc("Expense Report"),
            &rasterizer,
            Delivery::Email { recipient: "hr@example.com".to_string() },
        )
        .unwrap();
        assert_eq!(
            artifact.delivery,
            Delivery::Email { recipient: "hr@example.com".to_string() }
        );
    }

    #[test]
    fn rasterizer_failure_propagates() {
        let err = export(&doc("x"), &FailingRasterizer, Delivery::Download).unwrap_err();
        assert!(matches!(err, QuireError::Export(_)));
    }

    #[test]
    fn broken_local_image_fails_before_rasterization() {
        let mut document = doc("x");
        document.sheets[0].blocks.push(Block::image("data:image/png;base64"));
        let err = export(&document, &FailingRasterizer, Delivery::Download).unwrap_err();
        assert!(matches!(err, QuireError::Image(_)), "image error beats rasterizer error");
    }

    #[test]
    fn untitled_documents_get_a_default_filename() {
        let mut document = doc("x");
        document.metadata.title = None;
        assert_eq!(filename_for(&document), "document.pdf");
    }
}

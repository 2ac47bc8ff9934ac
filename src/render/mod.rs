//! # Sheet Renderer
//!
//! Serializes a balanced [`PagedDocument`] into the print-ready markup
//! handed to the external rasterizer: one absolutely sized sheet `<div>`
//! per page, each with its header band (letterhead), watermark, content
//! region, and footer band (verification QR plus "Page N of M"). All
//! styling is inline — the rasterizer sees a self-contained subtree.
//!
//! Output goes through `quick-xml`'s event writer so text and attribute
//! values are escaped correctly.

use std::io::Cursor;

use base64::Engine as _;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::QuireError;
use crate::model::{Block, BlockKind, ListKind, PagedDocument, Run, SheetChrome, TableBlock};

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn start(w: &mut XmlWriter, tag: &str, attrs: &[(&str, &str)]) -> Result<(), QuireError> {
    let mut el = BytesStart::new(tag);
    for (k, v) in attrs {
        el.push_attribute((*k, *v));
    }
    w.write_event(Event::Start(el))
        .map_err(|e| QuireError::Render(e.to_string()))
}

fn end(w: &mut XmlWriter, tag: &str) -> Result<(), QuireError> {
    w.write_event(Event::End(BytesEnd::new(tag)))
        .map_err(|e| QuireError::Render(e.to_string()))
}

fn empty(w: &mut XmlWriter, tag: &str, attrs: &[(&str, &str)]) -> Result<(), QuireError> {
    let mut el = BytesStart::new(tag);
    for (k, v) in attrs {
        el.push_attribute((*k, *v));
    }
    w.write_event(Event::Empty(el))
        .map_err(|e| QuireError::Render(e.to_string()))
}

fn text(w: &mut XmlWriter, s: &str) -> Result<(), QuireError> {
    w.write_event(Event::Text(BytesText::new(s)))
        .map_err(|e| QuireError::Render(e.to_string()))
}

/// The footer QR, rendered to SVG and embedded as a data URI.
pub fn qr_data_uri(payload: &str) -> Result<String, QuireError> {
    let code = qrcode::QrCode::new(payload.as_bytes())
        .map_err(|e| QuireError::Render(format!("QR encoding failed: {e}")))?;
    let svg = code
        .render::<qrcode::render::svg::Color>()
        .min_dimensions(72, 72)
        .build();
    let b64 = base64::engine::general_purpose::STANDARD.encode(svg.as_bytes());
    Ok(format!("data:image/svg+xml;base64,{b64}"))
}

/// Serialize the document to markup, one fixed-size sheet per page.
pub fn render_html(doc: &PagedDocument) -> Result<String, QuireError> {
    let mut w: XmlWriter = Writer::new(Cursor::new(Vec::new()));
    let total = doc.sheets.len();

    start(&mut w, "div", &[("class", "quire-document")])?;
    for index in 0..total {
        render_sheet(&mut w, doc, index, total)?;
    }
    end(&mut w, "div")?;

    let bytes = w.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| QuireError::Render(e.to_string()))
}

fn render_sheet(
    w: &mut XmlWriter,
    doc: &PagedDocument,
    index: usize,
    total: usize,
) -> Result<(), QuireError> {
    let chrome = &doc.chrome;
    let (width, height) = doc.format.dimensions();
    let (cw, ch) = doc.content_size();

    let sheet_style = format!(
        "position:relative;width:{width}px;height:{height}px;background:#ffffff;\
         overflow:hidden;font-family:Helvetica,Arial,sans-serif;font-size:16px;\
         color:#1a1a1a;"
    );
    start(w, "div", &[("class", "sheet"), ("style", &sheet_style)])?;

    render_header(w, chrome, width)?;
    if let Some(src) = &chrome.watermark {
        let style = format!(
            "position:absolute;top:50%;left:50%;transform:translate(-50%,-50%);\
             max-width:{}px;opacity:0.08;pointer-events:none;",
            width * 0.6
        );
        empty(w, "img", &[("src", src), ("style", &style), ("alt", "")])?;
    }

    let content_style = format!(
        "position:absolute;top:{}px;left:{}px;width:{cw}px;height:{ch}px;overflow:hidden;",
        chrome.header_band, chrome.side_padding
    );
    start(w, "div", &[("class", "sheet-content"), ("style", &content_style)])?;
    for block in &doc.sheets[index].blocks {
        render_block(w, block)?;
    }
    end(w, "div")?;

    render_footer(w, chrome, index, total, index + 1 == total)?;
    end(w, "div")
}

fn render_header(w: &mut XmlWriter, chrome: &SheetChrome, width: f64) -> Result<(), QuireError> {
    let style = format!(
        "position:absolute;top:0;left:0;width:{width}px;height:{}px;box-sizing:border-box;\
         padding:16px {}px 0 {}px;border-bottom:1px solid #d9d9d9;",
        chrome.header_band, chrome.side_padding, chrome.side_padding
    );
    start(w, "div", &[("class", "sheet-header"), ("style", &style)])?;
    if let Some(logo) = &chrome.letterhead.logo {
        empty(w, "img", &[("src", logo), ("style", "height:48px;float:left;margin-right:16px;"), ("alt", "")])?;
    }
    if !chrome.letterhead.company.is_empty() {
        start(w, "div", &[("style", "font-size:20px;font-weight:bold;")])?;
        text(w, &chrome.letterhead.company)?;
        end(w, "div")?;
    }
    for line in &chrome.letterhead.address_lines {
        start(w, "div", &[("style", "font-size:11px;color:#555555;")])?;
        text(w, line)?;
        end(w, "div")?;
    }
    end(w, "div")
}

fn render_footer(
    w: &mut XmlWriter,
    chrome: &SheetChrome,
    index: usize,
    total: usize,
    last_sheet: bool,
) -> Result<(), QuireError> {
    let style = format!(
        "position:absolute;bottom:0;left:0;right:0;height:{}px;box-sizing:border-box;\
         padding:8px {}px;border-top:1px solid #d9d9d9;",
        chrome.footer_band, chrome.side_padding
    );
    start(w, "div", &[("class", "sheet-footer"), ("style", &style)])?;

    if let Some(payload) = &chrome.qr_payload {
        let uri = qr_data_uri(payload)?;
        empty(w, "img", &[("src", &uri), ("style", "height:64px;float:left;"), ("alt", "verification code")])?;
    }

    // The signatory belongs on the final sheet only.
    if last_sheet {
        if let Some(sig) = &chrome.signature {
            start(w, "div", &[("style", "float:right;text-align:center;font-size:11px;")])?;
            if let Some(img) = &sig.image {
                empty(w, "img", &[("src", img), ("style", "height:40px;display:block;margin:0 auto;"), ("alt", "")])?;
            }
            start(w, "div", &[("style", "font-weight:bold;")])?;
            text(w, &sig.name)?;
            end(w, "div")?;
            start(w, "div", &[])?;
            text(w, &sig.title)?;
            end(w, "div")?;
            end(w, "div")?;
        }
    }

    if chrome.show_page_numbers {
        start(
            w,
            "div",
            &[("class", "page-number"), ("style", "position:absolute;bottom:8px;left:0;right:0;text-align:center;font-size:10px;color:#888888;")],
        )?;
        text(w, &format!("Page {} of {}", index + 1, total))?;
        end(w, "div")?;
    }

    end(w, "div")
}

fn render_block(w: &mut XmlWriter, block: &Block) -> Result<(), QuireError> {
    match &block.kind {
        BlockKind::Paragraph { align, runs } => {
            let style = format!("margin:0 0 12px 0;text-align:{};", align.css());
            start(w, "p", &[("style", &style)])?;
            render_runs(w, runs)?;
            end(w, "p")
        }
        BlockKind::List { kind, items } => {
            let tag = match kind {
                ListKind::Unordered => "ul",
                ListKind::Ordered => "ol",
            };
            start(w, tag, &[("style", "margin:0 0 12px 0;padding-left:40px;")])?;
            for runs in items {
                start(w, "li", &[])?;
                render_runs(w, runs)?;
                end(w, "li")?;
            }
            end(w, tag)
        }
        BlockKind::Table(table) => render_table(w, table),
        BlockKind::Image { src, width, height } => {
            let mut style = String::from("display:block;max-width:100%;margin:0 0 12px 0;");
            if let Some(width) = width {
                style.push_str(&format!("width:{width}px;"));
            }
            if let Some(height) = height {
                style.push_str(&format!("height:{height}px;"));
            }
            empty(w, "img", &[("src", src), ("style", &style), ("alt", "")])
        }
        BlockKind::Divider => empty(
            w,
            "hr",
            &[("style", "border:none;border-top:1px solid #999999;margin:9px 0;")],
        ),
    }
}

fn render_table(w: &mut XmlWriter, table: &TableBlock) -> Result<(), QuireError> {
    let border = format!("{}px solid {}", table.border_width, table.border_color.to_css());
    let table_style = format!(
        "border-collapse:collapse;width:100%;margin:0 0 12px 0;border:{border};"
    );
    let cell_style = format!("border:{border};padding:8px;font-size:16px;text-align:left;");

    start(w, "table", &[("style", &table_style)])?;
    start(w, "thead", &[])?;
    start(w, "tr", &[])?;
    for cell in &table.header {
        start(w, "th", &[("style", &cell_style)])?;
        text(w, cell)?;
        end(w, "th")?;
    }
    end(w, "tr")?;
    end(w, "thead")?;
    start(w, "tbody", &[])?;
    for row in &table.rows {
        start(w, "tr", &[])?;
        for cell in row {
            start(w, "td", &[("style", &cell_style)])?;
            text(w, cell)?;
            end(w, "td")?;
        }
        end(w, "tr")?;
    }
    end(w, "tbody")?;
    end(w, "table")
}

/// Inline marks nest in a fixed order: strong, em, u, s, then a styled
/// span for font family, size, and color.
fn render_runs(w: &mut XmlWriter, runs: &[Run]) -> Result<(), QuireError> {
    for run in runs {
        let marks = &run.marks;
        let mut open: Vec<&str> = Vec::new();
        if marks.bold {
            open.push("strong");
        }
        if marks.italic {
            open.push("em");
        }
        if marks.underline {
            open.push("u");
        }
        if marks.strikethrough {
            open.push("s");
        }

        let mut span_style = String::new();
        if let Some(family) = &marks.font_family {
            span_style.push_str(&format!("font-family:{family};"));
        }
        if let Some(size) = marks.font_size {
            span_style.push_str(&format!("font-size:{size}px;"));
        }
        if let Some(color) = marks.color {
            span_style.push_str(&format!("color:{};", color.to_css()));
        }

        for tag in &open {
            start(w, tag, &[])?;
        }
        if span_style.is_empty() {
            text(w, &run.text)?;
        } else {
            start(w, "span", &[("style", &span_style)])?;
            text(w, &run.text)?;
            end(w, "span")?;
        }
        for tag in open.iter().rev() {
            end(w, tag)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alignment, Marks, Metadata, Sheet, SheetFormat};

    fn doc_with_blocks(blocks: Vec<Block>) -> PagedDocument {
        PagedDocument {
            format: SheetFormat::A4Portrait,
            chrome: SheetChrome::default(),
            metadata: Metadata::default(),
            sheets: vec![Sheet { blocks }],
        }
    }

    #[test]
    fn text_content_is_escaped() {
        let doc = doc_with_blocks(vec![Block::text("a < b & \"c\"")]);
        let html = render_html(&doc).unwrap();
        assert!(html.contains("a &lt; b &amp;"));
        assert!(!html.contains("a < b"));
    }

    #[test]
    fn page_numbers_count_all_sheets() {
        let mut doc = doc_with_blocks(vec![Block::text("one")]);
        doc.sheets.push(Sheet { blocks: vec![Block::text("two")] });
        let html = render_html(&doc).unwrap();
        assert!(html.contains("Page 1 of 2"));
        assert!(html.contains("Page 2 of 2"));
    }

    #[test]
    fn qr_renders_as_svg_data_uri() {
        let mut doc = doc_with_blocks(vec![Block::text("x")]);
        doc.chrome.qr_payload =
            Some("https://example.com/payslip/verify?qrid=42".to_string());
        let html = render_html(&doc).unwrap();
        assert!(html.contains("data:image/svg+xml;base64,"));
    }

    #[test]
    fn marks_nest_as_inline_tags() {
        let doc = doc_with_blocks(vec![Block::paragraph(vec![Run::styled(
            "loud",
            Marks { bold: true, italic: true, ..Marks::default() },
        )])]);
        let html = render_html(&doc).unwrap();
        assert!(html.contains("<strong><em>loud</em></strong>"));
    }

    #[test]
    fn alignment_becomes_inline_style() {
        let doc = doc_with_blocks(vec![
            Block::text("centered").with_align(Alignment::Center)
        ]);
        let html = render_html(&doc).unwrap();
        assert!(html.contains("text-align:center;"));
    }

    #[test]
    fn table_markup_has_header_and_body_rows() {
        let draft = crate::model::TableDraft { rows: 3, cols: 2, ..Default::default() };
        let doc = doc_with_blocks(vec![Block {
            id: crate::model::BlockId::UNSET,
            kind: draft.into_block(),
        }]);
        let html = render_html(&doc).unwrap();
        assert_eq!(html.matches("<th ").count(), 2);
        assert_eq!(html.matches("<td ").count(), 4);
        assert!(html.contains("Header 1"));
        assert!(html.contains("Cell 2"));
    }

    #[test]
    fn sheet_div_is_sized_to_the_format() {
        let doc = doc_with_blocks(vec![Block::text("x")]);
        let html = render_html(&doc).unwrap();
        assert!(html.contains("width:794px;height:1123px;"));
    }
}

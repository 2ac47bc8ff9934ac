//! # Image Probing
//!
//! Resolves an image source string — data URI, file path, or raw base64 —
//! to its intrinsic pixel dimensions without a full decode. The measurer
//! uses the dimensions to estimate an image block's display height, and
//! export validates every referenced local image up front so a broken
//! source fails the export instead of the rasterization.
//!
//! Remote URLs are not probed; cross-origin loading is the rasterizer's
//! concern.

use std::io::Cursor;

use base64::Engine as _;

use crate::error::QuireError;

/// True for sources the rasterizer loads over the network.
pub fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// Intrinsic `(width, height)` in pixels of a local image source.
pub fn probe(src: &str) -> Result<(u32, u32), QuireError> {
    let bytes = read_source_bytes(src)?;
    dimensions_of(&bytes)
}

/// Resolve the source string to raw image bytes.
fn read_source_bytes(src: &str) -> Result<Vec<u8>, QuireError> {
    // Data URI: data:image/png;base64,iVBOR...
    if src.starts_with("data:image/") {
        let comma = src
            .find(',')
            .ok_or_else(|| QuireError::Image("invalid data URI: missing comma".to_string()))?;
        return base64_decode(&src[comma + 1..]);
    }

    // Only explicit path prefixes count as paths; base64 strings contain
    // '/' and must not be read from disk.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        #[cfg(not(target_arch = "wasm32"))]
        {
            return std::fs::read(src)
                .map_err(|e| QuireError::Image(format!("could not read image '{src}': {e}")));
        }
        #[cfg(target_arch = "wasm32")]
        {
            return Err(QuireError::Image(format!(
                "file path images are not available in wasm: '{src}'"
            )));
        }
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, QuireError> {
    base64::engine::general_purpose::STANDARD
        .decode(input)
        .map_err(|e| QuireError::Image(format!("base64 decode failed: {e}")))
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

/// Sniff the format and read dimensions without decoding pixels.
fn dimensions_of(data: &[u8]) -> Result<(u32, u32), QuireError> {
    if data.len() < 12 {
        return Err(QuireError::Image("image data too short".to_string()));
    }
    if !is_jpeg(data) && !is_png(data) && !is_webp(data) {
        return Err(QuireError::Image(
            "unsupported image format (expected JPEG, PNG, or WebP)".to_string(),
        ));
    }

    image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| QuireError::Image(format!("format detection failed: {e}")))?
        .into_dimensions()
        .map_err(|e| QuireError::Image(format!("could not read dimensions: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 255, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            width,
            height,
            image::ColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn data_uri_probes_to_intrinsic_size() {
        let b64 = base64::engine::general_purpose::STANDARD.encode(png_bytes(3, 2));
        let uri = format!("data:image/png;base64,{b64}");
        assert_eq!(probe(&uri).unwrap(), (3, 2));
    }

    #[test]
    fn raw_base64_is_accepted() {
        let b64 = base64::engine::general_purpose::STANDARD.encode(png_bytes(1, 1));
        assert_eq!(probe(&b64).unwrap(), (1, 1));
    }

    #[test]
    fn missing_comma_in_data_uri_is_an_error() {
        let err = probe("data:image/png;base64").unwrap_err();
        assert!(matches!(err, QuireError::Image(_)));
    }

    #[test]
    fn unsupported_format_is_an_error() {
        let b64 = base64::engine::general_purpose::STANDARD.encode([0u8; 64]);
        assert!(probe(&b64).is_err());
    }

    #[test]
    fn remote_sources_are_classified_not_probed() {
        assert!(is_remote("https://example.com/a.png"));
        assert!(!is_remote("./local.png"));
        assert!(!is_remote("data:image/png;base64,xxxx"));
    }
}

//! # Logo Loading
//!
//! Loads the invoice logo from a file path or a `data:image/...;base64,` URI
//! and sizes it into the header's bounding box. JPEG bytes pass through
//! untouched (PDF embeds them with DCTDecode); PNG is decoded to RGB with a
//! separate alpha channel for the SMask.

use std::io::Cursor;

use crate::error::InvoiceError;

/// Default bounding box for the logo, in pixels.
pub const DEFAULT_MAX_LOGO_PX: (u32, u32) = (230, 130);

const MM_PER_INCH: f64 = 25.4;
const SCREEN_DPI: f64 = 96.0;

/// A fully decoded/loaded image ready for PDF embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

/// The pixel data in a format the PDF serializer can consume directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixelData {
    /// Raw JPEG bytes, embedded directly with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded RGB pixels + optional alpha channel.
    Decoded {
        /// width * height * 3 bytes (RGB)
        rgb: Vec<u8>,
        /// width * height bytes (grayscale alpha). None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// A logo with its on-page size in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    pub image: LoadedImage,
    pub width: f64,
    pub height: f64,
}

impl Logo {
    /// Load and size a logo. `None` when the source is missing or unreadable;
    /// the header then lays out as if there were no logo at all.
    pub fn load(src: &str, max_px: (u32, u32)) -> Option<Logo> {
        match load_image(src) {
            Ok(image) => {
                let (width, height) = fit_to_box(image.width_px, image.height_px, max_px);
                Some(Logo {
                    image,
                    width,
                    height,
                })
            }
            Err(e) => {
                log::warn!("logo '{}' ignored: {}", src, e);
                None
            }
        }
    }
}

/// Scale `width_px` x `height_px` to fit `max_px` keeping aspect ratio, and
/// convert to whole millimetres at screen resolution.
pub fn fit_to_box(width_px: u32, height_px: u32, max_px: (u32, u32)) -> (f64, f64) {
    if width_px == 0 || height_px == 0 {
        return (0.0, 0.0);
    }
    let scale = (max_px.0 as f64 / width_px as f64).min(max_px.1 as f64 / height_px as f64);
    (
        pixels_to_mm(scale * width_px as f64).round(),
        pixels_to_mm(scale * height_px as f64).round(),
    )
}

fn pixels_to_mm(px: f64) -> f64 {
    px * MM_PER_INCH / SCREEN_DPI
}

/// Load an image from a source string.
///
/// Supported `src` formats:
/// - `data:image/...;base64,...` data URI
/// - a file path
pub fn load_image(src: &str) -> Result<LoadedImage, InvoiceError> {
    let raw_bytes = read_source_bytes(src)?;
    decode_image_bytes(&raw_bytes)
}

/// Resolve the source string to raw image bytes.
fn read_source_bytes(src: &str) -> Result<Vec<u8>, InvoiceError> {
    if src.starts_with("data:image/") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| InvoiceError::Image("Invalid data URI: missing comma".to_string()))?;
        return base64_decode(&src[comma_pos + 1..]);
    }

    std::fs::read(src)
        .map_err(|e| InvoiceError::Image(format!("Failed to read image file '{}': {}", src, e)))
}

fn base64_decode(input: &str) -> Result<Vec<u8>, InvoiceError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| InvoiceError::Image(format!("Base64 decode error: {}", e)))
}

/// Detect image format from magic bytes and decode accordingly.
fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, InvoiceError> {
    if data.len() < 4 {
        return Err(InvoiceError::Image("Image data too short".to_string()));
    }

    if is_jpeg(data) {
        decode_jpeg(data)
    } else if is_png(data) {
        decode_png(data)
    } else {
        Err(InvoiceError::Image(
            "Unsupported image format (expected JPEG or PNG)".to_string(),
        ))
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

/// JPEG: read dimensions and color space without decoding pixels.
fn decode_jpeg(data: &[u8]) -> Result<LoadedImage, InvoiceError> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| InvoiceError::Image(format!("JPEG format detection error: {}", e)))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| InvoiceError::Image(format!("Failed to read JPEG dimensions: {}", e)))?;

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: detect_jpeg_color_space(data),
        },
        width_px: width,
        height_px: height,
    })
}

/// Scan JPEG markers for the SOF segment and read the component count.
fn detect_jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2; // skip SOI marker (FF D8)
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            // length(2) + precision(1) + height(2) + width(2) + num_components(1)
            return if data[i + 9] == 1 {
                JpegColorSpace::DeviceGray
            } else {
                JpegColorSpace::DeviceRGB
            };
        }
        if i + 3 < data.len() {
            let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            i += 2 + seg_len;
        } else {
            break;
        }
    }
    JpegColorSpace::DeviceRGB
}

/// PNG: decode to RGBA, split into RGB + alpha.
fn decode_png(data: &[u8]) -> Result<LoadedImage, InvoiceError> {
    let img = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| InvoiceError::Image(format!("PNG format detection error: {}", e)))?
        .decode()
        .map_err(|e| InvoiceError::Image(format!("Failed to decode PNG: {}", e)))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    let mut has_transparency = false;

    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
        has_transparency |= pixel[3] != 255;
    }

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: has_transparency.then_some(alpha),
        },
        width_px: width,
        height_px: height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), w, h, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    #[test]
    fn test_magic_bytes() {
        assert!(is_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!is_jpeg(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(is_png(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(!is_png(&[0x89, 0x50]));
    }

    #[test]
    fn test_unsupported_format() {
        assert!(decode_image_bytes(&[0x00, 0x01, 0x02, 0x03, 0x04]).is_err());
        assert!(decode_image_bytes(&[0x00, 0x01]).is_err());
    }

    #[test]
    fn test_decode_png_with_alpha() {
        let loaded = decode_image_bytes(&png_bytes(1, 1, [255, 0, 0, 128])).unwrap();
        match &loaded.pixel_data {
            ImagePixelData::Decoded { rgb, alpha } => {
                assert_eq!(rgb, &[255, 0, 0]);
                assert_eq!(alpha.as_ref().unwrap(), &[128]);
            }
            _ => panic!("PNG should decode to Decoded variant"),
        }
    }

    #[test]
    fn test_decode_minimal_jpeg() {
        let img = image::RgbImage::from_fn(2, 2, |_, _| image::Rgb([0, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 2, 2, image::ColorType::Rgb8)
            .unwrap();

        let loaded = decode_image_bytes(&buf).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (2, 2));
        assert!(matches!(
            loaded.pixel_data,
            ImagePixelData::Jpeg { color_space: JpegColorSpace::DeviceRGB, .. }
        ));
    }

    #[test]
    fn test_data_uri_logo() {
        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD.encode(png_bytes(460, 130, [0, 0, 0, 255]));
        let logo = Logo::load(&format!("data:image/png;base64,{}", b64), DEFAULT_MAX_LOGO_PX).unwrap();
        // 460x130 scaled by 0.5 -> 230x65 px -> 60.85 x 17.2 mm
        assert_eq!(logo.width, 61.0);
        assert_eq!(logo.height, 17.0);
    }

    #[test]
    fn missing_logo_degrades_to_none() {
        assert!(Logo::load("/definitely/not/here.png", DEFAULT_MAX_LOGO_PX).is_none());
        assert!(Logo::load("data:image/png;base64", DEFAULT_MAX_LOGO_PX).is_none());
    }

    #[test]
    fn fit_keeps_aspect_ratio() {
        let (w, h) = fit_to_box(100, 100, (230, 130));
        assert_eq!(w, h);
        assert_eq!(fit_to_box(0, 10, (230, 130)), (0.0, 0.0));
    }
}

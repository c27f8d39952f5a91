//! # PDF Serializer
//!
//! Takes the recorded canvas pages and writes a PDF 1.7 file.
//!
//! The writer is hand-rolled: the subset an invoice needs (base-14 fonts,
//! filled and stroked paths, one optional raster logo, a rotation matrix) is
//! small, and writing the bytes ourselves keeps the output fully
//! deterministic. There are no timestamps and no random IDs, so the same
//! pages always serialize to the same bytes.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- Catalog
//! 2 0 obj ... endobj  <- Pages
//! ...                 <- fonts, images, content streams, pages, Info
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Canvas coordinates are millimetres from the top-left corner; PDF user
//! space is points from the bottom-left. Every coordinate goes through
//! [`PT_PER_MM`] and a y flip.

use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::canvas::{DrawCommand, ImageId, PageSet};
use crate::font::{FontContext, FontKey};
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::style::{Color, FontFamily, FontWeight};
use crate::text::PT_PER_MM;

const PRODUCER: &str = "invoicr";

#[derive(Debug, Default)]
pub struct PdfWriter {
    fonts: FontContext,
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
    /// Font keys in resource order (/F0, /F1, ...) with their object IDs.
    font_objects: Vec<(FontKey, usize)>,
    /// XObject IDs, indexed by [`ImageId`] as /Im0, /Im1, ...
    image_objects: Vec<usize>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    fn stream(&mut self, dict_entries: &str, data: &[u8]) -> usize {
        let mut obj: Vec<u8> = Vec::with_capacity(data.len() + 64);
        let _ = write!(obj, "<< {} /Length {} >>\nstream\n", dict_entries, data.len());
        obj.extend_from_slice(data);
        obj.extend_from_slice(b"\nendstream");
        self.push(obj)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self {
            fonts: FontContext::new(),
        }
    }

    /// Write the pages to a PDF byte vector. `title` goes into the Info
    /// dictionary when non-empty.
    pub fn write(&self, set: &PageSet, title: &str) -> Vec<u8> {
        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        let mut builder = PdfBuilder {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
            font_objects: Vec::new(),
            image_objects: Vec::new(),
        };

        self.register_fonts(&mut builder, set);
        for image in &set.images {
            let id = Self::write_image_xobject(&mut builder, image);
            builder.image_objects.push(id);
        }

        let font_resources = Self::build_font_resource_dict(&builder.font_objects);
        let mut page_obj_ids = Vec::with_capacity(set.pages.len());
        for page in &set.pages {
            let content = self.build_content_stream(&page.commands, page.height, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let content_obj_id = builder.stream("/Filter /FlateDecode", &compressed);

            let xobjects = Self::build_xobject_resource_dict(&page.commands, &builder);
            let resources = if xobjects.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!("/Font << {} >> /XObject << {} >>", font_resources, xobjects)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width * PT_PER_MM,
                page.height * PT_PER_MM,
                content_obj_id,
                resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2] = format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_obj_ids.len()).into_bytes();

        let mut info = String::from("<< ");
        if !title.is_empty() {
            let _ = write!(info, "/Title ({}) ", Self::encode_text(title));
        }
        let _ = write!(info, "/Producer ({}) /Creator ({}) >>", PRODUCER, PRODUCER);
        let info_obj_id = builder.push(info.into_bytes());

        Self::serialize(&builder, info_obj_id)
    }

    /// Collect the faces used by text runs, in a stable order.
    fn register_fonts(&self, builder: &mut PdfBuilder, set: &PageSet) {
        let mut keys: BTreeSet<FontKey> = set
            .pages
            .iter()
            .flat_map(|p| p.commands.iter())
            .filter_map(|c| match c {
                DrawCommand::Text { style, .. } => Some(FontKey::of(style)),
                _ => None,
            })
            .collect();

        // Always have at least Helvetica
        if keys.is_empty() {
            keys.insert(FontKey {
                family: FontFamily::Helvetica,
                weight: FontWeight::Regular,
            });
        }

        for key in keys {
            let font_dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                self.fonts.resolve(key).pdf_name()
            );
            let obj_id = builder.push(font_dict.into_bytes());
            builder.font_objects.push((key, obj_id));
        }
    }

    fn build_content_stream(&self, commands: &[DrawCommand], page_height: f64, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        let k = PT_PER_MM;
        let mut rotated = false;

        for command in commands {
            match command {
                DrawCommand::Text { x, y, text, style } => {
                    let font = Self::font_index(&builder.font_objects, FontKey::of(style));
                    let _ = write!(
                        stream,
                        "BT\n{} rg\n/F{} {:.2} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
                        Self::color_operands(&style.color),
                        font,
                        style.size,
                        x * k,
                        (page_height - y) * k,
                        Self::encode_text(text)
                    );
                }

                DrawCommand::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    stroke,
                } => {
                    let rect = format!(
                        "{:.2} {:.2} {:.2} {:.2} re",
                        x * k,
                        (page_height - y - height) * k,
                        width * k,
                        height * k
                    );
                    if let Some(bg) = fill {
                        let _ = write!(stream, "q\n{} rg\n{}\nf\nQ\n", Self::color_operands(bg), rect);
                    }
                    if let Some((color, line_width)) = stroke {
                        let _ = write!(
                            stream,
                            "q\n{} RG\n{:.2} w\n{}\nS\nQ\n",
                            Self::color_operands(color),
                            line_width * k,
                            rect
                        );
                    }
                }

                DrawCommand::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    color,
                    width,
                } => {
                    let _ = write!(
                        stream,
                        "q\n{} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                        Self::color_operands(color),
                        width * k,
                        x1 * k,
                        (page_height - y1) * k,
                        x2 * k,
                        (page_height - y2) * k
                    );
                }

                DrawCommand::Image {
                    x,
                    y,
                    width,
                    height,
                    image,
                } => {
                    if image.0 < builder.image_objects.len() {
                        let _ = write!(
                            stream,
                            "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                            width * k,
                            height * k,
                            x * k,
                            (page_height - y - height) * k,
                            image.0
                        );
                    }
                }

                DrawCommand::Rotate { angle, cx, cy } => {
                    if rotated {
                        stream.push_str("Q\n");
                    }
                    let (s, c) = angle.to_radians().sin_cos();
                    let (px, py) = (cx * k, (page_height - cy) * k);
                    let _ = write!(
                        stream,
                        "q {:.5} {:.5} {:.5} {:.5} {:.2} {:.2} cm 1 0 0 1 {:.2} {:.2} cm\n",
                        c, s, -s, c, px, py, -px, -py
                    );
                    rotated = true;
                }

                DrawCommand::ResetRotation => {
                    if rotated {
                        stream.push_str("Q\n");
                        rotated = false;
                    }
                }
            }
        }

        if rotated {
            stream.push_str("Q\n");
        }
        stream
    }

    fn color_operands(color: &Color) -> String {
        format!("{:.3} {:.3} {:.3}", color.r, color.g, color.b)
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space_str = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode",
                    image.width_px, image.height_px, color_space_str
                );
                builder.stream(&dict, data)
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                // SMask first, so the image can reference it
                let smask_ref = alpha
                    .as_ref()
                    .map(|alpha_data| {
                        let dict = format!(
                            "/Type /XObject /Subtype /Image /Width {} /Height {} \
                             /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode",
                            image.width_px, image.height_px
                        );
                        let id = builder.stream(&dict, &compress_to_vec_zlib(alpha_data, 6));
                        format!(" /SMask {} 0 R", id)
                    })
                    .unwrap_or_default();

                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{}",
                    image.width_px, image.height_px, smask_ref
                );
                builder.stream(&dict, &compress_to_vec_zlib(rgb, 6))
            }
        }
    }

    /// /XObject entries for the images a page actually draws.
    fn build_xobject_resource_dict(commands: &[DrawCommand], builder: &PdfBuilder) -> String {
        let used: BTreeSet<usize> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Image { image: ImageId(i), .. } if *i < builder.image_objects.len() => Some(*i),
                _ => None,
            })
            .collect();
        used.iter()
            .map(|i| format!("/Im{} {} 0 R", i, builder.image_objects[*i]))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_font_resource_dict(font_objects: &[(FontKey, usize)]) -> String {
        font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Resource index of a face; falls back to the first registered font.
    fn font_index(font_objects: &[(FontKey, usize)], key: FontKey) -> usize {
        font_objects.iter().position(|(k, _)| *k == key).unwrap_or(0)
    }

    /// Encode text as the body of a PDF literal string in WinAnsi.
    ///
    /// Characters outside WinAnsi become `?`.
    fn encode_text(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Most codepoints in
    /// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
    /// contains special mappings for smart quotes, bullets, dashes, etc.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82),
            0x0192 => Some(0x83),
            0x201E => Some(0x84),
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86),
            0x2021 => Some(0x87),
            0x02C6 => Some(0x88),
            0x2030 => Some(0x89),
            0x0160 => Some(0x8A),
            0x2039 => Some(0x8B),
            0x0152 => Some(0x8C),
            0x017D => Some(0x8E),
            0x2018 => Some(0x91),
            0x2019 => Some(0x92),
            0x201C => Some(0x93),
            0x201D => Some(0x94),
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98),
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A),
            0x203A => Some(0x9B),
            0x0153 => Some(0x9C),
            0x017E => Some(0x9E),
            0x0178 => Some(0x9F),
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(obj);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasPage;
    use crate::style::TextStyle;

    fn page(commands: Vec<DrawCommand>) -> PageSet {
        PageSet {
            pages: vec![CanvasPage {
                width: 210.0,
                height: 297.0,
                commands,
            }],
            images: Vec::new(),
        }
    }

    fn text(s: &str, style: TextStyle) -> DrawCommand {
        DrawCommand::Text {
            x: 20.0,
            y: 30.0,
            text: s.to_string(),
            style,
        }
    }

    #[test]
    fn test_encode_text_escapes() {
        assert_eq!(PdfWriter::encode_text("Hello (World)"), "Hello \\(World\\)");
        assert_eq!(PdfWriter::encode_text("back\\slash"), "back\\\\slash");
        assert_eq!(PdfWriter::encode_text("€ 5"), "\\200 5");
        assert_eq!(PdfWriter::encode_text("é"), "\\351");
        assert_eq!(PdfWriter::encode_text("日"), "?");
    }

    #[test]
    fn test_empty_document_produces_valid_pdf() {
        let bytes = PdfWriter::new().write(&page(vec![]), "");
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
        assert!(bytes.windows(4).any(|w| w == b"xref"));
        assert!(bytes.windows(7).any(|w| w == b"trailer"));
        let s = String::from_utf8_lossy(&bytes);
        assert!(s.contains("/MediaBox [0 0 595.28 841.89]"));
        assert!(s.contains("/BaseFont /Helvetica "));
    }

    #[test]
    fn test_title_in_info() {
        let bytes = PdfWriter::new().write(&page(vec![]), "Invoice INV-1");
        let s = String::from_utf8_lossy(&bytes);
        assert!(s.contains("/Title (Invoice INV-1)"));
        assert!(s.contains("/Producer (invoicr)"));
        assert!(!s.contains("CreationDate"));
    }

    #[test]
    fn test_bold_font_registered_separately() {
        let regular = TextStyle::regular(FontFamily::Helvetica, 8.0, Color::BLACK);
        let bold = TextStyle::bold(FontFamily::Helvetica, 8.0, Color::BLACK);
        let bytes = PdfWriter::new().write(&page(vec![text("a", regular), text("b", bold)]), "");
        let s = String::from_utf8_lossy(&bytes);
        assert!(s.contains("/BaseFont /Helvetica "));
        assert!(s.contains("/BaseFont /Helvetica-Bold"));
    }

    #[test]
    fn test_rotation_is_balanced() {
        let writer = PdfWriter::new();
        let stream = writer.build_content_stream(
            &[
                DrawCommand::Rotate {
                    angle: 10.0,
                    cx: 20.0,
                    cy: 100.0,
                },
                DrawCommand::ResetRotation,
                DrawCommand::Rotate {
                    angle: 90.0,
                    cx: 0.0,
                    cy: 0.0,
                },
            ],
            297.0,
            &PdfBuilder {
                objects: Vec::new(),
                font_objects: Vec::new(),
                image_objects: Vec::new(),
            },
        );
        assert_eq!(stream.matches("q ").count(), 2);
        assert_eq!(stream.matches("Q\n").count(), 2);
        assert!(stream.contains("0.98481 0.17365 -0.17365 0.98481"));
    }

    #[test]
    fn test_png_logo_becomes_xobject_with_smask() {
        let mut set = page(vec![DrawCommand::Image {
            x: 20.0,
            y: 20.0,
            width: 10.0,
            height: 10.0,
            image: ImageId(0),
        }]);
        set.images.push(LoadedImage {
            pixel_data: ImagePixelData::Decoded {
                rgb: vec![255, 0, 0],
                alpha: Some(vec![128]),
            },
            width_px: 1,
            height_px: 1,
        });
        let s = String::from_utf8_lossy(&PdfWriter::new().write(&set, "")).into_owned();
        assert!(s.contains("/SMask"));
        assert!(s.contains("/XObject << /Im0"));
        assert!(s.contains("/Im0 Do"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let style = TextStyle::regular(FontFamily::Times, 9.0, Color::gray(50.0));
        let set = page(vec![text("Same", style)]);
        let writer = PdfWriter::new();
        assert_eq!(writer.write(&set, "t"), writer.write(&set, "t"));
    }
}

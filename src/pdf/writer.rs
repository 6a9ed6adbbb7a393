//! Single-page certificate PDF: one JPEG background plus one line of text.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::error::{AppError, AppResult};

/// Pixels are laid out at 100 dpi.
pub const PT_PER_PX: f32 = 72.0 / 100.0;

pub struct TextRun<'a> {
    pub text: &'a str,
    pub font_size: f32,
    /// Left edge and baseline, in points from the bottom-left corner.
    pub x: f32,
    pub y: f32,
    pub rgb: [u8; 3],
    pub visible: bool,
}

pub struct PageSpec<'a> {
    pub width_px: u32,
    pub height_px: u32,
    pub jpeg: &'a [u8],
    pub text: TextRun<'a>,
    pub font_name: &'a str,
    pub title: &'a str,
}

pub fn write_certificate_page(page: &PageSpec<'_>) -> AppResult<Vec<u8>> {
    let width_pt = page.width_px as f32 * PT_PER_PX;
    let height_pt = page.height_px as f32 * PT_PER_PX;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => page.width_px,
            "Height" => page.height_px,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        page.jpeg.to_vec(),
    ));
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => page.font_name,
        "Encoding" => "WinAnsiEncoding",
    });

    let content = page_content(width_pt, height_pt, &page.text).encode().map_err(AppError::render)?;
    // Left uncompressed so the text run stays readable in the raw file.
    let content_id = doc.add_object(Stream::new(dictionary! {}, content).with_compression(false));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Real(width_pt), Object::Real(height_pt)],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im1" => image_id },
            "Font" => dictionary! { "F1" => font_id },
        },
        "Contents" => content_id,
    });
    doc.set_object(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        },
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    // No creation or modification dates: the same page always serialises the same way.
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(latin1(page.title)),
        "Producer" => Object::string_literal("certdist"),
    });
    let document_id = Object::String(fingerprint(page), StringFormat::Hexadecimal);

    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.trailer.set("ID", vec![document_id.clone(), document_id]);

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(AppError::render)?;
    Ok(out)
}

fn page_content(width_pt: f32, height_pt: f32, text: &TextRun<'_>) -> Content {
    let [r, g, b] = text.rgb.map(|c| f32::from(c) / 255.0);
    Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![width_pt.into(), 0.into(), 0.into(), height_pt.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), text.font_size.into()]),
            Operation::new("Tr", vec![Object::Integer(if text.visible { 0 } else { 3 })]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("Td", vec![text.x.into(), text.y.into()]),
            Operation::new("Tj", vec![Object::string_literal(latin1(text.text))]),
            Operation::new("ET", vec![]),
        ],
    }
}

/// Stable 16-byte file identifier derived from the page contents.
fn fingerprint(page: &PageSpec<'_>) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(16);
    for salt in [0u8, 1] {
        let mut hasher = DefaultHasher::new();
        salt.hash(&mut hasher);
        page.title.hash(&mut hasher);
        page.text.text.hash(&mut hasher);
        page.jpeg.hash(&mut hasher);
        bytes.extend_from_slice(&hasher.finish().to_be_bytes());
    }
    bytes
}

/// WinAnsi bytes for the built-in font: Latin-1 passes through, anything wider becomes `?`.
pub fn latin1(input: &str) -> Vec<u8> {
    input
        .chars()
        .map(|ch| match u32::from(ch) {
            c if c < 0x20 => b' ',
            c => u8::try_from(c).unwrap_or(b'?'),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Page text as a reader would extract it.
    pub(crate) fn extract_text(pdf: &[u8]) -> String {
        Document::load_mem(pdf).unwrap().extract_text(&[1]).unwrap()
    }

    /// Decoded operations of the only page.
    pub(crate) fn page_operations(pdf: &[u8]) -> Vec<Operation> {
        let doc = Document::load_mem(pdf).unwrap();
        let page_id = doc.get_pages()[&1];
        Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap().operations
    }

    pub(crate) fn media_box(pdf: &[u8]) -> Vec<f32> {
        let doc = Document::load_mem(pdf).unwrap();
        let page_id = doc.get_pages()[&1];
        doc.get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n.as_float().unwrap())
            .collect()
    }

    pub(crate) fn assert_box(media_box: &[f32], width_pt: f32, height_pt: f32) {
        assert_eq!(media_box.len(), 4);
        assert_eq!(&media_box[..2], &[0.0, 0.0]);
        assert!((media_box[2] - width_pt).abs() < 0.01, "width {}", media_box[2]);
        assert!((media_box[3] - height_pt).abs() < 0.01, "height {}", media_box[3]);
    }

    pub(crate) fn render_mode(pdf: &[u8]) -> i64 {
        page_operations(pdf)
            .iter()
            .find(|op| op.operator == "Tr")
            .map(|op| op.operands[0].as_i64().unwrap())
            .unwrap()
    }

    fn sample(text: &str, visible: bool) -> Vec<u8> {
        write_certificate_page(&PageSpec {
            width_px: 200,
            height_px: 100,
            jpeg: b"\xFF\xD8fakejpeg\xFF\xD9",
            text: TextRun {
                text,
                font_size: 24.0,
                x: 10.0,
                y: 20.5,
                rgb: [26, 26, 26],
                visible,
            },
            font_name: "Helvetica-Bold",
            title: "Certificate",
        })
        .unwrap()
    }

    #[test]
    fn page_carries_image_and_text() {
        let pdf = sample("Jane Doe", true);
        assert!(pdf.starts_with(b"%PDF-1.5"));
        assert_box(&media_box(&pdf), 144.0, 72.0);
        assert!(extract_text(&pdf).contains("Jane Doe"));

        let ops = page_operations(&pdf);
        let names: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(names, ["q", "cm", "Do", "Q", "BT", "Tf", "Tr", "rg", "Td", "Tj", "ET"]);
        let td = &ops[8].operands;
        assert!((td[0].as_float().unwrap() - 10.0).abs() < 0.01);
        assert!((td[1].as_float().unwrap() - 20.5).abs() < 0.01);
    }

    #[test]
    fn hidden_text_uses_invisible_render_mode() {
        assert_eq!(render_mode(&sample("Jane Doe", true)), 0);
        let hidden = sample("Jane Doe", false);
        assert_eq!(render_mode(&hidden), 3);
        assert!(extract_text(&hidden).contains("Jane Doe"));
    }

    #[test]
    fn info_has_title_but_no_dates() {
        let pdf = sample("Jane Doe", true);
        let doc = Document::load_mem(&pdf).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Certificate");
        assert!(info.get(b"CreationDate").is_err());
        assert!(info.get(b"ModDate").is_err());
        assert_eq!(pdf, sample("Jane Doe", true));
    }

    #[test]
    fn parentheses_survive_escaping() {
        let pdf = sample("O'Brien (Jr.)", true);
        assert!(extract_text(&pdf).contains("O'Brien (Jr.)"));
    }

    #[test]
    fn text_is_narrowed_to_latin1() {
        assert_eq!(latin1("José"), vec![b'J', b'o', b's', 0xE9]);
        assert_eq!(latin1("李"), b"?".to_vec());
        assert_eq!(latin1("a\tb"), b"a b".to_vec());
    }
}

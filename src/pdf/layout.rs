use ab_glyph::PxScale;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::fonts::{FontSource, NameFont, BUILTIN_ASCENT, BUILTIN_FONT_NAME};
use super::writer::{write_certificate_page, PageSpec, TextRun, PT_PER_PX};
use crate::error::{AppError, AppResult};

pub const NAME_COLOR: Rgb<u8> = Rgb([0x1a, 0x1a, 0x1a]);
pub const PLAIN_BACKGROUND: Rgb<u8> = Rgb([0xf5, 0xf5, 0xf0]);
pub const PLAIN_SIZE: (u32, u32) = (1920, 1080);
pub const DEFAULT_NAME_FONT_SIZE: f32 = 120.0;

/// What to do when the template image is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFallback {
    Error,
    Plain,
}

impl FromStr for TemplateFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" | "" => Ok(TemplateFallback::Error),
            "plain" => Ok(TemplateFallback::Plain),
            other => Err(format!("unknown template fallback '{}' (expected error or plain)", other)),
        }
    }
}

/// Draws a name onto the certificate background and produces PDF bytes.
pub struct CertificateLayout {
    template_path: PathBuf,
    fallback: TemplateFallback,
    font: NameFont,
    font_size: f32,
}

impl CertificateLayout {
    pub fn new(
        template_path: impl Into<PathBuf>,
        fallback: TemplateFallback,
        font_sources: &[FontSource],
        font_size: f32,
    ) -> Self {
        let font = NameFont::resolve(font_sources);
        if font.is_builtin() {
            tracing::warn!("No font file found, certificates use built-in {}", BUILTIN_FONT_NAME);
        }
        Self {
            template_path: template_path.into(),
            fallback,
            font,
            font_size,
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    fn background(&self) -> AppResult<RgbImage> {
        if self.template_path.exists() {
            return Ok(image::open(&self.template_path)?.to_rgb8());
        }

        match self.fallback {
            TemplateFallback::Error => Err(AppError::SourceNotFound(self.template_path.clone())),
            TemplateFallback::Plain => {
                tracing::debug!(
                    "Template {} missing, using plain background",
                    self.template_path.display()
                );
                Ok(RgbImage::from_pixel(PLAIN_SIZE.0, PLAIN_SIZE.1, PLAIN_BACKGROUND))
            }
        }
    }

    /// Top-left pixel of the name: horizontally centred, just above mid-height.
    pub fn name_origin(&self, name: &str, width: u32, height: u32) -> (i32, i32) {
        let text_width = self.font.text_width(name, self.font_size) as i32;
        let x = (width as i32 - text_width).div_euclid(2);
        let y = height as i32 / 2 - 20;
        (x, y)
    }

    /// Background with the name rasterised on it when an outline font is loaded.
    fn compose(&self, name: &str) -> AppResult<(RgbImage, (i32, i32))> {
        let mut canvas = self.background()?;
        let (width, height) = canvas.dimensions();
        let origin = self.name_origin(name, width, height);

        if let NameFont::Outline(font) = &self.font {
            imageproc::drawing::draw_text_mut(
                &mut canvas,
                NAME_COLOR,
                origin.0,
                origin.1,
                PxScale::from(self.font_size),
                font,
                name,
            );
        }
        Ok((canvas, origin))
    }

    pub fn render_pdf(&self, name: &str) -> AppResult<Vec<u8>> {
        let (canvas, (x, y)) = self.compose(name)?;
        let (width, height) = canvas.dimensions();

        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(canvas).write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)?;

        // Outline fonts are already in the raster; the text layer is then invisible.
        let baseline_px = y as f32 + BUILTIN_ASCENT * self.font_size;
        let title = format!("Certificate - {}", name);
        write_certificate_page(&PageSpec {
            width_px: width,
            height_px: height,
            jpeg: &jpeg,
            text: TextRun {
                text: name,
                font_size: self.font_size * PT_PER_PX,
                x: x as f32 * PT_PER_PX,
                y: (height as f32 - baseline_px) * PT_PER_PX,
                rgb: NAME_COLOR.0,
                visible: self.font.is_builtin(),
            },
            font_name: BUILTIN_FONT_NAME,
            title: &title,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pdf::fonts::DEFAULT_FONT_FILES;
    use crate::pdf::writer::tests::{assert_box, extract_text, media_box, render_mode};

    pub(crate) fn builtin_layout(template: impl Into<PathBuf>, fallback: TemplateFallback) -> CertificateLayout {
        CertificateLayout::new(template, fallback, &[FontSource::Builtin], DEFAULT_NAME_FONT_SIZE)
    }

    pub(crate) fn write_template(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([250, 250, 240]))
            .save_with_format(path, ImageFormat::Png)
            .unwrap();
    }

    #[test]
    fn fallback_parses_from_config_strings() {
        assert_eq!("plain".parse::<TemplateFallback>(), Ok(TemplateFallback::Plain));
        assert_eq!(" Error ".parse::<TemplateFallback>(), Ok(TemplateFallback::Error));
        assert!("blank".parse::<TemplateFallback>().is_err());
    }

    #[test]
    fn missing_template_fails_unless_plain_fallback() {
        let strict = builtin_layout("/nonexistent/template.jpg", TemplateFallback::Error);
        assert!(matches!(strict.render_pdf("Jane Doe"), Err(AppError::SourceNotFound(_))));

        let lenient = builtin_layout("/nonexistent/template.jpg", TemplateFallback::Plain);
        let pdf = lenient.render_pdf("Jane Doe").unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        assert_box(&media_box(&pdf), 1382.4, 777.6);
    }

    #[test]
    fn page_matches_template_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.png");
        write_template(&template, 400, 200);

        let layout = builtin_layout(&template, TemplateFallback::Error);
        let pdf = layout.render_pdf("Jane Doe").unwrap();
        assert_box(&media_box(&pdf), 288.0, 144.0);
        assert_eq!(render_mode(&pdf), 0);
        assert!(extract_text(&pdf).contains("Jane Doe"));

        let doc = lopdf::Document::load_mem(&pdf).unwrap();
        let image = doc
            .objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .find(|stream| stream.dict.type_is(b"XObject"))
            .unwrap();
        assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 400);
        assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 200);
        assert_eq!(image.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
    }

    #[test]
    fn name_is_centred_horizontally() {
        let layout = builtin_layout("unused.jpg", TemplateFallback::Plain);
        let width = NameFont::Builtin.text_width("Jane Doe", DEFAULT_NAME_FONT_SIZE) as i32;
        let (x, y) = layout.name_origin("Jane Doe", 1920, 1080);
        assert_eq!(y, 520);
        assert!((x + width / 2 - 960).abs() <= 1);

        let (short_x, _) = layout.name_origin("Al", 1920, 1080);
        assert!(short_x > x);
    }

    #[test]
    fn outline_font_draws_name_into_the_raster() {
        let Some(font_file) = DEFAULT_FONT_FILES.iter().map(Path::new).find(|path| path.is_file()) else {
            eprintln!("no outline font installed, skipping");
            return;
        };
        let layout = CertificateLayout::new(
            "/nonexistent/template.jpg",
            TemplateFallback::Plain,
            &[FontSource::File(font_file.to_path_buf())],
            DEFAULT_NAME_FONT_SIZE,
        );
        assert!(!layout.font.is_builtin());

        let width = layout.font.text_width("Jane Doe", DEFAULT_NAME_FONT_SIZE) as i32;
        let (canvas, (x, y)) = layout.compose("Jane Doe").unwrap();
        assert_eq!(y, 520);
        assert!((x + width / 2 - 960).abs() <= 1);

        let dark = |px: &Rgb<u8>| px.0.iter().all(|&c| c < 0x80);
        let inside = (x.max(0)..x + width)
            .flat_map(|px| (y..y + DEFAULT_NAME_FONT_SIZE as i32).map(move |py| (px, py)))
            .filter(|&(px, py)| dark(canvas.get_pixel(px as u32, py as u32)))
            .count();
        assert!(inside > 100, "only {} dark pixels in the name box", inside);
        assert!(canvas.enumerate_pixels().filter(|(_, py, _)| *py < y as u32 - 10).all(|(_, _, px)| !dark(px)));

        let pdf = layout.render_pdf("Jane Doe").unwrap();
        assert_eq!(render_mode(&pdf), 3);
        assert!(extract_text(&pdf).contains("Jane Doe"));
    }

    #[test]
    fn identical_inputs_give_identical_bytes() {
        let layout = builtin_layout("/nonexistent/template.jpg", TemplateFallback::Plain);
        assert_eq!(layout.render_pdf("Jane Doe").unwrap(), layout.render_pdf("Jane Doe").unwrap());
    }
}

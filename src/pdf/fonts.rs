use ab_glyph::{FontVec, PxScale};
use std::path::PathBuf;

/// Font files tried before the built-in font.
pub const DEFAULT_FONT_FILES: &[&str] = &[
    "arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
];

/// PDF base-14 font used for the built-in fallback and for the text layer.
pub const BUILTIN_FONT_NAME: &str = "Helvetica-Bold";
pub const BUILTIN_ASCENT: f32 = 0.718;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    File(PathBuf),
    Builtin,
}

impl FontSource {
    pub fn default_chain(extra: Option<PathBuf>) -> Vec<FontSource> {
        extra
            .into_iter()
            .chain(DEFAULT_FONT_FILES.iter().map(PathBuf::from))
            .map(FontSource::File)
            .chain(std::iter::once(FontSource::Builtin))
            .collect()
    }

    fn load(&self) -> Option<NameFont> {
        match self {
            FontSource::File(path) => {
                let bytes = std::fs::read(path).ok()?;
                match FontVec::try_from_vec(bytes) {
                    Ok(font) => Some(NameFont::Outline(font)),
                    Err(e) => {
                        tracing::warn!("Ignoring unreadable font {}: {}", path.display(), e);
                        None
                    }
                }
            }
            FontSource::Builtin => Some(NameFont::Builtin),
        }
    }
}

pub enum NameFont {
    Outline(FontVec),
    Builtin,
}

impl std::fmt::Debug for NameFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameFont::Outline(_) => f.write_str("NameFont::Outline"),
            NameFont::Builtin => f.write_str("NameFont::Builtin"),
        }
    }
}

impl NameFont {
    /// First source that loads wins; the built-in font is always the last resort.
    pub fn resolve(sources: &[FontSource]) -> NameFont {
        let resolved = sources.iter().find_map(|source| {
            let font = source.load()?;
            tracing::debug!("Resolved name font via {:?}", source);
            Some(font)
        });
        resolved.unwrap_or(NameFont::Builtin)
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, NameFont::Builtin)
    }

    /// Width in pixels of `text` drawn at `size` pixels.
    pub fn text_width(&self, text: &str, size: f32) -> u32 {
        match self {
            NameFont::Outline(font) => imageproc::drawing::text_size(PxScale::from(size), font, text).0,
            NameFont::Builtin => builtin_text_width(text, size).round() as u32,
        }
    }
}

/// Helvetica-Bold advance widths in 1/1000 em for the printable ASCII range.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 278, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    278, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

const HELVETICA_BOLD_DEFAULT_WIDTH: u16 = 556;

pub fn builtin_text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| {
            u32::from(match c as u32 {
                code @ 32..=126 => HELVETICA_BOLD_WIDTHS[(code - 32) as usize],
                _ => HELVETICA_BOLD_DEFAULT_WIDTH,
            })
        })
        .sum();
    units as f32 * size / 1000.0
}

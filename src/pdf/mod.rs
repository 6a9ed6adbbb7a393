// Certificate PDF generation.
// Font files are optional: without one the name is set in the PDF's built-in Helvetica-Bold.
mod fonts;
mod layout;
mod renderer;
mod template;
mod writer;

pub use fonts::FontSource;
pub use layout::{CertificateLayout, TemplateFallback, DEFAULT_NAME_FONT_SIZE};
pub use renderer::{CertificateRenderer, RenderedCertificate};
pub use template::create_template;

#[cfg(test)]
pub(crate) use writer::tests::extract_text;

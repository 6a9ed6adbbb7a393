use std::io::Write;
use std::path::{Component, Path, PathBuf};

use super::layout::CertificateLayout;
use crate::error::{AppError, AppResult};
use crate::records::CertificateId;

/// Where rendered certificates go. Chosen once, at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderMode {
    /// Persistent deployments: one `{certificate_id}.pdf` per identifier, rendered at most once.
    CachedFile { output_dir: PathBuf },
    /// Ephemeral or read-only deployments: every call renders into memory.
    InMemory,
}

#[derive(Debug)]
pub enum RenderedCertificate {
    Bytes(Vec<u8>),
    File(PathBuf),
}

impl RenderedCertificate {
    pub async fn into_bytes(self) -> AppResult<Vec<u8>> {
        match self {
            RenderedCertificate::Bytes(bytes) => Ok(bytes),
            RenderedCertificate::File(path) => Ok(tokio::fs::read(&path).await?),
        }
    }
}

pub struct CertificateRenderer {
    layout: CertificateLayout,
    mode: RenderMode,
}

impl CertificateRenderer {
    pub fn cached(layout: CertificateLayout, output_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            layout,
            mode: RenderMode::CachedFile { output_dir },
        })
    }

    pub fn in_memory(layout: CertificateLayout) -> Self {
        Self {
            layout,
            mode: RenderMode::InMemory,
        }
    }

    pub fn mode(&self) -> &RenderMode {
        &self.mode
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.mode, RenderMode::CachedFile { .. })
    }

    pub fn layout(&self) -> &CertificateLayout {
        &self.layout
    }

    pub fn get_certificate_path(&self, certificate_id: &CertificateId) -> AppResult<PathBuf> {
        match &self.mode {
            RenderMode::CachedFile { output_dir } => cache_path(output_dir, certificate_id),
            RenderMode::InMemory => Err(AppError::Configuration(
                "Certificates rendered in memory have no file path".to_string(),
            )),
        }
    }

    pub fn certificate_exists(&self, certificate_id: &CertificateId) -> bool {
        self.get_certificate_path(certificate_id)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Cached mode returns the existing file when there is one; in-memory mode
    /// ignores the identifier and always renders.
    pub fn render(
        &self,
        student_name: &str,
        certificate_id: Option<&CertificateId>,
    ) -> AppResult<RenderedCertificate> {
        match (&self.mode, certificate_id) {
            (RenderMode::InMemory, _) => Ok(RenderedCertificate::Bytes(self.layout.render_pdf(student_name)?)),
            (RenderMode::CachedFile { .. }, None) => Err(AppError::Configuration(
                "Cached rendering needs a certificate identifier".to_string(),
            )),
            (RenderMode::CachedFile { output_dir }, Some(id)) => {
                let path = cache_path(output_dir, id)?;
                if path.is_file() {
                    tracing::debug!("Certificate {} served from cache", id);
                    return Ok(RenderedCertificate::File(path));
                }
                let pdf = self.layout.render_pdf(student_name)?;
                persist(output_dir, &path, &pdf)?;
                tracing::info!("Generated certificate {}", id);
                Ok(RenderedCertificate::File(path))
            }
        }
    }
}

/// The identifier must name a single file directly inside the output directory.
fn cache_path(output_dir: &Path, certificate_id: &CertificateId) -> AppResult<PathBuf> {
    let file_name = certificate_id.file_name();
    let mut components = Path::new(&file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == file_name.as_str() => Ok(output_dir.join(file_name)),
        _ => Err(AppError::Render(format!(
            "certificate identifier '{}' is not a usable file name",
            certificate_id
        ))),
    }
}

/// Write next to the target, then rename, so readers never see a partial PDF.
fn persist(output_dir: &Path, path: &Path, pdf: &[u8]) -> AppResult<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(output_dir)?;
    tmp.write_all(pdf)?;
    tmp.persist(path).map_err(|e| AppError::render(e.error))?;
    Ok(())
}

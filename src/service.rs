use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::pdf::{CertificateRenderer, RenderedCertificate};
use crate::records::{CertificateId, RecordStore, StudentRecord};

/// Lookup, identifier derivation and rendering for a single request.
/// Built once at start-up and shared by every handler.
pub struct CertificateService {
    store: RecordStore,
    renderer: CertificateRenderer,
    admin_key: String,
}

#[derive(Debug, Serialize)]
pub struct Verification {
    pub name: String,
    pub email: String,
    pub student_id: String,
    pub course: String,
    pub certificate_id: CertificateId,
    pub valid: bool,
}

#[derive(Debug)]
pub struct CertificateDownload {
    pub certificate_id: CertificateId,
    pub artifact: RenderedCertificate,
}

impl CertificateDownload {
    pub fn file_name(&self) -> String {
        self.certificate_id.file_name()
    }
}

#[derive(Debug, Serialize)]
pub struct BulkReport {
    pub success: bool,
    pub total: usize,
    pub generated_count: usize,
    pub skipped_count: usize,
    pub generated_ids: Vec<CertificateId>,
    pub skipped_ids: Vec<CertificateId>,
}

impl CertificateService {
    pub fn new(store: RecordStore, renderer: CertificateRenderer, admin_key: impl Into<String>) -> Self {
        Self {
            store,
            renderer,
            admin_key: admin_key.into(),
        }
    }

    fn lookup(&self, name: &str, student_id: &str) -> AppResult<(StudentRecord, CertificateId)> {
        let student = self.store.find_by_name_and_id(name, student_id)?;
        let certificate_id = self.store.generate_certificate_id(&student.student_id);
        Ok((student, certificate_id))
    }

    pub fn verify(&self, name: &str, student_id: &str) -> AppResult<Verification> {
        let (student, certificate_id) = self.lookup(name, student_id)?;
        Ok(Verification {
            name: student.name,
            email: student.email,
            student_id: student.student_id,
            course: student.course,
            certificate_id,
            valid: true,
        })
    }

    pub fn certificate(&self, name: &str, student_id: &str) -> AppResult<CertificateDownload> {
        let (student, certificate_id) = self.lookup(name, student_id)?;
        let artifact = self.render(&student, &certificate_id)?;
        Ok(CertificateDownload {
            certificate_id,
            artifact,
        })
    }

    /// Renders every record that has no cached certificate yet. Persistent mode only.
    pub fn generate_all(&self, admin_key: &str) -> AppResult<BulkReport> {
        if admin_key != self.admin_key {
            return Err(AppError::Unauthorized);
        }
        if !self.renderer.is_persistent() {
            return Err(AppError::Configuration(
                "Bulk generation is disabled on serverless deployments. Generate on-demand via /certificate instead."
                    .to_string(),
            ));
        }

        let students = self.store.load_all()?;
        let mut generated_ids = Vec::new();
        let mut skipped_ids = Vec::new();

        for student in &students {
            let certificate_id = self.store.generate_certificate_id(&student.student_id);
            if self.renderer.certificate_exists(&certificate_id) {
                skipped_ids.push(certificate_id);
                continue;
            }
            self.render(student, &certificate_id)?;
            generated_ids.push(certificate_id);
        }

        tracing::info!(
            "Bulk generation finished: {} students, {} generated, {} skipped",
            students.len(),
            generated_ids.len(),
            skipped_ids.len()
        );

        Ok(BulkReport {
            success: true,
            total: students.len(),
            generated_count: generated_ids.len(),
            skipped_count: skipped_ids.len(),
            generated_ids,
            skipped_ids,
        })
    }

    fn render(&self, student: &StudentRecord, certificate_id: &CertificateId) -> AppResult<RenderedCertificate> {
        self.renderer
            .render(&student.name, Some(certificate_id))
            .map_err(|e| match e {
                AppError::Render(_) => e,
                other => AppError::Render(other.to_string()),
            })
    }
}

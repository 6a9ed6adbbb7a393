mod models;

pub use models::*;

use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Student records backed by a CSV export. The file is re-read on every call.
pub struct RecordStore {
    source_path: PathBuf,
    id_prefix: String,
}

impl RecordStore {
    pub fn new(source_path: impl Into<PathBuf>, id_prefix: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            id_prefix: id_prefix.into(),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    fn open(&self) -> AppResult<(Vec<String>, csv::Reader<std::fs::File>)> {
        if !self.source_path.exists() {
            return Err(AppError::SourceNotFound(self.source_path.clone()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.source_path)
            .map_err(|e| self.malformed(e))?;
        let headers = reader
            .headers()
            .map_err(|e| self.malformed(e))?
            .iter()
            .map(normalize_header)
            .collect();

        Ok((headers, reader))
    }

    fn malformed(&self, err: csv::Error) -> AppError {
        AppError::MalformedSource {
            path: self.source_path.clone(),
            reason: err.to_string(),
        }
    }

    pub fn load_all(&self) -> AppResult<Vec<StudentRecord>> {
        let (headers, mut reader) = self.open()?;

        let mut students = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| self.malformed(e))?;
            students.push(RawRow::new(&headers, &row).into_record());
        }

        tracing::debug!(
            "Loaded {} student records from {}",
            students.len(),
            self.source_path.display()
        );
        Ok(students)
    }

    /// Name matches case-insensitively after trimming; the ID only after trimming.
    ///
    /// Duplicate (name, ID) pairs resolve to whichever row the scan reaches first,
    /// which is only stable for a fixed source file.
    pub fn find_by_name_and_id(&self, name: &str, student_id: &str) -> AppResult<StudentRecord> {
        let wanted_name = name.trim().to_lowercase();
        let wanted_id = student_id.trim();

        self.load_all()?
            .into_iter()
            .find(|s| s.name.trim().to_lowercase() == wanted_name && s.student_id.trim() == wanted_id)
            .ok_or_else(|| AppError::RecordNotFound {
                name: name.to_string(),
                student_id: student_id.to_string(),
            })
    }

    pub fn generate_certificate_id(&self, student_id: &str) -> CertificateId {
        CertificateId::new(&self.id_prefix, student_id)
    }

    /// Diagnostic only: at least one row, and headers covering name and student ID.
    pub fn validate_structure(&self) -> bool {
        let headers = match self.open() {
            Ok((headers, _)) => headers,
            Err(e) => {
                tracing::warn!("Student source failed validation: {}", e);
                return false;
            }
        };

        if !has_any_alias(&headers, NAME_ALIASES) || !has_any_alias(&headers, STUDENT_ID_ALIASES) {
            return false;
        }

        matches!(self.load_all(), Ok(students) if !students.is_empty())
    }
}

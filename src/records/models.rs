use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Canonical fields and the raw headers accepted for each, in priority order.
pub const NAME_ALIASES: &[&str] = &["Name", "Full Name", "Student Name"];
pub const STUDENT_ID_ALIASES: &[&str] = &["Student_Id", "Student ID", "StudentId", "Student_Id "];
pub const EMAIL_ALIASES: &[&str] = &["Email_id", "Email", "Email ID", "Email Address"];
pub const COURSE_ALIASES: &[&str] = &["Course", "Program", "Branch"];
pub const CODE_ALIASES: &[&str] = &["Code", "Workshop", "Event", "Batch"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRecord {
    pub name: String,
    pub student_id: String,
    pub email: String,
    pub course: String,
    pub code: String,
}

/// Derived from a student ID; doubles as cache key and download filename stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CertificateId(String);

impl CertificateId {
    pub fn new(prefix: &str, student_id: &str) -> Self {
        CertificateId(format!("{}-{}", prefix, student_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.0)
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trim, lower-case, and keep only alphanumerics and underscores.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// One CSV row keyed by normalized header. Later duplicates overwrite earlier ones.
pub struct RawRow<'a> {
    fields: HashMap<String, &'a str>,
}

impl<'a> RawRow<'a> {
    pub fn new(headers: &[String], values: &'a csv::StringRecord) -> Self {
        let fields = headers
            .iter()
            .zip(values.iter())
            .map(|(header, value)| (header.clone(), value))
            .collect();
        Self { fields }
    }

    fn first_of(&self, aliases: &[&str]) -> String {
        aliases
            .iter()
            .find_map(|alias| self.fields.get(&normalize_header(alias)))
            .map(|value| value.to_string())
            .unwrap_or_default()
    }

    pub fn into_record(self) -> StudentRecord {
        StudentRecord {
            name: self.first_of(NAME_ALIASES),
            student_id: self.first_of(STUDENT_ID_ALIASES),
            email: self.first_of(EMAIL_ALIASES),
            course: self.first_of(COURSE_ALIASES),
            code: self.first_of(CODE_ALIASES),
        }
    }
}

/// True if some header in `headers` (already normalized) matches one of the aliases.
pub fn has_any_alias(headers: &[String], aliases: &[&str]) -> bool {
    aliases
        .iter()
        .map(|alias| normalize_header(alias))
        .any(|alias| headers.contains(&alias))
}

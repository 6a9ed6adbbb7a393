use std::path::PathBuf;

use crate::pdf::{FontSource, TemplateFallback, DEFAULT_NAME_FONT_SIZE};

#[derive(Clone, Debug)]
pub struct Config {
    pub data_csv: PathBuf,
    pub template_path: PathBuf,
    /// `None` selects in-memory rendering.
    pub output_dir: Option<PathBuf>,
    pub certificate_id_prefix: String,
    pub admin_key: String,
    pub template_fallback: TemplateFallback,
    pub font_path: Option<PathBuf>,
    pub name_font_size: f32,
    pub static_dir: PathBuf,
    pub frontend_dist: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let path = |key: &str, default: &str| base_dir.join(var(key).unwrap_or_else(|| default.to_string()));

        let data_csv = path("DATA_CSV", "data/Workshop-I Attendance Form (Responses).csv");
        let template_path = path("TEMPLATE_PATH", "templates/certificate_template.jpg");
        let static_dir = path("STATIC_DIR", "templates");
        let frontend_dist = path("FRONTEND_DIST", "frontend/dist");

        // Serverless platforms only offer a throwaway filesystem.
        let serverless = var("VERCEL").as_deref() == Some("1");
        let output_dir = match var("OUTPUT_DIR") {
            _ if serverless => None,
            Some(dir) if dir.trim().is_empty() || dir.trim().eq_ignore_ascii_case("none") => None,
            Some(dir) => Some(base_dir.join(dir)),
            None => Some(base_dir.join("certificates")),
        };

        let certificate_id_prefix = var("CERTIFICATE_ID_PREFIX").unwrap_or_else(|| "CERT".to_string());
        let admin_key = var("ADMIN_KEY").unwrap_or_else(|| "ADMIN123".to_string());

        let template_fallback = var("TEMPLATE_FALLBACK")
            .map(|v| v.parse::<TemplateFallback>())
            .transpose()?
            .unwrap_or(TemplateFallback::Error);

        let font_path = var("FONT_PATH").filter(|p| !p.trim().is_empty()).map(PathBuf::from);
        let name_font_size = match var("NAME_FONT_SIZE") {
            Some(size) => size
                .parse::<f32>()
                .ok()
                .filter(|s| s.is_finite() && *s > 0.0)
                .ok_or_else(|| format!("NAME_FONT_SIZE must be a positive number, got '{}'", size))?,
            None => DEFAULT_NAME_FONT_SIZE,
        };

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = var("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse()
            .unwrap_or(8000);

        Ok(Self {
            data_csv,
            template_path,
            output_dir,
            certificate_id_prefix,
            admin_key,
            template_fallback,
            font_path,
            name_font_size,
            static_dir,
            frontend_dist,
            host,
            port,
        })
    }

    pub fn font_sources(&self) -> Vec<FontSource> {
        FontSource::default_chain(self.font_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn defaults_select_persistent_mode() {
        let cfg = config(&[]);
        assert!(cfg.output_dir.as_ref().unwrap().ends_with("certificates"));
        assert_eq!(cfg.certificate_id_prefix, "CERT");
        assert_eq!(cfg.admin_key, "ADMIN123");
        assert_eq!(cfg.template_fallback, TemplateFallback::Error);
        assert_eq!(cfg.name_font_size, 120.0);
        assert_eq!(cfg.port, 8000);
    }

    #[test]
    fn empty_or_none_output_dir_selects_in_memory_mode() {
        assert!(config(&[("OUTPUT_DIR", "")]).output_dir.is_none());
        assert!(config(&[("OUTPUT_DIR", "None")]).output_dir.is_none());
        assert!(config(&[("OUTPUT_DIR", "/tmp/certs")]).output_dir.is_some());
    }

    #[test]
    fn serverless_flag_forces_in_memory_mode() {
        assert!(config(&[("VERCEL", "1"), ("OUTPUT_DIR", "/tmp/certs")]).output_dir.is_none());
        assert!(config(&[("VERCEL", "0")]).output_dir.is_some());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::from_lookup(|k| (k == "TEMPLATE_FALLBACK").then(|| "blank".to_string())).is_err());
        assert!(Config::from_lookup(|k| (k == "NAME_FONT_SIZE").then(|| "-3".to_string())).is_err());
    }

    #[test]
    fn font_size_must_be_finite() {
        for size in ["inf", "infinity", "NaN"] {
            assert!(Config::from_lookup(|k| (k == "NAME_FONT_SIZE").then(|| size.to_string())).is_err(), "{}", size);
        }
        let config = Config::from_lookup(|k| (k == "NAME_FONT_SIZE").then(|| "96.5".to_string())).unwrap();
        assert_eq!(config.name_font_size, 96.5);
    }
}

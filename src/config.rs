use std::path::PathBuf;

use crate::db::DEFAULT_DB_FILE;

/// Application settings loaded from environment variables.
///
/// | Env Var                   | Default             |
/// |---------------------------|---------------------|
/// | `MILK_DAIRY_DB`           | `milk_dairy.db`     |
/// | `MILK_DAIRY_REPORT_DIR`   | `.`                 |
/// | `MILK_DAIRY_REPORT_TITLE` | `Milk Dairy Report` |
/// | `MILK_DAIRY_PDF_FONT`     | built-in Helvetica  |
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// Directory generated documents land in when no explicit path is given.
    pub report_dir: PathBuf,
    /// Header printed on every page of a PDF report.
    pub report_title: String,
    /// TrueType font embedded in PDFs; needed for names outside Latin-1.
    pub pdf_font: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            report_dir: PathBuf::from("."),
            report_title: "Milk Dairy Report".to_string(),
            pdf_font: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        AppConfig {
            db_path: get("MILK_DAIRY_DB").map(PathBuf::from).unwrap_or(defaults.db_path),
            report_dir: get("MILK_DAIRY_REPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.report_dir),
            report_title: get("MILK_DAIRY_REPORT_TITLE").unwrap_or(defaults.report_title),
            pdf_font: get("MILK_DAIRY_PDF_FONT").map(PathBuf::from),
        }
    }
}

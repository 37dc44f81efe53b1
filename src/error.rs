// Error kinds for the dairy ledger
// Store and renderer failures propagate unchanged; callers decide what to show

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::entry::EntryId;

/// Caller-side input problem. Never raised by the store or the report engine.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open store at {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create schema")]
    Schema(#[source] rusqlite::Error),

    #[error("failed to write entry")]
    Write(#[source] rusqlite::Error),

    #[error("failed to read entries")]
    Read(#[source] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write document {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pdf generation failed: {0}")]
    Pdf(String),

    #[error("csv generation failed")]
    Csv(#[from] csv::Error),

    #[error("row {row} has {found} cells, table has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A multi-day insert stopped partway. Days before `failed_on` are persisted.
#[derive(Debug, Error)]
#[error("stopped at {failed_on} after {} of the requested days were saved", .inserted.len())]
pub struct PartialInsert {
    pub inserted: Vec<EntryId>,
    pub failed_on: NaiveDate,
    #[source]
    pub source: StorageError,
}

#[derive(Debug, Error)]
pub enum DairyError {
    #[error("invalid entry: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    PartialInsert(#[from] PartialInsert),
}

impl From<Vec<ValidationError>> for DairyError {
    fn from(errors: Vec<ValidationError>) -> Self {
        DairyError::Validation(errors)
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_joined() {
        let err = DairyError::from(vec![
            ValidationError::new("rent", "must not be negative"),
            ValidationError::new("end_date", "is before start_date"),
        ]);

        assert_eq!(
            err.to_string(),
            "invalid entry: rent: must not be negative; end_date: is before start_date"
        );
    }

    #[test]
    fn test_partial_insert_message_counts_saved_days() {
        let err = PartialInsert {
            inserted: vec![EntryId(1), EntryId(2)],
            failed_on: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            source: StorageError::Write(rusqlite::Error::InvalidQuery),
        };

        assert_eq!(
            err.to_string(),
            "stopped at 2024-05-03 after 2 of the requested days were saved"
        );
    }

    #[test]
    fn test_row_width_message() {
        let err = RenderError::RowWidth {
            row: 3,
            expected: 14,
            found: 13,
        };
        assert_eq!(err.to_string(), "row 3 has 13 cells, table has 14 columns");
    }
}

// Milk Dairy Ledger - Core Library
// Entry model, SQLite store, report queries and document rendering

pub mod config;
pub mod db;
pub mod document;
pub mod entry;
pub mod error;
pub mod intake;
pub mod report;
pub mod table;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{MilkStore, DEFAULT_DB_FILE};
pub use document::{
    paginate, CsvRenderer, DocumentRenderer, PageLayout, PdfRenderer, PdfTemplate,
};
pub use entry::{EntryId, MilkEntry, StoredEntry, ENTRY_COLUMNS};
pub use error::{DairyError, PartialInsert, RenderError, StorageError, ValidationError};
pub use intake::{record_range, EntryForm};
pub use report::{CustomerDetail, Report, ReportEngine, ReportKind, WeekWindow, SAIR_TO_MOUND};
pub use table::Table;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Persistence Store - SQLite + WAL
// Append-only storage of milk entries with date, month and customer lookups

use chrono::Month;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Params, Row};
use std::path::Path;
use tracing::{debug, info};

use crate::entry::{EntryId, MilkEntry, StoredEntry};
use crate::error::StorageError;

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_FILE: &str = "milk_dairy.db";

const SELECT_ENTRIES: &str = "SELECT id, customer_name, start_date, end_date,
        morning_mound, morning_sair, morning_rate,
        evening_mound, evening_sair, evening_rate,
        rent, commission, bandi, paid_amount
     FROM milk_entries";

/// Owns the connection for the lifetime of the process.
///
/// Created by the composition root and handed to the report layer by
/// reference. Each method is one statement, so each insert is atomic on its
/// own and nothing spans calls.
pub struct MilkStore {
    conn: Connection,
}

impl MilkStore {
    /// Open (or create) a database file. Call `initialize` before use.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened milk store");
        Ok(MilkStore { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|source| StorageError::Open {
            path: ":memory:".into(),
            source,
        })?;
        Ok(MilkStore { conn })
    }

    /// Ensure the schema exists. Safe on every startup, never drops data.
    pub fn initialize(&self) -> Result<(), StorageError> {
        // Enable WAL mode for crash recovery (in-memory databases report "memory")
        let mode: String = self
            .conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(StorageError::Schema)?;

        // ==========================================================================
        // Milk Entries Table
        // ==========================================================================
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS milk_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    customer_name TEXT,
                    start_date TEXT,
                    end_date TEXT,
                    morning_mound REAL,
                    morning_sair INTEGER,
                    morning_rate REAL,
                    evening_mound REAL,
                    evening_sair INTEGER,
                    evening_rate REAL,
                    rent REAL,
                    commission REAL,
                    bandi REAL,
                    paid_amount REAL
                )",
                [],
            )
            .map_err(StorageError::Schema)?;

        // ==========================================================================
        // Indexes
        // ==========================================================================
        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_milk_start_date ON milk_entries(start_date)",
                [],
            )
            .map_err(StorageError::Schema)?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_milk_customer ON milk_entries(customer_name)",
                [],
            )
            .map_err(StorageError::Schema)?;

        info!(journal_mode = %mode, "milk store schema ready");
        Ok(())
    }

    /// Append one entry and return its new identifier.
    pub fn insert(&self, entry: &MilkEntry) -> Result<EntryId, StorageError> {
        self.conn
            .execute(
                "INSERT INTO milk_entries (
                    customer_name, start_date, end_date,
                    morning_mound, morning_sair, morning_rate,
                    evening_mound, evening_sair, evening_rate,
                    rent, commission, bandi, paid_amount
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    entry.customer_name,
                    entry.start_date,
                    entry.end_date,
                    entry.morning_mound,
                    entry.morning_sair,
                    entry.morning_rate,
                    entry.evening_mound,
                    entry.evening_sair,
                    entry.evening_rate,
                    entry.rent,
                    entry.commission,
                    entry.bandi,
                    entry.paid_amount,
                ],
            )
            .map_err(StorageError::Write)?;

        let id = EntryId(self.conn.last_insert_rowid());
        info!(%id, customer = %entry.customer_name, date = %entry.start_date, "entry saved");
        Ok(id)
    }

    /// Entries whose start date lies in `[start, end]`, oldest first.
    ///
    /// An inverted range matches nothing.
    pub fn query_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StoredEntry>, StorageError> {
        let entries = self.query_entries(
            &format!(
                "{SELECT_ENTRIES}
                 WHERE start_date BETWEEN ?1 AND ?2
                 ORDER BY start_date, id"
            ),
            params![start, end],
        )?;
        debug!(%start, %end, rows = entries.len(), "date range query");
        Ok(entries)
    }

    /// Entries for one day, sorted by customer name.
    pub fn query_by_exact_date(&self, date: NaiveDate) -> Result<Vec<StoredEntry>, StorageError> {
        let entries = self.query_entries(
            &format!(
                "{SELECT_ENTRIES}
                 WHERE start_date = ?1
                 ORDER BY customer_name, id"
            ),
            params![date],
        )?;
        debug!(%date, rows = entries.len(), "exact date query");
        Ok(entries)
    }

    /// Entries whose start date falls in `month` of ANY year.
    ///
    /// The year is ignored on purpose: May covers May 2023, May 2024 and so on.
    pub fn query_by_month_across_years(
        &self,
        month: Month,
    ) -> Result<Vec<StoredEntry>, StorageError> {
        let month_text = format!("{:02}", month.number_from_month());
        let entries = self.query_entries(
            &format!(
                "{SELECT_ENTRIES}
                 WHERE strftime('%m', start_date) = ?1
                 ORDER BY start_date, id"
            ),
            params![month_text],
        )?;
        debug!(month = %month_text, rows = entries.len(), "month query");
        Ok(entries)
    }

    /// Entries for one customer (exact, case-sensitive), oldest first.
    pub fn query_by_customer(&self, name: &str) -> Result<Vec<StoredEntry>, StorageError> {
        let entries = self.query_entries(
            &format!(
                "{SELECT_ENTRIES}
                 WHERE customer_name = ?1
                 ORDER BY start_date, id"
            ),
            params![name],
        )?;
        debug!(customer = %name, rows = entries.len(), "customer query");
        Ok(entries)
    }

    /// Distinct customer names, ascending.
    pub fn customer_names(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT DISTINCT customer_name FROM milk_entries
                 WHERE customer_name IS NOT NULL
                 ORDER BY customer_name",
            )
            .map_err(StorageError::Read)?;

        let names = stmt
            .query_map([], |row| row.get(0))
            .map_err(StorageError::Read)?
            .collect::<Result<Vec<String>, _>>()
            .map_err(StorageError::Read)?;

        Ok(names)
    }

    pub fn count(&self) -> Result<i64, StorageError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM milk_entries", [], |row| row.get(0))
            .map_err(StorageError::Read)
    }

    #[cfg(test)]
    pub(crate) fn conn_for_tests(&self) -> &Connection {
        &self.conn
    }

    fn query_entries<P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<StoredEntry>, StorageError> {
        let mut stmt = self.conn.prepare(sql).map_err(StorageError::Read)?;

        let entries = stmt
            .query_map(params, row_to_entry)
            .map_err(StorageError::Read)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::Read)?;

        Ok(entries)
    }
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<StoredEntry> {
    Ok(StoredEntry {
        id: EntryId(row.get(0)?),
        entry: MilkEntry {
            customer_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            start_date: row.get(2)?,
            end_date: row.get(3)?,
            morning_mound: row.get(4)?,
            morning_sair: row.get(5)?,
            morning_rate: row.get(6)?,
            evening_mound: row.get(7)?,
            evening_sair: row.get(8)?,
            evening_rate: row.get(9)?,
            rent: row.get(10)?,
            commission: row.get(11)?,
            bandi: row.get(12)?,
            paid_amount: row.get(13)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_store() -> MilkStore {
        let store = MilkStore::open_in_memory().unwrap();
        store.initialize().unwrap();
        store
    }

    /// Ali, 2024-05-01, with every figure filled in
    fn ali_entry() -> MilkEntry {
        MilkEntry {
            customer_name: "Ali".to_string(),
            start_date: day(2024, 5, 1),
            end_date: day(2024, 5, 1),
            morning_mound: 2.0,
            morning_sair: 10,
            morning_rate: 50.0,
            evening_mound: 1.5,
            evening_sair: 8,
            evening_rate: 55.0,
            rent: 10.0,
            commission: 5.0,
            bandi: 2.0,
            paid_amount: 1000.0,
        }
    }

    #[test]
    fn test_insert_then_exact_date() {
        let store = test_store();
        let id = store.insert(&ali_entry()).unwrap();

        let entries = store.query_by_exact_date(day(2024, 5, 1)).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
        assert_eq!(entries[0].entry, ali_entry());
    }

    #[test]
    fn test_ids_strictly_increase() {
        let store = test_store();
        let a = store.insert(&ali_entry()).unwrap();
        let b = store.insert(&ali_entry()).unwrap();
        let c = store.insert(&ali_entry()).unwrap();

        assert!(a < b && b < c);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let store = test_store();
        store.insert(&ali_entry()).unwrap();

        store.initialize().unwrap();
        store.initialize().unwrap();

        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_DB_FILE);

        let first_id = {
            let store = MilkStore::open(&path).unwrap();
            store.initialize().unwrap();
            store.insert(&ali_entry()).unwrap()
        };

        let store = MilkStore::open(&path).unwrap();
        store.initialize().unwrap();
        let second_id = store.insert(&ali_entry()).unwrap();

        assert_eq!(store.count().unwrap(), 2);
        assert!(second_id > first_id);
    }

    #[test]
    fn test_date_range_eight_days_in_order() {
        let store = test_store();
        let first = day(2024, 4, 25);
        // Insert newest first so ordering comes from the query
        for offset in (0..8).rev() {
            store.insert(&ali_entry().for_day(first + Duration::days(offset))).unwrap();
        }

        let entries = store.query_by_date_range(first, day(2024, 5, 2)).unwrap();

        assert_eq!(entries.len(), 8);
        let dates: Vec<_> = entries.iter().map(|e| e.entry.start_date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(dates[0], first);
        assert_eq!(dates[7], day(2024, 5, 2));
    }

    #[test]
    fn test_date_range_ties_follow_insertion() {
        let store = test_store();
        let mut zara = ali_entry();
        zara.customer_name = "Zara".to_string();
        let first = store.insert(&zara).unwrap();
        let second = store.insert(&ali_entry()).unwrap();

        let entries = store.query_by_date_range(day(2024, 5, 1), day(2024, 5, 1)).unwrap();

        assert_eq!(entries[0].id, first);
        assert_eq!(entries[1].id, second);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let store = test_store();
        store.insert(&ali_entry()).unwrap();

        let entries = store.query_by_date_range(day(2024, 5, 2), day(2024, 4, 30)).unwrap();

        assert!(entries.is_empty());
    }

    #[test]
    fn test_single_day_range_matches_exact_date() {
        let store = test_store();
        for name in ["Zara", "Ali", "Bilal"] {
            let mut entry = ali_entry();
            entry.customer_name = name.to_string();
            store.insert(&entry).unwrap();
        }
        store.insert(&ali_entry().for_day(day(2024, 5, 2))).unwrap();

        let mut by_range: Vec<_> = store
            .query_by_date_range(day(2024, 5, 1), day(2024, 5, 1))
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        let exact = store.query_by_exact_date(day(2024, 5, 1)).unwrap();
        let mut by_exact: Vec<_> = exact.iter().map(|e| e.id).collect();

        let names: Vec<_> = exact.iter().map(|e| e.entry.customer_name.as_str()).collect();
        assert_eq!(names, vec!["Ali", "Bilal", "Zara"]);

        by_range.sort();
        by_exact.sort();
        assert_eq!(by_range, by_exact);
    }

    #[test]
    fn test_exact_date_name_ties_by_id() {
        let store = test_store();
        let a = store.insert(&ali_entry()).unwrap();
        let b = store.insert(&ali_entry()).unwrap();

        let entries = store.query_by_exact_date(day(2024, 5, 1)).unwrap();

        assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_month_query_spans_years() {
        let store = test_store();
        store.insert(&ali_entry().for_day(day(2024, 5, 20))).unwrap();
        store.insert(&ali_entry().for_day(day(2023, 5, 3))).unwrap();
        store.insert(&ali_entry().for_day(day(2024, 4, 30))).unwrap();
        store.insert(&ali_entry().for_day(day(2024, 6, 1))).unwrap();
        store.insert(&ali_entry().for_day(day(2022, 5, 31))).unwrap();

        let entries = store.query_by_month_across_years(Month::May).unwrap();

        let dates: Vec<_> = entries.iter().map(|e| e.entry.start_date).collect();
        assert_eq!(dates, vec![day(2022, 5, 31), day(2023, 5, 3), day(2024, 5, 20)]);
    }

    #[test]
    fn test_month_query_two_digit_months() {
        let store = test_store();
        store.insert(&ali_entry().for_day(day(2024, 1, 15))).unwrap();
        store.insert(&ali_entry().for_day(day(2024, 11, 15))).unwrap();

        assert_eq!(store.query_by_month_across_years(Month::January).unwrap().len(), 1);
        assert_eq!(store.query_by_month_across_years(Month::November).unwrap().len(), 1);
        assert!(store.query_by_month_across_years(Month::March).unwrap().is_empty());
    }

    #[test]
    fn test_customer_query_exact_and_ordered() {
        let store = test_store();
        let start = day(2024, 3, 1);
        // Five distinct days, inserted out of order
        for offset in [3, 0, 4, 1, 2] {
            store.insert(&ali_entry().for_day(start + Duration::days(offset))).unwrap();
        }
        let mut other = ali_entry();
        other.customer_name = "ali".to_string();
        store.insert(&other).unwrap();
        other.customer_name = "Ali Khan".to_string();
        store.insert(&other).unwrap();

        let entries = store.query_by_customer("Ali").unwrap();

        assert_eq!(entries.len(), 5);
        assert!(entries.iter().all(|e| e.entry.customer_name == "Ali"));
        let dates: Vec<_> = entries.iter().map(|e| e.entry.start_date).collect();
        let expected: Vec<_> = (0..5).map(|o| start + Duration::days(o)).collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn test_empty_results_are_not_errors() {
        let store = test_store();

        assert!(store.query_by_customer("Nobody").unwrap().is_empty());
        assert!(store.query_by_exact_date(day(2024, 1, 1)).unwrap().is_empty());
        assert!(store.customer_names().unwrap().is_empty());
    }

    #[test]
    fn test_customer_names_distinct_sorted() {
        let store = test_store();
        for name in ["Zara", "Ali", "Zara", "Bilal"] {
            let mut entry = ali_entry();
            entry.customer_name = name.to_string();
            store.insert(&entry).unwrap();
        }

        assert_eq!(store.customer_names().unwrap(), vec!["Ali", "Bilal", "Zara"]);
    }

    #[test]
    fn test_dates_stored_as_iso_text() {
        let store = test_store();
        store.insert(&ali_entry()).unwrap();

        let raw: String = store
            .conn
            .query_row("SELECT start_date FROM milk_entries", [], |row| row.get(0))
            .unwrap();

        assert_eq!(raw, "2024-05-01");
    }

    #[test]
    fn test_malformed_date_is_storage_error() {
        let store = test_store();
        store
            .conn
            .execute(
                "INSERT INTO milk_entries (customer_name, start_date, end_date) VALUES ('X', '05/01/2024', '05/01/2024')",
                [],
            )
            .unwrap();

        let result = store.query_by_customer("X");

        assert!(matches!(result, Err(StorageError::Read(_))));
    }
}

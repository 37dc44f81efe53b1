// Intake - operator form input
// Caller-side validation and per-day expansion of a date range before insert

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::MilkStore;
use crate::entry::{EntryId, MilkEntry};
use crate::error::{PartialInsert, ValidationError};

/// What the operator typed in: one set of figures applied to every day of
/// `[start_date, end_date]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryForm {
    pub template: MilkEntry,
}

impl EntryForm {
    pub fn new(template: MilkEntry) -> Self {
        EntryForm { template }
    }

    /// Checks the store does not make: ordering of the range and
    /// non-negative, finite decimal figures. An empty customer name is
    /// allowed but logged.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let e = &self.template;

        if e.customer_name.trim().is_empty() {
            warn!("entry has an empty customer name");
        }

        if e.start_date > e.end_date {
            errors.push(ValidationError::new(
                "end_date",
                format!("{} is before start date {}", e.end_date, e.start_date),
            ));
        }

        // Dates are stored as YYYY-MM-DD text; other years break text ordering
        for (field, date) in [("start_date", e.start_date), ("end_date", e.end_date)] {
            if !(0..=9999).contains(&date.year()) {
                errors.push(ValidationError::new(
                    field,
                    format!("year {} is outside 0000-9999", date.year()),
                ));
            }
        }

        let figures = [
            ("morning_mound", e.morning_mound),
            ("morning_rate", e.morning_rate),
            ("evening_mound", e.evening_mound),
            ("evening_rate", e.evening_rate),
            ("rent", e.rent),
            ("commission", e.commission),
            ("bandi", e.bandi),
            ("paid_amount", e.paid_amount),
        ];

        for (field, value) in figures {
            if !value.is_finite() {
                errors.push(ValidationError::new(field, "must be a number"));
            } else if value < 0.0 {
                errors.push(ValidationError::new(
                    field,
                    format!("must not be negative, got {}", value),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Days covered by the form, inclusive. Empty when the range is inverted.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.template
            .start_date
            .iter_days()
            .take_while(|day| *day <= self.template.end_date)
            .collect()
    }

    /// One single-day entry per calendar day of the range.
    pub fn expand(&self) -> Vec<MilkEntry> {
        self.days()
            .into_iter()
            .map(|day| self.template.for_day(day))
            .collect()
    }
}

/// Insert every day of the form in order.
///
/// There is no atomicity across days: on the first failure the days already
/// written stay written and the error says how many that was.
pub fn record_range(store: &MilkStore, form: &EntryForm) -> Result<Vec<EntryId>, PartialInsert> {
    let mut inserted = Vec::new();

    for entry in form.expand() {
        match store.insert(&entry) {
            Ok(id) => inserted.push(id),
            Err(source) => {
                return Err(PartialInsert {
                    inserted,
                    failed_on: entry.start_date,
                    source,
                })
            }
        }
    }

    info!(
        customer = %form.template.customer_name,
        days = inserted.len(),
        "recorded entry range"
    );
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn form(start: NaiveDate, end: NaiveDate) -> EntryForm {
        let mut template = MilkEntry::new("Ali", start);
        template.end_date = end;
        template.morning_sair = 10;
        template.rent = 10.0;
        EntryForm::new(template)
    }

    fn test_store() -> MilkStore {
        let store = MilkStore::open_in_memory().unwrap();
        store.initialize().unwrap();
        store
    }

    #[test]
    fn test_expand_one_entry_per_day() {
        let entries = form(day(2024, 2, 27), day(2024, 3, 2)).expand();

        // 2024 is a leap year: 27, 28, 29 Feb then 1, 2 Mar
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[2].start_date, day(2024, 2, 29));
        assert!(entries.iter().all(|e| e.start_date == e.end_date));
        assert!(entries.iter().all(|e| e.morning_sair == 10 && e.rent == 10.0));
    }

    #[test]
    fn test_expand_single_day() {
        let entries = form(day(2024, 5, 1), day(2024, 5, 1)).expand();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_expand_inverted_range_is_empty() {
        assert!(form(day(2024, 5, 3), day(2024, 5, 1)).expand().is_empty());
    }

    #[test]
    fn test_validate_accepts_zero_figures() {
        assert!(form(day(2024, 5, 1), day(2024, 5, 2)).validate().is_ok());
    }

    #[test]
    fn test_validate_inverted_range() {
        let errors = form(day(2024, 5, 3), day(2024, 5, 1)).validate().unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "end_date");
    }

    #[test]
    fn test_validate_negative_and_nan() {
        let mut f = form(day(2024, 5, 1), day(2024, 5, 1));
        f.template.commission = -5.0;
        f.template.paid_amount = f64::NAN;

        let errors = f.validate().unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "commission"));
        assert!(errors.iter().any(|e| e.field == "paid_amount"));
    }

    #[test]
    fn test_validate_rejects_five_digit_years() {
        let errors = form(day(9999, 12, 31), day(10000, 1, 1)).validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "end_date");

        let errors = form(day(-1, 12, 31), day(-1, 12, 31)).validate().unwrap_err();
        assert_eq!(errors.len(), 2);

        assert!(form(day(0, 1, 1), day(9999, 12, 31)).validate().is_ok());
    }

    #[test]
    fn test_validate_allows_empty_name() {
        let mut f = form(day(2024, 5, 1), day(2024, 5, 1));
        f.template.customer_name = String::new();
        assert!(f.validate().is_ok());
    }

    #[test]
    fn test_record_range_inserts_each_day() {
        let store = test_store();

        let ids = record_range(&store, &form(day(2024, 4, 25), day(2024, 5, 2))).unwrap();

        assert_eq!(ids.len(), 8);
        let entries = store.query_by_customer("Ali").unwrap();
        assert_eq!(entries.len(), 8);
        assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_record_range_reports_partial_progress() {
        let store = test_store();
        // Let two days through, then fail on the third
        store
            .conn_for_tests()
            .execute_batch(
                "CREATE TRIGGER stop_third BEFORE INSERT ON milk_entries
                 WHEN NEW.start_date = '2024-05-03'
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let err = record_range(&store, &form(day(2024, 5, 1), day(2024, 5, 5))).unwrap_err();

        assert_eq!(err.inserted.len(), 2);
        assert_eq!(err.failed_on, day(2024, 5, 3));
        assert!(matches!(err.source, StorageError::Write(_)));
        assert_eq!(store.count().unwrap(), 2);
    }
}

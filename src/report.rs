// Report Engine
// Daily / weekly / monthly / customer reports over the milk store
//
// Reports are the flat list of matching rows. No totals are computed and no
// filtering happens beyond the store query behind each report.

use chrono::{Duration, Month, NaiveDate};
use serde::Serialize;
use std::fmt;

use crate::db::MilkStore;
use crate::entry::{EntryId, StoredEntry, ENTRY_COLUMNS};
use crate::error::{RenderError, StorageError};
use crate::table::Table;

/// Liters-to-mounds factor used on the customer detail view.
pub const SAIR_TO_MOUND: u64 = 40;

// ============================================================================
// REPORT KINDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportKind {
    Daily(NaiveDate),
    /// Membership is "start date within [start, end]", not overlap with the week.
    Weekly { start: NaiveDate, end: NaiveDate },
    /// Matches the month in every year present in the store.
    Monthly(Month),
    Customer(String),
}

impl ReportKind {
    pub fn title(&self) -> String {
        match self {
            ReportKind::Daily(date) => format!("Daily Report {}", date),
            ReportKind::Weekly { start, end } => format!("Weekly Report {} to {}", start, end),
            ReportKind::Monthly(month) => format!("Monthly Report {}", month.name()),
            ReportKind::Customer(name) => format!("Customer Report {}", name),
        }
    }

    /// Default document name without extension.
    pub fn file_stem(&self) -> String {
        match self {
            ReportKind::Daily(date) => format!("daily_report_{}", date),
            ReportKind::Weekly { .. } => "weekly_report".to_string(),
            ReportKind::Monthly(month) => format!("monthly_report_{:02}", month.number_from_month()),
            ReportKind::Customer(name) => format!("customer_report_{}", file_safe(name)),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title())
    }
}

fn file_safe(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// Default window for the weekly report: the seven days before `end`, plus `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekWindow {
    pub fn ending_on(end: NaiveDate) -> Self {
        WeekWindow {
            start: end
                .checked_sub_signed(Duration::days(7))
                .unwrap_or(NaiveDate::MIN),
            end,
        }
    }
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone)]
pub struct Report {
    pub kind: ReportKind,
    pub entries: Vec<StoredEntry>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All stored fields under the standard 14 column labels.
    pub fn to_table(&self) -> Result<Table, RenderError> {
        let mut table = Table::new(&self.kind.title(), &ENTRY_COLUMNS);
        for entry in &self.entries {
            table.push_row(entry.cells())?;
        }
        Ok(table)
    }

    pub fn customer_details(&self) -> Vec<CustomerDetail> {
        self.entries.iter().map(CustomerDetail::from).collect()
    }
}

/// Borrowed view over the store that answers report requests.
pub struct ReportEngine<'a> {
    store: &'a MilkStore,
}

impl<'a> ReportEngine<'a> {
    pub fn new(store: &'a MilkStore) -> Self {
        ReportEngine { store }
    }

    pub fn daily(&self, date: NaiveDate) -> Result<Report, StorageError> {
        Ok(Report {
            kind: ReportKind::Daily(date),
            entries: self.store.query_by_exact_date(date)?,
        })
    }

    pub fn weekly(&self, start: NaiveDate, end: NaiveDate) -> Result<Report, StorageError> {
        Ok(Report {
            kind: ReportKind::Weekly { start, end },
            entries: self.store.query_by_date_range(start, end)?,
        })
    }

    pub fn monthly(&self, month: Month) -> Result<Report, StorageError> {
        Ok(Report {
            kind: ReportKind::Monthly(month),
            entries: self.store.query_by_month_across_years(month)?,
        })
    }

    pub fn customer(&self, name: &str) -> Result<Report, StorageError> {
        Ok(Report {
            kind: ReportKind::Customer(name.to_string()),
            entries: self.store.query_by_customer(name)?,
        })
    }

    pub fn run(&self, kind: &ReportKind) -> Result<Report, StorageError> {
        match kind {
            ReportKind::Daily(date) => self.daily(*date),
            ReportKind::Weekly { start, end } => self.weekly(*start, *end),
            ReportKind::Monthly(month) => self.monthly(*month),
            ReportKind::Customer(name) => self.customer(name),
        }
    }
}

// ============================================================================
// CUSTOMER DETAIL (display only)
// ============================================================================

/// One entry as shown on the customer profile. The mound equivalents are
/// derived at display time and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDetail {
    pub id: EntryId,
    pub customer_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub morning_mound: f64,
    pub morning_sair: u32,
    pub morning_mound_equivalent: u64,
    pub evening_mound: f64,
    pub evening_sair: u32,
    pub evening_mound_equivalent: u64,
    pub morning_rate: f64,
    pub evening_rate: f64,
    pub rent: f64,
    pub commission: f64,
    pub bandi: f64,
    pub paid_amount: f64,
}

impl From<&StoredEntry> for CustomerDetail {
    fn from(stored: &StoredEntry) -> Self {
        let e = &stored.entry;
        CustomerDetail {
            id: stored.id,
            customer_name: e.customer_name.clone(),
            start_date: e.start_date,
            end_date: e.end_date,
            morning_mound: e.morning_mound,
            morning_sair: e.morning_sair,
            morning_mound_equivalent: u64::from(e.morning_sair) * SAIR_TO_MOUND,
            evening_mound: e.evening_mound,
            evening_sair: e.evening_sair,
            evening_mound_equivalent: u64::from(e.evening_sair) * SAIR_TO_MOUND,
            morning_rate: e.morning_rate,
            evening_rate: e.evening_rate,
            rent: e.rent,
            commission: e.commission,
            bandi: e.bandi,
            paid_amount: e.paid_amount,
        }
    }
}

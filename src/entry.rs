// Entry Model
// One milk collection record for one customer on one calendar day

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier. Strictly increasing, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A milk transaction as entered by the operator.
///
/// Mound figures are weights, sair figures are whole volume counts, rates are
/// price per unit. `rent`, `commission` and `bandi` are deductions and
/// `paid_amount` is what was settled that day. No cross-field rule is enforced
/// here; see `intake::EntryForm::validate` for the caller-side checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilkEntry {
    pub customer_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    // ========================================================================
    // MORNING / EVENING COLLECTION
    // ========================================================================
    pub morning_mound: f64,
    pub morning_sair: u32,
    pub morning_rate: f64,
    pub evening_mound: f64,
    pub evening_sair: u32,
    pub evening_rate: f64,

    // ========================================================================
    // DEDUCTIONS & SETTLEMENT
    // ========================================================================
    pub rent: f64,
    pub commission: f64,
    pub bandi: f64,
    pub paid_amount: f64,
}

impl MilkEntry {
    /// Entry for a single day with every figure zeroed.
    pub fn new(customer_name: &str, day: NaiveDate) -> Self {
        MilkEntry {
            customer_name: customer_name.to_string(),
            start_date: day,
            end_date: day,
            morning_mound: 0.0,
            morning_sair: 0,
            morning_rate: 0.0,
            evening_mound: 0.0,
            evening_sair: 0,
            evening_rate: 0.0,
            rent: 0.0,
            commission: 0.0,
            bandi: 0.0,
            paid_amount: 0.0,
        }
    }

    /// Copy of this entry pinned to one calendar day.
    pub fn for_day(&self, day: NaiveDate) -> Self {
        MilkEntry {
            start_date: day,
            end_date: day,
            ..self.clone()
        }
    }
}

/// A persisted entry: the identifier plus the values it was stored with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub id: EntryId,
    #[serde(flatten)]
    pub entry: MilkEntry,
}

impl StoredEntry {
    /// All 14 stored fields as plain text, in `ENTRY_COLUMNS` order.
    pub fn cells(&self) -> Vec<String> {
        let e = &self.entry;
        vec![
            self.id.to_string(),
            e.customer_name.clone(),
            e.start_date.to_string(),
            e.end_date.to_string(),
            e.morning_mound.to_string(),
            e.morning_sair.to_string(),
            e.morning_rate.to_string(),
            e.evening_mound.to_string(),
            e.evening_sair.to_string(),
            e.evening_rate.to_string(),
            e.rent.to_string(),
            e.commission.to_string(),
            e.bandi.to_string(),
            e.paid_amount.to_string(),
        ]
    }
}

/// Column labels for the 14 stored fields.
pub const ENTRY_COLUMNS: [&str; 14] = [
    "ID", "Customer", "Start", "End",
    "M-Mound", "M-Sair", "M-Rate",
    "E-Mound", "E-Sair", "E-Rate",
    "Rent", "Comm.", "Bandi", "Paid",
];

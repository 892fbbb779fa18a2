//! Medication stock models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One tracked medication's current supply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationStockEntry {
    /// Stable identifier, assigned on creation
    pub stock_id: String,
    /// Display label (not required to be unique)
    pub name: String,
    /// Date the current supply was dispensed
    pub refill_date: NaiveDate,
    /// Units dispensed at refill
    pub total_units: i64,
    /// Units consumed per day
    pub dose_per_day: Decimal,
    /// Free-text annotation (e.g. "dose changed by doctor")
    pub note: Option<String>,
    /// Row version, bumped by every stored dose update
    pub version: i64,
}

impl MedicationStockEntry {
    /// Create a new entry with a fresh stock ID.
    pub fn new(name: String, refill_date: NaiveDate, total_units: i64, dose_per_day: Decimal) -> Self {
        Self {
            stock_id: uuid::Uuid::new_v4().to_string(),
            name,
            refill_date,
            total_units,
            dose_per_day,
            note: None,
            version: 1,
        }
    }

    /// Attach a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Unvalidated stock entry as it arrives from a form or the FFI boundary.
///
/// Converted into a [`MedicationStockEntry`] by `StockEntryInput::into_entry`,
/// which applies the same checks as the projector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StockEntryInput {
    pub name: String,
    pub refill_date: Option<NaiveDate>,
    pub total_units: i64,
    pub dose_per_day: Option<Decimal>,
    pub note: Option<String>,
}

/// Depletion forecast for a single stock entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationForecast {
    pub stock_id: String,
    pub name: String,
    pub total_units: i64,
    pub dose_per_day: Decimal,
    /// Whole days of supply, rounded down
    pub remaining_days: i64,
    pub estimated_finish_date: NaiveDate,
    /// Days between the projection date and the finish date (negative once overdue)
    pub days_until_finish: i64,
    /// Finish date falls inside the warning window
    pub warning_active: bool,
}

/// Find the first entry carrying a display name.
///
/// Names are labels, so this is only suitable for display lookups; updates go
/// through `stock_id`.
pub fn find_by_name<'a>(
    entries: &'a [MedicationStockEntry],
    name: &str,
) -> Option<&'a MedicationStockEntry> {
    entries.iter().find(|e| e.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_entry() {
        let entry = MedicationStockEntry::new("Metformin".into(), date(2024, 1, 1), 60, Decimal::TWO);
        assert_eq!(entry.name, "Metformin");
        assert_eq!(entry.version, 1);
        assert_eq!(entry.stock_id.len(), 36); // UUID format
        assert!(entry.note.is_none());
    }

    #[test]
    fn test_with_note() {
        let entry = MedicationStockEntry::new("Amlo".into(), date(2024, 1, 1), 30, Decimal::ONE)
            .with_note("morning only");
        assert_eq!(entry.note.as_deref(), Some("morning only"));
    }

    #[test]
    fn test_find_by_name_returns_first_match() {
        let first = MedicationStockEntry::new("Amlo".into(), date(2024, 1, 1), 30, Decimal::ONE);
        let second = MedicationStockEntry::new("Amlo".into(), date(2024, 2, 1), 60, Decimal::ONE);
        let entries = vec![first.clone(), second];

        let found = find_by_name(&entries, "Amlo").unwrap();
        assert_eq!(found.stock_id, first.stock_id);
        assert!(find_by_name(&entries, "Metformin").is_none());
    }
}

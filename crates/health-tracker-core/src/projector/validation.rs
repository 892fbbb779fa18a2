//! Stock entry validation.

use rust_decimal::Decimal;

use super::{StockError, StockResult};
use crate::models::{MedicationStockEntry, StockEntryInput};

/// Check the stock entry invariants.
///
/// The dose is checked first, so a bad dose always reports `InvalidDose`.
pub fn validate_entry(entry: &MedicationStockEntry) -> StockResult<()> {
    validate_dose(&entry.name, entry.dose_per_day)?;
    if entry.name.trim().is_empty() {
        return Err(StockError::Validation("medication name must not be empty".into()));
    }
    if entry.total_units < 0 {
        return Err(StockError::Validation(format!(
            "{}: total units must not be negative, got {}",
            entry.name, entry.total_units
        )));
    }
    Ok(())
}

/// Reject a dose that is zero or negative.
pub fn validate_dose(name: &str, dose_per_day: Decimal) -> StockResult<()> {
    if dose_per_day <= Decimal::ZERO {
        return Err(StockError::InvalidDose {
            name: name.to_string(),
            dose: dose_per_day.to_string(),
        });
    }
    Ok(())
}

impl StockEntryInput {
    /// Validate the input and assign a fresh stock ID.
    pub fn into_entry(self) -> StockResult<MedicationStockEntry> {
        let name = self.name.trim().to_string();
        let dose_per_day = self.dose_per_day.ok_or_else(|| StockError::InvalidDose {
            name: name.clone(),
            dose: "missing".into(),
        })?;
        validate_dose(&name, dose_per_day)?;
        let refill_date = self.refill_date.ok_or_else(|| {
            StockError::Validation(format!("{}: refill date is required", name))
        })?;

        let mut entry = MedicationStockEntry::new(name, refill_date, self.total_units, dose_per_day);
        entry.note = self.note.filter(|n| !n.trim().is_empty());

        validate_entry(&entry)?;
        Ok(entry)
    }
}

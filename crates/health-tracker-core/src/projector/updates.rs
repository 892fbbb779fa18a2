//! Value-level updates to a stock list.
//!
//! These never touch the store: the caller persists the result through a
//! `RecordStore` afterwards.

use rust_decimal::Decimal;

use super::{validate_dose, validate_entry, StockError, StockProjector, StockResult};
use crate::models::MedicationStockEntry;

impl StockProjector {
    /// Return a copy of `entries` with one entry's daily dose replaced.
    pub fn apply_dose_update(
        &self,
        entries: &[MedicationStockEntry],
        stock_id: &str,
        new_dose_per_day: Decimal,
    ) -> StockResult<Vec<MedicationStockEntry>> {
        let index = entries
            .iter()
            .position(|e| e.stock_id == stock_id)
            .ok_or_else(|| StockError::NotFound(stock_id.to_string()))?;

        validate_dose(&entries[index].name, new_dose_per_day)?;

        let mut updated = entries.to_vec();
        updated[index].dose_per_day = new_dose_per_day;
        Ok(updated)
    }

    /// Return a copy of `entries` with `new_entry` appended.
    ///
    /// Names are not checked for uniqueness; two entries may share a label.
    pub fn append_stock_entry(
        &self,
        entries: &[MedicationStockEntry],
        new_entry: MedicationStockEntry,
    ) -> StockResult<Vec<MedicationStockEntry>> {
        validate_entry(&new_entry)?;

        let mut updated = Vec::with_capacity(entries.len() + 1);
        updated.extend_from_slice(entries);
        updated.push(new_entry);
        Ok(updated)
    }
}

//! Medication stock database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;

use super::{Database, StoreError, StoreResult};
use crate::models::MedicationStockEntry;
use crate::projector::{validate_dose, validate_entry};

impl Database {
    /// Insert stock entries in a single transaction.
    pub fn insert_stock_entries(&self, entries: &[MedicationStockEntry]) -> StoreResult<()> {
        for entry in entries {
            validate_entry(entry)?;
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO medication_stock (
                    stock_id, name, refill_date, total_units, dose_per_day, note, version
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.stock_id,
                    entry.name,
                    entry.refill_date,
                    entry.total_units,
                    entry.dose_per_day.to_string(),
                    entry.note,
                    entry.version,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(count = entries.len(), "Stored stock entries");
        Ok(())
    }

    /// Get a stock entry by ID.
    pub fn get_stock_entry(&self, stock_id: &str) -> StoreResult<Option<MedicationStockEntry>> {
        self.conn
            .query_row(
                r#"
                SELECT stock_id, name, refill_date, total_units, dose_per_day, note, version
                FROM medication_stock
                WHERE stock_id = ?
                "#,
                [stock_id],
                StockRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all stock entries in insertion order.
    pub fn list_stock_entries(&self) -> StoreResult<Vec<MedicationStockEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT stock_id, name, refill_date, total_units, dose_per_day, note, version
            FROM medication_stock
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([], StockRow::from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.try_into()?);
        }
        Ok(entries)
    }

    /// Conditionally update the daily dose of one entry.
    pub fn update_stock_dose(
        &self,
        stock_id: &str,
        new_dose: Decimal,
        expected_version: i64,
    ) -> StoreResult<i64> {
        validate_dose(stock_id, new_dose)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE medication_stock SET
                dose_per_day = ?2,
                version = version + 1,
                updated_at = datetime('now')
            WHERE stock_id = ?1 AND version = ?3
            "#,
            params![stock_id, new_dose.to_string(), expected_version],
        )?;

        if rows_affected > 0 {
            tracing::info!(stock_id, dose = %new_dose, "Updated dose per day");
            return Ok(expected_version + 1);
        }

        let actual: Option<i64> = self
            .conn
            .query_row(
                "SELECT version FROM medication_stock WHERE stock_id = ?",
                [stock_id],
                |row| row.get(0),
            )
            .optional()?;

        match actual {
            None => Err(StoreError::NotFound(stock_id.to_string())),
            Some(actual) => {
                tracing::warn!(stock_id, expected_version, actual, "Stale dose update rejected");
                Err(StoreError::Conflict {
                    stock_id: stock_id.to_string(),
                    expected: expected_version,
                    actual,
                })
            }
        }
    }
}

/// Raw stock row before decimal parsing.
struct StockRow {
    stock_id: String,
    name: String,
    refill_date: NaiveDate,
    total_units: i64,
    dose_per_day: String,
    note: Option<String>,
    version: i64,
}

impl StockRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            stock_id: row.get(0)?,
            name: row.get(1)?,
            refill_date: row.get(2)?,
            total_units: row.get(3)?,
            dose_per_day: row.get(4)?,
            note: row.get(5)?,
            version: row.get(6)?,
        })
    }
}

impl TryFrom<StockRow> for MedicationStockEntry {
    type Error = StoreError;

    fn try_from(row: StockRow) -> Result<Self, Self::Error> {
        let dose_per_day = row.dose_per_day.parse::<Decimal>().map_err(|e| {
            StoreError::Corrupt(format!(
                "{}: dose_per_day {:?}: {}",
                row.stock_id, row.dose_per_day, e
            ))
        })?;

        Ok(MedicationStockEntry {
            stock_id: row.stock_id,
            name: row.name,
            refill_date: row.refill_date,
            total_units: row.total_units,
            dose_per_day,
            note: row.note,
            version: row.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::StockError;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn entry(name: &str, dose: &str) -> MedicationStockEntry {
        MedicationStockEntry::new(
            name.into(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            60,
            dose.parse().unwrap(),
        )
    }

    #[test]
    fn test_insert_and_list_preserves_order() {
        let db = setup_db();
        let entries = vec![entry("Metformin", "2"), entry("Amlo", "0.5"), entry("Aspirin", "1")];

        db.insert_stock_entries(&entries).unwrap();

        let listed = db.list_stock_entries().unwrap();
        assert_eq!(listed, entries);
    }

    #[test]
    fn test_decimal_dose_round_trips_exactly() {
        let db = setup_db();
        let e = entry("Amlo", "0.1").with_note("half tablet");
        db.insert_stock_entries(&[e.clone()]).unwrap();

        let stored = db.get_stock_entry(&e.stock_id).unwrap().unwrap();
        assert_eq!(stored.dose_per_day, "0.1".parse::<Decimal>().unwrap());
        assert_eq!(stored.note.as_deref(), Some("half tablet"));
    }

    #[test]
    fn test_insert_is_atomic() {
        let db = setup_db();
        let good = entry("Amlo", "1");
        let mut dup = entry("Metformin", "1");
        dup.stock_id = good.stock_id.clone(); // violates PRIMARY KEY

        assert!(matches!(
            db.insert_stock_entries(&[good, dup]),
            Err(StoreError::Unavailable(_))
        ));
        assert!(db.list_stock_entries().unwrap().is_empty());
    }

    #[test]
    fn test_update_dose() {
        let db = setup_db();
        let e = entry("Amlo", "1");
        db.insert_stock_entries(&[e.clone()]).unwrap();

        let version = db.update_stock_dose(&e.stock_id, Decimal::TWO, 1).unwrap();
        assert_eq!(version, 2);

        let stored = db.get_stock_entry(&e.stock_id).unwrap().unwrap();
        assert_eq!(stored.dose_per_day, Decimal::TWO);
        assert_eq!(stored.version, 2);
    }

    #[test]
    fn test_update_dose_stale_version() {
        let db = setup_db();
        let e = entry("Amlo", "1");
        db.insert_stock_entries(&[e.clone()]).unwrap();

        db.update_stock_dose(&e.stock_id, Decimal::TWO, 1).unwrap();
        let err = db.update_stock_dose(&e.stock_id, Decimal::TEN, 1).unwrap_err();

        assert!(matches!(
            err,
            StoreError::Conflict { expected: 1, actual: 2, .. }
        ));
        let stored = db.get_stock_entry(&e.stock_id).unwrap().unwrap();
        assert_eq!(stored.dose_per_day, Decimal::TWO);
    }

    #[test]
    fn test_insert_rejects_non_positive_dose() {
        let db = setup_db();
        let good = entry("Amlo", "1");
        let mut zero = entry("Metformin", "1");
        zero.dose_per_day = Decimal::ZERO;
        let mut negative = entry("Aspirin", "1");
        negative.dose_per_day = Decimal::NEGATIVE_ONE;

        for bad in [zero, negative] {
            let err = db.insert_stock_entries(&[good.clone(), bad]).unwrap_err();
            assert!(matches!(err, StoreError::Invalid(StockError::InvalidDose { .. })));
        }
        assert!(db.list_stock_entries().unwrap().is_empty());
    }

    #[test]
    fn test_update_rejects_non_positive_dose() {
        let db = setup_db();
        let e = entry("Amlo", "1");
        db.insert_stock_entries(&[e.clone()]).unwrap();

        for dose in [Decimal::ZERO, Decimal::NEGATIVE_ONE] {
            let err = db.update_stock_dose(&e.stock_id, dose, 1).unwrap_err();
            assert!(matches!(err, StoreError::Invalid(StockError::InvalidDose { .. })));
        }

        let stored = db.get_stock_entry(&e.stock_id).unwrap().unwrap();
        assert_eq!(stored.dose_per_day, Decimal::ONE);
        assert_eq!(stored.version, 1);
    }

    #[test]
    fn test_schema_rejects_non_positive_dose() {
        let db = setup_db();
        let result = db.conn().execute(
            "INSERT INTO medication_stock (stock_id, name, refill_date, total_units, dose_per_day)
             VALUES ('s1', 'Amlo', '2024-01-01', 30, '0')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_update_dose_not_found() {
        let db = setup_db();
        let err = db.update_stock_dose("missing", Decimal::ONE, 1).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_corrupt_dose_reported() {
        let db = setup_db();
        db.conn()
            .execute(
                "INSERT INTO medication_stock (stock_id, name, refill_date, total_units, dose_per_day)
                 VALUES ('s1', 'Amlo', '2024-01-01', 30, '1..2')",
                [],
            )
            .unwrap();

        let err = db.list_stock_entries().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}

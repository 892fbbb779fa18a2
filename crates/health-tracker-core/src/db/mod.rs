//! Record store for the health tracker.
//!
//! [`RecordStore`] is the persistence seam the dashboard session talks to;
//! [`Database`] implements it on SQLite.

mod schema;
mod records;
mod stock;

pub use schema::*;

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{HealthRecord, MedicationStockEntry};
use crate::projector::StockError;

/// Default time to wait on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Record store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Version conflict on {stock_id}: expected {expected}, found {actual}")]
    Conflict {
        stock_id: String,
        expected: i64,
        actual: i64,
    },

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Rejected write: {0}")]
    Invalid(#[from] StockError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for stock entries and health records.
pub trait RecordStore {
    /// All stock entries in insertion order.
    fn read_stock_entries(&self) -> StoreResult<Vec<MedicationStockEntry>>;

    /// Append entries atomically. Invalid entries fail with `Invalid` and
    /// nothing is written.
    fn append_stock_entries(&self, entries: &[MedicationStockEntry]) -> StoreResult<()>;

    /// Set a new daily dose if the stored version still matches.
    ///
    /// Returns the new version. Fails with `Invalid` for a dose that is not
    /// positive, `NotFound` for an unknown ID and `Conflict` when another
    /// writer got there first.
    fn update_dose_per_day(
        &self,
        stock_id: &str,
        new_dose: Decimal,
        expected_version: i64,
    ) -> StoreResult<i64>;

    /// All health records in insertion order.
    fn read_health_records(&self) -> StoreResult<Vec<HealthRecord>>;

    fn append_health_record(&self, record: &HealthRecord) -> StoreResult<()>;
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open database at path with an explicit lock timeout.
    pub fn open_with_timeout<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl RecordStore for Database {
    fn read_stock_entries(&self) -> StoreResult<Vec<MedicationStockEntry>> {
        self.list_stock_entries()
    }

    fn append_stock_entries(&self, entries: &[MedicationStockEntry]) -> StoreResult<()> {
        self.insert_stock_entries(entries)
    }

    fn update_dose_per_day(
        &self,
        stock_id: &str,
        new_dose: Decimal,
        expected_version: i64,
    ) -> StoreResult<i64> {
        self.update_stock_dose(stock_id, new_dose, expected_version)
    }

    fn read_health_records(&self) -> StoreResult<Vec<HealthRecord>> {
        self.list_health_records()
    }

    fn append_health_record(&self, record: &HealthRecord) -> StoreResult<()> {
        self.insert_health_record(record)
    }
}

//! Caller-owned dashboard session.
//!
//! Holds the record store, a clock, cached reads and the chat history. Every
//! write goes through the session and invalidates the caches, so the next
//! read always reflects what the store holds.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::db::{RecordStore, StoreError};
use crate::models::{
    ChatMessage, HealthRecord, HealthRecordInput, MedicationForecast, MedicationStockEntry,
    RecordError, StockEntryInput,
};
use crate::projector::{sort_by_urgency, StockError, StockProjector};
use crate::summary::VitalsSummary;

/// Source of "today" for projections.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date from the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Dashboard state for one user.
pub struct Dashboard<S: RecordStore, C: Clock> {
    store: S,
    clock: C,
    projector: StockProjector,
    stock_cache: Option<Vec<MedicationStockEntry>>,
    records_cache: Option<Vec<HealthRecord>>,
    chat_history: Vec<ChatMessage>,
}

impl<S: RecordStore, C: Clock> Dashboard<S, C> {
    /// Create a session with the default projector.
    pub fn new(store: S, clock: C) -> Self {
        Self::with_projector(store, clock, StockProjector::new())
    }

    pub fn with_projector(store: S, clock: C, projector: StockProjector) -> Self {
        Self {
            store,
            clock,
            projector,
            stock_cache: None,
            records_cache: None,
            chat_history: Vec::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Drop all cached reads.
    pub fn invalidate(&mut self) {
        self.stock_cache = None;
        self.records_cache = None;
    }

    // =========================================================================
    // Medication stock
    // =========================================================================

    /// Stock entries, read from the store on first use.
    pub fn stock_entries(&mut self) -> SessionResult<&[MedicationStockEntry]> {
        if self.stock_cache.is_none() {
            let entries = self.store.read_stock_entries()?;
            tracing::debug!(count = entries.len(), "Loaded stock entries");
            self.stock_cache = Some(entries);
        }
        Ok(self.stock_cache.as_deref().unwrap_or_default())
    }

    /// Forecasts as of the clock's today.
    pub fn forecasts(&mut self) -> SessionResult<Vec<MedicationForecast>> {
        let today = self.clock.today();
        self.forecasts_as_of(today)
    }

    pub fn forecasts_as_of(&mut self, as_of: NaiveDate) -> SessionResult<Vec<MedicationForecast>> {
        let projector = self.projector;
        let entries = self.stock_entries()?;
        Ok(projector.project(entries, as_of)?)
    }

    /// Forecasts inside the warning window, most urgent first.
    pub fn low_stock(&mut self) -> SessionResult<Vec<MedicationForecast>> {
        let mut low: Vec<_> = self
            .forecasts()?
            .into_iter()
            .filter(|f| f.warning_active)
            .collect();
        sort_by_urgency(&mut low);
        Ok(low)
    }

    /// Validate and store a new stock entry.
    pub fn add_stock_entry(&mut self, input: StockEntryInput) -> SessionResult<MedicationStockEntry> {
        let entry = input.into_entry()?;
        let projector = self.projector;
        let entries = self.stock_entries()?;
        projector.append_stock_entry(entries, entry.clone())?;

        let result = self.store.append_stock_entries(std::slice::from_ref(&entry));
        self.invalidate();
        result?;

        tracing::info!(stock_id = %entry.stock_id, name = %entry.name, "Added stock entry");
        Ok(entry)
    }

    /// Change the daily dose of one entry.
    ///
    /// The write is conditional on the version this session last read. A
    /// concurrent edit surfaces as `StoreError::Conflict`; the cache is
    /// dropped so a retry by the caller starts from fresh data.
    pub fn update_dose(
        &mut self,
        stock_id: &str,
        new_dose_per_day: Decimal,
    ) -> SessionResult<MedicationStockEntry> {
        let projector = self.projector;
        let entries = self.stock_entries()?;
        let updated = projector.apply_dose_update(entries, stock_id, new_dose_per_day)?;

        let mut entry = updated
            .into_iter()
            .find(|e| e.stock_id == stock_id)
            .ok_or_else(|| StockError::NotFound(stock_id.to_string()))?;

        let result = self
            .store
            .update_dose_per_day(stock_id, new_dose_per_day, entry.version);
        self.invalidate();
        entry.version = result?;

        Ok(entry)
    }

    // =========================================================================
    // Health records
    // =========================================================================

    pub fn health_records(&mut self) -> SessionResult<&[HealthRecord]> {
        if self.records_cache.is_none() {
            let records = self.store.read_health_records()?;
            tracing::debug!(count = records.len(), "Loaded health records");
            self.records_cache = Some(records);
        }
        Ok(self.records_cache.as_deref().unwrap_or_default())
    }

    /// Validate and store a health record.
    pub fn submit_health_record(&mut self, input: HealthRecordInput) -> SessionResult<HealthRecord> {
        let record = input.validate()?;

        let result = self.store.append_health_record(&record);
        self.invalidate();
        result?;

        tracing::info!(record_id = %record.record_id, date = %record.date, "Submitted health record");
        Ok(record)
    }

    pub fn vitals_summary(&mut self) -> SessionResult<VitalsSummary> {
        Ok(VitalsSummary::from_records(self.health_records()?))
    }

    // =========================================================================
    // Chat history
    // =========================================================================

    pub fn push_chat(&mut self, message: ChatMessage) {
        self.chat_history.push(message);
    }

    pub fn chat_history(&self) -> &[ChatMessage] {
        &self.chat_history
    }

    pub fn clear_chat(&mut self) {
        self.chat_history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dashboard() -> Dashboard<Database, FixedClock> {
        Dashboard::new(
            Database::open_in_memory().unwrap(),
            FixedClock(date(2024, 1, 25)),
        )
    }

    fn metformin() -> StockEntryInput {
        StockEntryInput {
            name: "Metformin".into(),
            refill_date: Some(date(2024, 1, 1)),
            total_units: 60,
            dose_per_day: Some(Decimal::TWO),
            note: None,
        }
    }

    #[test]
    fn test_add_and_forecast() {
        let mut dash = dashboard();
        dash.add_stock_entry(metformin()).unwrap();

        let forecasts = dash.forecasts().unwrap();
        assert_eq!(forecasts.len(), 1);
        assert_eq!(forecasts[0].estimated_finish_date, date(2024, 1, 31));
        assert!(forecasts[0].warning_active);
    }

    #[test]
    fn test_add_invalid_blocks_write() {
        let mut dash = dashboard();
        let mut raw = metformin();
        raw.dose_per_day = Some(Decimal::ZERO);

        let err = dash.add_stock_entry(raw).unwrap_err();
        assert!(matches!(err, SessionError::Stock(StockError::InvalidDose { .. })));
        assert!(dash.store().read_stock_entries().unwrap().is_empty());
    }

    #[test]
    fn test_cache_refreshed_after_write() {
        let mut dash = dashboard();
        assert!(dash.stock_entries().unwrap().is_empty());

        dash.add_stock_entry(metformin()).unwrap();
        assert_eq!(dash.stock_entries().unwrap().len(), 1);
    }

    #[test]
    fn test_cache_is_stale_until_invalidated() {
        let mut dash = dashboard();
        assert!(dash.stock_entries().unwrap().is_empty());

        // Write behind the session's back
        let outside = metformin().into_entry().unwrap();
        dash.store().append_stock_entries(&[outside]).unwrap();
        assert!(dash.stock_entries().unwrap().is_empty());

        dash.invalidate();
        assert_eq!(dash.stock_entries().unwrap().len(), 1);
    }

    #[test]
    fn test_update_dose() {
        let mut dash = dashboard();
        let entry = dash.add_stock_entry(metformin()).unwrap();

        let updated = dash.update_dose(&entry.stock_id, Decimal::ONE).unwrap();
        assert_eq!(updated.version, 2);

        let forecasts = dash.forecasts().unwrap();
        assert_eq!(forecasts[0].remaining_days, 60);
    }

    #[test]
    fn test_update_dose_conflict() {
        let mut dash = dashboard();
        let entry = dash.add_stock_entry(metformin()).unwrap();
        dash.stock_entries().unwrap();

        // Another writer bumps the version
        dash.store()
            .update_dose_per_day(&entry.stock_id, Decimal::TEN, 1)
            .unwrap();

        let err = dash.update_dose(&entry.stock_id, Decimal::ONE).unwrap_err();
        assert!(matches!(err, SessionError::Store(StoreError::Conflict { .. })));

        // Retry from fresh data succeeds
        let updated = dash.update_dose(&entry.stock_id, Decimal::ONE).unwrap();
        assert_eq!(updated.version, 3);
    }

    #[test]
    fn test_update_dose_unknown() {
        let mut dash = dashboard();
        let err = dash.update_dose("missing", Decimal::ONE).unwrap_err();
        assert!(matches!(err, SessionError::Stock(StockError::NotFound(_))));
    }

    #[test]
    fn test_low_stock() {
        let mut dash = dashboard();
        dash.add_stock_entry(metformin()).unwrap();
        let mut plenty = metformin();
        plenty.name = "Amlo".into();
        plenty.total_units = 600;
        dash.add_stock_entry(plenty).unwrap();

        let low = dash.low_stock().unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Metformin");
    }

    #[test]
    fn test_chat_history() {
        let mut dash = dashboard();
        dash.push_chat(ChatMessage::user("How is my blood pressure?"));
        dash.push_chat(ChatMessage::assistant("Mostly normal."));
        assert_eq!(dash.chat_history().len(), 2);

        dash.clear_chat();
        assert!(dash.chat_history().is_empty());
    }

    #[test]
    fn test_system_clock_today() {
        let today = SystemClock.today();
        assert!(today > date(2020, 1, 1));
    }
}

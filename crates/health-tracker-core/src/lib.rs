//! Health Tracker Core Library
//!
//! Local-first blood pressure, pulse and glucose tracking with medication
//! stock forecasting.
//!
//! # Architecture
//!
//! ```text
//!   Entry form / FFI            Photo / AI reply
//!          │                          │
//!          ▼                          ▼
//!   StockEntryInput            VitalsHint (range-checked)
//!   HealthRecordInput ◄───────── prefill
//!          │
//!       validate
//!          │
//!          ▼
//!   ┌─────────────────────────────────────┐
//!   │             Dashboard               │
//!   │  cached reads · invalidate on write │
//!   │  injected Clock · chat history      │
//!   └──────┬──────────────────────┬───────┘
//!          │                      │
//!          ▼                      ▼
//!     RecordStore           StockProjector (pure)
//!     (SQLite)                    │
//!                                 ▼
//!                        MedicationForecast
//!                                 │
//!                  ┌──────────────┼──────────────┐
//!                  ▼              ▼              ▼
//!              Warnings      StockReport     Reminders
//! ```
//!
//! # Core Principle
//!
//! **Bad data never reaches the store.** A zero dose is rejected when it is
//! entered, not discovered later as a division failure at render time.
//!
//! # Modules
//!
//! - [`db`]: `RecordStore` trait and its SQLite implementation
//! - [`models`]: Domain types (MedicationStockEntry, HealthRecord, etc.)
//! - [`projector`]: Stock depletion forecasts
//! - [`session`]: Caller-owned dashboard state
//! - [`summary`]: Vitals averages and trend series
//! - [`export`]: JSON and CSV export
//! - [`config`], [`logging`]: Ambient setup

pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod models;
pub mod projector;
pub mod session;
pub mod summary;

// Re-export commonly used types
pub use db::{Database, RecordStore};
pub use models::{
    ChatMessage, HealthRecord, HealthRecordInput, MedicationForecast, MedicationStockEntry,
    StockEntryInput, VitalsHint,
};
pub use projector::{StockError, StockProjector};
pub use session::{Clock, Dashboard, FixedClock, SystemClock};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use models::{MealTiming, TimePeriod};
use session::SessionError;
use summary::Metric;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum HealthTrackerError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<SessionError> for HealthTrackerError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Stock(StockError::NotFound(id)) => HealthTrackerError::NotFound(id),
            SessionError::Stock(e) => HealthTrackerError::InvalidInput(e.to_string()),
            SessionError::Record(e) => HealthTrackerError::InvalidInput(e.to_string()),
            SessionError::Store(e) => e.into(),
        }
    }
}

impl From<db::StoreError> for HealthTrackerError {
    fn from(e: db::StoreError) -> Self {
        match e {
            db::StoreError::NotFound(id) => HealthTrackerError::NotFound(id),
            e @ db::StoreError::Conflict { .. } => HealthTrackerError::Conflict(e.to_string()),
            db::StoreError::Invalid(e) => HealthTrackerError::InvalidInput(e.to_string()),
            e => HealthTrackerError::StoreError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for HealthTrackerError {
    fn from(e: serde_json::Error) -> Self {
        HealthTrackerError::SerializationError(e.to_string())
    }
}

impl From<anyhow::Error> for HealthTrackerError {
    fn from(e: anyhow::Error) -> Self {
        HealthTrackerError::InvalidInput(format!("Configuration: {}", e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for HealthTrackerError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        HealthTrackerError::StoreError(format!("Lock poisoned: {}", e))
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, HealthTrackerError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| HealthTrackerError::InvalidInput(format!("date {:?}: {}", s, e)))
}

fn parse_decimal(field: &str, value: f64) -> Result<Decimal, HealthTrackerError> {
    Decimal::try_from(value)
        .map_err(|e| HealthTrackerError::InvalidInput(format!("{} {}: {}", field, value, e)))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a dashboard backed by the database at the given path.
#[uniffi::export]
pub fn open_dashboard(path: String) -> Result<Arc<HealthTrackerCore>, HealthTrackerError> {
    let db = Database::open(&path)?;
    Ok(HealthTrackerCore::wrap(Dashboard::new(db, SystemClock)))
}

/// Create a dashboard over an in-memory database (for testing).
#[uniffi::export]
pub fn open_dashboard_in_memory() -> Result<Arc<HealthTrackerCore>, HealthTrackerError> {
    let db = Database::open_in_memory()?;
    Ok(HealthTrackerCore::wrap(Dashboard::new(db, SystemClock)))
}

/// Load configuration, install logging and open the configured store.
#[uniffi::export]
pub fn open_dashboard_from_config() -> Result<Arc<HealthTrackerCore>, HealthTrackerError> {
    let config = config::AppConfig::load()?;
    logging::init_tracing(&config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        store = %config.store.path,
        "Opening health tracker"
    );

    let db = Database::open_with_timeout(&config.store.path, config.store.busy_timeout())?;
    let projector = StockProjector::with_warning_window(config.stock.warning_window_days);
    Ok(HealthTrackerCore::wrap(Dashboard::with_projector(
        db,
        SystemClock,
        projector,
    )))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe dashboard wrapper for FFI.
///
/// The mutex makes this object the single writer for its store, so dose
/// edits from one process are serialized.
#[derive(uniffi::Object)]
pub struct HealthTrackerCore {
    dashboard: Mutex<Dashboard<Database, SystemClock>>,
}

impl HealthTrackerCore {
    fn wrap(dashboard: Dashboard<Database, SystemClock>) -> Arc<Self> {
        Arc::new(Self {
            dashboard: Mutex::new(dashboard),
        })
    }
}

#[uniffi::export]
impl HealthTrackerCore {
    // =========================================================================
    // Stock Operations
    // =========================================================================

    /// Forecasts for all medications as of today.
    pub fn list_stock_forecasts(&self) -> Result<Vec<FfiForecast>, HealthTrackerError> {
        let mut dashboard = self.dashboard.lock()?;
        let forecasts = dashboard.forecasts().map_err(HealthTrackerError::from)?;
        Ok(forecasts.into_iter().map(|f| f.into()).collect())
    }

    /// Forecasts as of a given date (YYYY-MM-DD).
    pub fn stock_forecasts_as_of(
        &self,
        as_of: String,
    ) -> Result<Vec<FfiForecast>, HealthTrackerError> {
        let as_of = parse_date(&as_of)?;
        let mut dashboard = self.dashboard.lock()?;
        let forecasts = dashboard
            .forecasts_as_of(as_of)
            .map_err(HealthTrackerError::from)?;
        Ok(forecasts.into_iter().map(|f| f.into()).collect())
    }

    /// Medications inside the warning window, most urgent first.
    pub fn low_stock_forecasts(&self) -> Result<Vec<FfiForecast>, HealthTrackerError> {
        let mut dashboard = self.dashboard.lock()?;
        let forecasts = dashboard.low_stock().map_err(HealthTrackerError::from)?;
        Ok(forecasts.into_iter().map(|f| f.into()).collect())
    }

    /// Record a refill.
    pub fn add_stock_entry(
        &self,
        input: FfiStockEntryInput,
    ) -> Result<FfiStockEntry, HealthTrackerError> {
        let input: StockEntryInput = input.try_into()?;
        let mut dashboard = self.dashboard.lock()?;
        let entry = dashboard
            .add_stock_entry(input)
            .map_err(HealthTrackerError::from)?;
        Ok(entry.into())
    }

    /// Change the daily dose of a medication.
    pub fn update_dose(
        &self,
        stock_id: String,
        new_dose_per_day: f64,
    ) -> Result<FfiStockEntry, HealthTrackerError> {
        let dose = parse_decimal("dose_per_day", new_dose_per_day)?;
        let mut dashboard = self.dashboard.lock()?;
        let entry = dashboard
            .update_dose(&stock_id, dose)
            .map_err(HealthTrackerError::from)?;
        Ok(entry.into())
    }

    // =========================================================================
    // Health Record Operations
    // =========================================================================

    pub fn list_health_records(&self) -> Result<Vec<FfiHealthRecord>, HealthTrackerError> {
        let mut dashboard = self.dashboard.lock()?;
        let records = dashboard.health_records().map_err(HealthTrackerError::from)?;
        Ok(records.iter().cloned().map(|r| r.into()).collect())
    }

    /// Records taken on a given date (YYYY-MM-DD).
    pub fn health_records_on(&self, date: String) -> Result<Vec<FfiHealthRecord>, HealthTrackerError> {
        let date = parse_date(&date)?;
        let mut dashboard = self.dashboard.lock()?;
        let records = dashboard.health_records().map_err(HealthTrackerError::from)?;
        Ok(summary::records_on(records, date)
            .into_iter()
            .map(|r| r.into())
            .collect())
    }

    pub fn submit_health_record(
        &self,
        input: FfiHealthRecordInput,
    ) -> Result<FfiHealthRecord, HealthTrackerError> {
        let input: HealthRecordInput = input.try_into()?;
        let mut dashboard = self.dashboard.lock()?;
        let record = dashboard
            .submit_health_record(input)
            .map_err(HealthTrackerError::from)?;
        Ok(record.into())
    }

    pub fn vitals_summary(&self) -> Result<FfiVitalsSummary, HealthTrackerError> {
        let mut dashboard = self.dashboard.lock()?;
        let summary = dashboard.vitals_summary().map_err(HealthTrackerError::from)?;
        Ok(summary.into())
    }

    /// Chart series for one metric, sorted by date.
    pub fn trend(&self, metric: FfiMetric) -> Result<Vec<FfiTrendPoint>, HealthTrackerError> {
        let mut dashboard = self.dashboard.lock()?;
        let records = dashboard.health_records().map_err(HealthTrackerError::from)?;
        Ok(summary::trend(records, metric.into())
            .into_iter()
            .map(|p| p.into())
            .collect())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export today's stock report as JSON.
    pub fn export_stock_report_json(&self) -> Result<String, HealthTrackerError> {
        Ok(self.stock_report()?.to_json()?)
    }

    /// Export today's stock report as CSV.
    pub fn export_stock_report_csv(&self) -> Result<String, HealthTrackerError> {
        Ok(self.stock_report()?.to_csv())
    }

    /// Export all health records as CSV.
    pub fn export_health_records_csv(&self) -> Result<String, HealthTrackerError> {
        let mut dashboard = self.dashboard.lock()?;
        let records = dashboard.health_records().map_err(HealthTrackerError::from)?;
        Ok(export::RecordsExport::new(records.to_vec()).to_csv())
    }

    /// Drop cached reads (e.g. after the store was edited elsewhere).
    pub fn invalidate(&self) -> Result<(), HealthTrackerError> {
        self.dashboard.lock()?.invalidate();
        Ok(())
    }
}

impl HealthTrackerCore {
    fn stock_report(&self) -> Result<export::StockReport, HealthTrackerError> {
        let mut dashboard = self.dashboard.lock()?;
        let as_of = dashboard.today();
        let forecasts = dashboard
            .forecasts_as_of(as_of)
            .map_err(HealthTrackerError::from)?;
        Ok(export::StockReport::new(as_of, forecasts))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe stock entry input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStockEntryInput {
    pub name: String,
    /// YYYY-MM-DD
    pub refill_date: Option<String>,
    pub total_units: i64,
    pub dose_per_day: f64,
    pub note: Option<String>,
}

impl TryFrom<FfiStockEntryInput> for StockEntryInput {
    type Error = HealthTrackerError;

    fn try_from(input: FfiStockEntryInput) -> Result<Self, Self::Error> {
        Ok(StockEntryInput {
            name: input.name,
            refill_date: input.refill_date.as_deref().map(parse_date).transpose()?,
            total_units: input.total_units,
            dose_per_day: Some(parse_decimal("dose_per_day", input.dose_per_day)?),
            note: input.note,
        })
    }
}

/// FFI-safe stock entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStockEntry {
    pub stock_id: String,
    pub name: String,
    pub refill_date: String,
    pub total_units: i64,
    pub dose_per_day: f64,
    pub note: Option<String>,
}

impl From<MedicationStockEntry> for FfiStockEntry {
    fn from(entry: MedicationStockEntry) -> Self {
        Self {
            stock_id: entry.stock_id,
            name: entry.name,
            refill_date: entry.refill_date.to_string(),
            total_units: entry.total_units,
            dose_per_day: entry.dose_per_day.to_f64().unwrap_or_default(),
            note: entry.note,
        }
    }
}

/// FFI-safe forecast.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiForecast {
    pub stock_id: String,
    pub name: String,
    pub total_units: i64,
    pub dose_per_day: f64,
    pub remaining_days: i64,
    pub estimated_finish_date: String,
    pub days_until_finish: i64,
    pub warning_active: bool,
}

impl From<MedicationForecast> for FfiForecast {
    fn from(f: MedicationForecast) -> Self {
        Self {
            stock_id: f.stock_id,
            name: f.name,
            total_units: f.total_units,
            dose_per_day: f.dose_per_day.to_f64().unwrap_or_default(),
            remaining_days: f.remaining_days,
            estimated_finish_date: f.estimated_finish_date.to_string(),
            days_until_finish: f.days_until_finish,
            warning_active: f.warning_active,
        }
    }
}

#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiTimePeriod {
    Morning,
    Noon,
    Evening,
}

impl From<FfiTimePeriod> for TimePeriod {
    fn from(p: FfiTimePeriod) -> Self {
        match p {
            FfiTimePeriod::Morning => TimePeriod::Morning,
            FfiTimePeriod::Noon => TimePeriod::Noon,
            FfiTimePeriod::Evening => TimePeriod::Evening,
        }
    }
}

impl From<TimePeriod> for FfiTimePeriod {
    fn from(p: TimePeriod) -> Self {
        match p {
            TimePeriod::Morning => FfiTimePeriod::Morning,
            TimePeriod::Noon => FfiTimePeriod::Noon,
            TimePeriod::Evening => FfiTimePeriod::Evening,
        }
    }
}

#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiMetric {
    Systolic,
    Diastolic,
    Pulse,
    Glucose,
}

impl From<FfiMetric> for Metric {
    fn from(m: FfiMetric) -> Self {
        match m {
            FfiMetric::Systolic => Metric::Systolic,
            FfiMetric::Diastolic => Metric::Diastolic,
            FfiMetric::Pulse => Metric::Pulse,
            FfiMetric::Glucose => Metric::Glucose,
        }
    }
}

/// FFI-safe health record input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHealthRecordInput {
    /// YYYY-MM-DD
    pub date: String,
    pub time_period: FfiTimePeriod,
    pub took_medication: bool,
    pub medication: Option<String>,
    pub before_meal: bool,
    pub dose: Option<String>,
    pub systolic: u32,
    pub diastolic: u32,
    pub pulse: u32,
    pub glucose_mmol: f64,
    pub bp_note: Option<String>,
    pub glucose_note: Option<String>,
}

impl TryFrom<FfiHealthRecordInput> for HealthRecordInput {
    type Error = HealthTrackerError;

    fn try_from(input: FfiHealthRecordInput) -> Result<Self, Self::Error> {
        Ok(HealthRecordInput {
            date: parse_date(&input.date)?,
            time_period: input.time_period.into(),
            took_medication: input.took_medication,
            medication: input.medication,
            meal_timing: if input.before_meal {
                MealTiming::BeforeMeal
            } else {
                MealTiming::AfterMeal
            },
            dose: input.dose,
            systolic: input.systolic,
            diastolic: input.diastolic,
            pulse: input.pulse,
            glucose_mmol: parse_decimal("glucose", input.glucose_mmol)?,
            bp_note: input.bp_note,
            glucose_note: input.glucose_note,
        })
    }
}

/// FFI-safe health record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHealthRecord {
    pub record_id: String,
    pub date: String,
    pub time_period: FfiTimePeriod,
    pub took_medication: bool,
    pub medication: Option<String>,
    pub before_meal: bool,
    pub dose: Option<String>,
    pub systolic: u32,
    pub diastolic: u32,
    pub pulse: u32,
    pub bp_status: String,
    pub bp_note: Option<String>,
    pub glucose_mmol: f64,
    pub glucose_status: String,
    pub glucose_note: Option<String>,
}

impl From<HealthRecord> for FfiHealthRecord {
    fn from(r: HealthRecord) -> Self {
        Self {
            record_id: r.record_id,
            date: r.date.to_string(),
            time_period: r.time_period.into(),
            took_medication: r.took_medication,
            medication: r.medication,
            before_meal: r.meal_timing == MealTiming::BeforeMeal,
            dose: r.dose,
            systolic: r.systolic,
            diastolic: r.diastolic,
            pulse: r.pulse,
            bp_status: format!("{:?}", r.bp_status),
            bp_note: r.bp_note,
            glucose_mmol: r.glucose_mmol.to_f64().unwrap_or_default(),
            glucose_status: format!("{:?}", r.glucose_status),
            glucose_note: r.glucose_note,
        }
    }
}

/// FFI-safe vitals summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVitalsSummary {
    pub count: u32,
    pub mean_systolic: Option<f64>,
    pub mean_diastolic: Option<f64>,
    pub mean_pulse: Option<f64>,
    pub mean_glucose_mmol: Option<f64>,
}

impl From<summary::VitalsSummary> for FfiVitalsSummary {
    fn from(s: summary::VitalsSummary) -> Self {
        Self {
            count: u32::try_from(s.count).unwrap_or(u32::MAX),
            mean_systolic: s.mean_systolic.and_then(|v| v.to_f64()),
            mean_diastolic: s.mean_diastolic.and_then(|v| v.to_f64()),
            mean_pulse: s.mean_pulse.and_then(|v| v.to_f64()),
            mean_glucose_mmol: s.mean_glucose_mmol.and_then(|v| v.to_f64()),
        }
    }
}

/// FFI-safe trend point.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTrendPoint {
    pub date: String,
    pub time_period: FfiTimePeriod,
    pub value: f64,
}

impl From<summary::TrendPoint> for FfiTrendPoint {
    fn from(p: summary::TrendPoint) -> Self {
        Self {
            date: p.date.to_string(),
            time_period: p.time_period.into(),
            value: p.value.to_f64().unwrap_or_default(),
        }
    }
}

//! Medication stock depletion forecasts.
//!
//! Pipeline: StockEntryInput → validation → MedicationStockEntry → projection → MedicationForecast
//!
//! Every operation here is a pure function of its inputs. The projection date is
//! always passed in; nothing in this module reads the wall clock.

mod updates;
mod validation;

pub use validation::*;

use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{MedicationForecast, MedicationStockEntry};

/// Default warning window in days.
pub const DEFAULT_WARNING_WINDOW_DAYS: i64 = 7;

/// Stock projection errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StockError {
    #[error("Invalid dose per day for {name}: {dose} (must be greater than zero)")]
    InvalidDose { name: String, dose: String },

    #[error("Stock entry not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type StockResult<T> = Result<T, StockError>;

/// Projects remaining supply and low-stock warnings for stock entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockProjector {
    warning_window_days: i64,
}

impl Default for StockProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl StockProjector {
    /// Create a projector with the default 7-day warning window.
    pub fn new() -> Self {
        Self {
            warning_window_days: DEFAULT_WARNING_WINDOW_DAYS,
        }
    }

    /// Create a projector with a custom warning window.
    pub fn with_warning_window(days: i64) -> Self {
        Self {
            warning_window_days: days,
        }
    }

    pub fn warning_window_days(&self) -> i64 {
        self.warning_window_days
    }

    /// Forecast every entry as of the given date.
    ///
    /// All entries are validated before any forecast is produced, so a single
    /// bad entry fails the whole call. Output order matches input order.
    pub fn project(
        &self,
        entries: &[MedicationStockEntry],
        as_of: NaiveDate,
    ) -> StockResult<Vec<MedicationForecast>> {
        for entry in entries {
            validate_entry(entry)?;
        }

        entries
            .iter()
            .map(|entry| self.forecast(entry, as_of))
            .collect()
    }

    /// Forecast a single, already validated entry.
    fn forecast(&self, entry: &MedicationStockEntry, as_of: NaiveDate) -> StockResult<MedicationForecast> {
        let remaining_days = remaining_days(&entry.name, entry.total_units, entry.dose_per_day)?;

        let estimated_finish_date = u64::try_from(remaining_days)
            .ok()
            .and_then(|days| entry.refill_date.checked_add_days(Days::new(days)))
            .ok_or_else(|| {
                StockError::Validation(format!(
                    "{}: supply of {} days runs past the supported date range",
                    entry.name, remaining_days
                ))
            })?;

        let days_until_finish = (estimated_finish_date - as_of).num_days();

        Ok(MedicationForecast {
            stock_id: entry.stock_id.clone(),
            name: entry.name.clone(),
            total_units: entry.total_units,
            dose_per_day: entry.dose_per_day,
            remaining_days,
            estimated_finish_date,
            days_until_finish,
            warning_active: days_until_finish <= self.warning_window_days,
        })
    }
}

/// Whole days of supply: `floor(total_units / dose_per_day)`.
///
/// A partial day never counts as a full day remaining. `name` labels any
/// error.
pub fn remaining_days(name: &str, total_units: i64, dose_per_day: Decimal) -> StockResult<i64> {
    validate_dose(name, dose_per_day)?;
    if total_units < 0 {
        return Err(StockError::Validation(format!(
            "{}: total units must not be negative, got {}",
            name, total_units
        )));
    }

    Decimal::from(total_units)
        .checked_div(dose_per_day)
        .and_then(|days| days.floor().to_i64())
        .ok_or_else(|| {
            StockError::Validation(format!(
                "{}: {} units at {} per day is out of range",
                name, total_units, dose_per_day
            ))
        })
}

/// Sort forecasts alphabetically by name.
pub fn sort_by_name(forecasts: &mut [MedicationForecast]) {
    forecasts.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Sort forecasts by urgency: earliest finish date first, then by name.
pub fn sort_by_urgency(forecasts: &mut [MedicationForecast]) {
    forecasts.sort_by(|a, b| {
        a.estimated_finish_date
            .cmp(&b.estimated_finish_date)
            .then_with(|| a.name.cmp(&b.name))
    });
}

//! Health record models: blood pressure, pulse and glucose readings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Systolic above this is flagged high (mmHg).
pub const SYSTOLIC_HIGH: u32 = 140;
/// Diastolic above this is flagged high (mmHg).
pub const DIASTOLIC_HIGH: u32 = 90;
/// Glucose above this is flagged high (mmol/L).
pub const GLUCOSE_HIGH: Decimal = Decimal::from_parts(78, 0, 0, false, 1);
/// Glucose below this is flagged low (mmol/L).
pub const GLUCOSE_LOW: Decimal = Decimal::from_parts(39, 0, 0, false, 1);

/// Accepted input ranges, shared by manual entry and extraction hints.
pub const SYSTOLIC_RANGE: (u32, u32) = (50, 250);
pub const DIASTOLIC_RANGE: (u32, u32) = (30, 150);
pub const PULSE_RANGE: (u32, u32) = (30, 180);
pub const GLUCOSE_RANGE: (Decimal, Decimal) = (
    Decimal::from_parts(10, 0, 0, false, 1),
    Decimal::from_parts(200, 0, 0, false, 1),
);

/// Health record validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("{field} value {value} outside accepted range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },
}

pub type RecordResult<T> = Result<T, RecordError>;

/// Time of day a reading was taken.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimePeriod {
    Morning,
    Noon,
    Evening,
}

/// Whether a glucose reading was taken before or after a meal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MealTiming {
    BeforeMeal,
    AfterMeal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BloodPressureStatus {
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GlucoseStatus {
    Low,
    Normal,
    High,
}

/// A stored health record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthRecord {
    pub record_id: String,
    pub date: NaiveDate,
    pub time_period: TimePeriod,
    pub took_medication: bool,
    /// Medication name, if any was taken
    pub medication: Option<String>,
    pub meal_timing: MealTiming,
    /// Free-text dose (e.g. "5 mg")
    pub dose: Option<String>,
    pub systolic: u32,
    pub diastolic: u32,
    pub pulse: u32,
    pub bp_status: BloodPressureStatus,
    pub bp_note: Option<String>,
    /// Blood glucose in mmol/L
    pub glucose_mmol: Decimal,
    pub glucose_status: GlucoseStatus,
    pub glucose_note: Option<String>,
}

/// Unvalidated health record from the entry form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthRecordInput {
    pub date: NaiveDate,
    pub time_period: TimePeriod,
    pub took_medication: bool,
    pub medication: Option<String>,
    pub meal_timing: MealTiming,
    pub dose: Option<String>,
    pub systolic: u32,
    pub diastolic: u32,
    pub pulse: u32,
    pub glucose_mmol: Decimal,
    pub bp_note: Option<String>,
    pub glucose_note: Option<String>,
}

/// Optional vitals read from a photo or an AI reply.
///
/// Untrusted: pass through [`VitalsHint::checked`] before use, and only ever
/// use it to prefill a [`HealthRecordInput`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VitalsHint {
    pub systolic: Option<u32>,
    pub diastolic: Option<u32>,
    pub pulse: Option<u32>,
    pub glucose_mmol: Option<Decimal>,
}

/// Classify a blood pressure reading.
pub fn classify_blood_pressure(systolic: u32, diastolic: u32) -> BloodPressureStatus {
    if systolic > SYSTOLIC_HIGH || diastolic > DIASTOLIC_HIGH {
        BloodPressureStatus::High
    } else {
        BloodPressureStatus::Normal
    }
}

/// Classify a glucose reading in mmol/L.
pub fn classify_glucose(glucose_mmol: Decimal) -> GlucoseStatus {
    if glucose_mmol > GLUCOSE_HIGH {
        GlucoseStatus::High
    } else if glucose_mmol < GLUCOSE_LOW {
        GlucoseStatus::Low
    } else {
        GlucoseStatus::Normal
    }
}

fn check_range<T>(field: &'static str, value: T, (min, max): (T, T)) -> RecordResult<T>
where
    T: PartialOrd + ToString + Copy,
{
    if value < min || value > max {
        return Err(RecordError::OutOfRange {
            field,
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(value)
}

impl HealthRecordInput {
    /// Validate ranges and derive statuses.
    pub fn validate(self) -> RecordResult<HealthRecord> {
        check_range("systolic", self.systolic, SYSTOLIC_RANGE)?;
        check_range("diastolic", self.diastolic, DIASTOLIC_RANGE)?;
        check_range("pulse", self.pulse, PULSE_RANGE)?;
        check_range("glucose", self.glucose_mmol, GLUCOSE_RANGE)?;

        Ok(HealthRecord {
            record_id: uuid::Uuid::new_v4().to_string(),
            date: self.date,
            time_period: self.time_period,
            took_medication: self.took_medication,
            medication: self.medication.filter(|m| !m.trim().is_empty()),
            meal_timing: self.meal_timing,
            dose: self.dose.filter(|d| !d.trim().is_empty()),
            systolic: self.systolic,
            diastolic: self.diastolic,
            pulse: self.pulse,
            bp_status: classify_blood_pressure(self.systolic, self.diastolic),
            bp_note: self.bp_note.filter(|n| !n.trim().is_empty()),
            glucose_mmol: self.glucose_mmol,
            glucose_status: classify_glucose(self.glucose_mmol),
            glucose_note: self.glucose_note.filter(|n| !n.trim().is_empty()),
        })
    }

    /// Overwrite vitals with the values a hint carries.
    pub fn prefill(mut self, hint: &VitalsHint) -> Self {
        if let Some(v) = hint.systolic {
            self.systolic = v;
        }
        if let Some(v) = hint.diastolic {
            self.diastolic = v;
        }
        if let Some(v) = hint.pulse {
            self.pulse = v;
        }
        if let Some(v) = hint.glucose_mmol {
            self.glucose_mmol = v;
        }
        self
    }
}

impl VitalsHint {
    /// Drop every value outside the manual-entry ranges.
    pub fn checked(self) -> Self {
        fn keep<T>(field: &'static str, value: Option<T>, range: (T, T)) -> Option<T>
        where
            T: PartialOrd + ToString + Copy,
        {
            let value = value?;
            match check_range(field, value, range) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding extracted vital");
                    None
                }
            }
        }

        Self {
            systolic: keep("systolic", self.systolic, SYSTOLIC_RANGE),
            diastolic: keep("diastolic", self.diastolic, DIASTOLIC_RANGE),
            pulse: keep("pulse", self.pulse, PULSE_RANGE),
            glucose_mmol: keep("glucose", self.glucose_mmol, GLUCOSE_RANGE),
        }
    }

    /// True when no value survived.
    pub fn is_empty(&self) -> bool {
        self.systolic.is_none()
            && self.diastolic.is_none()
            && self.pulse.is_none()
            && self.glucose_mmol.is_none()
    }
}

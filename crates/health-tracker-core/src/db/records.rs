//! Health record database operations.

use chrono::NaiveDate;
use rusqlite::params;
use rust_decimal::Decimal;

use super::{Database, StoreError, StoreResult};
use crate::models::{BloodPressureStatus, GlucoseStatus, HealthRecord, MealTiming, TimePeriod};

impl Database {
    /// Insert a health record.
    pub fn insert_health_record(&self, record: &HealthRecord) -> StoreResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO health_records (
                record_id, date, time_period, took_medication, medication, meal_timing,
                dose, systolic, diastolic, pulse, bp_status, bp_note,
                glucose_mmol, glucose_status, glucose_note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                record.record_id,
                record.date,
                time_period_to_string(&record.time_period),
                record.took_medication,
                record.medication,
                meal_timing_to_string(&record.meal_timing),
                record.dose,
                record.systolic,
                record.diastolic,
                record.pulse,
                bp_status_to_string(&record.bp_status),
                record.bp_note,
                record.glucose_mmol.to_string(),
                glucose_status_to_string(&record.glucose_status),
                record.glucose_note,
            ],
        )?;

        tracing::debug!(record_id = %record.record_id, date = %record.date, "Stored health record");
        Ok(())
    }

    /// List all health records in insertion order.
    pub fn list_health_records(&self) -> StoreResult<Vec<HealthRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT record_id, date, time_period, took_medication, medication, meal_timing,
                   dose, systolic, diastolic, pulse, bp_status, bp_note,
                   glucose_mmol, glucose_status, glucose_note
            FROM health_records
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(RecordRow {
                record_id: row.get(0)?,
                date: row.get(1)?,
                time_period: row.get(2)?,
                took_medication: row.get(3)?,
                medication: row.get(4)?,
                meal_timing: row.get(5)?,
                dose: row.get(6)?,
                systolic: row.get(7)?,
                diastolic: row.get(8)?,
                pulse: row.get(9)?,
                bp_status: row.get(10)?,
                bp_note: row.get(11)?,
                glucose_mmol: row.get(12)?,
                glucose_status: row.get(13)?,
                glucose_note: row.get(14)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }
}

/// Internal row type for database mapping.
struct RecordRow {
    record_id: String,
    date: NaiveDate,
    time_period: String,
    took_medication: bool,
    medication: Option<String>,
    meal_timing: String,
    dose: Option<String>,
    systolic: u32,
    diastolic: u32,
    pulse: u32,
    bp_status: String,
    bp_note: Option<String>,
    glucose_mmol: String,
    glucose_status: String,
    glucose_note: Option<String>,
}

impl TryFrom<RecordRow> for HealthRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, value: &str| {
            StoreError::Corrupt(format!("{}: {} {:?}", row.record_id, field, value))
        };

        let glucose_mmol = row
            .glucose_mmol
            .parse::<Decimal>()
            .map_err(|_| corrupt("glucose_mmol", &row.glucose_mmol))?;

        Ok(HealthRecord {
            time_period: string_to_time_period(&row.time_period)
                .ok_or_else(|| corrupt("time_period", &row.time_period))?,
            meal_timing: string_to_meal_timing(&row.meal_timing)
                .ok_or_else(|| corrupt("meal_timing", &row.meal_timing))?,
            bp_status: string_to_bp_status(&row.bp_status)
                .ok_or_else(|| corrupt("bp_status", &row.bp_status))?,
            glucose_status: string_to_glucose_status(&row.glucose_status)
                .ok_or_else(|| corrupt("glucose_status", &row.glucose_status))?,
            glucose_mmol,
            record_id: row.record_id.clone(),
            date: row.date,
            took_medication: row.took_medication,
            medication: row.medication,
            dose: row.dose,
            systolic: row.systolic,
            diastolic: row.diastolic,
            pulse: row.pulse,
            bp_note: row.bp_note,
            glucose_note: row.glucose_note,
        })
    }
}

fn time_period_to_string(period: &TimePeriod) -> &'static str {
    match period {
        TimePeriod::Morning => "morning",
        TimePeriod::Noon => "noon",
        TimePeriod::Evening => "evening",
    }
}

fn string_to_time_period(s: &str) -> Option<TimePeriod> {
    match s {
        "morning" => Some(TimePeriod::Morning),
        "noon" => Some(TimePeriod::Noon),
        "evening" => Some(TimePeriod::Evening),
        _ => None,
    }
}

fn meal_timing_to_string(timing: &MealTiming) -> &'static str {
    match timing {
        MealTiming::BeforeMeal => "before_meal",
        MealTiming::AfterMeal => "after_meal",
    }
}

fn string_to_meal_timing(s: &str) -> Option<MealTiming> {
    match s {
        "before_meal" => Some(MealTiming::BeforeMeal),
        "after_meal" => Some(MealTiming::AfterMeal),
        _ => None,
    }
}

fn bp_status_to_string(status: &BloodPressureStatus) -> &'static str {
    match status {
        BloodPressureStatus::Normal => "normal",
        BloodPressureStatus::High => "high",
    }
}

fn string_to_bp_status(s: &str) -> Option<BloodPressureStatus> {
    match s {
        "normal" => Some(BloodPressureStatus::Normal),
        "high" => Some(BloodPressureStatus::High),
        _ => None,
    }
}

fn glucose_status_to_string(status: &GlucoseStatus) -> &'static str {
    match status {
        GlucoseStatus::Low => "low",
        GlucoseStatus::Normal => "normal",
        GlucoseStatus::High => "high",
    }
}

fn string_to_glucose_status(s: &str) -> Option<GlucoseStatus> {
    match s {
        "low" => Some(GlucoseStatus::Low),
        "normal" => Some(GlucoseStatus::Normal),
        "high" => Some(GlucoseStatus::High),
        _ => None,
    }
}

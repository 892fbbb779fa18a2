//! Health record export.

use serde::{Deserialize, Serialize};

use super::escape_csv;
use crate::models::HealthRecord;

/// Health records as a flat table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsExport {
    pub records: Vec<HealthRecord>,
}

impl RecordsExport {
    pub fn new(records: Vec<HealthRecord>) -> Self {
        Self { records }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("date,time_period,took_medication,medication,meal_timing,dose,systolic,diastolic,pulse,bp_status,bp_note,glucose_mmol,glucose_status,glucose_note\n");

        for r in &self.records {
            csv.push_str(&format!(
                "{},{:?},{},{},{:?},{},{},{},{},{:?},{},{},{:?},{}\n",
                r.date,
                r.time_period,
                r.took_medication,
                escape_csv(r.medication.as_deref().unwrap_or("")),
                r.meal_timing,
                escape_csv(r.dose.as_deref().unwrap_or("")),
                r.systolic,
                r.diastolic,
                r.pulse,
                r.bp_status,
                escape_csv(r.bp_note.as_deref().unwrap_or("")),
                r.glucose_mmol,
                r.glucose_status,
                escape_csv(r.glucose_note.as_deref().unwrap_or("")),
            ));
        }

        csv
    }
}

//! Stock forecast report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::escape_csv;
use crate::models::MedicationForecast;

/// Forecast table as shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReport {
    /// Projection date
    pub as_of: NaiveDate,
    /// Number of medications inside the warning window
    pub warning_count: usize,
    pub forecasts: Vec<MedicationForecast>,
}

impl StockReport {
    pub fn new(as_of: NaiveDate, forecasts: Vec<MedicationForecast>) -> Self {
        Self {
            as_of,
            warning_count: forecasts.iter().filter(|f| f.warning_active).count(),
            forecasts,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("stock_id,name,total_units,dose_per_day,remaining_days,estimated_finish_date,days_until_finish,warning\n");

        for f in &self.forecasts {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                escape_csv(&f.stock_id),
                escape_csv(&f.name),
                f.total_units,
                f.dose_per_day,
                f.remaining_days,
                f.estimated_finish_date,
                f.days_until_finish,
                f.warning_active,
            ));
        }

        csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MedicationStockEntry;
    use crate::projector::StockProjector;
    use rust_decimal::Decimal;

    fn report() -> StockReport {
        let refill = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let entries = vec![
            MedicationStockEntry::new("Metformin".into(), refill, 60, Decimal::TWO),
            MedicationStockEntry::new("Amlo, 5mg".into(), refill, 90, Decimal::ONE),
        ];
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 25).unwrap();
        StockReport::new(as_of, StockProjector::new().project(&entries, as_of).unwrap())
    }

    #[test]
    fn test_warning_count() {
        assert_eq!(report().warning_count, 1);
    }

    #[test]
    fn test_report_csv() {
        let csv = report().to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3); // Header + 2 forecasts
        assert!(lines[0].starts_with("stock_id,name"));
        assert!(lines[1].contains(",Metformin,60,2,30,2024-01-31,6,true"));
        assert!(lines[2].contains("\"Amlo, 5mg\""));
    }

    #[test]
    fn test_report_json() {
        let json = report().to_json().unwrap();
        assert!(json.contains("\"as_of\": \"2024-01-25\""));
        assert!(json.contains("Metformin"));
    }
}

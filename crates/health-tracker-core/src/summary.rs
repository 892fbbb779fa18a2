//! Aggregates and trend series over health records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{HealthRecord, TimePeriod};

/// Mean vitals across a set of records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VitalsSummary {
    pub count: usize,
    pub mean_systolic: Option<Decimal>,
    pub mean_diastolic: Option<Decimal>,
    pub mean_pulse: Option<Decimal>,
    pub mean_glucose_mmol: Option<Decimal>,
}

impl VitalsSummary {
    /// Compute means; all `None` when there are no records.
    pub fn from_records(records: &[HealthRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let count = Decimal::from(records.len() as u64);
        let mean = |sum: Decimal| Some((sum / count).round_dp(1));

        Self {
            count: records.len(),
            mean_systolic: mean(records.iter().map(|r| Decimal::from(r.systolic)).sum()),
            mean_diastolic: mean(records.iter().map(|r| Decimal::from(r.diastolic)).sum()),
            mean_pulse: mean(records.iter().map(|r| Decimal::from(r.pulse)).sum()),
            mean_glucose_mmol: mean(records.iter().map(|r| r.glucose_mmol).sum()),
        }
    }
}

/// A vital sign that can be charted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Metric {
    Systolic,
    Diastolic,
    Pulse,
    Glucose,
}

impl Metric {
    fn value(&self, record: &HealthRecord) -> Decimal {
        match self {
            Metric::Systolic => Decimal::from(record.systolic),
            Metric::Diastolic => Decimal::from(record.diastolic),
            Metric::Pulse => Decimal::from(record.pulse),
            Metric::Glucose => record.glucose_mmol,
        }
    }
}

/// One point of a trend chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub time_period: TimePeriod,
    pub value: Decimal,
}

/// Records taken on a given date, in stored order.
pub fn records_on(records: &[HealthRecord], date: NaiveDate) -> Vec<HealthRecord> {
    records.iter().filter(|r| r.date == date).cloned().collect()
}

/// The last `n` records in stored order.
pub fn recent(records: &[HealthRecord], n: usize) -> &[HealthRecord] {
    &records[records.len().saturating_sub(n)..]
}

/// Chart series for one metric, sorted by date then time of day.
pub fn trend(records: &[HealthRecord], metric: Metric) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = records
        .iter()
        .map(|r| TrendPoint {
            date: r.date,
            time_period: r.time_period,
            value: metric.value(r),
        })
        .collect();
    points.sort_by(|a, b| (a.date, a.time_period).cmp(&(b.date, b.time_period)));
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HealthRecordInput, MealTiming};

    fn record(day: u32, period: TimePeriod, systolic: u32, glucose: &str) -> HealthRecord {
        HealthRecordInput {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            time_period: period,
            took_medication: false,
            medication: None,
            meal_timing: MealTiming::AfterMeal,
            dose: None,
            systolic,
            diastolic: 80,
            pulse: 72,
            glucose_mmol: glucose.parse().unwrap(),
            bp_note: None,
            glucose_note: None,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_summary_empty() {
        let summary = VitalsSummary::from_records(&[]);
        assert_eq!(summary.count, 0);
        assert!(summary.mean_systolic.is_none());
    }

    #[test]
    fn test_summary_means() {
        let records = vec![
            record(1, TimePeriod::Morning, 120, "5.0"),
            record(1, TimePeriod::Evening, 131, "6.1"),
        ];
        let summary = VitalsSummary::from_records(&records);

        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean_systolic, Some("125.5".parse().unwrap()));
        assert_eq!(summary.mean_diastolic, Some(Decimal::from(80)));
        assert_eq!(summary.mean_glucose_mmol, Some("5.6".parse().unwrap()));
    }

    #[test]
    fn test_records_on() {
        let records = vec![
            record(1, TimePeriod::Morning, 120, "5.0"),
            record(2, TimePeriod::Morning, 125, "5.2"),
        ];
        let filtered = records_on(&records, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].systolic, 125);
    }

    #[test]
    fn test_recent() {
        let records = vec![
            record(1, TimePeriod::Morning, 120, "5.0"),
            record(2, TimePeriod::Morning, 121, "5.0"),
            record(3, TimePeriod::Morning, 122, "5.0"),
        ];
        assert_eq!(recent(&records, 2).len(), 2);
        assert_eq!(recent(&records, 2)[0].systolic, 121);
        assert_eq!(recent(&records, 10).len(), 3);
    }

    #[test]
    fn test_trend_sorted() {
        let records = vec![
            record(2, TimePeriod::Morning, 130, "5.0"),
            record(1, TimePeriod::Evening, 125, "5.0"),
            record(1, TimePeriod::Morning, 120, "5.0"),
        ];
        let points = trend(&records, Metric::Systolic);

        let values: Vec<Decimal> = points.iter().map(|p| p.value).collect();
        assert_eq!(
            values,
            vec![Decimal::from(120), Decimal::from(125), Decimal::from(130)]
        );
    }
}

//! Property tests for stock projection.

use chrono::{Days, NaiveDate};
use health_tracker_core::models::MedicationStockEntry;
use health_tracker_core::projector::{StockError, StockProjector};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

prop_compose! {
    fn arb_entry()(
        total_units in 0i64..10_000,
        dose_tenths in 1i64..200,
        refill_offset in 0u64..730,
    ) -> MedicationStockEntry {
        MedicationStockEntry::new(
            "Med".to_string(),
            base_date() + Days::new(refill_offset),
            total_units,
            Decimal::new(dose_tenths, 1),
        )
    }
}

proptest! {
    #[test]
    fn remaining_days_is_floor_and_non_negative(entry in arb_entry(), as_of_offset in 0u64..1000) {
        let as_of = base_date() + Days::new(as_of_offset);
        let forecasts = StockProjector::new().project(&[entry.clone()], as_of).unwrap();
        let f = &forecasts[0];

        prop_assert!(f.remaining_days >= 0);
        // floor: remaining * dose <= units < (remaining + 1) * dose
        let units = Decimal::from(entry.total_units);
        prop_assert!(Decimal::from(f.remaining_days) * entry.dose_per_day <= units);
        prop_assert!(Decimal::from(f.remaining_days + 1) * entry.dose_per_day > units);
    }

    #[test]
    fn finish_is_refill_when_units_below_dose(dose_tenths in 11i64..200, refill_offset in 0u64..365) {
        let dose = Decimal::new(dose_tenths, 1);
        let refill = base_date() + Days::new(refill_offset);
        let entry = MedicationStockEntry::new("Med".into(), refill, 1, dose);

        let forecasts = StockProjector::new().project(&[entry], base_date()).unwrap();
        prop_assert_eq!(forecasts[0].estimated_finish_date, refill);
    }

    #[test]
    fn warning_matches_window(entry in arb_entry(), as_of_offset in 0u64..1000) {
        let as_of = base_date() + Days::new(as_of_offset);
        let forecasts = StockProjector::new().project(&[entry], as_of).unwrap();
        let f = &forecasts[0];

        let gap = (f.estimated_finish_date - as_of).num_days();
        prop_assert_eq!(f.warning_active, gap <= 7);
    }

    #[test]
    fn project_is_pure(entries in prop::collection::vec(arb_entry(), 0..8), as_of_offset in 0u64..1000) {
        let as_of = base_date() + Days::new(as_of_offset);
        let before = entries.clone();
        let projector = StockProjector::new();

        let first = projector.project(&entries, as_of).unwrap();
        let second = projector.project(&entries, as_of).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&entries, &before);
        prop_assert_eq!(first.len(), entries.len());
        for (f, e) in first.iter().zip(entries.iter()) {
            prop_assert_eq!(&f.stock_id, &e.stock_id);
        }
    }

    #[test]
    fn unknown_id_leaves_list_unchanged(entries in prop::collection::vec(arb_entry(), 0..8)) {
        let before = entries.clone();
        let result = StockProjector::new().apply_dose_update(&entries, "no-such-id", Decimal::ONE);

        prop_assert_eq!(result, Err(StockError::NotFound("no-such-id".into())));
        prop_assert_eq!(entries, before);
    }

    #[test]
    fn non_positive_dose_never_appended(
        entries in prop::collection::vec(arb_entry(), 0..8),
        dose_tenths in -100i64..=0,
    ) {
        let mut bad = MedicationStockEntry::new("Bad".into(), base_date(), 10, Decimal::ONE);
        bad.dose_per_day = Decimal::new(dose_tenths, 1);

        let result = StockProjector::new().append_stock_entry(&entries, bad);
        let is_invalid_dose = matches!(result, Err(StockError::InvalidDose { .. }));
        prop_assert!(is_invalid_dose);
    }
}

//! Dated windows over a subject's performance records

use chrono::{Duration, NaiveDate};

use crate::models::{PerformanceRecord, StatField};

/// Records falling in the before and after windows around a center date.
///
/// A record dated exactly on the center date belongs to neither side.
#[derive(Debug, Clone, Default)]
pub struct WindowPartition<'a> {
    pub before: Vec<&'a PerformanceRecord>,
    pub after: Vec<&'a PerformanceRecord>,
}

impl<'a> WindowPartition<'a> {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    pub fn mean_before(&self, field: StatField) -> Option<f64> {
        mean(&self.before, field)
    }

    pub fn mean_after(&self, field: StatField) -> Option<f64> {
        mean(&self.after, field)
    }
}

/// Partition `records` into those strictly before `center` (at most `days_before` days earlier)
/// and those strictly after it (at most `days_after` days later). Input order is preserved.
pub fn aggregate<'a>(
    records: &'a [PerformanceRecord],
    center: NaiveDate,
    days_before: u32,
    days_after: u32,
) -> WindowPartition<'a> {
    let window_start = center - Duration::days(days_before as i64);
    let window_end = center + Duration::days(days_after as i64);

    let mut partition = WindowPartition::default();
    for record in records {
        if record.game_date >= window_start && record.game_date < center {
            partition.before.push(record);
        } else if record.game_date > center && record.game_date <= window_end {
            partition.after.push(record);
        }
    }
    partition
}

/// Mean of `field` over `records`; `None` for an empty set
pub fn mean(records: &[&PerformanceRecord], field: StatField) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let total: f64 = records.iter().map(|r| field.value(r)).sum();
    Some(total / records.len() as f64)
}

/// Mean of `field` over an owned slice of records; `None` for an empty slice
pub fn mean_of(records: &[PerformanceRecord], field: StatField) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let total: f64 = records.iter().map(|r| field.value(r)).sum();
    Some(total / records.len() as f64)
}

/// Absolute distance in days between two dates
pub fn days_apart(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record_on(game_date: NaiveDate, fantasy_points: f64) -> PerformanceRecord {
        PerformanceRecord { fantasy_points, ..PerformanceRecord::empty(1, game_date) }
    }

    #[test]
    fn test_center_date_excluded() {
        let center = date(2024, 10, 15);
        let records = vec![
            record_on(date(2024, 10, 8), 10.0),
            record_on(center, 99.0),
            record_on(date(2024, 10, 22), 20.0),
        ];

        let partition = aggregate(&records, center, 30, 30);
        assert_eq!(partition.before.len(), 1);
        assert_eq!(partition.after.len(), 1);
        assert_eq!(partition.mean_before(StatField::FantasyPoints), Some(10.0));
        assert_eq!(partition.mean_after(StatField::FantasyPoints), Some(20.0));
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let center = date(2024, 10, 15);
        let records = vec![
            record_on(date(2024, 10, 8), 1.0),  // exactly 7 before
            record_on(date(2024, 10, 7), 2.0),  // 8 before
            record_on(date(2024, 10, 22), 3.0), // exactly 7 after
            record_on(date(2024, 10, 23), 4.0), // 8 after
        ];

        let partition = aggregate(&records, center, 7, 7);
        assert_eq!(partition.before.len(), 1);
        assert_eq!(partition.before[0].fantasy_points, 1.0);
        assert_eq!(partition.after.len(), 1);
        assert_eq!(partition.after[0].fantasy_points, 3.0);
    }

    #[test]
    fn test_empty_windows_have_no_mean() {
        let records: Vec<PerformanceRecord> = Vec::new();
        let partition = aggregate(&records, date(2024, 10, 15), 30, 30);
        assert!(partition.is_empty());
        assert_eq!(partition.mean_before(StatField::FantasyPoints), None);
        assert_eq!(mean_of(&records, StatField::ReceivingYards), None);
    }

    proptest! {
        #[test]
        fn prop_partition_is_disjoint_and_complete(
            offsets in proptest::collection::vec(-90i64..90, 0..40),
            days_before in 0u32..60,
            days_after in 0u32..60,
        ) {
            let center = date(2024, 10, 15);
            let records: Vec<PerformanceRecord> = offsets
                .iter()
                .enumerate()
                .map(|(i, off)| record_on(center + Duration::days(*off), i as f64))
                .collect();

            let partition = aggregate(&records, center, days_before, days_after);

            let outside = records
                .iter()
                .filter(|r| {
                    let off = (r.game_date - center).num_days();
                    off == 0 || off < -(days_before as i64) || off > days_after as i64
                })
                .count();

            prop_assert_eq!(partition.before.len() + partition.after.len() + outside, records.len());
            for r in &partition.before {
                prop_assert!(r.game_date < center);
                prop_assert!(!partition.after.iter().any(|a| std::ptr::eq(*a, *r)));
            }
            for r in &partition.after {
                prop_assert!(r.game_date > center);
            }
        }
    }
}

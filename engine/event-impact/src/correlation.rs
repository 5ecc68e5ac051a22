//! Before/after significance testing of life events against fantasy output

use bigdecimal::{BigDecimal, FromPrimitive};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::CorrelationParameters;
use crate::error::Result;
use crate::models::{LifeEvent, PerformanceRecord, StatField, SubjectId};
use crate::stats::{pearson_correlation, sample_mean, two_sample_t_test};
use crate::store::AnalyticsStore;
use crate::window;

/// A persisted correlation analysis for one (subject, event type) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub subject_id: SubjectId,
    pub event_type: String,
    pub correlation_coefficient: BigDecimal,
    /// Before-values plus after-values
    pub sample_size: usize,
    pub p_value: BigDecimal,
    /// `None` when both windows were constant and the statistic is unbounded
    pub t_statistic: Option<f64>,
    pub mean_before: f64,
    pub mean_after: f64,
    pub is_significant: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of a single analysis. Too few windows is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Result(CorrelationResult),
    NoResult { before_samples: usize, after_samples: usize },
}

impl AnalysisOutcome {
    pub fn result(&self) -> Option<&CorrelationResult> {
        match self {
            AnalysisOutcome::Result(result) => Some(result),
            AnalysisOutcome::NoResult { .. } => None,
        }
    }

    pub fn into_result(self) -> Option<CorrelationResult> {
        match self {
            AnalysisOutcome::Result(result) => Some(result),
            AnalysisOutcome::NoResult { .. } => None,
        }
    }
}

/// Tests whether a subject's fantasy output shifts around repeated events of one category
#[derive(Debug, Clone)]
pub struct CorrelationAnalyzer {
    params: CorrelationParameters,
}

impl CorrelationAnalyzer {
    pub fn new(params: CorrelationParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CorrelationParameters {
        &self.params
    }

    /// Load a subject's records and events from `store` and analyze one event category
    pub fn analyze(
        &self,
        store: &impl AnalyticsStore,
        subject_id: SubjectId,
        event_type: &str,
    ) -> Result<AnalysisOutcome> {
        let records = store.performance_records(subject_id)?;
        let events = store.life_events(subject_id)?;
        Ok(self.analyze_records(subject_id, event_type, &records, &events))
    }

    /// Analyze already-loaded data. Events whose category differs from `event_type` are ignored.
    pub fn analyze_records(
        &self,
        subject_id: SubjectId,
        event_type: &str,
        records: &[PerformanceRecord],
        events: &[LifeEvent],
    ) -> AnalysisOutcome {
        let matching: Vec<&LifeEvent> = events.iter().filter(|e| e.has_category(event_type)).collect();

        let mut before_values = Vec::new();
        let mut after_values = Vec::new();

        for event in &matching {
            let partition =
                window::aggregate(records, event.date, self.params.days_before, self.params.days_after);
            debug!(
                "Event {} on {}: {} games before, {} games after",
                event.id,
                event.date,
                partition.before.len(),
                partition.after.len()
            );

            if let Some(before) = partition.mean_before(StatField::FantasyPoints) {
                before_values.push(before);
            }
            if let Some(after) = partition.mean_after(StatField::FantasyPoints) {
                after_values.push(after);
            }
        }

        let min = self.params.min_samples_per_side;
        if before_values.len() < min || after_values.len() < min {
            info!(
                "Insufficient data for subject {} / {}: {} before, {} after (need {} each)",
                subject_id,
                event_type,
                before_values.len(),
                after_values.len(),
                min
            );
            return AnalysisOutcome::NoResult {
                before_samples: before_values.len(),
                after_samples: after_values.len(),
            };
        }

        // Guaranteed Some: both sides hold at least `min` >= 2 values
        let Some(test) = two_sample_t_test(&before_values, &after_values, self.params.test_kind) else {
            return AnalysisOutcome::NoResult {
                before_samples: before_values.len(),
                after_samples: after_values.len(),
            };
        };

        let (correlation, notes) = if before_values.len() == after_values.len() {
            (pearson_correlation(&before_values, &after_values), None)
        } else {
            (
                0.0,
                Some(format!(
                    "correlation not paired: {} before windows vs {} after windows",
                    before_values.len(),
                    after_values.len()
                )),
            )
        };

        let is_significant = test.p_value < self.params.significance_level;
        let result = CorrelationResult {
            subject_id,
            event_type: event_type.to_string(),
            correlation_coefficient: to_scaled_decimal(correlation, self.params.correlation_scale),
            sample_size: before_values.len() + after_values.len(),
            p_value: to_scaled_decimal(test.p_value, self.params.p_value_scale),
            t_statistic: test.statistic.is_finite().then_some(test.statistic),
            mean_before: sample_mean(&before_values).unwrap_or_default(),
            mean_after: sample_mean(&after_values).unwrap_or_default(),
            is_significant,
            notes,
            created_at: Utc::now(),
        };

        info!(
            "Analysis complete for subject {} / {}: r={}, p={}, significant={}",
            subject_id, event_type, result.correlation_coefficient, result.p_value, is_significant
        );

        AnalysisOutcome::Result(result)
    }
}

/// Fixed-precision decimal rounded to `scale` places; non-finite input maps to zero
fn to_scaled_decimal(value: f64, scale: i64) -> BigDecimal {
    BigDecimal::from_f64(value).unwrap_or_default().round(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsConfig;
    use crate::models::EventPolarity;
    use chrono::{Duration, NaiveDate};
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_analyzer() -> CorrelationAnalyzer {
        CorrelationAnalyzer::new(AnalyticsConfig::default().correlation)
    }

    fn create_test_event(id: i64, category: &str, on: NaiveDate) -> LifeEvent {
        LifeEvent {
            id,
            subject_id: 1,
            polarity: EventPolarity::Positive,
            category: category.to_string(),
            date: on,
            description: String::new(),
        }
    }

    fn record(on: NaiveDate, fantasy_points: f64) -> PerformanceRecord {
        PerformanceRecord { fantasy_points, ..PerformanceRecord::empty(1, on) }
    }

    /// Three events spaced far apart, one game a week before and after each
    fn create_separated_history(before: [f64; 3], after: [f64; 3]) -> (Vec<PerformanceRecord>, Vec<LifeEvent>) {
        let mut records = Vec::new();
        let mut events = Vec::new();
        for i in 0..3 {
            let center = date(2023, 1, 1) + Duration::days(200 * i as i64);
            events.push(create_test_event(i as i64 + 1, "birth", center));
            records.push(record(center - Duration::days(7), before[i]));
            records.push(record(center + Duration::days(7), after[i]));
        }
        (records, events)
    }

    #[test]
    fn test_clear_shift_is_significant() {
        let (records, events) = create_separated_history([10.0, 12.0, 11.0], [20.0, 22.0, 21.0]);
        let outcome = create_test_analyzer().analyze_records(1, "birth", &records, &events);

        let result = outcome.result().expect("expected a correlation result");
        assert_eq!(result.sample_size, 6);
        assert_eq!(result.mean_before, 11.0);
        assert_eq!(result.mean_after, 21.0);
        assert_eq!(result.correlation_coefficient, BigDecimal::from_str("1.0000").unwrap());
        assert!(result.is_significant);
        assert!(result.p_value < BigDecimal::from_str("0.001").unwrap());
        assert!(result.notes.is_none());
    }

    #[test]
    fn test_two_events_is_no_result() {
        let (records, mut events) = create_separated_history([10.0, 12.0, 11.0], [20.0, 22.0, 21.0]);
        events.pop();

        let outcome = create_test_analyzer().analyze_records(1, "birth", &records, &events);
        assert_eq!(outcome, AnalysisOutcome::NoResult { before_samples: 2, after_samples: 2 });
    }

    #[test]
    fn test_category_match_is_case_insensitive() {
        let (records, events) = create_separated_history([10.0, 12.0, 11.0], [20.0, 22.0, 21.0]);
        let analyzer = create_test_analyzer();

        assert!(analyzer.analyze_records(1, "BIRTH", &records, &events).result().is_some());
        assert!(matches!(
            analyzer.analyze_records(1, "injury", &records, &events),
            AnalysisOutcome::NoResult { before_samples: 0, after_samples: 0 }
        ));
    }

    #[test]
    fn test_unequal_lengths_report_zero_correlation() {
        let (mut records, mut events) = create_separated_history([10.0, 12.0, 11.0], [20.0, 22.0, 21.0]);
        // A fourth event with only a before-window game
        let center = date(2025, 6, 1);
        events.push(create_test_event(4, "birth", center));
        records.push(record(center - Duration::days(3), 9.0));

        let outcome = create_test_analyzer().analyze_records(1, "birth", &records, &events);
        let result = outcome.into_result().unwrap();

        assert_eq!(result.sample_size, 7);
        assert_eq!(result.correlation_coefficient, BigDecimal::from(0));
        assert!(result.notes.unwrap().contains("4 before windows vs 3 after windows"));
    }

    #[test]
    fn test_no_shift_is_not_significant() {
        let (records, events) = create_separated_history([10.0, 14.0, 12.0], [13.0, 11.0, 12.0]);
        let result = create_test_analyzer().analyze_records(1, "birth", &records, &events).into_result().unwrap();

        assert!(!result.is_significant);
        assert!(result.p_value >= BigDecimal::from_str("0.05").unwrap());
    }

    #[test]
    fn test_decimal_scales() {
        let value = to_scaled_decimal(0.123_456_789, 4);
        assert_eq!(value, BigDecimal::from_str("0.1235").unwrap());
        assert_eq!(to_scaled_decimal(f64::NAN, 8), BigDecimal::from(0));
    }

    #[test]
    fn test_analyze_through_store() {
        use crate::models::{Position, Subject};
        use crate::store::Dataset;

        let (records, events) = create_separated_history([10.0, 12.0, 11.0], [20.0, 22.0, 21.0]);
        let dataset = Dataset {
            subjects: vec![Subject { id: 1, name: "Test".into(), team: "KC".into(), position: Position::Wr }],
            performance_records: records,
            life_events: events,
            ..Default::default()
        };

        let outcome = create_test_analyzer().analyze(&dataset, 1, "birth").unwrap();
        assert!(outcome.result().is_some());
    }
}

//! Periodic correlation sweep over every subject with life events

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::config::{AnalyticsConfig, SweepConfig};
use crate::correlation::{AnalysisOutcome, CorrelationAnalyzer, CorrelationResult};
use crate::error::{AnalyticsError, Result};
use crate::models::{LifeEvent, SubjectId};
use crate::store::{AnalyticsStore, ResultSink};

/// A subject the sweep could not analyze
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub subject_id: SubjectId,
    pub message: String,
}

/// Summary of one sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub subjects: usize,
    /// (subject, event type) pairs evaluated
    pub pairs_analyzed: usize,
    pub results_written: usize,
    pub no_result: usize,
    pub failures: Vec<SweepFailure>,
}

/// Everything evaluated for one subject, before anything is written
#[derive(Debug, Default)]
struct SubjectOutcome {
    pairs: usize,
    results: Vec<CorrelationResult>,
    no_result: usize,
}

/// Runs the correlation analyzer for every (subject, event type) pair
#[derive(Debug, Clone)]
pub struct AnalysisSweep {
    analyzer: CorrelationAnalyzer,
    config: SweepConfig,
}

impl AnalysisSweep {
    pub fn new(analyzer: CorrelationAnalyzer, config: SweepConfig) -> Self {
        Self { analyzer, config }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(CorrelationAnalyzer::new(config.correlation.clone()), config.sweep.clone())
    }

    /// Evaluate all pairs and append successful results to `sink`.
    ///
    /// Upstream failures for a subject are logged and recorded in the report; the sweep
    /// moves on to the next subject. Any other error, including a sink failure, aborts it.
    pub fn run<S>(&self, store: &S, sink: &mut impl ResultSink) -> Result<SweepReport>
    where
        S: AnalyticsStore + Sync,
    {
        let started_at = Utc::now();
        let subjects = store.subjects_with_events()?;

        if subjects.is_empty() {
            info!("No subjects with life events to analyze");
        } else {
            info!("Starting analysis sweep over {} subjects", subjects.len());
        }

        let outcomes: Vec<(SubjectId, Result<SubjectOutcome>)> = if self.config.parallel {
            subjects.par_iter().map(|&id| (id, self.evaluate_subject(store, id))).collect()
        } else {
            subjects.iter().map(|&id| (id, self.evaluate_subject(store, id))).collect()
        };

        let mut report = SweepReport {
            started_at,
            finished_at: started_at,
            subjects: subjects.len(),
            pairs_analyzed: 0,
            results_written: 0,
            no_result: 0,
            failures: Vec::new(),
        };

        // Results are written in subject order regardless of evaluation order
        for (subject_id, outcome) in outcomes {
            match outcome {
                Ok(outcome) => {
                    report.pairs_analyzed += outcome.pairs;
                    report.no_result += outcome.no_result;
                    for result in &outcome.results {
                        sink.append(result)?;
                        report.results_written += 1;
                    }
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping subject {} in sweep: {}", subject_id, e);
                    report.failures.push(SweepFailure { subject_id, message: e.to_string() });
                }
                Err(e) => return Err(e),
            }
        }

        report.finished_at = Utc::now();
        info!(
            "Analysis sweep complete: {} correlations written, {} pairs without enough data, {} failures",
            report.results_written,
            report.no_result,
            report.failures.len()
        );
        Ok(report)
    }

    fn evaluate_subject(&self, store: &impl AnalyticsStore, subject_id: SubjectId) -> Result<SubjectOutcome> {
        let records = store.performance_records(subject_id)?;
        let events = store.life_events(subject_id)?;
        if records.is_empty() {
            return Err(AnalyticsError::source_failure(subject_id, "no performance records available"));
        }

        let mut outcome = SubjectOutcome::default();
        for event_type in self.event_types(&events) {
            outcome.pairs += 1;
            match self.analyzer.analyze_records(subject_id, &event_type, &records, &events) {
                AnalysisOutcome::Result(result) => outcome.results.push(result),
                AnalysisOutcome::NoResult { .. } => outcome.no_result += 1,
            }
        }
        Ok(outcome)
    }

    /// Configured categories, or every distinct (lower-cased) category of the subject's events
    fn event_types(&self, events: &[LifeEvent]) -> Vec<String> {
        if !self.config.event_categories.is_empty() {
            return self.config.event_categories.clone();
        }
        events
            .iter()
            .map(|e| e.category.trim().to_lowercase())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AnalyticsError, Result};
use crate::stats::TestKind;

/// Prefix for environment overrides, e.g. `EVENT_IMPACT__CORRELATION__DAYS_BEFORE=21`
pub const ENV_PREFIX: &str = "EVENT_IMPACT";

/// Configuration for the event impact engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Input dataset and result log locations
    pub data: DataConfig,

    /// Correlation analyzer parameters
    pub correlation: CorrelationParameters,

    /// Event proximity profiler parameters
    pub profiler: ProfilerParameters,

    /// Matchup projection parameters
    pub projection: ProjectionParameters,

    /// Analysis sweep configuration
    pub sweep: SweepConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON dataset with subjects, records, events, defenses, matchups and head-to-head history
    pub dataset_path: PathBuf,

    /// Append-only JSON Lines log of correlation results
    pub results_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationParameters {
    /// Days before each event included in the before window
    pub days_before: u32,

    /// Days after each event included in the after window
    pub days_after: u32,

    /// Minimum number of window means required on each side
    pub min_samples_per_side: usize,

    /// p-value below which a result is flagged significant
    pub significance_level: f64,

    /// Decimal places persisted for the correlation coefficient
    pub correlation_scale: i64,

    /// Decimal places persisted for the p-value
    pub p_value_scale: i64,

    /// Variance assumption of the two-sample test
    pub test_kind: TestKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilerParameters {
    /// Absolute day distances at which proximity aggregates are computed
    pub proximity_thresholds: Vec<u32>,

    /// Number of most recent games shown as recent form
    pub recent_games: usize,

    /// Maximum distance in days for a recent game to be flagged near an event
    pub near_event_days: u32,

    /// Games taken on each side of an event for before/after comparisons
    pub comparison_games: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionParameters {
    /// Events at most this many days before the matchup adjust the projection
    pub event_window_days: u32,

    /// Fractional boost per positive event (0.12 = +12%)
    pub positive_event_impact: f64,

    /// Fractional penalty per non-positive event (0.08 = -8%)
    pub negative_event_impact: f64,

    /// Defense rank that leaves the projection unchanged
    pub neutral_rank: u32,

    /// Fractional change per rank away from neutral
    pub rank_step: f64,

    /// Ranks at or below this are a tough matchup
    pub tough_rank_max: u32,

    /// Ranks at or above this are a favorable matchup
    pub favorable_rank_min: u32,

    /// Head-to-head average above base × this is a strong history
    pub history_strong_ratio: f64,

    /// Head-to-head average below base × this is a struggling history
    pub history_weak_ratio: f64,

    /// Minimum record count that earns the sample-size confidence weight
    pub min_records_for_confidence: usize,

    /// Confidence multiplier when the matchup season differs from the records' season
    pub cross_season_factor: f64,

    /// Projection minus prop line needed for a STRONG call
    pub strong_edge: f64,

    /// Projection minus prop line needed for a LEAN call
    pub lean_edge: f64,

    /// Confidence required for a STRONG call
    pub strong_min_confidence: u32,

    /// Confidence weights, summing to at most 100
    pub confidence: ConfidenceWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub life_event: u32,
    pub defense_profile: u32,
    pub head_to_head: u32,
    pub sample_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Event categories analyzed per subject; empty means every category the subject has
    pub event_categories: Vec<String>,

    /// Hours between sweeps in watch mode
    pub interval_hours: u64,

    /// Evaluate subjects in parallel (results are still written sequentially)
    pub parallel: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                dataset_path: PathBuf::from("data/dataset.json"),
                results_path: PathBuf::from("data/correlation_results.jsonl"),
            },
            correlation: CorrelationParameters {
                days_before: 30,
                days_after: 30,
                min_samples_per_side: 3,
                significance_level: 0.05,
                correlation_scale: 4,
                p_value_scale: 8,
                test_kind: TestKind::Student,
            },
            profiler: ProfilerParameters {
                proximity_thresholds: vec![7, 14, 30],
                recent_games: 5,
                near_event_days: 7,
                comparison_games: 3,
            },
            projection: ProjectionParameters {
                event_window_days: 7,
                positive_event_impact: 0.12,
                negative_event_impact: 0.08,
                neutral_rank: 16,
                rank_step: 0.02,
                tough_rank_max: 10,
                favorable_rank_min: 23,
                history_strong_ratio: 1.15,
                history_weak_ratio: 0.85,
                min_records_for_confidence: 5,
                cross_season_factor: 0.85,
                strong_edge: 8.0,
                lean_edge: 4.0,
                strong_min_confidence: 60,
                confidence: ConfidenceWeights {
                    life_event: 25,
                    defense_profile: 35,
                    head_to_head: 20,
                    sample_size: 20,
                },
            },
            sweep: SweepConfig {
                event_categories: ["birth", "marriage", "injury", "family_issue", "contract"]
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
                interval_hours: 12,
                parallel: true,
            },
        }
    }
}

impl AnalyticsConfig {
    /// Load defaults, then an optional TOML file, then `EVENT_IMPACT__*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
            .build()?;

        let config: AnalyticsConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| AnalyticsError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject parameter combinations the engines cannot work with
    pub fn validate(&self) -> Result<()> {
        let corr = &self.correlation;
        if !(corr.significance_level > 0.0 && corr.significance_level < 1.0) {
            return Err(AnalyticsError::Config(format!(
                "significance_level must be in (0, 1), got {}",
                corr.significance_level
            )));
        }
        if corr.min_samples_per_side < 2 {
            return Err(AnalyticsError::Config("min_samples_per_side must be at least 2".into()));
        }
        if corr.correlation_scale < 0 || corr.p_value_scale < 0 {
            return Err(AnalyticsError::Config("decimal scales must be non-negative".into()));
        }

        let prof = &self.profiler;
        if prof.proximity_thresholds.is_empty() || prof.proximity_thresholds.contains(&0) {
            return Err(AnalyticsError::Config("proximity_thresholds must be non-empty and positive".into()));
        }
        if prof.comparison_games == 0 {
            return Err(AnalyticsError::Config("comparison_games must be positive".into()));
        }

        let proj = &self.projection;
        let weights = &proj.confidence;
        let total = weights.life_event + weights.defense_profile + weights.head_to_head + weights.sample_size;
        if total > 100 {
            return Err(AnalyticsError::Config(format!("confidence weights sum to {total}, above 100")));
        }
        if proj.tough_rank_max >= proj.favorable_rank_min {
            return Err(AnalyticsError::Config("tough_rank_max must be below favorable_rank_min".into()));
        }
        if proj.lean_edge > proj.strong_edge {
            return Err(AnalyticsError::Config("lean_edge must not exceed strong_edge".into()));
        }
        if !(0.0..=1.0).contains(&proj.cross_season_factor) {
            return Err(AnalyticsError::Config("cross_season_factor must be in [0, 1]".into()));
        }

        if self.sweep.interval_hours == 0 {
            return Err(AnalyticsError::Config("sweep interval_hours must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalyticsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.correlation.days_before, 30);
        assert_eq!(config.profiler.proximity_thresholds, vec![7, 14, 30]);
        assert_eq!(config.sweep.event_categories.len(), 5);
    }

    #[test]
    fn test_invalid_significance_level_rejected() {
        let mut config = AnalyticsConfig::default();
        config.correlation.significance_level = 1.5;
        assert!(matches!(config.validate(), Err(AnalyticsError::Config(_))));
    }

    #[test]
    fn test_overweight_confidence_rejected() {
        let mut config = AnalyticsConfig::default();
        config.projection.confidence.sample_size = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event_impact.toml");

        let mut config = AnalyticsConfig::default();
        config.correlation.days_before = 21;
        config.projection.strong_edge = 10.0;
        config.to_file(&path).unwrap();

        let loaded = AnalyticsConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.correlation.days_before, 21);
        assert_eq!(loaded.projection.strong_edge, 10.0);
        assert_eq!(loaded.projection.neutral_rank, 16);
    }
}

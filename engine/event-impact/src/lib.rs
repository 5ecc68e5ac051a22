//! Event Impact Engine
//!
//! Tests whether an athlete's fantasy output shifts around personal life events
//! (births, injuries, contract changes, ...) and projects yardage for upcoming
//! matchups from season baseline, recent events, opponent defense and
//! head-to-head history. All computations are synchronous and run over data
//! read through a caller-owned [`AnalyticsStore`].

pub mod config;
pub mod correlation;
pub mod defense;
pub mod error;
pub mod matchup;
pub mod models;
pub mod proximity;
pub mod stats;
pub mod store;
pub mod sweep;
pub mod window;

pub use config::AnalyticsConfig;
pub use correlation::{AnalysisOutcome, CorrelationAnalyzer, CorrelationResult};
pub use error::{AnalyticsError, Result};
pub use matchup::{MatchupInputs, MatchupProjector, Projection, ProjectionFactor, Recommendation};
pub use models::*;
pub use proximity::{ProximityProfile, ProximityProfiler};
pub use store::{AnalyticsStore, Dataset, JsonlResultLog, ResultSink};
pub use sweep::{AnalysisSweep, SweepReport};

//! Stats ingestion
//!
//! Converts upstream weekly game rows and league-wide defensive summaries into the
//! engine's performance records and ranked defense profiles, and merges them into a
//! [`event_impact::Dataset`] keyed by their natural keys.

pub mod error;
pub mod import;
pub mod models;
pub mod scoring;
pub mod source;

pub use error::{IngestError, Result};
pub use import::{import_defense_week, import_game_log, ImportSummary};
pub use models::*;
pub use scoring::{estimate_game_date, ScoringRules};
pub use source::{JsonDirectorySource, StatsSource};

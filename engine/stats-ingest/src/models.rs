use event_impact::{OpponentDefenseProfile, PerformanceRecord, SubjectId};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use crate::scoring::{estimate_game_date, ScoringRules};

/// One weekly stat row as published by the upstream data source.
///
/// Counting stats arrive as floats (or null) and are rounded on conversion.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawGameRow {
    /// Upstream player identifier
    #[serde(alias = "gsis_id")]
    pub player_id: String,

    pub season: Option<i32>,
    pub week: Option<u32>,

    pub targets: Option<f64>,
    pub receptions: Option<f64>,
    pub receiving_yards: Option<f64>,
    pub receiving_tds: Option<f64>,

    pub carries: Option<f64>,
    pub rushing_yards: Option<f64>,
    pub rushing_tds: Option<f64>,

    pub completions: Option<f64>,
    #[serde(rename = "attempts")]
    pub pass_attempts: Option<f64>,
    pub passing_yards: Option<f64>,
    pub passing_tds: Option<f64>,
    pub interceptions: Option<f64>,

    #[serde(rename = "sack_fumbles_lost")]
    pub fumbles: Option<f64>,

    #[serde(rename = "fantasy_points_ppr")]
    pub fantasy_points: Option<f64>,
}

fn count(value: Option<f64>) -> i32 {
    value.filter(|v| v.is_finite()).map(|v| v.round() as i32).unwrap_or(0)
}

impl RawGameRow {
    /// Convert to a performance record for `subject_id`.
    ///
    /// The game date is estimated from season and week (the row's season wins over
    /// `default_season`). Rows without published fantasy points are scored with `rules`.
    pub fn to_performance_record(
        &self,
        subject_id: SubjectId,
        default_season: i32,
        rules: &ScoringRules,
    ) -> Result<PerformanceRecord> {
        let season = self.season.unwrap_or(default_season);
        let week = self.week.unwrap_or(1);
        let game_date = estimate_game_date(season, week).ok_or_else(|| {
            IngestError::Malformed(format!("player {}: no game date for season {season} week {week}", self.player_id))
        })?;

        let mut record = PerformanceRecord {
            targets: count(self.targets),
            receptions: count(self.receptions),
            receiving_yards: count(self.receiving_yards),
            receiving_tds: count(self.receiving_tds),
            carries: count(self.carries),
            rushing_yards: count(self.rushing_yards),
            rushing_tds: count(self.rushing_tds),
            completions: count(self.completions),
            pass_attempts: count(self.pass_attempts),
            passing_yards: count(self.passing_yards),
            passing_tds: count(self.passing_tds),
            interceptions: count(self.interceptions),
            fumbles: count(self.fumbles),
            ..PerformanceRecord::empty(subject_id, game_date)
        };
        record.fantasy_points = match self.fantasy_points.filter(|v| v.is_finite()) {
            Some(points) => points,
            None => rules.score(&record),
        };
        Ok(record)
    }
}

/// League-wide defensive summary row for one team
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawDefenseSummary {
    #[serde(alias = "team_abbr")]
    pub team: String,
    pub pass_yards_allowed_per_game: f64,
    pub rush_yards_allowed_per_game: f64,
    #[serde(default)]
    pub passing_tds_allowed: u32,
    #[serde(default)]
    pub rushing_tds_allowed: u32,
    #[serde(default)]
    pub sacks: u32,
}

impl RawDefenseSummary {
    /// Unranked profile for (season, week); ranks are assigned across the whole week later
    pub fn to_profile(&self, season: i32, week: u32) -> OpponentDefenseProfile {
        OpponentDefenseProfile {
            team: self.team.trim().to_uppercase(),
            season,
            week,
            pass_yards_allowed_per_game: self.pass_yards_allowed_per_game,
            rush_yards_allowed_per_game: self.rush_yards_allowed_per_game,
            passing_tds_allowed: self.passing_tds_allowed,
            rushing_tds_allowed: self.rushing_tds_allowed,
            sacks: self.sacks,
            pass_defense_rank: 0,
            rush_defense_rank: 0,
        }
    }
}

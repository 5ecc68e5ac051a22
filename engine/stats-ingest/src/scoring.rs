use chrono::{Duration, NaiveDate};
use event_impact::PerformanceRecord;
use serde::{Deserialize, Serialize};

/// Fantasy scoring weights per unit of each statistic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub reception: f64,
    pub receiving_yard: f64,
    pub receiving_td: f64,
    pub rushing_yard: f64,
    pub rushing_td: f64,
    pub passing_yard: f64,
    pub passing_td: f64,
    pub interception: f64,
    pub fumble: f64,
}

impl ScoringRules {
    /// Point-per-reception scoring
    pub fn ppr() -> Self {
        Self {
            reception: 1.0,
            receiving_yard: 0.1,
            receiving_td: 6.0,
            rushing_yard: 0.1,
            rushing_td: 6.0,
            passing_yard: 0.04,
            passing_td: 4.0,
            interception: -2.0,
            fumble: -2.0,
        }
    }

    /// Fantasy points for one game, rounded to two decimals
    pub fn score(&self, record: &PerformanceRecord) -> f64 {
        let points = record.receptions as f64 * self.reception
            + record.receiving_yards as f64 * self.receiving_yard
            + record.receiving_tds as f64 * self.receiving_td
            + record.rushing_yards as f64 * self.rushing_yard
            + record.rushing_tds as f64 * self.rushing_td
            + record.passing_yards as f64 * self.passing_yard
            + record.passing_tds as f64 * self.passing_td
            + record.interceptions as f64 * self.interception
            + record.fumbles as f64 * self.fumble;
        (points * 100.0).round() / 100.0
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self::ppr()
    }
}

/// Opening day of a regular season
pub fn season_kickoff(season: i32) -> Option<NaiveDate> {
    match season {
        2025 => NaiveDate::from_ymd_opt(2025, 9, 4),
        2024 => NaiveDate::from_ymd_opt(2024, 9, 5),
        _ => NaiveDate::from_ymd_opt(season, 9, 5),
    }
}

/// Approximate date of a week's games: kickoff plus one week per week number.
/// `None` for week 0 or an unrepresentable season.
pub fn estimate_game_date(season: i32, week: u32) -> Option<NaiveDate> {
    if week == 0 {
        return None;
    }
    Some(season_kickoff(season)? + Duration::days(7 * (week as i64 - 1)))
}

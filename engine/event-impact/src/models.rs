use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalyticsError;

/// Subject (athlete) identifier
pub type SubjectId = i32;

/// Roster position of a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    Qb,
    Rb,
    Fb,
    Wr,
    Te,
    K,
}

impl Position {
    /// Pass-catching positions are projected on receiving yards, everyone else on rushing yards
    pub fn is_pass_catcher(&self) -> bool {
        matches!(self, Position::Wr | Position::Te)
    }

    /// The statistic a matchup projection targets for this position
    pub fn projection_field(&self) -> StatField {
        if self.is_pass_catcher() {
            StatField::ReceivingYards
        } else {
            StatField::RushingYards
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Qb => "QB",
            Position::Rb => "RB",
            Position::Fb => "FB",
            Position::Wr => "WR",
            Position::Te => "TE",
            Position::K => "K",
        }
    }
}

impl FromStr for Position {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QB" => Ok(Position::Qb),
            "RB" | "HB" => Ok(Position::Rb),
            "FB" => Ok(Position::Fb),
            "WR" => Ok(Position::Wr),
            "TE" => Ok(Position::Te),
            "K" | "PK" => Ok(Position::K),
            _ => Err(AnalyticsError::InvalidPosition(s.to_string())),
        }
    }
}

impl TryFrom<String> for Position {
    type Error = AnalyticsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.as_str().to_string()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The athlete being analyzed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    /// Team abbreviation (e.g., "KC", "BUF")
    pub team: String,
    pub position: Position,
}

/// One game's box score for a subject. `game_date` is the natural key within a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub subject_id: SubjectId,
    pub game_date: NaiveDate,

    #[serde(default)]
    pub passing_yards: i32,
    #[serde(default)]
    pub passing_tds: i32,
    #[serde(default)]
    pub interceptions: i32,
    #[serde(default)]
    pub completions: i32,
    #[serde(default)]
    pub pass_attempts: i32,

    #[serde(default)]
    pub rushing_yards: i32,
    #[serde(default)]
    pub rushing_tds: i32,
    #[serde(default)]
    pub carries: i32,

    #[serde(default)]
    pub receptions: i32,
    #[serde(default)]
    pub receiving_yards: i32,
    #[serde(default)]
    pub receiving_tds: i32,
    #[serde(default)]
    pub targets: i32,

    #[serde(default)]
    pub fumbles: i32,
    #[serde(default)]
    pub fantasy_points: f64,
}

impl PerformanceRecord {
    /// An all-zero box score for `subject_id` on `game_date`
    pub fn empty(subject_id: SubjectId, game_date: NaiveDate) -> Self {
        Self {
            subject_id,
            game_date,
            passing_yards: 0,
            passing_tds: 0,
            interceptions: 0,
            completions: 0,
            pass_attempts: 0,
            rushing_yards: 0,
            rushing_tds: 0,
            carries: 0,
            receptions: 0,
            receiving_yards: 0,
            receiving_tds: 0,
            targets: 0,
            fumbles: 0,
            fantasy_points: 0.0,
        }
    }

    /// Receiving plus rushing touchdowns
    pub fn total_touchdowns(&self) -> i32 {
        self.receiving_tds + self.rushing_tds
    }

    /// Season this game belongs to. January and February games close out the previous season.
    pub fn season(&self) -> i32 {
        season_of(self.game_date)
    }
}

/// Season a calendar date belongs to (playoff games early in the year count toward the prior season)
pub fn season_of(date: NaiveDate) -> i32 {
    if date.month() <= 2 {
        date.year() - 1
    } else {
        date.year()
    }
}

/// Numeric fields that can be averaged over a set of performance records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    FantasyPoints,
    PassingYards,
    PassingTds,
    Interceptions,
    Completions,
    PassAttempts,
    RushingYards,
    RushingTds,
    Carries,
    Receptions,
    ReceivingYards,
    ReceivingTds,
    Targets,
    Fumbles,
    TotalTouchdowns,
}

impl StatField {
    pub fn value(&self, record: &PerformanceRecord) -> f64 {
        match self {
            StatField::FantasyPoints => record.fantasy_points,
            StatField::PassingYards => record.passing_yards as f64,
            StatField::PassingTds => record.passing_tds as f64,
            StatField::Interceptions => record.interceptions as f64,
            StatField::Completions => record.completions as f64,
            StatField::PassAttempts => record.pass_attempts as f64,
            StatField::RushingYards => record.rushing_yards as f64,
            StatField::RushingTds => record.rushing_tds as f64,
            StatField::Carries => record.carries as f64,
            StatField::Receptions => record.receptions as f64,
            StatField::ReceivingYards => record.receiving_yards as f64,
            StatField::ReceivingTds => record.receiving_tds as f64,
            StatField::Targets => record.targets as f64,
            StatField::Fumbles => record.fumbles as f64,
            StatField::TotalTouchdowns => record.total_touchdowns() as f64,
        }
    }
}

/// Direction of a life event. Anything other than "positive" normalizes to `Negative` at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventPolarity {
    Positive,
    Negative,
}

impl EventPolarity {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("positive") {
            EventPolarity::Positive
        } else {
            EventPolarity::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventPolarity::Positive => "positive",
            EventPolarity::Negative => "negative",
        }
    }
}

impl From<String> for EventPolarity {
    fn from(raw: String) -> Self {
        EventPolarity::parse(&raw)
    }
}

impl From<EventPolarity> for String {
    fn from(polarity: EventPolarity) -> Self {
        polarity.as_str().to_string()
    }
}

impl fmt::Display for EventPolarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dated personal event in a subject's life
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifeEvent {
    pub id: i64,
    pub subject_id: SubjectId,
    #[serde(alias = "event_type")]
    pub polarity: EventPolarity,
    /// Free-form label such as "birth", "injury" or "contract"
    #[serde(alias = "event_category")]
    pub category: String,
    #[serde(alias = "event_date")]
    pub date: NaiveDate,
    #[serde(default, alias = "event_description")]
    pub description: String,
}

impl LifeEvent {
    /// Whether this event's category matches `event_type` (case-insensitive)
    pub fn has_category(&self, event_type: &str) -> bool {
        self.category.trim().eq_ignore_ascii_case(event_type.trim())
    }
}

/// A team's defensive profile for one (season, week)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentDefenseProfile {
    /// Team abbreviation (e.g., "KC", "BUF")
    pub team: String,
    pub season: i32,
    pub week: u32,
    pub pass_yards_allowed_per_game: f64,
    pub rush_yards_allowed_per_game: f64,
    #[serde(default)]
    pub passing_tds_allowed: u32,
    #[serde(default)]
    pub rushing_tds_allowed: u32,
    #[serde(default)]
    pub sacks: u32,
    /// 1 = fewest pass yards allowed
    #[serde(default)]
    pub pass_defense_rank: u32,
    /// 1 = fewest rush yards allowed
    #[serde(default)]
    pub rush_defense_rank: u32,
}

impl OpponentDefenseProfile {
    /// Rank against the statistic a subject at `position` is projected on
    pub fn rank_for(&self, position: Position) -> u32 {
        if position.is_pass_catcher() {
            self.pass_defense_rank
        } else {
            self.rush_defense_rank
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HomeAway {
    Home,
    Away,
}

/// An upcoming game for a subject, with optional prop lines to compare against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledMatchup {
    pub subject_id: SubjectId,
    pub game_date: NaiveDate,
    /// Opponent team abbreviation
    pub opponent: String,
    pub home_away: HomeAway,
    pub week: u32,
    pub season: i32,
    #[serde(default)]
    pub prop_receiving_yards: Option<f64>,
    #[serde(default)]
    pub prop_receptions: Option<f64>,
    #[serde(default)]
    pub prop_rush_yards: Option<f64>,
}

impl ScheduledMatchup {
    /// Prop line for the yardage statistic projected for `position`, if one was supplied
    pub fn prop_line_for(&self, position: Position) -> Option<f64> {
        if position.is_pass_catcher() {
            self.prop_receiving_yards
        } else {
            self.prop_rush_yards
        }
    }
}

/// A subject's performance in a prior meeting with a specific opponent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadToHeadRecord {
    pub subject_id: SubjectId,
    #[serde(alias = "opponent_team")]
    pub opponent: String,
    pub game_date: NaiveDate,
    #[serde(default)]
    pub receiving_yards: i32,
    #[serde(default)]
    pub receptions: i32,
    #[serde(default)]
    pub receiving_tds: i32,
    #[serde(default)]
    pub rushing_yards: i32,
    #[serde(default)]
    pub rushing_tds: i32,
    #[serde(default)]
    pub fantasy_points: f64,
}

impl HeadToHeadRecord {
    /// Yardage on the statistic projected for `position`
    pub fn yards_for(&self, position: Position) -> f64 {
        if position.is_pass_catcher() {
            self.receiving_yards as f64
        } else {
            self.rushing_yards as f64
        }
    }
}

/// Percent change from `base` to `value`; 0 when the base is zero
pub fn percent_change(base: f64, value: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        (value - base) / base * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_parsing() {
        assert_eq!("wr".parse::<Position>().unwrap(), Position::Wr);
        assert_eq!(" TE ".parse::<Position>().unwrap(), Position::Te);
        assert_eq!("HB".parse::<Position>().unwrap(), Position::Rb);
        assert!("LB".parse::<Position>().is_err());
    }

    #[test]
    fn test_projection_field_by_position() {
        assert_eq!(Position::Wr.projection_field(), StatField::ReceivingYards);
        assert_eq!(Position::Te.projection_field(), StatField::ReceivingYards);
        assert_eq!(Position::Rb.projection_field(), StatField::RushingYards);
        assert_eq!(Position::Qb.projection_field(), StatField::RushingYards);
    }

    #[test]
    fn test_polarity_normalization() {
        assert_eq!(EventPolarity::parse("positive"), EventPolarity::Positive);
        assert_eq!(EventPolarity::parse(" Positive "), EventPolarity::Positive);
        assert_eq!(EventPolarity::parse("negative"), EventPolarity::Negative);
        assert_eq!(EventPolarity::parse("neutral"), EventPolarity::Negative);
        assert_eq!(EventPolarity::parse(""), EventPolarity::Negative);
    }

    #[test]
    fn test_life_event_deserializes_legacy_field_names() {
        let json = r#"{
            "id": 7,
            "subject_id": 1,
            "event_type": "mixed",
            "event_category": "Birth",
            "event_date": "2024-10-01",
            "event_description": "Second child"
        }"#;
        let event: LifeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.polarity, EventPolarity::Negative);
        assert!(event.has_category("birth"));
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
    }

    #[test]
    fn test_season_of_playoff_dates() {
        assert_eq!(season_of(NaiveDate::from_ymd_opt(2024, 9, 5).unwrap()), 2024);
        assert_eq!(season_of(NaiveDate::from_ymd_opt(2025, 1, 12).unwrap()), 2024);
        assert_eq!(season_of(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()), 2025);
    }

    #[test]
    fn test_percent_change_zero_base() {
        assert_eq!(percent_change(0.0, 12.0), 0.0);
        assert!((percent_change(10.0, 12.0) - 20.0).abs() < 1e-9);
    }
}

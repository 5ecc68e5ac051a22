use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::config::ProjectionParameters;
use crate::error::{AnalyticsError, Result};
use crate::models::*;
use crate::stats::round_to;
use crate::store::AnalyticsStore;
use crate::window::mean_of;

/// Call relative to a prop line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "STRONG OVER")]
    StrongOver,
    #[serde(rename = "LEAN OVER")]
    LeanOver,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "LEAN UNDER")]
    LeanUnder,
    #[serde(rename = "STRONG UNDER")]
    StrongUnder,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Recommendation::StrongOver => "STRONG OVER",
            Recommendation::LeanOver => "LEAN OVER",
            Recommendation::Hold => "HOLD",
            Recommendation::LeanUnder => "LEAN UNDER",
            Recommendation::StrongUnder => "STRONG UNDER",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenseSide {
    Pass,
    Run,
}

impl DefenseSide {
    fn for_position(position: Position) -> Self {
        if position.is_pass_catcher() {
            DefenseSide::Pass
        } else {
            DefenseSide::Run
        }
    }
}

impl fmt::Display for DefenseSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefenseSide::Pass => f.write_str("pass"),
            DefenseSide::Run => f.write_str("run"),
        }
    }
}

/// One reason that shaped a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionFactor {
    LifeEvent { polarity: EventPolarity, category: String, days_before: i64 },
    ToughMatchup { rank: u32, side: DefenseSide },
    FavorableMatchup { rank: u32, side: DefenseSide },
    StrongHistory { opponent: String, games: usize },
    StrugglingHistory { opponent: String, games: usize },
    CrossSeasonBaseline { baseline_season: i32, matchup_season: i32 },
}

impl fmt::Display for ProjectionFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionFactor::LifeEvent { polarity, category, days_before } => {
                let sign = match polarity {
                    EventPolarity::Positive => '+',
                    EventPolarity::Negative => '-',
                };
                write!(f, "[{sign}] {category} ({days_before}d ago)")
            }
            ProjectionFactor::ToughMatchup { rank, side } => write!(f, "Tough matchup (#{rank} {side} defense)"),
            ProjectionFactor::FavorableMatchup { rank, side } => {
                write!(f, "Favorable matchup (#{rank} {side} defense)")
            }
            ProjectionFactor::StrongHistory { opponent, games } => {
                write!(f, "Strong history vs {opponent} ({games} games)")
            }
            ProjectionFactor::StrugglingHistory { opponent, games } => {
                write!(f, "Struggles vs {opponent} ({games} games)")
            }
            ProjectionFactor::CrossSeasonBaseline { baseline_season, matchup_season } => {
                write!(f, "Cross-season baseline ({baseline_season}->{matchup_season})")
            }
        }
    }
}

/// Yardage projection for one scheduled matchup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub subject_id: SubjectId,
    pub opponent: String,
    pub season: i32,
    pub week: u32,
    /// Statistic being projected (receiving or rushing yards)
    pub stat: StatField,
    pub base_projection: f64,
    pub event_adjustment: f64,
    pub opponent_adjustment: f64,
    /// Rounded to one decimal
    pub final_projection: f64,
    /// 0-100
    pub confidence: u32,
    pub recommendation: Recommendation,
    pub prop_line: Option<f64>,
    /// Average yardage in prior meetings with this opponent
    pub head_to_head_average: Option<f64>,
    pub factors: Vec<ProjectionFactor>,
}

/// Everything a projection reads, already loaded
#[derive(Debug, Clone, Copy)]
pub struct MatchupInputs<'a> {
    pub subject: &'a Subject,
    pub matchup: &'a ScheduledMatchup,
    pub life_events: &'a [LifeEvent],
    pub records: &'a [PerformanceRecord],
    /// Opponent profile for the matchup's (season, week), if known
    pub defense: Option<&'a OpponentDefenseProfile>,
    pub head_to_head: &'a [HeadToHeadRecord],
}

/// Matchup projection engine
#[derive(Debug, Clone)]
pub struct MatchupProjector {
    params: ProjectionParameters,
}

impl MatchupProjector {
    pub fn new(params: ProjectionParameters) -> Self {
        Self { params }
    }

    /// Project the `index`-th scheduled matchup (in date order) of a subject
    pub fn project_from_store(
        &self,
        store: &impl AnalyticsStore,
        subject_id: SubjectId,
        index: usize,
    ) -> Result<Projection> {
        let matchups = store.scheduled_matchups(subject_id)?;
        let matchup = matchups
            .get(index)
            .ok_or(AnalyticsError::UnknownMatchup { subject_id, index })?;
        self.project_matchup(store, subject_id, matchup)
    }

    /// Project every scheduled matchup of a subject, in date order
    pub fn project_upcoming(&self, store: &impl AnalyticsStore, subject_id: SubjectId) -> Result<Vec<Projection>> {
        store
            .scheduled_matchups(subject_id)?
            .iter()
            .map(|matchup| self.project_matchup(store, subject_id, matchup))
            .collect()
    }

    fn project_matchup(
        &self,
        store: &impl AnalyticsStore,
        subject_id: SubjectId,
        matchup: &ScheduledMatchup,
    ) -> Result<Projection> {
        let subject = store.subject(subject_id)?;
        let records = store.performance_records(subject_id)?;
        let life_events = store.life_events(subject_id)?;
        let defense = store.defense_profile(&matchup.opponent, matchup.season, matchup.week)?;
        let head_to_head = store.head_to_head(subject_id, &matchup.opponent)?;

        Ok(self.project(&MatchupInputs {
            subject: &subject,
            matchup,
            life_events: &life_events,
            records: &records,
            defense: defense.as_ref(),
            head_to_head: &head_to_head,
        }))
    }

    /// Fuse baseline, life events, opponent defense and head-to-head history into one projection.
    ///
    /// Pure: the same inputs always give the same projection.
    pub fn project(&self, inputs: &MatchupInputs<'_>) -> Projection {
        let position = inputs.subject.position;
        let matchup = inputs.matchup;
        let stat = position.projection_field();
        let p = &self.params;

        let mut projection = Projection {
            subject_id: inputs.subject.id,
            opponent: matchup.opponent.clone(),
            season: matchup.season,
            week: matchup.week,
            stat,
            base_projection: 0.0,
            event_adjustment: 0.0,
            opponent_adjustment: 0.0,
            final_projection: 0.0,
            confidence: 0,
            recommendation: Recommendation::Hold,
            prop_line: matchup.prop_line_for(position),
            head_to_head_average: None,
            factors: Vec::new(),
        };

        let Some(base) = mean_of(inputs.records, stat) else {
            debug!("No records for subject {}; returning empty projection", inputs.subject.id);
            return projection;
        };
        projection.base_projection = base;

        // Life events in the days leading up to the game
        let mut recent_events: Vec<&LifeEvent> = inputs
            .life_events
            .iter()
            .filter(|e| {
                let days = (matchup.game_date - e.date).num_days();
                (0..=p.event_window_days as i64).contains(&days)
            })
            .collect();
        recent_events.sort_by_key(|e| (e.date, e.id));

        if !recent_events.is_empty() {
            let impact: f64 = recent_events
                .iter()
                .map(|e| match e.polarity {
                    EventPolarity::Positive => p.positive_event_impact,
                    EventPolarity::Negative => -p.negative_event_impact,
                })
                .sum();
            projection.event_adjustment = base * impact;
            projection.factors.extend(recent_events.iter().map(|e| ProjectionFactor::LifeEvent {
                polarity: e.polarity,
                category: e.category.clone(),
                days_before: (matchup.game_date - e.date).num_days(),
            }));
        }

        if let Some(defense) = inputs.defense {
            let rank = defense.rank_for(position);
            projection.opponent_adjustment = self.opponent_adjustment(base, rank);

            let side = DefenseSide::for_position(position);
            if rank <= p.tough_rank_max {
                projection.factors.push(ProjectionFactor::ToughMatchup { rank, side });
            } else if rank >= p.favorable_rank_min {
                projection.factors.push(ProjectionFactor::FavorableMatchup { rank, side });
            }
        }

        // Informational only: history never moves the number
        if !inputs.head_to_head.is_empty() {
            let games = inputs.head_to_head.len();
            let average = inputs.head_to_head.iter().map(|h| h.yards_for(position)).sum::<f64>() / games as f64;
            projection.head_to_head_average = Some(average);

            let opponent = matchup.opponent.clone();
            if average > base * p.history_strong_ratio {
                projection.factors.push(ProjectionFactor::StrongHistory { opponent, games });
            } else if average < base * p.history_weak_ratio {
                projection.factors.push(ProjectionFactor::StrugglingHistory { opponent, games });
            }
        }

        projection.final_projection =
            round_to(base + projection.event_adjustment + projection.opponent_adjustment, 1);

        let weights = &p.confidence;
        let mut confidence = 0;
        if !recent_events.is_empty() {
            confidence += weights.life_event;
        }
        if inputs.defense.is_some() {
            confidence += weights.defense_profile;
        }
        if !inputs.head_to_head.is_empty() {
            confidence += weights.head_to_head;
        }
        if inputs.records.len() >= p.min_records_for_confidence {
            confidence += weights.sample_size;
        }

        if let Some(baseline_season) = baseline_season(inputs.records) {
            if baseline_season != matchup.season {
                confidence = (confidence as f64 * p.cross_season_factor) as u32;
                projection.factors.push(ProjectionFactor::CrossSeasonBaseline {
                    baseline_season,
                    matchup_season: matchup.season,
                });
            }
        }
        projection.confidence = confidence.min(100);

        if let Some(line) = projection.prop_line {
            projection.recommendation = self.recommend(projection.final_projection - line, projection.confidence);
        }

        info!(
            "Projected subject {} vs {} (week {}): {} {:?} -> {:.1}, confidence {}, {}",
            inputs.subject.id,
            matchup.opponent,
            matchup.week,
            base,
            stat,
            projection.final_projection,
            projection.confidence,
            projection.recommendation
        );

        projection
    }

    /// Adjustment for a defense rank; negative for stingy defenses, zero at the neutral rank
    pub fn opponent_adjustment(&self, base: f64, rank: u32) -> f64 {
        let offset = rank as f64 - self.params.neutral_rank as f64;
        base * offset * self.params.rank_step
    }

    fn recommend(&self, diff: f64, confidence: u32) -> Recommendation {
        let p = &self.params;
        if diff >= p.strong_edge && confidence >= p.strong_min_confidence {
            Recommendation::StrongOver
        } else if diff >= p.lean_edge {
            Recommendation::LeanOver
        } else if diff <= -p.strong_edge && confidence >= p.strong_min_confidence {
            Recommendation::StrongUnder
        } else if diff <= -p.lean_edge {
            Recommendation::LeanUnder
        } else {
            Recommendation::Hold
        }
    }
}

/// Season of the subject's earliest record
fn baseline_season(records: &[PerformanceRecord]) -> Option<i32> {
    records.iter().map(|r| r.game_date).min().map(season_of)
}

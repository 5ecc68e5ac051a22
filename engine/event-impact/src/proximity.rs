//! Performance profile of a subject around their life events
//!
//! Everything here is computed on demand from the store and never persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::ProfilerParameters;
use crate::error::Result;
use crate::models::*;
use crate::stats::round_to;
use crate::store::AnalyticsStore;
use crate::window::{days_apart, mean, mean_of};

/// Fields compared before and after each event
const COMPARED_FIELDS: [StatField; 5] = [
    StatField::FantasyPoints,
    StatField::ReceivingYards,
    StatField::Receptions,
    StatField::ReceivingTds,
    StatField::RushingYards,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonAverages {
    pub games: usize,
    pub fantasy_points: f64,
    pub receiving_yards: f64,
    pub receptions: f64,
    pub receiving_tds: f64,
    pub targets: f64,
    pub rushing_yards: f64,
    pub rushing_tds: f64,
}

impl SeasonAverages {
    fn from_records(records: &[PerformanceRecord]) -> Option<Self> {
        Some(Self {
            games: records.len(),
            fantasy_points: mean_of(records, StatField::FantasyPoints)?,
            receiving_yards: mean_of(records, StatField::ReceivingYards)?,
            receptions: mean_of(records, StatField::Receptions)?,
            receiving_tds: mean_of(records, StatField::ReceivingTds)?,
            targets: mean_of(records, StatField::Targets)?,
            rushing_yards: mean_of(records, StatField::RushingYards)?,
            rushing_tds: mean_of(records, StatField::RushingTds)?,
        })
    }
}

/// Life event close to a recent game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearEvent {
    pub event_id: i64,
    pub polarity: EventPolarity,
    pub category: String,
    pub days_away: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentGame {
    pub date: NaiveDate,
    pub fantasy_points: f64,
    pub receiving_yards: i32,
    pub receptions: i32,
    pub touchdowns: i32,
    pub near_event: Option<NearEvent>,
    /// Fantasy points strictly above the season average
    pub above_average: bool,
}

/// Averages over games played within `days` of any life event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityWindow {
    pub days: u32,
    pub games: usize,
    pub avg_fantasy_points: f64,
    pub avg_receiving_yards: f64,
    pub avg_receptions: f64,
    pub avg_touchdowns: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: f64,
    pub after: f64,
    pub change: f64,
    pub change_pct: f64,
}

/// Nearest games before and after one event, side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventComparison {
    pub event_id: i64,
    pub polarity: EventPolarity,
    pub category: String,
    pub date: NaiveDate,
    /// Fields whose before-average is zero are left out
    pub changes: BTreeMap<StatField, FieldChange>,
    pub improved: bool,
    pub before_games: usize,
    pub after_games: usize,
}

impl EventComparison {
    fn change_in(&self, field: StatField) -> f64 {
        self.changes.get(&field).map_or(0.0, |c| c.change)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BettingInsights {
    pub total_events: usize,
    pub avg_fantasy_change: f64,
    /// Average change in receiving yards, whatever the subject's position
    pub avg_receiving_yards_change: f64,
    pub improved_pct: f64,
    pub positive_events: usize,
    pub negative_events: usize,
    pub positive_avg_change: f64,
    pub negative_avg_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonLine {
    pub season: f64,
    pub near_events: f64,
    pub diff: f64,
    pub diff_pct: f64,
}

impl ComparisonLine {
    fn new(season: f64, near_events: f64) -> Self {
        Self {
            season: round_to(season, 1),
            near_events: round_to(near_events, 1),
            diff: round_to(near_events - season, 1),
            diff_pct: if season > 0.0 { round_to(percent_change(season, near_events), 1) } else { 0.0 },
        }
    }
}

/// Season baseline against games played within the tightest proximity window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonComparison {
    pub window_days: u32,
    pub fantasy_points: ComparisonLine,
    pub receiving_yards: ComparisonLine,
    pub receptions: ComparisonLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityProfile {
    pub subject_id: SubjectId,
    pub season_averages: Option<SeasonAverages>,
    pub recent_form: Vec<RecentGame>,
    /// Keyed by threshold in days; thresholds with no nearby games are absent
    pub proximity: BTreeMap<u32, ProximityWindow>,
    pub event_comparisons: Vec<EventComparison>,
    pub insights: Option<BettingInsights>,
    pub season_comparison: Option<SeasonComparison>,
}

impl ProximityProfile {
    fn empty(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            season_averages: None,
            recent_form: Vec::new(),
            proximity: BTreeMap::new(),
            event_comparisons: Vec::new(),
            insights: None,
            season_comparison: None,
        }
    }
}

/// Builds [`ProximityProfile`]s
#[derive(Debug, Clone)]
pub struct ProximityProfiler {
    params: ProfilerParameters,
}

impl ProximityProfiler {
    pub fn new(params: ProfilerParameters) -> Self {
        Self { params }
    }

    pub fn profile(&self, store: &impl AnalyticsStore, subject_id: SubjectId) -> Result<ProximityProfile> {
        let subject = store.subject(subject_id)?;
        let records = store.performance_records(subject_id)?;
        let events = store.life_events(subject_id)?;
        Ok(self.profile_records(&subject, records, events))
    }

    /// Profile already-loaded data. Records and events are put into date order first.
    pub fn profile_records(
        &self,
        subject: &Subject,
        mut records: Vec<PerformanceRecord>,
        mut events: Vec<LifeEvent>,
    ) -> ProximityProfile {
        records.sort_by_key(|r| r.game_date);
        // Stable scan order for the "first event within range" lookup
        events.sort_by_key(|e| (e.date, e.id));

        let Some(season) = SeasonAverages::from_records(&records) else {
            return ProximityProfile::empty(subject.id);
        };

        let recent_form = self.recent_form(&records, &events, season.fantasy_points);

        let proximity: BTreeMap<u32, ProximityWindow> = self
            .params
            .proximity_thresholds
            .iter()
            .filter_map(|&days| proximity_window(&records, &events, days).map(|w| (days, w)))
            .collect();

        let event_comparisons: Vec<EventComparison> =
            events.iter().filter_map(|e| self.compare_around(&records, e)).collect();

        let insights = betting_insights(&event_comparisons);

        // Only the tightest configured window is compared; no games there means no comparison
        let tightest = self.params.proximity_thresholds.iter().min().copied();
        let season_comparison = tightest.and_then(|days| proximity.get(&days)).map(|window| SeasonComparison {
            window_days: window.days,
            fantasy_points: ComparisonLine::new(season.fantasy_points, window.avg_fantasy_points),
            receiving_yards: ComparisonLine::new(season.receiving_yards, window.avg_receiving_yards),
            receptions: ComparisonLine::new(season.receptions, window.avg_receptions),
        });

        debug!(
            "Profiled subject {}: {} games, {} events, {} comparisons",
            subject.id,
            records.len(),
            events.len(),
            event_comparisons.len()
        );

        ProximityProfile {
            subject_id: subject.id,
            season_averages: Some(season),
            recent_form,
            proximity,
            event_comparisons,
            insights,
            season_comparison,
        }
    }

    fn recent_form(&self, records: &[PerformanceRecord], events: &[LifeEvent], season_fp: f64) -> Vec<RecentGame> {
        let skip = records.len().saturating_sub(self.params.recent_games);
        records[skip..]
            .iter()
            .map(|record| {
                let near_event = events
                    .iter()
                    .map(|e| (e, days_apart(record.game_date, e.date)))
                    .find(|(_, days)| *days <= self.params.near_event_days as i64)
                    .map(|(e, days_away)| NearEvent {
                        event_id: e.id,
                        polarity: e.polarity,
                        category: e.category.clone(),
                        days_away,
                    });

                RecentGame {
                    date: record.game_date,
                    fantasy_points: record.fantasy_points,
                    receiving_yards: record.receiving_yards,
                    receptions: record.receptions,
                    touchdowns: record.total_touchdowns(),
                    near_event,
                    above_average: record.fantasy_points > season_fp,
                }
            })
            .collect()
    }

    /// Compare the nearest games on each side of `event`; `None` without enough games on both sides
    fn compare_around(&self, records: &[PerformanceRecord], event: &LifeEvent) -> Option<EventComparison> {
        let n = self.params.comparison_games;
        let before: Vec<&PerformanceRecord> = records.iter().filter(|r| r.game_date < event.date).collect();
        let after: Vec<&PerformanceRecord> = records.iter().filter(|r| r.game_date > event.date).collect();
        if before.len() < n || after.len() < n {
            return None;
        }

        let nearest_before = &before[before.len() - n..];
        let nearest_after = &after[..n];

        let mut changes = BTreeMap::new();
        for field in COMPARED_FIELDS {
            let b = mean(nearest_before, field)?;
            let a = mean(nearest_after, field)?;
            if b > 0.0 {
                changes.insert(
                    field,
                    FieldChange {
                        before: round_to(b, 1),
                        after: round_to(a, 1),
                        change: round_to(a - b, 1),
                        change_pct: round_to(percent_change(b, a), 1),
                    },
                );
            }
        }

        let improved = mean(nearest_after, StatField::FantasyPoints)? > mean(nearest_before, StatField::FantasyPoints)?;

        Some(EventComparison {
            event_id: event.id,
            polarity: event.polarity,
            category: event.category.clone(),
            date: event.date,
            changes,
            improved,
            before_games: nearest_before.len(),
            after_games: nearest_after.len(),
        })
    }
}

/// Games within `days` of any event, each counted once; `None` when there are none
fn proximity_window(records: &[PerformanceRecord], events: &[LifeEvent], days: u32) -> Option<ProximityWindow> {
    let near: Vec<&PerformanceRecord> = records
        .iter()
        .filter(|r| events.iter().any(|e| days_apart(r.game_date, e.date) <= days as i64))
        .collect();

    Some(ProximityWindow {
        days,
        games: near.len(),
        avg_fantasy_points: mean(&near, StatField::FantasyPoints)?,
        avg_receiving_yards: mean(&near, StatField::ReceivingYards)?,
        avg_receptions: mean(&near, StatField::Receptions)?,
        avg_touchdowns: mean(&near, StatField::TotalTouchdowns)?,
    })
}

/// Averages are taken over every compared event, including those missing a field
fn betting_insights(comparisons: &[EventComparison]) -> Option<BettingInsights> {
    if comparisons.is_empty() {
        return None;
    }
    let total = comparisons.len() as f64;

    let avg_change = |events: &[&EventComparison]| {
        if events.is_empty() {
            0.0
        } else {
            let total: f64 = events.iter().map(|e| e.change_in(StatField::FantasyPoints)).sum();
            round_to(total / events.len() as f64, 1)
        }
    };

    let positive: Vec<&EventComparison> =
        comparisons.iter().filter(|c| c.polarity == EventPolarity::Positive).collect();
    let negative: Vec<&EventComparison> =
        comparisons.iter().filter(|c| c.polarity == EventPolarity::Negative).collect();
    let improved = comparisons.iter().filter(|c| c.improved).count() as f64;

    Some(BettingInsights {
        total_events: comparisons.len(),
        avg_fantasy_change: round_to(
            comparisons.iter().map(|c| c.change_in(StatField::FantasyPoints)).sum::<f64>() / total,
            1,
        ),
        avg_receiving_yards_change: round_to(
            comparisons.iter().map(|c| c.change_in(StatField::ReceivingYards)).sum::<f64>() / total,
            1,
        ),
        improved_pct: round_to(improved / total * 100.0, 0),
        positive_events: positive.len(),
        negative_events: negative.len(),
        positive_avg_change: avg_change(&positive),
        negative_avg_change: avg_change(&negative),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsConfig;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_subject(position: Position) -> Subject {
        Subject { id: 1, name: "Test Receiver".into(), team: "KC".into(), position }
    }

    fn create_test_profiler() -> ProximityProfiler {
        ProximityProfiler::new(AnalyticsConfig::default().profiler)
    }

    fn game(on: NaiveDate, fantasy_points: f64, receiving_yards: i32) -> PerformanceRecord {
        PerformanceRecord {
            fantasy_points,
            receiving_yards,
            receptions: receiving_yards / 10,
            receiving_tds: 1,
            ..PerformanceRecord::empty(1, on)
        }
    }

    fn event(id: i64, polarity: EventPolarity, category: &str, on: NaiveDate) -> LifeEvent {
        LifeEvent { id, subject_id: 1, polarity, category: category.into(), date: on, description: String::new() }
    }

    /// Eight weekly games starting Sep 8; an event on Oct 9, between games 5 and 6
    fn create_weekly_history() -> (Vec<PerformanceRecord>, Vec<LifeEvent>) {
        let start = date(2024, 9, 8);
        let points = [10.0, 12.0, 8.0, 10.0, 12.0, 20.0, 22.0, 18.0];
        let records = points
            .iter()
            .enumerate()
            .map(|(i, fp)| game(start + Duration::days(7 * i as i64), *fp, (*fp as i32) * 5))
            .collect();
        let events = vec![event(1, EventPolarity::Positive, "birth", date(2024, 10, 9))];
        (records, events)
    }

    #[test]
    fn test_no_records_gives_empty_profile() {
        let profile = create_test_profiler().profile_records(
            &create_test_subject(Position::Wr),
            Vec::new(),
            vec![event(1, EventPolarity::Positive, "birth", date(2024, 10, 9))],
        );
        assert!(profile.season_averages.is_none());
        assert!(profile.recent_form.is_empty());
        assert!(profile.proximity.is_empty());
        assert!(profile.insights.is_none());
    }

    #[test]
    fn test_season_averages_and_recent_form() {
        let (records, events) = create_weekly_history();
        let profile = create_test_profiler().profile_records(&create_test_subject(Position::Wr), records, events);

        let season = profile.season_averages.unwrap();
        assert_eq!(season.games, 8);
        assert_eq!(season.fantasy_points, 14.0);

        assert_eq!(profile.recent_form.len(), 5);
        // Last five games start Sep 29, ten days before the event
        assert!(profile.recent_form[0].near_event.is_none());
        // Games on Oct 6 and Oct 13 are 3 and 4 days from the event
        let oct6 = &profile.recent_form[1];
        assert_eq!(oct6.date, date(2024, 10, 6));
        assert_eq!(oct6.near_event.as_ref().unwrap().days_away, 3);
        assert!(!oct6.above_average);
        let oct13 = &profile.recent_form[2];
        assert_eq!(oct13.near_event.as_ref().unwrap().days_away, 4);
        assert!(oct13.above_average);
        assert!(profile.recent_form[4].near_event.is_none());
    }

    #[test]
    fn test_recent_form_takes_first_event_in_date_order() {
        let (records, _) = create_weekly_history();
        let events = vec![
            event(7, EventPolarity::Negative, "injury", date(2024, 10, 12)),
            event(3, EventPolarity::Positive, "birth", date(2024, 10, 9)),
        ];
        let profile = create_test_profiler().profile_records(&create_test_subject(Position::Wr), records, events);

        // Oct 13 game: Oct 9 event scanned first even though Oct 12 is closer
        let oct13 = &profile.recent_form[2];
        assert_eq!(oct13.date, date(2024, 10, 13));
        assert_eq!(oct13.near_event.as_ref().unwrap().event_id, 3);
    }

    #[test]
    fn test_proximity_windows_count_each_game_once() {
        let (records, mut events) = create_weekly_history();
        events.push(event(2, EventPolarity::Negative, "injury", date(2024, 10, 10)));
        let profile = create_test_profiler().profile_records(&create_test_subject(Position::Wr), records, events);

        let seven = &profile.proximity[&7];
        assert_eq!(seven.games, 2);
        assert_eq!(seven.avg_fantasy_points, 16.0);
        assert_eq!(seven.avg_touchdowns, 1.0);

        let thirty = &profile.proximity[&30];
        assert!(thirty.games >= seven.games);
        assert!(profile.proximity[&14].games >= seven.games);
    }

    #[test]
    fn test_event_comparison_uses_nearest_games() {
        let (records, events) = create_weekly_history();
        let profile = create_test_profiler().profile_records(&create_test_subject(Position::Wr), records, events);

        assert_eq!(profile.event_comparisons.len(), 1);
        let comparison = &profile.event_comparisons[0];
        assert!(comparison.improved);
        assert_eq!(comparison.before_games, 3);

        // Before: 8, 10, 12 -> 10; after: 20, 22, 18 -> 20
        let fp = &comparison.changes[&StatField::FantasyPoints];
        assert_eq!(fp.before, 10.0);
        assert_eq!(fp.after, 20.0);
        assert_eq!(fp.change_pct, 100.0);
        // No rushing yards at all, so that field is skipped
        assert!(!comparison.changes.contains_key(&StatField::RushingYards));
    }

    #[test]
    fn test_event_without_enough_games_is_skipped() {
        let (records, _) = create_weekly_history();
        let events = vec![event(1, EventPolarity::Positive, "birth", date(2024, 9, 20))];
        let profile = create_test_profiler().profile_records(&create_test_subject(Position::Wr), records, events);

        assert!(profile.event_comparisons.is_empty());
        assert!(profile.insights.is_none());
    }

    #[test]
    fn test_betting_insights_split_by_polarity() {
        let (records, mut events) = create_weekly_history();
        events.push(event(2, EventPolarity::Negative, "injury", date(2024, 9, 27)));
        let profile = create_test_profiler().profile_records(&create_test_subject(Position::Wr), records, events);

        let insights = profile.insights.unwrap();
        assert_eq!(insights.total_events, 2);
        assert_eq!(insights.positive_events, 1);
        assert_eq!(insights.negative_events, 1);
        assert_eq!(insights.positive_avg_change, 10.0);
        // Sep 27 event: before 10, 12, 8 -> 10; after 10, 12, 20 -> 14
        assert_eq!(insights.negative_avg_change, 4.0);
        assert_eq!(insights.avg_fantasy_change, 7.0);
        assert_eq!(insights.improved_pct, 100.0);
    }

    #[test]
    fn test_season_comparison_from_seven_day_window() {
        let (records, events) = create_weekly_history();
        let profile = create_test_profiler().profile_records(&create_test_subject(Position::Wr), records, events);

        let comparison = profile.season_comparison.unwrap();
        assert_eq!(comparison.window_days, 7);
        assert_eq!(comparison.fantasy_points.season, 14.0);
        assert_eq!(comparison.fantasy_points.near_events, 16.0);
        assert_eq!(comparison.fantasy_points.diff, 2.0);
        assert_eq!(comparison.fantasy_points.diff_pct, 14.3);
    }

    #[test]
    fn test_no_season_comparison_without_games_inside_seven_days() {
        // Games every 20 days; the event sits 10 days from the nearest game
        let start = date(2024, 9, 1);
        let records: Vec<PerformanceRecord> =
            (0..4).map(|i| game(start + Duration::days(20 * i), 12.0, 60)).collect();
        let events = vec![event(1, EventPolarity::Positive, "birth", date(2024, 9, 11))];
        let profile = create_test_profiler().profile_records(&create_test_subject(Position::Wr), records, events);

        assert!(!profile.proximity.contains_key(&7));
        assert!(profile.proximity.contains_key(&14));
        assert!(profile.season_comparison.is_none());
    }

    #[test]
    fn test_insights_track_receiving_yards_for_rushers() {
        let (records, events) = create_weekly_history();
        let records = records.into_iter().map(|r| PerformanceRecord { rushing_yards: 40, ..r }).collect();
        let profile = create_test_profiler().profile_records(&create_test_subject(Position::Rb), records, events);

        // Receiving yards go from 50 to 100 around the event; rushing yards do not move
        let insights = profile.insights.unwrap();
        assert_eq!(insights.avg_receiving_yards_change, 50.0);
    }
}

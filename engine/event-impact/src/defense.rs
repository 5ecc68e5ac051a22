//! Defense rankings and per-season defensive summaries

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::OpponentDefenseProfile;

/// Cumulative defensive figures for one team across every week of a season.
///
/// Built once by [`season_summaries`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDefenseSummary {
    pub team: String,
    pub season: i32,
    /// Most recent week included in the summary
    pub latest_week: u32,
    pub weeks: usize,
    pub pass_yards_allowed_per_game: f64,
    pub rush_yards_allowed_per_game: f64,
    pub passing_tds_allowed: u32,
    pub rushing_tds_allowed: u32,
    pub sacks: u32,
    pub pass_defense_rank: u32,
    pub rush_defense_rank: u32,
}

/// Assign pass and rush defense ranks within each (season, week) group.
///
/// Rank 1 allows the fewest yards; ties fall back to team abbreviation so the
/// ranks in every group are a permutation of 1..=N. Output is ordered by
/// (season, week, team).
pub fn rank_profiles(mut profiles: Vec<OpponentDefenseProfile>) -> Vec<OpponentDefenseProfile> {
    profiles.sort_by(|a, b| (a.season, a.week, &a.team).cmp(&(b.season, b.week, &b.team)));

    let mut start = 0;
    while start < profiles.len() {
        let key = (profiles[start].season, profiles[start].week);
        let end = profiles[start..]
            .iter()
            .position(|p| (p.season, p.week) != key)
            .map_or(profiles.len(), |offset| start + offset);

        let group = &mut profiles[start..end];
        assign_ranks(
            group,
            |p| p.pass_yards_allowed_per_game,
            |p, rank| p.pass_defense_rank = rank,
        );
        assign_ranks(
            group,
            |p| p.rush_yards_allowed_per_game,
            |p, rank| p.rush_defense_rank = rank,
        );
        start = end;
    }

    profiles
}

/// Roll weekly profiles up into one ranked summary per (season, team).
/// Output is ordered by (season, team).
pub fn season_summaries(profiles: &[OpponentDefenseProfile]) -> Vec<SeasonDefenseSummary> {
    let mut grouped: BTreeMap<(i32, &str), Vec<&OpponentDefenseProfile>> = BTreeMap::new();
    for profile in profiles {
        grouped.entry((profile.season, profile.team.as_str())).or_default().push(profile);
    }

    let mut summaries: Vec<SeasonDefenseSummary> = grouped
        .into_iter()
        .map(|((season, team), weeks)| {
            let count = weeks.len() as f64;
            SeasonDefenseSummary {
                team: team.to_string(),
                season,
                latest_week: weeks.iter().map(|p| p.week).max().unwrap_or_default(),
                weeks: weeks.len(),
                pass_yards_allowed_per_game: weeks.iter().map(|p| p.pass_yards_allowed_per_game).sum::<f64>() / count,
                rush_yards_allowed_per_game: weeks.iter().map(|p| p.rush_yards_allowed_per_game).sum::<f64>() / count,
                passing_tds_allowed: weeks.iter().map(|p| p.passing_tds_allowed).sum(),
                rushing_tds_allowed: weeks.iter().map(|p| p.rushing_tds_allowed).sum(),
                sacks: weeks.iter().map(|p| p.sacks).sum(),
                pass_defense_rank: 0,
                rush_defense_rank: 0,
            }
        })
        .collect();

    let mut start = 0;
    while start < summaries.len() {
        let season = summaries[start].season;
        let end = summaries[start..]
            .iter()
            .position(|s| s.season != season)
            .map_or(summaries.len(), |offset| start + offset);

        let group = &mut summaries[start..end];
        assign_ranks(group, |s| s.pass_yards_allowed_per_game, |s, rank| s.pass_defense_rank = rank);
        assign_ranks(group, |s| s.rush_yards_allowed_per_game, |s, rank| s.rush_defense_rank = rank);
        start = end;
    }

    summaries
}

/// Rank a group (already ordered by team) by ascending `yards`, writing ranks through `set`
fn assign_ranks<T>(group: &mut [T], yards: impl Fn(&T) -> f64, mut set: impl FnMut(&mut T, u32)) {
    let mut order: Vec<usize> = (0..group.len()).collect();
    // Stable sort keeps the team order for equal yardage
    order.sort_by(|&a, &b| yards(&group[a]).partial_cmp(&yards(&group[b])).unwrap_or(Ordering::Equal));

    for (rank, index) in order.into_iter().enumerate() {
        set(&mut group[index], rank as u32 + 1);
    }
}

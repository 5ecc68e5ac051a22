use event_impact::defense::rank_profiles;
use event_impact::{AnalyticsStore, Dataset, OpponentDefenseProfile, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::error::{IngestError, Result};
use crate::models::RawDefenseSummary;
use crate::scoring::ScoringRules;
use crate::source::StatsSource;

/// Rows written by an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Import a season game log for `subject_id`, upserting on (subject, game date).
///
/// An unavailable source imports nothing rather than failing.
pub fn import_game_log(
    dataset: &mut Dataset,
    source: &impl StatsSource,
    subject_id: SubjectId,
    player_id: &str,
    season: i32,
    rules: &ScoringRules,
) -> Result<ImportSummary> {
    dataset.subject(subject_id)?;

    let rows = match source.game_log(player_id, season) {
        Ok(rows) => rows,
        Err(IngestError::Unavailable(reason)) => {
            warn!("No game log for player {} in {}: {}", player_id, season, reason);
            return Ok(ImportSummary::default());
        }
        Err(e) => return Err(e),
    };

    let mut summary = ImportSummary::default();
    for row in &rows {
        let record = row.to_performance_record(subject_id, season, rules)?;
        if dataset.upsert_record(record) {
            summary.updated += 1;
        } else {
            summary.inserted += 1;
        }
    }

    info!(
        "Imported game log for subject {} ({} season {}): {} inserted, {} updated",
        subject_id, player_id, season, summary.inserted, summary.updated
    );
    Ok(summary)
}

/// Merge `summaries` into the (season, week) group and re-rank the whole group
pub fn merge_defense_week(
    existing: Vec<OpponentDefenseProfile>,
    summaries: &[RawDefenseSummary],
    season: i32,
    week: u32,
) -> (Vec<OpponentDefenseProfile>, ImportSummary) {
    let mut by_team: BTreeMap<String, OpponentDefenseProfile> =
        existing.into_iter().map(|p| (p.team.clone(), p)).collect();

    let mut summary = ImportSummary::default();
    for raw in summaries {
        let profile = raw.to_profile(season, week);
        if by_team.insert(profile.team.clone(), profile).is_some() {
            summary.updated += 1;
        } else {
            summary.inserted += 1;
        }
    }

    (rank_profiles(by_team.into_values().collect()), summary)
}

/// Import league-wide defense summaries for a season as the profiles of one week.
///
/// Teams already stored for that week are updated in place and every team in the
/// week is re-ranked. An unavailable source imports nothing.
pub fn import_defense_week(
    dataset: &mut Dataset,
    source: &impl StatsSource,
    season: i32,
    week: u32,
) -> Result<ImportSummary> {
    let summaries = match source.defense_summaries(season) {
        Ok(summaries) => summaries,
        Err(IngestError::Unavailable(reason)) => {
            warn!("No defense summaries for season {}: {}", season, reason);
            return Ok(ImportSummary::default());
        }
        Err(e) => return Err(e),
    };

    let (profiles, summary) = merge_defense_week(dataset.defense_week(season, week), &summaries, season, week);
    dataset.replace_defense_week(season, week, profiles);

    info!(
        "Imported defense for season {} week {}: {} inserted, {} updated",
        season, week, summary.inserted, summary.updated
    );
    Ok(summary)
}

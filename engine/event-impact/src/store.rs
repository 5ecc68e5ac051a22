//! Caller-owned data access for the engines
//!
//! Storage itself lives outside this crate. Components read through [`AnalyticsStore`]
//! and write correlation results through [`ResultSink`]; [`Dataset`] and
//! [`JsonlResultLog`] are the file-backed implementations used by the service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::correlation::CorrelationResult;
use crate::defense::rank_profiles;
use crate::error::{AnalyticsError, Result};
use crate::models::*;

/// Read access to subjects and their performance, events and reference data
pub trait AnalyticsStore {
    fn subject(&self, subject_id: SubjectId) -> Result<Subject>;

    /// All subjects, ordered by id
    fn subjects(&self) -> Result<Vec<Subject>>;

    /// Subjects with at least one life event, ordered by id
    fn subjects_with_events(&self) -> Result<Vec<SubjectId>>;

    /// Performance records for a subject, ordered by game date
    fn performance_records(&self, subject_id: SubjectId) -> Result<Vec<PerformanceRecord>>;

    /// Life events for a subject, ordered by (date, id)
    fn life_events(&self, subject_id: SubjectId) -> Result<Vec<LifeEvent>>;

    fn defense_profile(&self, team: &str, season: i32, week: u32) -> Result<Option<OpponentDefenseProfile>>;

    fn defense_profiles(&self) -> Result<Vec<OpponentDefenseProfile>>;

    fn head_to_head(&self, subject_id: SubjectId, opponent: &str) -> Result<Vec<HeadToHeadRecord>>;

    /// Upcoming games for a subject, ordered by date
    fn scheduled_matchups(&self, subject_id: SubjectId) -> Result<Vec<ScheduledMatchup>>;
}

/// Append-only destination for correlation results
pub trait ResultSink {
    fn append(&mut self, result: &CorrelationResult) -> Result<()>;
}

impl ResultSink for Vec<CorrelationResult> {
    fn append(&mut self, result: &CorrelationResult) -> Result<()> {
        self.push(result.clone());
        Ok(())
    }
}

/// In-memory dataset, loadable from a single JSON document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub performance_records: Vec<PerformanceRecord>,
    #[serde(default)]
    pub life_events: Vec<LifeEvent>,
    #[serde(default)]
    pub defense_profiles: Vec<OpponentDefenseProfile>,
    #[serde(default)]
    pub scheduled_matchups: Vec<ScheduledMatchup>,
    #[serde(default)]
    pub head_to_head: Vec<HeadToHeadRecord>,
}

impl Dataset {
    /// Load a dataset from a JSON file
    ///
    /// Defense ranks are always re-derived from yards allowed, so profiles written
    /// without ranks (or with stale ones) load as a 1..=N permutation per (season, week).
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut dataset: Dataset = serde_json::from_reader(reader)?;
        dataset.defense_profiles = rank_profiles(std::mem::take(&mut dataset.defense_profiles));
        info!(
            "Loaded dataset from {}: {} subjects, {} records, {} events, {} defense profiles",
            path.display(),
            dataset.subjects.len(),
            dataset.performance_records.len(),
            dataset.life_events.len(),
            dataset.defense_profiles.len()
        );
        Ok(dataset)
    }

    /// Write the dataset back out as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Insert or replace a record, keyed by (subject, game date). Returns true when a record was replaced.
    pub fn upsert_record(&mut self, record: PerformanceRecord) -> bool {
        match self
            .performance_records
            .iter_mut()
            .find(|r| r.subject_id == record.subject_id && r.game_date == record.game_date)
        {
            Some(existing) => {
                *existing = record;
                true
            }
            None => {
                self.performance_records.push(record);
                false
            }
        }
    }

    /// Defense profiles of one (season, week)
    pub fn defense_week(&self, season: i32, week: u32) -> Vec<OpponentDefenseProfile> {
        self.defense_profiles.iter().filter(|p| p.season == season && p.week == week).cloned().collect()
    }

    /// Replace every defense profile of one (season, week), keeping other weeks untouched
    pub fn replace_defense_week(&mut self, season: i32, week: u32, profiles: Vec<OpponentDefenseProfile>) {
        self.defense_profiles.retain(|p| !(p.season == season && p.week == week));
        self.defense_profiles.extend(profiles);
    }
}

impl AnalyticsStore for Dataset {
    fn subject(&self, subject_id: SubjectId) -> Result<Subject> {
        self.subjects
            .iter()
            .find(|s| s.id == subject_id)
            .cloned()
            .ok_or(AnalyticsError::UnknownSubject(subject_id))
    }

    fn subjects(&self) -> Result<Vec<Subject>> {
        let mut subjects = self.subjects.clone();
        subjects.sort_by_key(|s| s.id);
        Ok(subjects)
    }

    fn subjects_with_events(&self) -> Result<Vec<SubjectId>> {
        let ids: BTreeSet<SubjectId> = self.life_events.iter().map(|e| e.subject_id).collect();
        Ok(ids.into_iter().collect())
    }

    fn performance_records(&self, subject_id: SubjectId) -> Result<Vec<PerformanceRecord>> {
        let mut records: Vec<PerformanceRecord> =
            self.performance_records.iter().filter(|r| r.subject_id == subject_id).cloned().collect();
        records.sort_by_key(|r| r.game_date);
        Ok(records)
    }

    fn life_events(&self, subject_id: SubjectId) -> Result<Vec<LifeEvent>> {
        let mut events: Vec<LifeEvent> =
            self.life_events.iter().filter(|e| e.subject_id == subject_id).cloned().collect();
        events.sort_by_key(|e| (e.date, e.id));
        Ok(events)
    }

    fn defense_profile(&self, team: &str, season: i32, week: u32) -> Result<Option<OpponentDefenseProfile>> {
        Ok(self
            .defense_profiles
            .iter()
            .find(|p| p.team.eq_ignore_ascii_case(team) && p.season == season && p.week == week)
            .cloned())
    }

    fn defense_profiles(&self) -> Result<Vec<OpponentDefenseProfile>> {
        Ok(self.defense_profiles.clone())
    }

    fn head_to_head(&self, subject_id: SubjectId, opponent: &str) -> Result<Vec<HeadToHeadRecord>> {
        Ok(self
            .head_to_head
            .iter()
            .filter(|h| h.subject_id == subject_id && h.opponent.eq_ignore_ascii_case(opponent))
            .cloned()
            .collect())
    }

    fn scheduled_matchups(&self, subject_id: SubjectId) -> Result<Vec<ScheduledMatchup>> {
        let mut matchups: Vec<ScheduledMatchup> =
            self.scheduled_matchups.iter().filter(|m| m.subject_id == subject_id).cloned().collect();
        matchups.sort_by_key(|m| m.game_date);
        Ok(matchups)
    }
}

/// Subject with both performance records and life events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectDataSummary {
    pub id: SubjectId,
    pub name: String,
    pub team: String,
    pub position: Position,
    pub records: usize,
    pub events: usize,
}

/// Dataset totals and the subjects that can be analyzed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsOverview {
    pub total_subjects: usize,
    pub total_records: usize,
    pub total_events: usize,
    pub analyzable_subjects: Vec<SubjectDataSummary>,
}

/// Summarize what `store` holds, subject by subject
pub fn overview(store: &impl AnalyticsStore) -> Result<AnalyticsOverview> {
    let subjects = store.subjects()?;
    let mut overview = AnalyticsOverview {
        total_subjects: subjects.len(),
        total_records: 0,
        total_events: 0,
        analyzable_subjects: Vec::new(),
    };

    for subject in subjects {
        let records = store.performance_records(subject.id)?.len();
        let events = store.life_events(subject.id)?.len();
        overview.total_records += records;
        overview.total_events += events;

        if records > 0 && events > 0 {
            overview.analyzable_subjects.push(SubjectDataSummary {
                id: subject.id,
                name: subject.name,
                team: subject.team,
                position: subject.position,
                records,
                events,
            });
        }
    }
    Ok(overview)
}

/// Correlation results appended one JSON object per line
#[derive(Debug, Clone)]
pub struct JsonlResultLog {
    path: PathBuf,
}

impl JsonlResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every result logged so far, oldest first
    pub fn read_all(&self) -> Result<Vec<CorrelationResult>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut results = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            results.push(serde_json::from_str(&line)?);
        }
        Ok(results)
    }
}

impl ResultSink for JsonlResultLog {
    fn append(&mut self, result: &CorrelationResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let line = serde_json::to_string(result)?;
        writeln!(file, "{line}")?;
        debug!("Appended correlation result for subject {} to {}", result.subject_id, self.path.display());
        Ok(())
    }
}

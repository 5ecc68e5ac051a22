use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::models::{RawDefenseSummary, RawGameRow};

/// Upstream provider of raw game rows and defensive summaries
pub trait StatsSource {
    /// Every game row for one upstream player in a season
    fn game_log(&self, player_id: &str, season: i32) -> Result<Vec<RawGameRow>>;

    /// One summary row per team for a season
    fn defense_summaries(&self, season: i32) -> Result<Vec<RawDefenseSummary>>;
}

/// Source backed by JSON exports on disk:
/// `<root>/weekly_<season>.json` (array of game rows) and
/// `<root>/defense_<season>.json` (array of defense summaries).
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    root: PathBuf,
}

impl JsonDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_array<T: serde::de::DeserializeOwned>(&self, file_name: &str) -> Result<Vec<T>> {
        let path = self.root.join(file_name);
        if !path.exists() {
            return Err(IngestError::Unavailable(format!("{} does not exist", path.display())));
        }
        let reader = BufReader::new(File::open(&path).map_err(|e| unavailable(&path, e))?);
        let rows: Vec<T> = serde_json::from_reader(reader)?;
        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }
}

fn unavailable(path: &Path, err: std::io::Error) -> IngestError {
    IngestError::Unavailable(format!("{}: {err}", path.display()))
}

impl StatsSource for JsonDirectorySource {
    fn game_log(&self, player_id: &str, season: i32) -> Result<Vec<RawGameRow>> {
        let rows: Vec<RawGameRow> = self.read_array(&format!("weekly_{season}.json"))?;
        Ok(rows.into_iter().filter(|row| row.player_id == player_id).collect())
    }

    fn defense_summaries(&self, season: i32) -> Result<Vec<RawDefenseSummary>> {
        self.read_array(&format!("defense_{season}.json"))
    }
}

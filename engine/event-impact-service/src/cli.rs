//! # Command Line Interface
//!
//! Commands for running analyses, projections and imports against a JSON dataset.
//! Every command prints its result as pretty JSON on stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use event_impact::defense::season_summaries;
use event_impact::store::overview;
use event_impact::{
    AnalyticsConfig, AnalyticsStore, CorrelationAnalyzer, Dataset, JsonlResultLog, MatchupProjector,
    ProximityProfiler, ResultSink, SubjectId,
};
use serde::Serialize;
use stats_ingest::{import_defense_week, import_game_log, JsonDirectorySource, ScoringRules};
use std::path::PathBuf;
use tracing::info;

use crate::logging::LogFormat;
use crate::runner;

/// Event impact CLI
#[derive(Parser)]
#[command(name = "event-impact", version)]
#[command(about = "Life-event performance correlation and matchup projections")]
pub struct Cli {
    /// TOML configuration file (defaults and EVENT_IMPACT__* environment overrides still apply)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Dataset file, overriding the configured path
    #[arg(short, long, global = true)]
    pub dataset: Option<PathBuf>,

    /// Correlation result log, overriding the configured path
    #[arg(long, global = true)]
    pub results: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Log format: compact, pretty or json
    #[arg(long, global = true, default_value = "compact")]
    pub log_format: LogFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Correlate one subject's output with one event category
    Analyze {
        #[arg(long)]
        subject: SubjectId,
        #[arg(long)]
        event_type: String,
        /// Append a successful result to the result log
        #[arg(long)]
        save: bool,
    },
    /// Analyze every subject with life events
    Sweep {
        /// Keep running, repeating the sweep every configured interval
        #[arg(long)]
        watch: bool,
    },
    /// Event proximity profile for one subject
    Profile {
        #[arg(long)]
        subject: SubjectId,
    },
    /// Project scheduled matchups for one subject
    Project {
        #[arg(long)]
        subject: SubjectId,
        /// Index of the matchup in date order; all matchups when omitted
        #[arg(long)]
        matchup: Option<usize>,
    },
    /// Season-to-date defensive summaries with ranks
    DefenseTable,
    /// Dataset totals and subjects with both records and events
    Overview,
    /// Import a season game log for one subject
    ImportGames {
        #[arg(long)]
        subject: SubjectId,
        /// Upstream player identifier
        #[arg(long)]
        player_id: String,
        #[arg(long)]
        season: i32,
        /// Directory holding weekly_<season>.json
        #[arg(long)]
        source_dir: PathBuf,
    },
    /// Import league defense summaries as one week's profiles
    ImportDefense {
        #[arg(long)]
        season: i32,
        #[arg(long)]
        week: u32,
        /// Directory holding defense_<season>.json
        #[arg(long)]
        source_dir: PathBuf,
    },
}

impl Cli {
    /// Layered configuration with command line path overrides applied
    pub fn load_config(&self) -> Result<AnalyticsConfig> {
        let mut config = AnalyticsConfig::load(self.config.as_deref()).context("Failed to load configuration")?;
        if let Some(dataset) = &self.dataset {
            config.data.dataset_path = dataset.clone();
        }
        if let Some(results) = &self.results {
            config.data.results_path = results.clone();
        }
        Ok(config)
    }
}

/// CLI handler
pub struct CliHandler {
    config: AnalyticsConfig,
}

impl CliHandler {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Handle CLI commands
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Analyze { subject, event_type, save } => self.analyze(subject, &event_type, save),
            Commands::Sweep { watch: false } => {
                let config = self.config.clone();
                let report = tokio::task::spawn_blocking(move || runner::run_sweep_once(&config)).await??;
                print_json(&report)
            }
            Commands::Sweep { watch: true } => {
                runner::watch(self.config.clone(), |report| {
                    if let Err(e) = print_json(report) {
                        tracing::error!("Failed to print sweep report: {:#}", e);
                    }
                })
                .await
            }
            Commands::Profile { subject } => {
                let dataset = self.load_dataset()?;
                let profile = ProximityProfiler::new(self.config.profiler.clone()).profile(&dataset, subject)?;
                print_json(&profile)
            }
            Commands::Project { subject, matchup } => {
                let dataset = self.load_dataset()?;
                let projector = MatchupProjector::new(self.config.projection.clone());
                match matchup {
                    Some(index) => print_json(&projector.project_from_store(&dataset, subject, index)?),
                    None => print_json(&projector.project_upcoming(&dataset, subject)?),
                }
            }
            Commands::DefenseTable => {
                let dataset = self.load_dataset()?;
                print_json(&season_summaries(&dataset.defense_profiles()?))
            }
            Commands::Overview => {
                let dataset = self.load_dataset()?;
                print_json(&overview(&dataset)?)
            }
            Commands::ImportGames { subject, player_id, season, source_dir } => {
                let mut dataset = self.load_dataset_for_import()?;
                let source = JsonDirectorySource::new(source_dir);
                let summary =
                    import_game_log(&mut dataset, &source, subject, &player_id, season, &ScoringRules::ppr())?;
                self.save_dataset(&dataset)?;
                print_json(&summary)
            }
            Commands::ImportDefense { season, week, source_dir } => {
                let mut dataset = self.load_dataset_for_import()?;
                let source = JsonDirectorySource::new(source_dir);
                let summary = import_defense_week(&mut dataset, &source, season, week)?;
                self.save_dataset(&dataset)?;
                print_json(&summary)
            }
        }
    }

    fn analyze(&self, subject: SubjectId, event_type: &str, save: bool) -> Result<()> {
        let dataset = self.load_dataset()?;
        let outcome = CorrelationAnalyzer::new(self.config.correlation.clone()).analyze(&dataset, subject, event_type)?;

        if save {
            if let Some(result) = outcome.result() {
                let mut log = JsonlResultLog::new(&self.config.data.results_path);
                log.append(result)?;
                info!("Saved correlation result to {}", log.path().display());
            }
        }
        print_json(&outcome)
    }

    fn load_dataset(&self) -> Result<Dataset> {
        let path = &self.config.data.dataset_path;
        Dataset::load(path).with_context(|| format!("Failed to load dataset {}", path.display()))
    }

    /// Imports may target a dataset file that does not exist yet
    fn load_dataset_for_import(&self) -> Result<Dataset> {
        if self.config.data.dataset_path.exists() {
            self.load_dataset()
        } else {
            info!("Dataset {} not found, starting a new one", self.config.data.dataset_path.display());
            Ok(Dataset::default())
        }
    }

    fn save_dataset(&self, dataset: &Dataset) -> Result<()> {
        let path = &self.config.data.dataset_path;
        dataset.save(path).with_context(|| format!("Failed to save dataset {}", path.display()))
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_command() {
        let cli = Cli::try_parse_from([
            "event-impact",
            "--dataset",
            "data/nfl.json",
            "project",
            "--subject",
            "12",
            "--matchup",
            "0",
        ])
        .unwrap();

        assert_eq!(cli.dataset, Some(PathBuf::from("data/nfl.json")));
        assert!(matches!(cli.command, Commands::Project { subject: 12, matchup: Some(0) }));
    }

    #[test]
    fn test_parse_sweep_watch_with_trailing_options() {
        let cli = Cli::try_parse_from(["event-impact", "sweep", "--watch", "--log-format", "json"]).unwrap();
        assert!(matches!(cli.command, Commands::Sweep { watch: true }));
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_parse_import_defense() {
        let cli = Cli::try_parse_from([
            "event-impact",
            "import-defense",
            "--season",
            "2024",
            "--week",
            "6",
            "--source-dir",
            "exports",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::ImportDefense { season: 2024, week: 6, .. }));
    }

    #[test]
    fn test_path_overrides_apply() {
        let cli = Cli::try_parse_from(["event-impact", "--results", "out/r.jsonl", "overview"]).unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.data.results_path, PathBuf::from("out/r.jsonl"));
        assert_eq!(config.data.dataset_path, AnalyticsConfig::default().data.dataset_path);
    }

    #[test]
    fn test_analyze_saves_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AnalyticsConfig::default();
        config.data.dataset_path = dir.path().join("dataset.json");
        config.data.results_path = dir.path().join("results.jsonl");
        Dataset::default().save(&config.data.dataset_path).unwrap();

        let handler = CliHandler::new(config.clone());
        // Unknown subject has no records: no result, nothing saved
        handler.analyze(5, "injury", true).unwrap();
        assert!(JsonlResultLog::new(&config.data.results_path).read_all().unwrap().is_empty());
    }
}

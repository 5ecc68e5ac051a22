//! Analysis sweep runner
//!
//! A single sweep reloads the dataset from disk so each run in watch mode sees the
//! latest imports. Sweeps are CPU bound and run on the blocking pool.

use anyhow::{Context, Result};
use event_impact::{AnalysisSweep, AnalyticsConfig, Dataset, JsonlResultLog, SweepReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::signals::setup_signal_handlers;

/// Load the dataset and run one sweep, appending results to the configured log
pub fn run_sweep_once(config: &AnalyticsConfig) -> Result<SweepReport> {
    let dataset = Dataset::load(&config.data.dataset_path)
        .with_context(|| format!("Failed to load dataset {}", config.data.dataset_path.display()))?;
    let mut sink = JsonlResultLog::new(&config.data.results_path);

    AnalysisSweep::from_config(config)
        .run(&dataset, &mut sink)
        .context("Analysis sweep failed")
}

/// Period between sweeps in watch mode
pub fn sweep_period(config: &AnalyticsConfig) -> Duration {
    Duration::from_secs(config.sweep.interval_hours.saturating_mul(3600))
}

/// Run a sweep immediately and then every `interval_hours` until a shutdown signal.
///
/// A failed sweep is logged and retried at the next tick.
pub async fn watch(config: AnalyticsConfig, mut on_report: impl FnMut(&SweepReport)) -> Result<()> {
    let period = sweep_period(&config);
    let config = Arc::new(config);

    let mut shutdown = setup_signal_handlers()?;
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Sweep runner started, interval {} hours. Press Ctrl+C to stop.", config.sweep.interval_hours);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping sweep runner");
                break;
            }
            _ = interval.tick() => {
                let sweep_config = Arc::clone(&config);
                match tokio::task::spawn_blocking(move || run_sweep_once(&sweep_config)).await {
                    Ok(Ok(report)) => on_report(&report),
                    Ok(Err(e)) => error!("Sweep failed: {:#}", e),
                    Err(e) => error!("Sweep task failed: {}", e),
                }
            }
        }
    }

    Ok(())
}

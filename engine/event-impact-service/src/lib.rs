//! Event Impact Service Library
//!
//! Command line handling, logging setup and the periodic sweep runner behind the
//! `event-impact` binary.

pub mod cli;
pub mod logging;
pub mod runner;
pub mod signals;

pub use cli::{Cli, CliHandler, Commands};
pub use logging::{initialize_logging, LogFormat};
pub use runner::{run_sweep_once, watch};
pub use signals::setup_signal_handlers;

//! Diagnostics logging for the command-line front end.
//!
//! User-facing progress goes to stdout through the console renderer. This
//! logger only carries the `log` facade output: to a file when requested
//! and to stderr in verbose mode.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Where diagnostics go.
pub enum LogDestination {
    /// Nothing is logged.
    Off,
    /// Append to the given file.
    File(PathBuf),
    /// Write to stderr.
    Terminal,
    /// Both of the above.
    Both(PathBuf),
}

impl LogDestination {
    pub fn from_flags(log_file: Option<PathBuf>, verbose: bool) -> Self {
        match (log_file, verbose) {
            (None, false) => LogDestination::Off,
            (None, true) => LogDestination::Terminal,
            (Some(path), false) => LogDestination::File(path),
            (Some(path), true) => LogDestination::Both(path),
        }
    }
}

/// Install the global logger. Safe to call once per process.
pub fn initialize(destination: LogDestination, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::Off => return,
        LogDestination::File(path) => create_file_logger(&path, level, config)
            .into_iter()
            .map(|logger| logger as Box<dyn SharedLogger>)
            .collect(),
        LogDestination::Terminal => vec![terminal_logger(level, config)],
        LogDestination::Both(path) => {
            let mut loggers = vec![terminal_logger(level, config.clone())];
            if let Some(file_logger) = create_file_logger(&path, level, config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    if loggers.is_empty() {
        return;
    }
    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<dyn SharedLogger> {
    TermLogger::new(level, config, TerminalMode::Stderr, ColorChoice::Auto)
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not open log file at {:?}: {}", path, err);
            None
        }
    }
}

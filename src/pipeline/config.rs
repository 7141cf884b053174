//! Configuration for the postprocessing pipeline.

use crate::text::DEFAULT_ABBREVIATIONS;
use std::path::PathBuf;

/// Default output directory.
pub const DEFAULT_OUT_DIR: &str = "out";

/// Logging detail level.
///
/// The library only emits records through the `log` facade; the level is
/// applied by whoever installs the logger (the `postprocess` binary does).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Warnings and errors only (`-q`)
    Warn,
    /// Progress per document (default level)
    #[default]
    Info,
    /// Per-stage details and written files (`-v`)
    Debug,
}

impl LogLevel {
    /// Pick a level from the quiet/verbose flags. Verbose wins.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if verbose {
            Self::Debug
        } else if quiet {
            Self::Warn
        } else {
            Self::Info
        }
    }

    /// Matching `log` filter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Pipeline configuration.
///
/// # Examples
///
/// ```
/// use pdfnlt_postprocess::pipeline::{LogLevel, PipelineConfig};
///
/// let config = PipelineConfig::default()
///     .with_batch(true)
///     .with_out_dir("results")
///     .with_log_level(LogLevel::Debug);
/// assert!(config.batch);
/// assert!(config.remove_positions);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Abbreviations known to the sentence splitter (without trailing period)
    pub abbreviations: Vec<String>,
    /// Strip `data-from`/`data-to` from `class="word"` spans in the written XHTML
    pub remove_positions: bool,
    /// Log and continue when a document fails
    pub batch: bool,
    /// Directory receiving the output files
    pub out_dir: PathBuf,
    /// Logging detail level
    pub log_level: LogLevel,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            abbreviations: DEFAULT_ABBREVIATIONS.iter().map(|a| a.to_string()).collect(),
            remove_positions: true,
            batch: false,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            log_level: LogLevel::default(),
        }
    }
}

impl PipelineConfig {
    /// Replace the sentence-splitter abbreviations.
    pub fn with_abbreviations<I, S>(mut self, abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.abbreviations = abbreviations.into_iter().map(Into::into).collect();
        self
    }

    /// Keep (`true`) or strip (`false`) positions on word spans.
    ///
    /// This is the `-m/--map` switch.
    pub fn with_positions(mut self, keep: bool) -> Self {
        self.remove_positions = !keep;
        self
    }

    /// Enable batch mode.
    pub fn with_batch(mut self, batch: bool) -> Self {
        self.batch = batch;
        self
    }

    /// Set the output directory.
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    /// Set the logging detail level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}

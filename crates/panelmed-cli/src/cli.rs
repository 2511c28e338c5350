//! CLI argument definitions for panel mediation analysis.

use std::path::PathBuf;

use clap::{Args, ColorChoice, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use panelmed_model::{EffectType, PanelModel};
use tracing::level_filters::LevelFilter;

use crate::logging::{LogConfig, LogFormat};

/// Output basename used when none is given.
pub const DEFAULT_BASENAME: &str = "panel_mediation";

#[derive(Parser)]
#[command(
    name = "panelmed",
    version,
    about = "Panel data mediation analysis",
    long_about = "Estimate indirect, direct and total effects of a treatment on an outcome\n\
                  through one or more mediators, using fixed, random, pooled or between\n\
                  panel estimators.\n\n\
                  Reads CSV, TSV and SAS Transport (XPT v5) files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging settings implied by the global flags. An explicit
    /// `--log-level` wins over `-v`/`-q`; with neither, `RUST_LOG` applies.
    pub fn log_config(&self, stderr_is_terminal: bool) -> LogConfig {
        let explicit = self.log_level.map(LevelFilter::from);
        let mut config = LogConfig::default()
            .with_level_filter(explicit.unwrap_or_else(|| self.verbosity.tracing_level_filter()))
            .with_format(self.log_format.into())
            .with_log_file(self.log_file.clone());
        config.use_env_filter = explicit.is_none() && !self.verbosity.is_present();
        config.with_ansi = match self.color.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.log_file.is_none() && stderr_is_terminal,
        };
        config
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Estimate a mediation model and write the effect tables.
    Run(RunArgs),

    /// Estimate the same mediation model under several panel estimators.
    Compare(CompareArgs),

    /// Report the panel structure of a data file.
    Check(CheckArgs),
}

/// Data file and variable roles shared by `run` and `compare`.
#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// Input data file (.csv, .tsv, .txt or .xpt).
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// Treatment column.
    #[arg(value_name = "X")]
    pub treatment: String,

    /// Mediator columns, comma separated.
    #[arg(value_name = "M")]
    pub mediators: String,

    /// Outcome column.
    #[arg(value_name = "Y")]
    pub outcome: String,

    /// Individual identifier column.
    #[arg(value_name = "ID")]
    pub id: String,

    /// Time period column.
    #[arg(value_name = "TIME")]
    pub time: String,
}

/// Model options shared by `run` and `compare`.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Effects accounted for.
    #[arg(long = "effect", value_name = "EFFECT", value_enum)]
    pub effect: Option<EffectArg>,

    /// Lag order for dynamic specifications.
    #[arg(long = "lag", value_name = "K")]
    pub lag: Option<usize>,

    /// Moderator column (first-stage moderation).
    #[arg(long = "moderator", value_name = "W")]
    pub moderator: Option<String>,

    /// Keep individuals not observed in every period.
    #[arg(long = "no-balance")]
    pub no_balance: bool,

    /// TOML file with model settings; flags override its values.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Panel estimator.
    #[arg(value_name = "PANEL_MODEL", value_enum)]
    pub panel_model: Option<PanelModelArg>,

    /// Basename of the effect tables (default: panel_mediation).
    #[arg(value_name = "OUTPUT_BASENAME")]
    pub output_base: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Attach cluster-robust (HC1) standard errors.
    #[arg(long = "robust")]
    pub robust: bool,

    /// Print coefficient tables for every sub-model.
    #[arg(long = "detailed")]
    pub detailed: bool,

    /// Write the detailed text report to a file.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Write the prepared panel as CSV.
    #[arg(long = "export-data", value_name = "PATH")]
    pub export_data: Option<PathBuf>,

    /// Write a JSON summary of the analysis.
    #[arg(long = "json", value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Number of cluster bootstrap replicates for the indirect effects.
    #[arg(long = "bootstrap", value_name = "N")]
    pub bootstrap: Option<usize>,

    /// Bootstrap random seed.
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Bootstrap confidence level.
    #[arg(long = "confidence", value_name = "LEVEL")]
    pub confidence: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Basename of the comparison table (default: panel_mediation).
    #[arg(value_name = "OUTPUT_BASENAME")]
    pub output_base: Option<PathBuf>,

    /// Estimators to compare, comma separated.
    #[arg(
        long = "models",
        value_name = "MODELS",
        value_enum,
        value_delimiter = ',',
        default_value = "pooling,within,random"
    )]
    pub models: Vec<PanelModelArg>,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Input data file (.csv, .tsv, .txt or .xpt).
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// Individual identifier column.
    #[arg(value_name = "ID")]
    pub id: String,

    /// Time period column.
    #[arg(value_name = "TIME")]
    pub time: String,
}

/// Panel estimator choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PanelModelArg {
    /// Fixed effects (within transformation).
    Within,
    /// Swamy-Arora random effects.
    Random,
    /// Pooled OLS.
    Pooling,
    /// OLS on individual means.
    Between,
}

/// Effect choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EffectArg {
    Individual,
    Time,
    Twoways,
}

impl From<PanelModelArg> for PanelModel {
    fn from(model: PanelModelArg) -> Self {
        match model {
            PanelModelArg::Within => Self::Within,
            PanelModelArg::Random => Self::Random,
            PanelModelArg::Pooling => Self::Pooling,
            PanelModelArg::Between => Self::Between,
        }
    }
}

impl From<EffectArg> for EffectType {
    fn from(effect: EffectArg) -> Self {
        match effect {
            EffectArg::Individual => Self::Individual,
            EffectArg::Time => Self::Time,
            EffectArg::Twoways => Self::Twoways,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}

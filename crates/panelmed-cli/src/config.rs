//! Analysis settings from a TOML file merged with command-line flags.
//!
//! ```toml
//! panel_model = "random"
//! effect = "individual"
//! robust_se = true
//! lag = 1
//! moderator = "w"
//! balance = false
//!
//! [bootstrap]
//! replicates = 500
//! seed = 7
//! confidence = 0.9
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use panelmed_estimate::BootstrapOptions;
use panelmed_model::{EffectType, ModelConfig, ModeratorSpec, PanelModel};
use serde::Deserialize;

use crate::cli::{ModelArgs, PanelModelArg, RunArgs};

/// Bootstrap table of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapFile {
    pub replicates: Option<usize>,
    pub seed: Option<u64>,
    pub confidence: Option<f64>,
}

/// Settings file contents; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub panel_model: Option<PanelModel>,
    pub effect: Option<EffectType>,
    pub robust_se: Option<bool>,
    pub lag: Option<usize>,
    pub moderator: Option<String>,
    pub balance: Option<bool>,
    pub bootstrap: Option<BootstrapFile>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("parse settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("load {}", path.display()))
    }

    /// The settings file named by `--config`, or an empty one.
    pub fn from_args(args: &ModelArgs) -> Result<Self> {
        args.config
            .as_deref()
            .map_or_else(|| Ok(Self::default()), Self::load)
    }
}

/// Effective settings of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: ModelConfig,
    pub balance: bool,
    pub bootstrap: Option<BootstrapOptions>,
}

/// Merge the file settings with the shared model flags. Flags win.
pub fn model_settings(
    file: &FileConfig,
    args: &ModelArgs,
    panel_model: Option<PanelModelArg>,
) -> Settings {
    let panel_model = panel_model
        .map(PanelModel::from)
        .or(file.panel_model)
        .unwrap_or_default();
    let effect = args
        .effect
        .map(EffectType::from)
        .or(file.effect)
        .unwrap_or_default();
    let moderator = args
        .moderator
        .clone()
        .or_else(|| file.moderator.clone())
        .map(ModeratorSpec::single);
    let model = ModelConfig::new(panel_model, effect)
        .with_robust_se(file.robust_se.unwrap_or(false))
        .with_lag(args.lag.or(file.lag).unwrap_or(0))
        .with_moderator(moderator);
    let balance = !args.no_balance && file.balance.unwrap_or(true);
    Settings {
        model,
        balance,
        bootstrap: None,
    }
}

/// Settings of `panelmed run`, including robust errors and bootstrap.
pub fn run_settings(file: &FileConfig, args: &RunArgs) -> Settings {
    let mut settings = model_settings(file, &args.model, args.panel_model);
    if args.robust {
        settings.model.robust_se = true;
    }

    let from_file = file.bootstrap.clone().unwrap_or_default();
    let replicates = args.bootstrap.or(from_file.replicates);
    settings.bootstrap = replicates.map(|replicates| {
        let defaults = BootstrapOptions::default();
        BootstrapOptions {
            replicates,
            seed: args.seed.or(from_file.seed).unwrap_or(defaults.seed),
            confidence: args
                .confidence
                .or(from_file.confidence)
                .unwrap_or(defaults.confidence),
        }
    });
    settings
}

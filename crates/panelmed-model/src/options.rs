//! Configuration options for panel mediation analysis.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};

/// Panel estimator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelModel {
    /// Fixed effects: OLS on data demeaned within groups.
    #[default]
    Within,
    /// Random effects: OLS on quasi-demeaned data (Swamy-Arora components).
    Random,
    /// Pooled OLS on the stacked observations.
    Pooling,
    /// OLS on group means.
    Between,
}

impl PanelModel {
    pub const ALL: [PanelModel; 4] = [
        PanelModel::Pooling,
        PanelModel::Within,
        PanelModel::Random,
        PanelModel::Between,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Within => "within",
            Self::Random => "random",
            Self::Pooling => "pooling",
            Self::Between => "between",
        }
    }

    /// Human-readable estimator name used in reports.
    pub fn description(self) -> &'static str {
        match self {
            Self::Within => "Fixed effects (within)",
            Self::Random => "Random effects (Swamy-Arora)",
            Self::Pooling => "Pooled OLS",
            Self::Between => "Between",
        }
    }
}

impl fmt::Display for PanelModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelModel {
    type Err = PanelError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "within" => Ok(Self::Within),
            "random" => Ok(Self::Random),
            "pooling" => Ok(Self::Pooling),
            "between" => Ok(Self::Between),
            _ => Err(PanelError::configuration(
                "panel_model",
                format!(
                    "unknown value '{value}' (expected one of: within, random, pooling, between)"
                ),
            )),
        }
    }
}

/// Which unobserved effects the estimator accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectType {
    #[default]
    Individual,
    Time,
    Twoways,
}

impl EffectType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Time => "time",
            Self::Twoways => "twoways",
        }
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectType {
    type Err = PanelError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(Self::Individual),
            "time" => Ok(Self::Time),
            "twoways" => Ok(Self::Twoways),
            _ => Err(PanelError::configuration(
                "effect",
                format!("unknown value '{value}' (expected one of: individual, time, twoways)"),
            )),
        }
    }
}

/// Moderator variables supplied with an analysis request.
///
/// Only a single moderator is supported; it enters the X -> M paths as a
/// first-stage interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeratorSpec {
    pub moderators: Vec<String>,
}

impl ModeratorSpec {
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            moderators: vec![name.into()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.moderators.is_empty()
    }

    /// The moderator column, if exactly one is configured.
    pub fn primary(&self) -> Option<&str> {
        match self.moderators.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

/// Model configuration for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub panel_model: PanelModel,
    pub effect: EffectType,
    /// Attach an HC1 cluster-robust covariance to every fitted sub-model.
    pub robust_se: bool,
    /// Lag order for dynamic specifications (0 = static).
    pub lag: usize,
    pub moderator: Option<ModeratorSpec>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            panel_model: PanelModel::Within,
            effect: EffectType::Individual,
            robust_se: false,
            lag: 0,
            moderator: None,
        }
    }
}

impl ModelConfig {
    pub fn new(panel_model: PanelModel, effect: EffectType) -> Self {
        Self {
            panel_model,
            effect,
            ..Self::default()
        }
    }

    /// Build a configuration from option labels, e.g. `("random", "individual")`.
    pub fn from_labels(panel_model: &str, effect: &str) -> Result<Self> {
        Ok(Self::new(panel_model.parse()?, effect.parse()?))
    }

    #[must_use]
    pub fn with_panel_model(mut self, panel_model: PanelModel) -> Self {
        self.panel_model = panel_model;
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: EffectType) -> Self {
        self.effect = effect;
        self
    }

    #[must_use]
    pub fn with_robust_se(mut self, enable: bool) -> Self {
        self.robust_se = enable;
        self
    }

    #[must_use]
    pub fn with_lag(mut self, lag: usize) -> Self {
        self.lag = lag;
        self
    }

    #[must_use]
    pub fn with_moderator(mut self, moderator: Option<ModeratorSpec>) -> Self {
        self.moderator = moderator.filter(|spec| !spec.is_empty());
        self
    }

    /// The configured moderator column, if any.
    pub fn moderator_column(&self) -> Option<&str> {
        self.moderator.as_ref().and_then(ModeratorSpec::primary)
    }

    /// Check option combinations that no estimator accepts.
    pub fn validate(&self) -> Result<()> {
        if self.panel_model == PanelModel::Between && self.effect == EffectType::Twoways {
            return Err(PanelError::configuration(
                "effect",
                "the between estimator does not support twoways effects",
            ));
        }
        if let Some(spec) = &self.moderator {
            if spec.moderators.len() > 1 {
                return Err(PanelError::configuration(
                    "moderator",
                    format!(
                        "only one moderator is supported, got {}",
                        spec.moderators.len()
                    ),
                ));
            }
            if spec.moderators.iter().any(|name| name.trim().is_empty()) {
                return Err(PanelError::configuration(
                    "moderator",
                    "moderator name must not be empty",
                ));
            }
        }
        Ok(())
    }
}

/// Index columns of the panel and the balancing policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub id: String,
    pub time: String,
    /// Keep only individuals observed in every time period.
    pub balance: bool,
}

impl PanelSpec {
    pub fn new(id: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            time: time.into(),
            balance: true,
        }
    }

    #[must_use]
    pub fn with_balance(mut self, balance: bool) -> Self {
        self.balance = balance;
        self
    }
}

use serde::{Deserialize, Serialize};

use crate::options::{EffectType, PanelModel};

/// Metadata describing the panel an analysis ran on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelInfo {
    pub id: String,
    pub time: String,
    pub model: PanelModel,
    pub effect: EffectType,
    pub robust: bool,
    pub lag: usize,
    /// Individuals remaining after balancing.
    pub n_individuals: usize,
    /// Time periods remaining after balancing.
    pub n_time_periods: usize,
    /// Rows of the prepared panel.
    pub n_obs: usize,
    pub balanced: bool,
}

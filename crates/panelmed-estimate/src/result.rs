//! Immutable mediation results.

use panelmed_model::{EffectKind, MediationVariables, PanelInfo};
use serde::Serialize;

use crate::plm::FittedModel;

/// One labelled effect, e.g. `indirect_m1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedEffect {
    /// Effect label (`indirect_<M>`, `direct_<X>`, `total_<X>`).
    pub name: String,
    pub kind: EffectKind,
    /// Mediator for indirect effects, treatment otherwise.
    pub variable: String,
    pub value: f64,
}

impl NamedEffect {
    pub(crate) fn new(kind: EffectKind, variable: &str, value: f64) -> Self {
        Self {
            name: kind.label(variable),
            kind,
            variable: variable.to_string(),
            value,
        }
    }
}

/// Indirect effect at one value of the moderator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalPoint {
    /// `mean - 1 SD`, `mean` or `mean + 1 SD`.
    pub label: String,
    /// Moderator value on its original scale.
    pub moderator_value: f64,
    pub effect: f64,
}

/// First-stage moderated mediation summary for one mediator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalEffect {
    pub mediator: String,
    pub moderator: String,
    /// `a_{X:W} * b`.
    pub index_of_moderated_mediation: f64,
    pub points: Vec<ConditionalPoint>,
}

/// Outcome of a step-wise mediation analysis.
///
/// Built once by the estimator and read through accessors only.
#[derive(Debug, Clone)]
pub struct MediationResult {
    pub(crate) variables: MediationVariables,
    pub(crate) a_models: Vec<FittedModel>,
    pub(crate) y_model: FittedModel,
    pub(crate) total_model: FittedModel,
    pub(crate) indirect_effects: Vec<NamedEffect>,
    pub(crate) direct_effects: Vec<NamedEffect>,
    pub(crate) total_effects: Vec<NamedEffect>,
    pub(crate) conditional_effects: Vec<ConditionalEffect>,
    pub(crate) panel_info: PanelInfo,
}

impl MediationResult {
    pub fn variables(&self) -> &MediationVariables {
        &self.variables
    }

    /// X -> M models, one per mediator in input order.
    pub fn a_models(&self) -> &[FittedModel] {
        &self.a_models
    }

    /// The X + M -> Y model.
    pub fn y_model(&self) -> &FittedModel {
        &self.y_model
    }

    /// The X -> Y model.
    pub fn total_model(&self) -> &FittedModel {
        &self.total_model
    }

    pub fn indirect_effects(&self) -> &[NamedEffect] {
        &self.indirect_effects
    }

    pub fn direct_effects(&self) -> &[NamedEffect] {
        &self.direct_effects
    }

    pub fn total_effects(&self) -> &[NamedEffect] {
        &self.total_effects
    }

    /// Empty unless the analysis had a moderator.
    pub fn conditional_effects(&self) -> &[ConditionalEffect] {
        &self.conditional_effects
    }

    pub fn panel_info(&self) -> &PanelInfo {
        &self.panel_info
    }

    /// Indirect effect through `mediator`.
    pub fn indirect(&self, mediator: &str) -> Option<f64> {
        self.indirect_effects
            .iter()
            .find(|effect| effect.variable == mediator)
            .map(|effect| effect.value)
    }

    pub fn direct(&self) -> f64 {
        self.direct_effects.first().map_or(f64::NAN, |effect| effect.value)
    }

    pub fn total(&self) -> f64 {
        self.total_effects.first().map_or(f64::NAN, |effect| effect.value)
    }

    /// Every effect in report order: indirect, direct, total.
    pub fn all_effects(&self) -> impl Iterator<Item = &NamedEffect> {
        self.indirect_effects
            .iter()
            .chain(&self.direct_effects)
            .chain(&self.total_effects)
    }

    /// True when every sub-model carries a robust covariance.
    pub fn is_robust(&self) -> bool {
        self.a_models.iter().all(FittedModel::is_robust)
            && self.y_model.is_robust()
            && self.total_model.is_robust()
    }
}

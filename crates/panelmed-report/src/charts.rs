//! Values behind the result charts.

use panelmed_estimate::MediationResult;
use panelmed_model::EffectKind;
use serde::Serialize;

/// One bar of the effect chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectBar {
    pub name: String,
    pub value: f64,
    pub kind: EffectKind,
}

/// Every effect as a bar, indirect effects first.
pub fn effect_bars(result: &MediationResult) -> Vec<EffectBar> {
    result
        .all_effects()
        .map(|effect| EffectBar {
            name: effect.name.clone(),
            value: effect.value,
            kind: effect.kind,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResidualPoint {
    pub fitted: f64,
    pub residual: f64,
}

/// Residual-versus-fitted points of the b/c' model.
pub fn residual_points(result: &MediationResult) -> Vec<ResidualPoint> {
    let model = result.y_model();
    model
        .fitted_values()
        .iter()
        .zip(model.residuals())
        .map(|(&fitted, &residual)| ResidualPoint { fitted, residual })
        .collect()
}

/// Conditional indirect effect of one mediator across moderator values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalLine {
    pub mediator: String,
    pub moderator: String,
    /// (moderator value, indirect effect), in increasing moderator order.
    pub points: Vec<(f64, f64)>,
}

/// One line per mediator; empty without a moderator.
pub fn conditional_lines(result: &MediationResult) -> Vec<ConditionalLine> {
    result
        .conditional_effects()
        .iter()
        .map(|conditional| ConditionalLine {
            mediator: conditional.mediator.clone(),
            moderator: conditional.moderator.clone(),
            points: conditional
                .points
                .iter()
                .map(|point| (point.moderator_value, point.effect))
                .collect(),
        })
        .collect()
}

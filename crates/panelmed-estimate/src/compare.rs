//! Mediation under several panel estimators.

use std::collections::HashSet;

use panelmed_model::{MediationVariables, ModelConfig, PanelError, PanelModel, PanelSpec, Result};
use panelmed_panel::prepare;
use polars::prelude::DataFrame;
use tracing::{info, info_span, warn};

use crate::mediation::{check_inputs, estimate_prepared};
use crate::result::MediationResult;

/// A model label whose analysis failed.
#[derive(Debug)]
pub struct ModelFailure {
    pub model: PanelModel,
    pub error: PanelError,
}

/// Results of [`compare`], in the order the models were requested.
#[derive(Debug)]
pub struct Comparison {
    results: Vec<(PanelModel, MediationResult)>,
    failures: Vec<ModelFailure>,
}

impl Comparison {
    pub fn results(&self) -> &[(PanelModel, MediationResult)] {
        &self.results
    }

    pub fn failures(&self) -> &[ModelFailure] {
        &self.failures
    }

    /// Models that produced a result.
    pub fn models(&self) -> Vec<PanelModel> {
        self.results.iter().map(|(model, _)| *model).collect()
    }

    pub fn get(&self, model: PanelModel) -> Option<&MediationResult> {
        self.results
            .iter()
            .find(|(candidate, _)| *candidate == model)
            .map(|(_, result)| result)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Run the mediation analysis once per model in `models`.
///
/// Robust standard errors are always off. A model whose analysis fails is
/// logged, recorded in [`Comparison::failures`] and skipped; the other
/// models still run. Problems shared by every model (missing columns,
/// invalid variables, panel preparation) are returned as errors.
pub fn compare(
    data: &DataFrame,
    variables: &MediationVariables,
    panel_spec: &PanelSpec,
    base_config: &ModelConfig,
    models: &[PanelModel],
) -> Result<Comparison> {
    if models.is_empty() {
        return Err(PanelError::configuration(
            "models",
            "at least one panel model is required",
        ));
    }
    let mut seen = HashSet::new();
    for model in models {
        if !seen.insert(*model) {
            return Err(PanelError::configuration(
                "models",
                format!("panel model '{model}' is listed more than once"),
            ));
        }
    }

    let span = info_span!("compare", models = models.len());
    let _guard = span.enter();

    check_inputs(data, variables, base_config)?;
    let panel = prepare(data, panel_spec)?;

    let mut results = Vec::with_capacity(models.len());
    let mut failures = Vec::new();
    for &model in models {
        let config = base_config
            .clone()
            .with_panel_model(model)
            .with_robust_se(false);
        let outcome = config
            .validate()
            .and_then(|()| estimate_prepared(&panel, variables, &config));
        match outcome {
            Ok(result) => {
                info!(model = %model, "model estimated");
                results.push((model, result));
            }
            Err(error) => {
                warn!(model = %model, error = %error, "model failed; skipping");
                failures.push(ModelFailure { model, error });
            }
        }
    }

    Ok(Comparison { results, failures })
}

/// [`compare`] with models given as labels such as `"within"`.
pub fn compare_labels(
    data: &DataFrame,
    variables: &MediationVariables,
    panel_spec: &PanelSpec,
    base_config: &ModelConfig,
    labels: &[&str],
) -> Result<Comparison> {
    let models = labels
        .iter()
        .map(|label| label.parse::<PanelModel>())
        .collect::<Result<Vec<_>>>()?;
    compare(data, variables, panel_spec, base_config, &models)
}

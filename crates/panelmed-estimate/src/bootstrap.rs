//! Cluster bootstrap of indirect effects.
//!
//! Whole individuals are resampled with replacement; each draw becomes a
//! separate individual in the replicate panel. The a-paths and the b/c'
//! path are refitted on every replicate (robust covariance off) and the
//! percentile interval of each indirect effect is reported.

use panelmed_model::{MediationVariables, ModelConfig, PanelError, PanelSpec, Result};
use panelmed_panel::prepare;
use polars::prelude::DataFrame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::mediation::{check_inputs, fit_paths};

/// Bootstrap settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapOptions {
    pub replicates: usize,
    pub seed: u64,
    /// Confidence level of the percentile interval, in (0, 1).
    pub confidence: f64,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            replicates: 1000,
            seed: 42,
            confidence: 0.95,
        }
    }
}

/// Bootstrap distribution summary of one indirect effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootstrapEffect {
    pub name: String,
    pub mediator: String,
    /// Estimate on the original panel.
    pub estimate: f64,
    pub mean: f64,
    pub std_error: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Result of [`bootstrap_indirect`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootstrapSummary {
    pub requested: usize,
    pub successful: usize,
    pub failed: usize,
    pub confidence: f64,
    pub seed: u64,
    pub effects: Vec<BootstrapEffect>,
}

/// Percentile bootstrap of the indirect effects.
///
/// Replicates whose fits fail are skipped and counted; fewer than two
/// successful replicates is an estimation error.
pub fn bootstrap_indirect(
    data: &DataFrame,
    variables: &MediationVariables,
    panel_spec: &PanelSpec,
    config: &ModelConfig,
    options: &BootstrapOptions,
) -> Result<BootstrapSummary> {
    if !(options.confidence > 0.0 && options.confidence < 1.0) {
        return Err(PanelError::configuration(
            "confidence",
            format!("must be in (0, 1), got {}", options.confidence),
        ));
    }
    if options.replicates < 2 {
        return Err(PanelError::configuration(
            "bootstrap",
            "at least two replicates are required",
        ));
    }

    let span = info_span!(
        "bootstrap",
        replicates = options.replicates,
        seed = options.seed
    );
    let _guard = span.enter();

    check_inputs(data, variables, config)?;
    config.validate()?;
    let config = config.clone().with_robust_se(false);
    let panel = prepare(data, panel_spec)?;

    let point = fit_paths(&panel, variables, &config)?.indirect_effects(variables)?;

    let n_individuals = panel.n_individuals();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut draws: Vec<Vec<f64>> = vec![Vec::with_capacity(options.replicates); point.len()];
    let mut failed = 0usize;
    for replicate in 0..options.replicates {
        let sample: Vec<usize> = (0..n_individuals)
            .map(|_| rng.random_range(0..n_individuals))
            .collect();
        let outcome = panel
            .resample(&sample)
            .and_then(|boot| fit_paths(&boot, variables, &config))
            .and_then(|paths| paths.indirect_effects(variables));
        match outcome {
            Ok(effects) => {
                for (slot, effect) in draws.iter_mut().zip(effects) {
                    slot.push(effect.value);
                }
            }
            Err(error) => {
                failed += 1;
                debug!(replicate, error = %error, "bootstrap replicate failed");
            }
        }
    }

    let successful = options.replicates - failed;
    if failed > 0 {
        warn!(failed, successful, "skipped failed bootstrap replicates");
    }
    if successful < 2 {
        return Err(PanelError::estimation(
            config.panel_model.as_str(),
            format!("only {successful} bootstrap replicates succeeded"),
        ));
    }

    let alpha = (1.0 - options.confidence) / 2.0;
    let effects = point
        .into_iter()
        .zip(draws)
        .map(|(effect, mut values)| {
            values.sort_by(f64::total_cmp);
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            BootstrapEffect {
                name: effect.name,
                mediator: effect.variable,
                estimate: effect.value,
                mean,
                std_error: variance.sqrt(),
                lower: quantile_sorted(&values, alpha),
                upper: quantile_sorted(&values, 1.0 - alpha),
            }
        })
        .collect();

    info!(successful, failed, "bootstrap finished");
    Ok(BootstrapSummary {
        requested: options.replicates,
        successful,
        failed,
        confidence: options.confidence,
        seed: options.seed,
        effects,
    })
}

/// Quantile of sorted data with linear interpolation.
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let i = pos.floor() as usize;
    let j = pos.ceil() as usize;
    let t = pos - i as f64;
    (1.0 - t) * sorted[i] + t * sorted[j]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantiles_interpolate() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(quantile_sorted(&sorted, 1.0), 5.0);
        assert_eq!(quantile_sorted(&sorted, 0.5), 3.0);
        assert!((quantile_sorted(&sorted, 0.1) - 1.4).abs() < 1e-12);
        assert!(quantile_sorted(&[], 0.5).is_nan());
    }
}

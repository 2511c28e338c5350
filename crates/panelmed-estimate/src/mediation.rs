//! Step-wise panel mediation.
//!
//! For treatment X, mediators M_1..M_k and outcome Y the estimator fits
//!
//! 1. one a-path per mediator: `M_i ~ X`,
//! 2. the b/c' path: `Y ~ X + M_1 + ... + M_k`,
//! 3. the total path: `Y ~ X`, as an independent regression,
//!
//! and reports `indirect_<M_i> = a_i * b_i`, `direct_<X> = c'` and
//! `total_<X> = c`. The total effect is not forced to equal the sum of the
//! direct and indirect effects.
//!
//! With a lag order `k > 0`, `lag(X, k)` enters every a-path and the
//! b/c' path additionally gets `lag(M_i, k)`. A single moderator W enters
//! the a-paths as `W + X:W` (W mean-centred), so `a_i` is the effect of X
//! at the mean of W.

use panelmed_model::{
    EffectKind, MediationVariables, ModelConfig, PanelError, PanelInfo, PanelSpec, Result,
};
use panelmed_panel::{PanelFrame, prepare};
use polars::prelude::DataFrame;
use tracing::{debug, info_span};

use crate::plm::{Design, Estimator, FittedModel, Term, fit};
use crate::result::{ConditionalEffect, ConditionalPoint, MediationResult, NamedEffect};

/// Run the step-wise mediation analysis on `data`.
///
/// All configuration checks happen before any regression: at least one
/// mediator, every variable present, no variable used twice and a valid
/// option combination. The panel is prepared (sorted and, unless disabled,
/// balanced) before fitting. Any failed fit aborts the analysis.
pub fn estimate(
    data: &DataFrame,
    variables: &MediationVariables,
    panel_spec: &PanelSpec,
    config: &ModelConfig,
) -> Result<MediationResult> {
    let span = info_span!(
        "mediation",
        model = %config.panel_model,
        effect = %config.effect,
        robust = config.robust_se
    );
    let _guard = span.enter();

    check_inputs(data, variables, config)?;
    config.validate()?;
    let panel = prepare(data, panel_spec)?;
    estimate_prepared(&panel, variables, config)
}

/// Check that every analysis column exists and the variable roles are valid.
pub(crate) fn check_inputs(
    data: &DataFrame,
    variables: &MediationVariables,
    config: &ModelConfig,
) -> Result<()> {
    variables.validate()?;
    let mut columns = variables.columns();
    if let Some(spec) = &config.moderator {
        if spec.moderators.len() > 1 {
            return Err(PanelError::configuration(
                "moderator",
                format!(
                    "only one moderator is supported, got {}",
                    spec.moderators.len()
                ),
            ));
        }
        if let Some(moderator) = spec.primary() {
            if columns.contains(&moderator) {
                return Err(PanelError::configuration(
                    "moderator",
                    format!("variable '{moderator}' is used more than once"),
                ));
            }
            columns.push(moderator);
        }
    }
    let names = data.get_column_names();
    for column in columns {
        if !names.iter().any(|name| name.as_str() == column) {
            return Err(PanelError::configuration(
                "variables",
                format!("column '{column}' not found in data"),
            ));
        }
    }
    Ok(())
}

/// Name of the lag term of `variable`.
pub fn lag_name(variable: &str, k: usize) -> String {
    format!("lag({variable}, {k})")
}

/// Name of the interaction of `left` and `right`.
pub fn interaction_name(left: &str, right: &str) -> String {
    format!("{left}:{right}")
}

/// Mean-centred moderator and its interaction with the treatment.
struct Moderation {
    name: String,
    mean: f64,
    sd: f64,
    centred: Term,
    interaction: Term,
}

impl Moderation {
    /// Centre `moderator` on the rows every a-path fit keeps: those where
    /// the moderator and each of `a_path_columns` are observed.
    fn new(
        panel: &PanelFrame,
        moderator: &str,
        treatment: &Term,
        a_path_columns: &[&Term],
    ) -> Result<Self> {
        let values = panel.numeric(moderator)?;
        let present: Vec<f64> = values
            .iter()
            .enumerate()
            .filter(|(row, _)| {
                std::iter::once(treatment)
                    .chain(a_path_columns.iter().copied())
                    .all(|term| term.values[*row].is_some())
            })
            .filter_map(|(_, value)| *value)
            .collect();
        if present.len() < 2 {
            return Err(PanelError::configuration(
                "moderator",
                format!("moderator '{moderator}' has fewer than two values in the a-path sample"),
            ));
        }
        let n = present.len() as f64;
        let mean = present.iter().sum::<f64>() / n;
        let sd = (present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();

        let centred: Vec<Option<f64>> = values.iter().map(|v| v.map(|w| w - mean)).collect();
        let interaction = treatment
            .values
            .iter()
            .zip(&centred)
            .map(|(x, w)| Some((*x)? * (*w)?))
            .collect();
        Ok(Self {
            name: moderator.to_string(),
            mean,
            sd,
            centred: Term::new(moderator, centred),
            interaction: Term::new(interaction_name(&treatment.name, moderator), interaction),
        })
    }
}

/// Fitted a-paths and b/c' path.
pub(crate) struct Paths {
    pub a_models: Vec<FittedModel>,
    pub y_model: FittedModel,
    moderation: Option<Moderation>,
}

fn lag_term(panel: &PanelFrame, variable: &str, k: usize) -> Result<Option<Term>> {
    if k == 0 {
        return Ok(None);
    }
    Ok(Some(Term::new(lag_name(variable, k), panel.lagged(variable, k)?)))
}

fn fit_step(
    panel: &PanelFrame,
    response: Term,
    regressors: Vec<Term>,
    estimator: Estimator,
    robust: bool,
    step: &str,
) -> Result<FittedModel> {
    let design = Design::new(
        response,
        regressors,
        panel.individual_codes(),
        panel.period_codes(),
    )?;
    debug!(
        step,
        formula = %design.formula(),
        n = design.n_obs(),
        k = design.terms().len(),
        "fitting"
    );
    fit(&design, estimator, robust)
}

/// Fit the a-paths and the b/c' path on a prepared panel.
pub(crate) fn fit_paths(
    panel: &PanelFrame,
    variables: &MediationVariables,
    config: &ModelConfig,
) -> Result<Paths> {
    let estimator = Estimator::new(config.panel_model, config.effect);
    let robust = config.robust_se;
    let treatment = Term::new(
        variables.treatment.as_str(),
        panel.numeric(&variables.treatment)?,
    );
    let lag_x = lag_term(panel, &variables.treatment, config.lag)?;
    let mediators = variables
        .mediators
        .iter()
        .map(|mediator| Ok(Term::new(mediator.as_str(), panel.numeric(mediator)?)))
        .collect::<Result<Vec<Term>>>()?;
    let moderation = match config.moderator_column() {
        Some(moderator) => {
            let a_path_columns: Vec<&Term> = mediators.iter().chain(lag_x.as_ref()).collect();
            Some(Moderation::new(panel, moderator, &treatment, &a_path_columns)?)
        }
        None => None,
    };

    let mut a_models = Vec::with_capacity(mediators.len());
    for response in &mediators {
        let mut regressors = vec![treatment.clone()];
        if let Some(moderation) = &moderation {
            regressors.push(moderation.centred.clone());
            regressors.push(moderation.interaction.clone());
        }
        regressors.extend(lag_x.clone());
        a_models.push(fit_step(panel, response.clone(), regressors, estimator, robust, "a-path")?);
    }

    let mut regressors = vec![treatment];
    regressors.extend(mediators);
    regressors.extend(lag_x);
    for mediator in &variables.mediators {
        regressors.extend(lag_term(panel, mediator, config.lag)?);
    }
    let outcome = Term::new(variables.outcome.as_str(), panel.numeric(&variables.outcome)?);
    let y_model = fit_step(panel, outcome, regressors, estimator, robust, "b-path")?;

    Ok(Paths {
        a_models,
        y_model,
        moderation,
    })
}

fn coefficient(model: &FittedModel, term: &str) -> Result<f64> {
    model.coefficient(term).ok_or_else(|| {
        PanelError::estimation(
            model.estimator().model.as_str(),
            format!("{}: no coefficient for '{term}'", model.formula()),
        )
    })
}

impl Paths {
    /// Product-of-coefficients indirect effect of every mediator.
    pub(crate) fn indirect_effects(&self, variables: &MediationVariables) -> Result<Vec<NamedEffect>> {
        variables
            .mediators
            .iter()
            .zip(&self.a_models)
            .map(|(mediator, a_model)| {
                let a = coefficient(a_model, &variables.treatment)?;
                let b = coefficient(&self.y_model, mediator)?;
                Ok(NamedEffect::new(EffectKind::Indirect, mediator, a * b))
            })
            .collect()
    }

    fn conditional_effects(&self, variables: &MediationVariables) -> Result<Vec<ConditionalEffect>> {
        let Some(moderation) = &self.moderation else {
            return Ok(Vec::new());
        };
        let mut effects = Vec::with_capacity(variables.mediators.len());
        for (mediator, a_model) in variables.mediators.iter().zip(&self.a_models) {
            let a1 = coefficient(a_model, &variables.treatment)?;
            let a3 = coefficient(a_model, &moderation.interaction.name)?;
            let b = coefficient(&self.y_model, mediator)?;
            let points = [
                ("mean - 1 SD", -moderation.sd),
                ("mean", 0.0),
                ("mean + 1 SD", moderation.sd),
            ]
            .into_iter()
            .map(|(label, offset)| ConditionalPoint {
                label: label.to_string(),
                moderator_value: moderation.mean + offset,
                effect: (a1 + a3 * offset) * b,
            })
            .collect();
            effects.push(ConditionalEffect {
                mediator: mediator.clone(),
                moderator: moderation.name.clone(),
                index_of_moderated_mediation: a3 * b,
                points,
            });
        }
        Ok(effects)
    }
}

/// Run the analysis on an already prepared panel.
pub fn estimate_prepared(
    panel: &PanelFrame,
    variables: &MediationVariables,
    config: &ModelConfig,
) -> Result<MediationResult> {
    let paths = fit_paths(panel, variables, config)?;

    let estimator = Estimator::new(config.panel_model, config.effect);
    let treatment = Term::new(
        variables.treatment.as_str(),
        panel.numeric(&variables.treatment)?,
    );
    let outcome = Term::new(variables.outcome.as_str(), panel.numeric(&variables.outcome)?);
    let total_model = fit_step(
        panel,
        outcome,
        vec![treatment],
        estimator,
        config.robust_se,
        "total",
    )?;

    let indirect_effects = paths.indirect_effects(variables)?;
    let conditional_effects = paths.conditional_effects(variables)?;
    let direct = coefficient(&paths.y_model, &variables.treatment)?;
    let total = coefficient(&total_model, &variables.treatment)?;

    let spec = panel.spec();
    let panel_info = PanelInfo {
        id: spec.id.clone(),
        time: spec.time.clone(),
        model: config.panel_model,
        effect: config.effect,
        robust: config.robust_se,
        lag: config.lag,
        n_individuals: panel.n_individuals(),
        n_time_periods: panel.n_time_periods(),
        n_obs: panel.n_obs(),
        balanced: panel.is_balanced(),
    };

    let Paths {
        a_models, y_model, ..
    } = paths;
    Ok(MediationResult {
        variables: variables.clone(),
        a_models,
        y_model,
        total_model,
        indirect_effects,
        direct_effects: vec![NamedEffect::new(
            EffectKind::Direct,
            &variables.treatment,
            direct,
        )],
        total_effects: vec![NamedEffect::new(
            EffectKind::Total,
            &variables.treatment,
            total,
        )],
        conditional_effects,
        panel_info,
    })
}

//! Linear panel regression engine.
//!
//! Estimators:
//!
//! - `pooling`: OLS with an intercept on the stacked observations.
//! - `within`: OLS on data demeaned by individual, period or both
//!   (alternating projections for twoways). No intercept.
//! - `between`: OLS with an intercept on group means.
//! - `random`: Swamy-Arora variance components and quasi-demeaning.
//!
//! Every fit carries the default covariance `s^2 (X'X)^-1`; the Arellano
//! cluster-robust covariance (clustered by individual, HC1 scaled) is added
//! on request and never changes the coefficients.

mod fitted;
mod groups;
mod ols;

use nalgebra::{DMatrix, DVector};
use panelmed_model::{EffectType, PanelError, PanelModel, Result};
use tracing::{debug, warn};

pub use fitted::{CoefficientTest, Estimator, FittedModel, INTERCEPT, VarianceComponents};

use groups::{Groups, demean_twoways};
use ols::{OlsFit, cluster_covariance, ols};

/// A named column of a regression, with missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Term {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Complete-case regression data: response, regressors and panel codes.
#[derive(Debug, Clone)]
pub struct Design {
    response: String,
    y: Vec<f64>,
    terms: Vec<String>,
    columns: Vec<Vec<f64>>,
    individuals: Vec<usize>,
    periods: Vec<usize>,
}

impl Design {
    /// Build a design, dropping every row where the response or any
    /// regressor is missing.
    pub fn new(
        response: Term,
        regressors: Vec<Term>,
        individuals: &[usize],
        periods: &[usize],
    ) -> Result<Self> {
        let n = response.values.len();
        let lengths_match = individuals.len() == n
            && periods.len() == n
            && regressors.iter().all(|term| term.values.len() == n);
        if !lengths_match {
            return Err(PanelError::configuration(
                "design",
                format!("regressors of '{}' have mismatched lengths", response.name),
            ));
        }

        let complete: Vec<usize> = (0..n)
            .filter(|&i| {
                response.values[i].is_some()
                    && regressors.iter().all(|term| term.values[i].is_some())
            })
            .collect();
        let pick = |values: &[Option<f64>]| -> Vec<f64> {
            complete
                .iter()
                .filter_map(|&i| values[i])
                .collect()
        };

        Ok(Self {
            y: pick(&response.values),
            columns: regressors.iter().map(|term| pick(&term.values)).collect(),
            terms: regressors.into_iter().map(|term| term.name).collect(),
            individuals: complete.iter().map(|&i| individuals[i]).collect(),
            periods: complete.iter().map(|&i| periods[i]).collect(),
            response: response.name,
        })
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Complete observations.
    pub fn n_obs(&self) -> usize {
        self.y.len()
    }

    /// `response ~ term1 + term2 ...`
    pub fn formula(&self) -> String {
        format!("{} ~ {}", self.response, self.terms.join(" + "))
    }
}

/// Regression inputs after the estimator's transformation.
struct Transformed {
    y: Vec<f64>,
    columns: Vec<Vec<f64>>,
    terms: Vec<String>,
    clusters: Vec<usize>,
    /// Parameters absorbed by demeaning (fixed effects).
    absorbed: usize,
    centered_r2: bool,
    components: Option<VarianceComponents>,
}

/// Fit `design` with `estimator`, attaching the robust covariance when
/// `robust` is set.
pub fn fit(design: &Design, estimator: Estimator, robust: bool) -> Result<FittedModel> {
    let label = estimator.model.as_str();
    let formula = design.formula();
    if design.n_obs() == 0 {
        return Err(PanelError::estimation(
            label,
            format!("{formula}: no complete observations"),
        ));
    }

    let individuals = Groups::new(&design.individuals);
    let periods = Groups::new(&design.periods);
    let transformed = match estimator.model {
        PanelModel::Pooling => pooling(design, &individuals),
        PanelModel::Within => within(design, estimator.effect, &individuals, &periods),
        PanelModel::Between => between(design, estimator.effect, &individuals, &periods)?,
        PanelModel::Random => random(design, estimator.effect, &individuals, &periods)?,
    };

    let n = transformed.y.len();
    let p = transformed.columns.len();
    if n <= p + transformed.absorbed {
        return Err(PanelError::estimation(
            label,
            format!(
                "{formula}: too few observations ({n}) for {} parameters",
                p + transformed.absorbed
            ),
        ));
    }
    let x = to_matrix(&transformed.columns, n);
    let y = DVector::from_column_slice(&transformed.y);
    let OlsFit {
        beta,
        xtx_inv,
        fitted,
        residuals,
        rss,
    } = ols(&x, &y, label, &formula)?;

    let df_residual = n - p - transformed.absorbed;
    let sigma2 = rss / df_residual as f64;
    let vcov = &xtx_inv * sigma2;
    let robust_vcov =
        robust.then(|| cluster_covariance(&x, &residuals, &xtx_inv, &transformed.clusters));

    let tss = if transformed.centered_r2 {
        let mean = transformed.y.iter().sum::<f64>() / n as f64;
        transformed.y.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
    } else {
        transformed.y.iter().map(|v| v * v).sum::<f64>()
    };
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };

    debug!(
        formula = %formula,
        estimator = %estimator,
        n,
        k = p,
        df = df_residual,
        robust,
        "fitted panel regression"
    );

    Ok(FittedModel {
        response: design.response.clone(),
        formula,
        estimator,
        terms: transformed.terms,
        coefficients: beta.iter().copied().collect(),
        vcov,
        robust_vcov,
        fitted: fitted.iter().copied().collect(),
        residuals: residuals.iter().copied().collect(),
        df_residual,
        r_squared,
        n_obs: n,
        components: transformed.components,
    })
}

fn to_matrix(columns: &[Vec<f64>], n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, columns.len(), |i, j| columns[j][i])
}

fn with_intercept(
    intercept: Vec<f64>,
    columns: Vec<Vec<f64>>,
    terms: &[String],
) -> (Vec<Vec<f64>>, Vec<String>) {
    let mut all_columns = Vec::with_capacity(columns.len() + 1);
    all_columns.push(intercept);
    all_columns.extend(columns);
    let mut all_terms = Vec::with_capacity(terms.len() + 1);
    all_terms.push(INTERCEPT.to_string());
    all_terms.extend(terms.iter().cloned());
    (all_columns, all_terms)
}

fn pooling(design: &Design, individuals: &Groups) -> Transformed {
    let (columns, terms) = with_intercept(
        vec![1.0; design.n_obs()],
        design.columns.clone(),
        &design.terms,
    );
    Transformed {
        y: design.y.clone(),
        columns,
        terms,
        clusters: individuals.of().to_vec(),
        absorbed: 0,
        centered_r2: true,
        components: None,
    }
}

/// Demean one column for the within transformation of `effect`.
fn within_column(
    v: &[f64],
    effect: EffectType,
    individuals: &Groups,
    periods: &Groups,
) -> Vec<f64> {
    match effect {
        EffectType::Individual => {
            let mut out = v.to_vec();
            individuals.demean(&mut out);
            out
        }
        EffectType::Time => {
            let mut out = v.to_vec();
            periods.demean(&mut out);
            out
        }
        EffectType::Twoways => demean_twoways(v, individuals, periods),
    }
}

fn absorbed_effects(effect: EffectType, individuals: &Groups, periods: &Groups) -> usize {
    match effect {
        EffectType::Individual => individuals.len(),
        EffectType::Time => periods.len(),
        EffectType::Twoways => individuals.len() + periods.len() - 1,
    }
}

fn within(
    design: &Design,
    effect: EffectType,
    individuals: &Groups,
    periods: &Groups,
) -> Transformed {
    Transformed {
        y: within_column(&design.y, effect, individuals, periods),
        columns: design
            .columns
            .iter()
            .map(|column| within_column(column, effect, individuals, periods))
            .collect(),
        terms: design.terms.clone(),
        clusters: individuals.of().to_vec(),
        absorbed: absorbed_effects(effect, individuals, periods),
        centered_r2: false,
        components: None,
    }
}

fn between(
    design: &Design,
    effect: EffectType,
    individuals: &Groups,
    periods: &Groups,
) -> Result<Transformed> {
    let groups = match effect {
        EffectType::Individual => individuals,
        EffectType::Time => periods,
        EffectType::Twoways => {
            return Err(PanelError::configuration(
                "effect",
                "the between estimator does not support twoways effects",
            ));
        }
    };
    let (columns, terms) = with_intercept(
        vec![1.0; groups.len()],
        design.columns.iter().map(|column| groups.means(column)).collect(),
        &design.terms,
    );
    Ok(Transformed {
        y: groups.means(&design.y),
        columns,
        terms,
        clusters: (0..groups.len()).collect(),
        absorbed: 0,
        centered_r2: true,
        components: None,
    })
}

/// Residuals of the between regression over `groups`, one per group.
fn between_residuals(design: &Design, groups: &Groups, what: &str) -> Result<Vec<f64>> {
    let g = groups.len();
    let k = design.columns.len();
    if g <= k + 1 {
        return Err(PanelError::estimation(
            "random",
            format!(
                "{}: {g} {what} groups are too few for a between regression with {} parameters",
                design.formula(),
                k + 1
            ),
        ));
    }
    let mut columns = vec![vec![1.0; g]];
    columns.extend(design.columns.iter().map(|column| groups.means(column)));
    let x = to_matrix(&columns, g);
    let y = DVector::from_vec(groups.means(&design.y));
    let fit = ols(&x, &y, "random", &format!("{} (between {what})", design.formula()))?;
    Ok(fit.residuals.iter().copied().collect())
}

fn idiosyncratic_variance(
    design: &Design,
    effect: EffectType,
    individuals: &Groups,
    periods: &Groups,
) -> Result<f64> {
    let n = design.n_obs();
    let k = design.columns.len();
    let absorbed = absorbed_effects(effect, individuals, periods);
    let transformed = within(design, effect, individuals, periods);
    if n <= k + absorbed {
        return Err(PanelError::estimation(
            "random",
            format!("{}: too few observations for the within regression", design.formula()),
        ));
    }
    let x = to_matrix(&transformed.columns, n);
    let y = DVector::from_vec(transformed.y);
    let fit = ols(&x, &y, "random", &format!("{} (within)", design.formula()))?;
    let sigma2 = fit.rss / (n - k - absorbed) as f64;
    if !(sigma2 > 0.0) {
        return Err(PanelError::estimation(
            "random",
            format!("{}: idiosyncratic variance is not positive", design.formula()),
        ));
    }
    Ok(sigma2)
}

fn random(
    design: &Design,
    effect: EffectType,
    individuals: &Groups,
    periods: &Groups,
) -> Result<Transformed> {
    if effect == EffectType::Twoways {
        return random_twoways(design, individuals, periods);
    }
    let groups = if effect == EffectType::Individual {
        individuals
    } else {
        periods
    };
    let n = design.n_obs();
    let sigma2_e = idiosyncratic_variance(design, effect, individuals, periods)?;
    let ebar = between_residuals(design, groups, effect.as_str())?;
    let sizes = groups.sizes();
    let k = design.columns.len();

    let weighted: f64 = sizes
        .iter()
        .zip(&ebar)
        .map(|(&t, e)| t as f64 * e * e)
        .sum();
    let sigma2_1 = weighted / (groups.len() - k - 1) as f64;
    let t_bar = n as f64 / groups.len() as f64;
    let mut sigma2_u = (sigma2_1 - sigma2_e) / t_bar;
    if sigma2_u < 0.0 {
        warn!(
            formula = %design.formula(),
            estimate = sigma2_u,
            "negative {} variance component truncated to zero",
            effect
        );
        sigma2_u = 0.0;
    }

    let theta: Vec<f64> = sizes
        .iter()
        .map(|&t| 1.0 - (sigma2_e / (sigma2_e + t as f64 * sigma2_u)).sqrt())
        .collect();
    let row_theta: Vec<f64> = groups.of().iter().map(|&g| theta[g]).collect();
    let quasi = |v: &[f64]| -> Vec<f64> {
        let means = groups.means(v);
        v.iter()
            .zip(groups.of())
            .zip(&row_theta)
            .map(|((value, &g), th)| value - th * means[g])
            .collect()
    };

    let (columns, terms) = with_intercept(
        row_theta.iter().map(|th| 1.0 - th).collect(),
        design.columns.iter().map(|column| quasi(column)).collect(),
        &design.terms,
    );
    let components = VarianceComponents {
        idiosyncratic: sigma2_e,
        individual: (effect == EffectType::Individual).then_some(sigma2_u),
        time: (effect == EffectType::Time).then_some(sigma2_u),
        theta: row_theta.iter().sum::<f64>() / n as f64,
    };
    debug!(
        sigma2_e,
        sigma2_u,
        theta = components.theta,
        "random effects components"
    );
    Ok(Transformed {
        y: quasi(&design.y),
        columns,
        terms,
        clusters: individuals.of().to_vec(),
        absorbed: 0,
        centered_r2: true,
        components: Some(components),
    })
}

/// Twoways random effects on a balanced panel.
fn random_twoways(design: &Design, individuals: &Groups, periods: &Groups) -> Result<Transformed> {
    let n = design.n_obs();
    let n_ind = individuals.len();
    let n_per = periods.len();
    if n != n_ind * n_per || !individuals.is_uniform() || !periods.is_uniform() {
        return Err(PanelError::estimation(
            "random",
            format!(
                "{}: twoways random effects require a balanced panel",
                design.formula()
            ),
        ));
    }
    let k = design.columns.len();
    let sigma2_e = idiosyncratic_variance(design, EffectType::Twoways, individuals, periods)?;
    let e_ind = between_residuals(design, individuals, "individual")?;
    let e_per = between_residuals(design, periods, "time")?;

    let mut sigma2_1 =
        n_per as f64 * e_ind.iter().map(|e| e * e).sum::<f64>() / (n_ind - k - 1) as f64;
    let mut sigma2_2 =
        n_ind as f64 * e_per.iter().map(|e| e * e).sum::<f64>() / (n_per - k - 1) as f64;
    if sigma2_1 < sigma2_e {
        warn!(formula = %design.formula(), "negative individual variance component truncated to zero");
        sigma2_1 = sigma2_e;
    }
    if sigma2_2 < sigma2_e {
        warn!(formula = %design.formula(), "negative time variance component truncated to zero");
        sigma2_2 = sigma2_e;
    }
    let sigma2_3 = sigma2_1 + sigma2_2 - sigma2_e;
    let theta1 = 1.0 - (sigma2_e / sigma2_1).sqrt();
    let theta2 = 1.0 - (sigma2_e / sigma2_2).sqrt();
    let theta3 = theta1 + theta2 + (sigma2_e / sigma2_3).sqrt() - 1.0;

    let quasi = |v: &[f64]| -> Vec<f64> {
        let ind_means = individuals.means(v);
        let per_means = periods.means(v);
        let grand = v.iter().sum::<f64>() / n as f64;
        v.iter()
            .enumerate()
            .map(|(i, value)| {
                value - theta1 * ind_means[individuals.of()[i]]
                    - theta2 * per_means[periods.of()[i]]
                    + theta3 * grand
            })
            .collect()
    };

    let (columns, terms) = with_intercept(
        vec![1.0 - theta1 - theta2 + theta3; n],
        design.columns.iter().map(|column| quasi(column)).collect(),
        &design.terms,
    );
    Ok(Transformed {
        y: quasi(&design.y),
        columns,
        terms,
        clusters: individuals.of().to_vec(),
        absorbed: 0,
        centered_r2: true,
        components: Some(VarianceComponents {
            idiosyncratic: sigma2_e,
            individual: Some((sigma2_1 - sigma2_e) / n_per as f64),
            time: Some((sigma2_2 - sigma2_e) / n_ind as f64),
            theta: theta1,
        }),
    })
}

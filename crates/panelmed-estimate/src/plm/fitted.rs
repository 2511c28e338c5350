//! Fitted panel regressions and coefficient inference.

use std::fmt;

use nalgebra::DMatrix;
use panelmed_model::{EffectType, PanelModel};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Name of the intercept term.
pub const INTERCEPT: &str = "(Intercept)";

/// Panel estimator: model family plus the effects it accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Estimator {
    pub model: PanelModel,
    pub effect: EffectType,
}

impl Estimator {
    pub fn new(model: PanelModel, effect: EffectType) -> Self {
        Self { model, effect }
    }
}

impl fmt::Display for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.model, self.effect)
    }
}

/// Swamy-Arora variance components of a random-effects fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VarianceComponents {
    pub idiosyncratic: f64,
    pub individual: Option<f64>,
    pub time: Option<f64>,
    /// Mean quasi-demeaning weight across observations.
    pub theta: f64,
}

/// Estimate, standard error, t statistic and two-sided p-value of a term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientTest {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// A fitted linear panel regression.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub(crate) response: String,
    pub(crate) formula: String,
    pub(crate) estimator: Estimator,
    pub(crate) terms: Vec<String>,
    pub(crate) coefficients: Vec<f64>,
    pub(crate) vcov: DMatrix<f64>,
    pub(crate) robust_vcov: Option<DMatrix<f64>>,
    pub(crate) fitted: Vec<f64>,
    pub(crate) residuals: Vec<f64>,
    pub(crate) df_residual: usize,
    pub(crate) r_squared: f64,
    pub(crate) n_obs: usize,
    pub(crate) components: Option<VarianceComponents>,
}

impl FittedModel {
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Model formula, e.g. `y ~ x + m1`.
    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn estimator(&self) -> Estimator {
        self.estimator
    }

    /// Term names in coefficient order (intercept first when present).
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Coefficient of `term`, if the model has it.
    pub fn coefficient(&self, term: &str) -> Option<f64> {
        self.term_index(term).map(|idx| self.coefficients[idx])
    }

    /// Default (homoskedastic) covariance matrix.
    pub fn vcov(&self) -> &DMatrix<f64> {
        &self.vcov
    }

    /// HC1 cluster-robust covariance, when requested at fit time.
    pub fn robust_vcov(&self) -> Option<&DMatrix<f64>> {
        self.robust_vcov.as_ref()
    }

    pub fn is_robust(&self) -> bool {
        self.robust_vcov.is_some()
    }

    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn df_residual(&self) -> usize {
        self.df_residual
    }

    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// Rows used by the regression after listwise deletion (groups for the
    /// between estimator).
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub fn variance_components(&self) -> Option<&VarianceComponents> {
        self.components.as_ref()
    }

    /// Standard error of `term` from the covariance used for inference.
    pub fn std_error(&self, term: &str) -> Option<f64> {
        let idx = self.term_index(term)?;
        Some(self.inference_vcov()[(idx, idx)].max(0.0).sqrt())
    }

    /// The robust covariance when present, otherwise the default one.
    pub fn inference_vcov(&self) -> &DMatrix<f64> {
        self.robust_vcov.as_ref().unwrap_or(&self.vcov)
    }

    /// t-tests for every coefficient using the inference covariance and
    /// a Student t reference with the residual degrees of freedom.
    pub fn coefficient_tests(&self) -> Vec<CoefficientTest> {
        let vcov = self.inference_vcov();
        let dist = StudentsT::new(0.0, 1.0, self.df_residual as f64).ok();
        self.terms
            .iter()
            .enumerate()
            .map(|(idx, term)| {
                let estimate = self.coefficients[idx];
                let std_error = vcov[(idx, idx)].max(0.0).sqrt();
                let t_value = estimate / std_error;
                let p_value = match &dist {
                    Some(dist) if t_value.is_finite() => 2.0 * (1.0 - dist.cdf(t_value.abs())),
                    _ => f64::NAN,
                };
                CoefficientTest {
                    term: term.clone(),
                    estimate,
                    std_error,
                    t_value,
                    p_value,
                }
            })
            .collect()
    }

    fn term_index(&self, term: &str) -> Option<usize> {
        self.terms.iter().position(|name| name == term)
    }
}

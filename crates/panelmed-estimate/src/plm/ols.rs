//! Least-squares solve and covariance estimators.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use panelmed_model::{PanelError, Result};

/// Relative singular-value tolerance below which a design is rank deficient.
const RANK_TOL: f64 = 1e-10;

/// Output of an OLS solve.
#[derive(Debug, Clone)]
pub(crate) struct OlsFit {
    pub beta: DVector<f64>,
    pub xtx_inv: DMatrix<f64>,
    pub fitted: DVector<f64>,
    pub residuals: DVector<f64>,
    pub rss: f64,
}

/// Solve `y = X b` by least squares.
///
/// `model` and `what` only label the error raised for a rank-deficient or
/// under-determined design.
pub(crate) fn ols(x: &DMatrix<f64>, y: &DVector<f64>, model: &str, what: &str) -> Result<OlsFit> {
    let (n, p) = x.shape();
    if p == 0 {
        return Err(PanelError::estimation(model, format!("{what}: no regressors")));
    }
    if n <= p {
        return Err(PanelError::estimation(
            model,
            format!("{what}: too few observations ({n}) for {p} parameters"),
        ));
    }

    let singular = x.clone().svd(false, false).singular_values;
    let max_sv = singular.max();
    let min_sv = singular.min();
    if !(max_sv > 0.0) || min_sv <= RANK_TOL * max_sv {
        return Err(PanelError::estimation(
            model,
            format!("{what}: design matrix is rank deficient"),
        ));
    }

    let xtx = x.transpose() * x;
    let xtx_inv = xtx.try_inverse().ok_or_else(|| {
        PanelError::estimation(model, format!("{what}: X'X is singular"))
    })?;
    let beta = &xtx_inv * (x.transpose() * y);
    let fitted = x * &beta;
    let residuals = y - &fitted;
    let rss = residuals.norm_squared();

    Ok(OlsFit {
        beta,
        xtx_inv,
        fitted,
        residuals,
        rss,
    })
}

/// Arellano cluster-robust covariance with the HC1 factor `n / (n - p)`.
///
/// `(X'X)^-1 (sum_g X_g' e_g e_g' X_g) (X'X)^-1 * n / (n - p)`.
pub(crate) fn cluster_covariance(
    x: &DMatrix<f64>,
    residuals: &DVector<f64>,
    xtx_inv: &DMatrix<f64>,
    clusters: &[usize],
) -> DMatrix<f64> {
    let (n, p) = x.shape();

    let mut scores: HashMap<usize, DVector<f64>> = HashMap::new();
    for (i, &cluster) in clusters.iter().enumerate() {
        let score = scores
            .entry(cluster)
            .or_insert_with(|| DVector::zeros(p));
        let e_i = residuals[i];
        for j in 0..p {
            score[j] += x[(i, j)] * e_i;
        }
    }

    let mut meat = DMatrix::zeros(p, p);
    for score in scores.values() {
        meat += score * score.transpose();
    }

    let correction = if n > p {
        n as f64 / (n - p) as f64
    } else {
        1.0
    };
    (xtx_inv * meat * xtx_inv) * correction
}

//! Panel regression engine and step-wise mediation estimation.
//!
//! [`estimate`] runs the a-paths, the b/c' path and the total path with a
//! chosen panel estimator and returns an immutable [`MediationResult`].
//! [`compare`] repeats the analysis across estimators and
//! [`bootstrap_indirect`] adds percentile intervals for indirect effects.

pub mod bootstrap;
pub mod compare;
pub mod mediation;
pub mod plm;
pub mod result;

pub use bootstrap::{BootstrapEffect, BootstrapOptions, BootstrapSummary, bootstrap_indirect};
pub use compare::{Comparison, ModelFailure, compare, compare_labels};
pub use mediation::{estimate, estimate_prepared, interaction_name, lag_name};
pub use plm::{
    CoefficientTest, Design, Estimator, FittedModel, INTERCEPT, Term, VarianceComponents, fit,
};
pub use result::{ConditionalEffect, ConditionalPoint, MediationResult, NamedEffect};

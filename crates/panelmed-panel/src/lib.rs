//! Panel structure validation and preparation.
//!
//! [`is_panel`] is the cheap heuristic a caller runs before analysis;
//! [`prepare`] produces the sorted (and optionally balanced) [`PanelFrame`]
//! every estimator works on.

mod keys;
pub mod prepare;
pub mod validate;

pub use prepare::{PanelFrame, prepare};
pub use validate::{PanelShape, is_panel, panel_shape};

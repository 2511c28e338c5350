//! Panel mediation data model.
//!
//! Shared configuration, metadata and error types used by every
//! `panelmed-*` crate.

pub mod error;
pub mod info;
pub mod options;
pub mod variables;

pub use error::{PanelError, Result};
pub use info::PanelInfo;
pub use options::{EffectType, ModelConfig, ModeratorSpec, PanelModel, PanelSpec};
pub use variables::{EffectKind, MediationVariables, split_joined};

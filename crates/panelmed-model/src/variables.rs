//! Variable roles of a mediation analysis and effect labelling.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};

/// Treatment, mediators and outcome of a mediation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediationVariables {
    /// X.
    pub treatment: String,
    /// M, in the order they are reported.
    pub mediators: Vec<String>,
    /// Y.
    pub outcome: String,
}

impl MediationVariables {
    pub fn new<I, S>(treatment: impl Into<String>, mediators: I, outcome: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            treatment: treatment.into(),
            mediators: mediators.into_iter().map(Into::into).collect(),
            outcome: outcome.into(),
        }
    }

    /// Build from a comma-joined mediator list such as `"m1,m2"`.
    pub fn from_joined(treatment: &str, mediators: &str, outcome: &str) -> Self {
        Self::new(treatment, split_joined(mediators), outcome)
    }

    /// Every column name the model reads, treatment first.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = Vec::with_capacity(self.mediators.len() + 2);
        columns.push(self.treatment.as_str());
        columns.extend(self.mediators.iter().map(String::as_str));
        columns.push(self.outcome.as_str());
        columns
    }

    /// Reject an empty mediator list and names used in more than one role.
    pub fn validate(&self) -> Result<()> {
        if self.treatment.trim().is_empty() {
            return Err(PanelError::configuration("X", "treatment name is empty"));
        }
        if self.outcome.trim().is_empty() {
            return Err(PanelError::configuration("Y", "outcome name is empty"));
        }
        if self.mediators.is_empty() {
            return Err(PanelError::configuration(
                "M",
                "at least one mediator is required",
            ));
        }
        let mut seen = BTreeSet::new();
        for name in self.columns() {
            if !seen.insert(name) {
                return Err(PanelError::configuration(
                    "variables",
                    format!("variable '{name}' is used more than once"),
                ));
            }
        }
        Ok(())
    }
}

/// Split a comma-joined list, dropping blanks.
pub fn split_joined(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Kind of effect reported by a mediation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Indirect,
    Direct,
    Total,
}

impl EffectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indirect => "indirect",
            Self::Direct => "direct",
            Self::Total => "total",
        }
    }

    /// Label of the effect for `variable`, e.g. `indirect_m1`.
    pub fn label(self, variable: &str) -> String {
        format!("{}_{variable}", self.as_str())
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

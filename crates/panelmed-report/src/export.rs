//! CSV, text and JSON output.

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use panelmed_estimate::{
    BootstrapSummary, CoefficientTest, Comparison, ConditionalEffect, Estimator, FittedModel,
    MediationResult, NamedEffect,
};
use panelmed_model::PanelInfo;
use panelmed_panel::PanelFrame;
use polars::prelude::{CsvWriter, SerWriter};
use serde::Serialize;

use crate::render::render_detailed;

/// Paths of the three effect tables written for one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectFiles {
    pub indirect: PathBuf,
    pub direct: PathBuf,
    pub total: PathBuf,
}

impl EffectFiles {
    /// `<base>_indirect.csv`, `<base>_direct.csv` and `<base>_total.csv`.
    pub fn for_base(base: &Path) -> Self {
        Self {
            indirect: with_suffix(base, "_indirect.csv"),
            direct: with_suffix(base, "_direct.csv"),
            total: with_suffix(base, "_total.csv"),
        }
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// `<base>.csv`.
pub fn comparison_path(base: &Path) -> PathBuf {
    with_suffix(base, ".csv")
}

fn write_effects(path: &Path, header: &str, effects: &[NamedEffect]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    writer.write_record([header, "effect"])?;
    for effect in effects {
        writer.write_record([effect.variable.as_str(), &effect.value.to_string()])?;
    }
    writer
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the indirect (`mediator,effect`), direct and total
/// (`variable,effect`) tables next to `base`.
pub fn write_effect_csvs(result: &MediationResult, base: &Path) -> Result<EffectFiles> {
    let files = EffectFiles::for_base(base);
    write_effects(&files.indirect, "mediator", result.indirect_effects())?;
    write_effects(&files.direct, "variable", result.direct_effects())?;
    write_effects(&files.total, "variable", result.total_effects())?;
    Ok(files)
}

/// Write `model,mediator,indirect_effect` rows for every compared model.
pub fn write_comparison_csv(comparison: &Comparison, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    writer.write_record(["model", "mediator", "indirect_effect"])?;
    for (model, result) in comparison.results() {
        for effect in result.indirect_effects() {
            writer.write_record([
                model.as_str(),
                effect.variable.as_str(),
                &effect.value.to_string(),
            ])?;
        }
    }
    writer
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the prepared (sorted, balanced) panel as CSV.
pub fn write_processed_data(panel: &PanelFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut data = panel.data().clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut data)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the detailed text report.
pub fn write_text_report(result: &MediationResult, path: &Path) -> Result<()> {
    fs::write(path, render_detailed(result)).with_context(|| format!("write {}", path.display()))
}

/// One sub-model in the JSON summary.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub role: String,
    pub formula: String,
    pub estimator: Estimator,
    pub n_obs: usize,
    pub df_residual: usize,
    pub r_squared: f64,
    pub robust: bool,
    pub coefficients: Vec<CoefficientTest>,
}

impl ModelSummary {
    fn new(role: String, model: &FittedModel) -> Self {
        Self {
            role,
            formula: model.formula().to_string(),
            estimator: model.estimator(),
            n_obs: model.n_obs(),
            df_residual: model.df_residual(),
            r_squared: model.r_squared(),
            robust: model.is_robust(),
            coefficients: model.coefficient_tests(),
        }
    }
}

/// Machine-readable summary of an analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    pub panel: PanelInfo,
    pub effects: Vec<NamedEffect>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditional_effects: Vec<ConditionalEffect>,
    pub models: Vec<ModelSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<BootstrapSummary>,
}

impl ResultSummary {
    pub fn new(result: &MediationResult, bootstrap: Option<&BootstrapSummary>) -> Self {
        let mediators = &result.variables().mediators;
        let mut models: Vec<ModelSummary> = mediators
            .iter()
            .zip(result.a_models())
            .map(|(mediator, model)| ModelSummary::new(format!("a-path ({mediator})"), model))
            .collect();
        models.push(ModelSummary::new("b-path".to_string(), result.y_model()));
        models.push(ModelSummary::new(
            "total path".to_string(),
            result.total_model(),
        ));
        Self {
            panel: result.panel_info().clone(),
            effects: result.all_effects().cloned().collect(),
            conditional_effects: result.conditional_effects().to_vec(),
            models,
            bootstrap: bootstrap.cloned(),
        }
    }
}

/// Write `summary` as pretty-printed JSON.
pub fn write_json_summary(summary: &ResultSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("serialize summary")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))
}

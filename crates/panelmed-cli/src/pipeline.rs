//! Steps behind the `run`, `compare` and `check` commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use panelmed_estimate::{
    BootstrapSummary, Comparison, MediationResult, bootstrap_indirect, compare, estimate,
};
use panelmed_ingest::read_table;
use panelmed_model::{MediationVariables, PanelModel, PanelSpec};
use panelmed_panel::{PanelShape, is_panel, panel_shape, prepare};
use panelmed_report::{
    EffectFiles, ResultSummary, comparison_path, write_comparison_csv, write_effect_csvs,
    write_json_summary, write_processed_data, write_text_report,
};
use polars::prelude::DataFrame;
use tracing::{info, info_span};

use crate::config::Settings;

/// Read a data file, failing on unsupported extensions before anything is
/// written.
pub fn load_data(path: &Path) -> Result<DataFrame> {
    let span = info_span!("ingest", path = %path.display());
    let _guard = span.enter();
    let df = read_table(path).with_context(|| format!("read {}", path.display()))?;
    info!(rows = df.height(), columns = df.width(), "data loaded");
    Ok(df)
}

/// Everything `panelmed run` needs.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub data: PathBuf,
    pub variables: MediationVariables,
    pub panel: PanelSpec,
    pub settings: Settings,
    pub output_base: PathBuf,
    pub report: Option<PathBuf>,
    pub export_data: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

/// What `panelmed run` produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub result: MediationResult,
    pub bootstrap: Option<BootstrapSummary>,
    pub files: EffectFiles,
    /// Optional outputs that were written, in write order.
    pub extra_files: Vec<PathBuf>,
}

pub fn run_analysis(request: &RunRequest) -> Result<RunOutcome> {
    let df = load_data(&request.data)?;
    let settings = &request.settings;
    let result = estimate(&df, &request.variables, &request.panel, &settings.model)
        .context("mediation analysis failed")?;

    let bootstrap = settings
        .bootstrap
        .as_ref()
        .map(|options| {
            bootstrap_indirect(
                &df,
                &request.variables,
                &request.panel,
                &settings.model,
                options,
            )
            .context("bootstrap failed")
        })
        .transpose()?;

    let files = write_effect_csvs(&result, &request.output_base)?;
    info!(
        indirect = %files.indirect.display(),
        direct = %files.direct.display(),
        total = %files.total.display(),
        "effect tables written"
    );

    let mut extra_files = Vec::new();
    if let Some(path) = &request.report {
        write_text_report(&result, path)?;
        extra_files.push(path.clone());
    }
    if let Some(path) = &request.export_data {
        let panel = prepare(&df, &request.panel).context("prepare panel for export")?;
        write_processed_data(&panel, path)?;
        extra_files.push(path.clone());
    }
    if let Some(path) = &request.json {
        let summary = ResultSummary::new(&result, bootstrap.as_ref());
        write_json_summary(&summary, path)?;
        extra_files.push(path.clone());
    }

    Ok(RunOutcome {
        result,
        bootstrap,
        files,
        extra_files,
    })
}

/// Everything `panelmed compare` needs.
#[derive(Debug, Clone)]
pub struct CompareRequest {
    pub data: PathBuf,
    pub variables: MediationVariables,
    pub panel: PanelSpec,
    pub settings: Settings,
    pub models: Vec<PanelModel>,
    pub output_base: PathBuf,
}

#[derive(Debug)]
pub struct CompareOutcome {
    pub comparison: Comparison,
    pub csv: PathBuf,
}

/// Run the comparison and write `<base>.csv`. Fails when no model could be
/// estimated.
pub fn run_comparison(request: &CompareRequest) -> Result<CompareOutcome> {
    let df = load_data(&request.data)?;
    let comparison = compare(
        &df,
        &request.variables,
        &request.panel,
        &request.settings.model,
        &request.models,
    )
    .context("model comparison failed")?;
    if comparison.is_empty() {
        let reasons: Vec<String> = comparison
            .failures()
            .iter()
            .map(|failure| format!("{}: {}", failure.model, failure.error))
            .collect();
        bail!("no model could be estimated ({})", reasons.join("; "));
    }

    let csv = comparison_path(&request.output_base);
    write_comparison_csv(&comparison, &csv)?;
    info!(path = %csv.display(), "comparison table written");
    Ok(CompareOutcome { comparison, csv })
}

#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub shape: PanelShape,
    pub is_panel: bool,
}

pub fn check_panel(data: &Path, id: &str, time: &str) -> Result<CheckOutcome> {
    let df = load_data(data)?;
    let shape = panel_shape(&df, id, time).context("inspect panel structure")?;
    Ok(CheckOutcome {
        shape,
        is_panel: is_panel(&df, Some(id), Some(time)),
    })
}

use std::path::PathBuf;

use anyhow::Result;
use panelmed_model::{MediationVariables, PanelModel, PanelSpec};
use tracing::info_span;

use panelmed_cli::cli::{AnalysisArgs, CheckArgs, CompareArgs, DEFAULT_BASENAME, RunArgs};
use panelmed_cli::config::{FileConfig, model_settings, run_settings};
use panelmed_cli::pipeline::{
    CompareRequest, RunRequest, check_panel, run_analysis, run_comparison,
};
use panelmed_report::{render_detailed, render_summary};

use crate::summary::{print_bootstrap, print_check, print_comparison, print_outputs};

fn variables(args: &AnalysisArgs) -> MediationVariables {
    MediationVariables::from_joined(&args.treatment, &args.mediators, &args.outcome)
}

fn output_base(base: Option<&PathBuf>) -> PathBuf {
    base.cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BASENAME))
}

pub fn run(args: &RunArgs) -> Result<u8> {
    let span = info_span!("run", data = %args.analysis.data.display());
    let _guard = span.enter();

    let file = FileConfig::from_args(&args.model)?;
    let settings = run_settings(&file, args);
    let request = RunRequest {
        data: args.analysis.data.clone(),
        variables: variables(&args.analysis),
        panel: PanelSpec::new(&args.analysis.id, &args.analysis.time)
            .with_balance(settings.balance),
        settings,
        output_base: output_base(args.output_base.as_ref()),
        report: args.report.clone(),
        export_data: args.export_data.clone(),
        json: args.json.clone(),
    };
    let outcome = run_analysis(&request)?;

    if args.detailed {
        print!("{}", render_detailed(&outcome.result));
    } else {
        print!("{}", render_summary(&outcome.result));
    }
    if let Some(bootstrap) = &outcome.bootstrap {
        print_bootstrap(bootstrap);
    }
    print_outputs(&outcome.files, &outcome.extra_files);
    Ok(0)
}

pub fn compare(args: &CompareArgs) -> Result<u8> {
    let span = info_span!("compare", data = %args.analysis.data.display());
    let _guard = span.enter();

    let file = FileConfig::from_args(&args.model)?;
    let settings = model_settings(&file, &args.model, None);
    let request = CompareRequest {
        data: args.analysis.data.clone(),
        variables: variables(&args.analysis),
        panel: PanelSpec::new(&args.analysis.id, &args.analysis.time)
            .with_balance(settings.balance),
        settings,
        models: args.models.iter().copied().map(PanelModel::from).collect(),
        output_base: output_base(args.output_base.as_ref()),
    };
    let outcome = run_comparison(&request)?;
    print_comparison(&outcome.comparison);
    println!("Comparison table: {}", outcome.csv.display());
    Ok(0)
}

pub fn check(args: &CheckArgs) -> Result<u8> {
    let span = info_span!("check", data = %args.data.display());
    let _guard = span.enter();

    let outcome = check_panel(&args.data, &args.id, &args.time)?;
    print_check(&outcome);
    Ok(if outcome.is_panel { 0 } else { 1 })
}

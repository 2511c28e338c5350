//! Argument parsing and end-to-end pipeline tests.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use clap::{CommandFactory, Parser};
use panelmed_cli::cli::{Cli, Command, EffectArg, PanelModelArg};
use panelmed_cli::logging::LogFormat;
use panelmed_cli::config::{FileConfig, Settings, model_settings, run_settings};
use panelmed_cli::pipeline::{
    CompareRequest, RunRequest, check_panel, run_analysis, run_comparison,
};
use panelmed_model::{EffectType, MediationVariables, ModelConfig, PanelModel, PanelSpec};
use tracing::level_filters::LevelFilter;

/// Four individuals over five years with individual offsets and mediation
/// through `m`.
fn write_panel(path: &Path) {
    let base = [-2.0, -1.0, 0.0, 1.0, 2.0];
    let u = [0.5, -1.0, 0.0, 1.0, -0.5];
    let v = [1.0, -0.5, -1.0, 0.0, 0.5];
    let mut text = String::from("id,year,x,m,y\n");
    for i in 0..4 {
        for t in 0..5 {
            let x = base[t] * (1.0 + 0.1 * f64::from(i)) + f64::from(i);
            let m = 0.3 * x + u[(t + i as usize) % 5] + 0.5 * f64::from(i);
            let y = 0.4 * x + 0.6 * m + 0.2 * v[t] - f64::from(i);
            writeln!(text, "{},{},{x},{m},{y}", i + 1, 2001 + t).unwrap();
        }
    }
    fs::write(path, text).unwrap();
}

fn settings() -> Settings {
    Settings {
        model: ModelConfig::default(),
        balance: true,
        bootstrap: None,
    }
}

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn explicit_log_level_disables_env_filter() {
    let cli = Cli::try_parse_from([
        "panelmed", "--log-level", "debug", "--log-format", "json", "--color", "never", "check",
        "data.csv", "id", "year",
    ])
    .unwrap();
    let config = cli.log_config(true);
    assert_eq!(config.level_filter, LevelFilter::DEBUG);
    assert_eq!(config.format, LogFormat::Json);
    assert!(!config.use_env_filter);
    assert!(!config.with_ansi);
}

#[test]
fn default_logging_follows_env_and_terminal() {
    let cli = Cli::try_parse_from(["panelmed", "check", "data.csv", "id", "year"]).unwrap();
    let config = cli.log_config(false);
    assert_eq!(config.level_filter, LevelFilter::WARN);
    assert!(config.use_env_filter);
    assert!(!config.with_ansi);
    assert!(cli.log_config(true).with_ansi);
}

#[test]
fn run_accepts_optional_model_and_basename() {
    let cli = Cli::try_parse_from([
        "panelmed", "run", "data.csv", "x", "m1,m2", "y", "id", "year", "random", "out/base",
        "--robust", "--lag", "1",
    ])
    .unwrap();
    let Command::Run(args) = cli.command else {
        panic!("expected run");
    };
    assert_eq!(args.analysis.mediators, "m1,m2");
    assert_eq!(args.panel_model, Some(PanelModelArg::Random));
    assert_eq!(args.output_base.as_deref(), Some(Path::new("out/base")));
    assert!(args.robust);

    let settings = run_settings(&FileConfig::default(), &args);
    assert_eq!(settings.model.panel_model, PanelModel::Random);
    assert_eq!(settings.model.lag, 1);
    assert!(settings.model.robust_se);
    assert!(settings.bootstrap.is_none());
}

#[test]
fn run_bootstrap_flags_build_options() {
    let cli = Cli::try_parse_from([
        "panelmed", "run", "data.csv", "x", "m", "y", "id", "year", "--bootstrap", "200",
        "--seed", "9",
    ])
    .unwrap();
    let Command::Run(args) = cli.command else {
        panic!("expected run");
    };
    let settings = run_settings(&FileConfig::default(), &args);
    let bootstrap = settings.bootstrap.unwrap();
    assert_eq!(bootstrap.replicates, 200);
    assert_eq!(bootstrap.seed, 9);
    assert!((bootstrap.confidence - 0.95).abs() < 1e-12);
}

#[test]
fn compare_defaults_to_three_models() {
    let cli = Cli::try_parse_from([
        "panelmed", "compare", "data.csv", "x", "m", "y", "id", "year",
    ])
    .unwrap();
    let Command::Compare(args) = cli.command else {
        panic!("expected compare");
    };
    assert_eq!(
        args.models,
        vec![PanelModelArg::Pooling, PanelModelArg::Within, PanelModelArg::Random]
    );
    let settings = model_settings(&FileConfig::default(), &args.model, None);
    assert_eq!(settings.model.panel_model, PanelModel::Within);
}

#[test]
fn unknown_model_labels_are_rejected_by_the_parser() {
    let base = ["panelmed", "run", "data.csv", "x", "m", "y", "id", "year"];
    assert!(Cli::try_parse_from(base.iter().copied().chain(["bogus"])).is_err());
    assert!(Cli::try_parse_from(base.iter().copied().chain(["--effect", "both"])).is_err());
    assert!(
        Cli::try_parse_from([
            "panelmed", "compare", "data.csv", "x", "m", "y", "id", "year", "--models",
            "within,bogus",
        ])
        .is_err()
    );
}

#[test]
fn effect_flag_maps_onto_model_settings() {
    let cli = Cli::try_parse_from([
        "panelmed", "run", "data.csv", "x", "m", "y", "id", "year", "between", "--effect",
        "time",
    ])
    .unwrap();
    let Command::Run(args) = cli.command else {
        panic!("expected run");
    };
    assert_eq!(args.model.effect, Some(EffectArg::Time));
    let settings = run_settings(&FileConfig::default(), &args);
    assert_eq!(settings.model.panel_model, PanelModel::Between);
    assert_eq!(settings.model.effect, EffectType::Time);
}

#[test]
fn run_writes_effect_tables_and_extras() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("panel.csv");
    write_panel(&data);
    let base = dir.path().join("result");
    let request = RunRequest {
        data,
        variables: MediationVariables::new("x", ["m"], "y"),
        panel: PanelSpec::new("id", "year"),
        settings: settings(),
        output_base: base,
        report: Some(dir.path().join("report.txt")),
        export_data: Some(dir.path().join("processed.csv")),
        json: Some(dir.path().join("summary.json")),
    };
    let outcome = run_analysis(&request).unwrap();

    assert!(outcome.files.indirect.ends_with("result_indirect.csv"));
    for path in [&outcome.files.indirect, &outcome.files.direct, &outcome.files.total] {
        assert!(path.exists(), "{} missing", path.display());
    }
    assert_eq!(outcome.extra_files.len(), 3);
    for path in &outcome.extra_files {
        assert!(path.exists(), "{} missing", path.display());
    }
    assert_eq!(outcome.result.panel_info().n_obs, 20);
    assert!(outcome.bootstrap.is_none());
}

#[test]
fn unsupported_extension_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("panel.sav");
    fs::write(&data, "id,year\n").unwrap();
    let base = dir.path().join("result");
    let request = RunRequest {
        data,
        variables: MediationVariables::new("x", ["m"], "y"),
        panel: PanelSpec::new("id", "year"),
        settings: settings(),
        output_base: base,
        report: None,
        export_data: None,
        json: None,
    };
    let err = run_analysis(&request).unwrap_err();
    assert!(format!("{err:#}").contains("panel.sav"));
    assert!(!dir.path().join("result_indirect.csv").exists());
}

#[test]
fn compare_writes_one_table() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("panel.csv");
    write_panel(&data);
    let request = CompareRequest {
        data,
        variables: MediationVariables::new("x", ["m"], "y"),
        panel: PanelSpec::new("id", "year"),
        settings: settings(),
        models: vec![PanelModel::Within, PanelModel::Pooling],
        output_base: dir.path().join("models"),
    };
    let outcome = run_comparison(&request).unwrap();
    assert_eq!(outcome.csv, dir.path().join("models.csv"));
    assert_eq!(
        outcome.comparison.models(),
        vec![PanelModel::Within, PanelModel::Pooling]
    );
    let text = fs::read_to_string(&outcome.csv).unwrap();
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn check_reports_panel_shape() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("panel.csv");
    write_panel(&data);
    let outcome = check_panel(&data, "id", "year").unwrap();
    assert!(outcome.is_panel);
    assert_eq!(outcome.shape.n_obs, 20);
    assert_eq!(outcome.shape.n_individuals, 4);
    assert_eq!(outcome.shape.n_time_periods, 5);
    assert!(outcome.shape.balanced);
}

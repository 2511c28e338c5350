//! Rendering, chart and export tests on an exactly solvable panel.

use std::fs;

use panelmed_estimate::{compare, estimate};
use panelmed_model::{EffectKind, MediationVariables, ModelConfig, PanelModel, PanelSpec};
use panelmed_panel::prepare;
use panelmed_report::{
    ResultSummary, conditional_lines, effect_bars, render_comparison, render_detailed,
    render_summary, residual_points, write_comparison_csv, write_effect_csvs, write_json_summary,
    write_processed_data, write_text_report,
};
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};

/// Three individuals over four years where, after removing individual means,
/// `m = 0.3 x + u` and `y = 0.4 x + 0.6 m + 0.1 v` with `u` and `v`
/// orthogonal to `x` and to each other.
fn exact_panel() -> DataFrame {
    let base = [-3.0, -1.0, 1.0, 3.0];
    let u = [1.0, -1.0, -1.0, 1.0];
    let v = [-1.0, 3.0, -3.0, 1.0];
    let mut ids = Vec::new();
    let mut years = Vec::new();
    let mut xs = Vec::new();
    let mut ms = Vec::new();
    let mut ys = Vec::new();
    for i in 0..3_i64 {
        let offset = 10.0 * i as f64;
        for t in 0..4 {
            let x = base[t] + offset;
            let m = 0.3 * x + u[t] + 2.0 * i as f64;
            let y = 0.4 * x + 0.6 * m + 0.1 * v[t] - 1.5 * i as f64;
            ids.push(i + 1);
            years.push(2001 + t as i64);
            xs.push(x);
            ms.push(m);
            ys.push(y);
        }
    }
    let columns: Vec<Column> = vec![
        Series::new("id".into(), ids).into_column(),
        Series::new("year".into(), years).into_column(),
        Series::new("x".into(), xs).into_column(),
        Series::new("m".into(), ms).into_column(),
        Series::new("y".into(), ys).into_column(),
    ];
    DataFrame::new(columns).unwrap()
}

fn variables() -> MediationVariables {
    MediationVariables::new("x", ["m"], "y")
}

fn spec() -> PanelSpec {
    PanelSpec::new("id", "year")
}

#[test]
fn summary_snapshot() {
    let result = estimate(&exact_panel(), &variables(), &spec(), &ModelConfig::default()).unwrap();
    let text = render_summary(&result);
    insta::assert_snapshot!("summary", text);
}

#[test]
fn detailed_report_lists_every_model() {
    let result = estimate(&exact_panel(), &variables(), &spec(), &ModelConfig::default()).unwrap();
    let text = render_detailed(&result);
    assert!(text.starts_with(&render_summary(&result)));
    assert!(text.contains("a-path (m): m ~ x"));
    assert!(text.contains("b-path: y ~ x + m"));
    assert!(text.contains("total path: y ~ x"));
    assert!(text.contains("estimator: within (individual), n = 12, df = 8"));
}

#[test]
fn robust_summary_names_the_covariance() {
    let config = ModelConfig::default().with_robust_se(true);
    let result = estimate(&exact_panel(), &variables(), &spec(), &config).unwrap();
    assert!(
        render_summary(&result).contains("Standard errors: robust (HC1, clustered by individual)")
    );
}

#[test]
fn comparison_report_keeps_model_order() {
    let comparison = compare(
        &exact_panel(),
        &variables(),
        &spec(),
        &ModelConfig::default(),
        &[PanelModel::Within, PanelModel::Pooling],
    )
    .unwrap();
    let text = render_comparison(&comparison);
    let within = text.find("within").unwrap();
    let pooling = text.find("pooling").unwrap();
    assert!(within < pooling);
    assert!(!text.contains("Failed models:"));
}

#[test]
fn chart_values_follow_the_result() {
    let result = estimate(&exact_panel(), &variables(), &spec(), &ModelConfig::default()).unwrap();

    let bars = effect_bars(&result);
    let kinds: Vec<EffectKind> = bars.iter().map(|bar| bar.kind).collect();
    assert_eq!(
        kinds,
        vec![EffectKind::Indirect, EffectKind::Direct, EffectKind::Total]
    );
    assert!((bars[0].value - 0.18).abs() < 1e-9);

    let points = residual_points(&result);
    assert_eq!(points.len(), result.y_model().n_obs());
    for point in &points {
        assert!(point.residual.is_finite());
    }
    assert!(conditional_lines(&result).is_empty());
}

#[test]
fn effect_csvs_are_written_next_to_the_base() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("panel_mediation");
    let result = estimate(&exact_panel(), &variables(), &spec(), &ModelConfig::default()).unwrap();

    let files = write_effect_csvs(&result, &base).unwrap();
    assert_eq!(files.indirect, dir.path().join("panel_mediation_indirect.csv"));
    assert_eq!(files.direct, dir.path().join("panel_mediation_direct.csv"));
    assert_eq!(files.total, dir.path().join("panel_mediation_total.csv"));

    let indirect = fs::read_to_string(&files.indirect).unwrap();
    let mut lines = indirect.lines();
    assert_eq!(lines.next(), Some("mediator,effect"));
    let row = lines.next().unwrap();
    let (name, value) = row.split_once(',').unwrap();
    assert_eq!(name, "m");
    assert!((value.parse::<f64>().unwrap() - 0.18).abs() < 1e-9);
    assert_eq!(lines.next(), None);

    let direct = fs::read_to_string(&files.direct).unwrap();
    assert!(direct.starts_with("variable,effect\nx,"));
    let total = fs::read_to_string(&files.total).unwrap();
    assert!(total.starts_with("variable,effect\nx,"));
}

#[test]
fn comparison_csv_has_one_row_per_model_and_mediator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compare.csv");
    let comparison = compare(
        &exact_panel(),
        &variables(),
        &spec(),
        &ModelConfig::default(),
        &[PanelModel::Pooling, PanelModel::Within],
    )
    .unwrap();
    write_comparison_csv(&comparison, &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "model,mediator,indirect_effect");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("pooling,m,"));
    assert!(lines[2].starts_with("within,m,"));
}

#[test]
fn processed_data_is_sorted_panel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("processed.csv");
    let df = exact_panel();
    let panel = prepare(&df, &spec()).unwrap();
    write_processed_data(&panel, &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("id,year,x,m,y"));
    assert_eq!(lines.count(), 12);
}

#[test]
fn text_report_and_json_summary_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let result = estimate(&exact_panel(), &variables(), &spec(), &ModelConfig::default()).unwrap();

    let report = dir.path().join("report.txt");
    write_text_report(&result, &report).unwrap();
    assert_eq!(fs::read_to_string(&report).unwrap(), render_detailed(&result));

    let json_path = dir.path().join("summary.json");
    let summary = ResultSummary::new(&result, None);
    write_json_summary(&summary, &json_path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["panel"]["model"], "within");
    assert_eq!(value["panel"]["n_obs"], 12);
    assert_eq!(value["effects"].as_array().unwrap().len(), 3);
    assert_eq!(value["models"].as_array().unwrap().len(), 3);
    assert!(value.get("bootstrap").is_none());
    assert!(value.get("conditional_effects").is_none());
}

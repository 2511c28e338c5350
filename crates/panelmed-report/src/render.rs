//! Plain-text rendering of mediation results.

use panelmed_estimate::{Comparison, FittedModel, MediationResult, NamedEffect};

/// Width of right-aligned numeric columns.
const NUM_WIDTH: usize = 10;

/// Panel metadata followed by the indirect, direct and total effects.
pub fn render_summary(result: &MediationResult) -> String {
    let info = result.panel_info();
    let mut lines = vec![
        "Panel mediation analysis".to_string(),
        format!("Model: {} ({} effect)", info.model.description(), info.effect),
        format!("Index: id = {}, time = {}", info.id, info.time),
        format!(
            "Panel: {} individuals, {} periods, {} observations ({})",
            info.n_individuals,
            info.n_time_periods,
            info.n_obs,
            if info.balanced { "balanced" } else { "unbalanced" }
        ),
    ];
    if info.lag > 0 {
        lines.push(format!("Lag order: {}", info.lag));
    }
    lines.push(format!("Standard errors: {}", inference_label(info.robust)));

    let width = result
        .all_effects()
        .map(|effect| effect.name.len())
        .max()
        .unwrap_or(0);
    lines.push(String::new());
    lines.push("Indirect effects:".to_string());
    lines.extend(effect_lines(result.indirect_effects(), width));
    lines.push("Direct effect:".to_string());
    lines.extend(effect_lines(result.direct_effects(), width));
    lines.push("Total effect:".to_string());
    lines.extend(effect_lines(result.total_effects(), width));

    for conditional in result.conditional_effects() {
        lines.push(String::new());
        lines.push(format!(
            "Conditional indirect effect of {} (moderator {}):",
            conditional.mediator, conditional.moderator
        ));
        lines.push(format!(
            "  index of moderated mediation {:>NUM_WIDTH$.4}",
            conditional.index_of_moderated_mediation
        ));
        for point in &conditional.points {
            lines.push(format!(
                "  {:<12} ({} = {:.4}) {:>NUM_WIDTH$.4}",
                point.label, conditional.moderator, point.moderator_value, point.effect
            ));
        }
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn inference_label(robust: bool) -> &'static str {
    if robust {
        "robust (HC1, clustered by individual)"
    } else {
        "default"
    }
}

fn effect_lines(effects: &[NamedEffect], width: usize) -> impl Iterator<Item = String> + '_ {
    effects
        .iter()
        .map(move |effect| format!("  {:<width$}  {:>NUM_WIDTH$.4}", effect.name, effect.value))
}

/// The summary followed by a coefficient table for every sub-model.
pub fn render_detailed(result: &MediationResult) -> String {
    let mut text = render_summary(result);
    let variables = result.variables();
    for (mediator, model) in variables.mediators.iter().zip(result.a_models()) {
        text.push('\n');
        text.push_str(&model_section(&format!("a-path ({mediator})"), model));
    }
    text.push('\n');
    text.push_str(&model_section("b-path", result.y_model()));
    text.push('\n');
    text.push_str(&model_section("total path", result.total_model()));
    text
}

fn model_section(title: &str, model: &FittedModel) -> String {
    let estimator = model.estimator();
    let mut lines = vec![
        format!("{title}: {}", model.formula()),
        format!(
            "  estimator: {}, n = {}, df = {}, R-squared = {:.4}",
            estimator,
            model.n_obs(),
            model.df_residual(),
            model.r_squared()
        ),
        format!("  inference: {}", inference_label(model.is_robust())),
    ];
    if let Some(components) = model.variance_components() {
        let mut parts = vec![format!("idiosyncratic = {:.4}", components.idiosyncratic)];
        if let Some(individual) = components.individual {
            parts.push(format!("individual = {individual:.4}"));
        }
        if let Some(time) = components.time {
            parts.push(format!("time = {time:.4}"));
        }
        parts.push(format!("theta = {:.4}", components.theta));
        lines.push(format!("  variance components: {}", parts.join(", ")));
    }

    let tests = model.coefficient_tests();
    let term_width = tests
        .iter()
        .map(|test| test.term.len())
        .chain(std::iter::once(4))
        .max()
        .unwrap_or(4);
    lines.push(format!(
        "  {:<term_width$} {:>NUM_WIDTH$} {:>NUM_WIDTH$} {:>NUM_WIDTH$} {:>NUM_WIDTH$}",
        "term", "estimate", "std.error", "t value", "Pr(>|t|)"
    ));
    for test in tests {
        lines.push(format!(
            "  {:<term_width$} {:>NUM_WIDTH$.4} {:>NUM_WIDTH$.4} {:>NUM_WIDTH$.4} {:>NUM_WIDTH$.4}",
            test.term, test.estimate, test.std_error, test.t_value, test.p_value
        ));
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Indirect, direct and total effects of every compared model, then the
/// models that failed.
pub fn render_comparison(comparison: &Comparison) -> String {
    let mut lines = vec!["Mediation effects by panel model".to_string()];
    let rows: Vec<(String, String, f64)> = comparison
        .results()
        .iter()
        .flat_map(|(model, result)| {
            result
                .all_effects()
                .map(move |effect| (model.to_string(), effect.name.clone(), effect.value))
        })
        .collect();
    let model_width = rows
        .iter()
        .map(|row| row.0.len())
        .chain(std::iter::once("model".len()))
        .max()
        .unwrap_or(5);
    let effect_width = rows
        .iter()
        .map(|row| row.1.len())
        .chain(std::iter::once("effect".len()))
        .max()
        .unwrap_or(6);
    lines.push(format!(
        "  {:<model_width$}  {:<effect_width$}  {:>NUM_WIDTH$}",
        "model", "effect", "value"
    ));
    for (model, effect, value) in &rows {
        lines.push(format!(
            "  {model:<model_width$}  {effect:<effect_width$}  {value:>NUM_WIDTH$.4}"
        ));
    }
    if !comparison.failures().is_empty() {
        lines.push(String::new());
        lines.push("Failed models:".to_string());
        for failure in comparison.failures() {
            lines.push(format!("  {}: {}", failure.model, failure.error));
        }
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

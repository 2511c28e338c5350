use std::path::PathBuf;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use panelmed_cli::pipeline::CheckOutcome;
use panelmed_estimate::{BootstrapSummary, Comparison};
use panelmed_model::EffectKind;
use panelmed_report::EffectFiles;

pub fn print_comparison(comparison: &Comparison) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Model"),
        header_cell("Effect"),
        header_cell("Kind"),
        header_cell("Value"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    for (model, result) in comparison.results() {
        for effect in result.all_effects() {
            table.add_row(vec![
                model_cell(model.as_str()),
                Cell::new(&effect.name),
                kind_cell(effect.kind),
                number_cell(effect.value),
            ]);
        }
    }
    println!("{table}");

    if !comparison.failures().is_empty() {
        let mut failures = Table::new();
        failures.set_header(vec![header_cell("Model"), header_cell("Error")]);
        apply_table_style(&mut failures);
        for failure in comparison.failures() {
            failures.add_row(vec![
                Cell::new(failure.model.as_str())
                    .fg(Color::Red)
                    .add_attribute(Attribute::Bold),
                Cell::new(failure.error.to_string()),
            ]);
        }
        println!();
        println!("Failed models:");
        println!("{failures}");
    }
}

pub fn print_bootstrap(summary: &BootstrapSummary) {
    let level = format!("{:.0}%", summary.confidence * 100.0);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Effect"),
        header_cell("Estimate"),
        header_cell("Boot mean"),
        header_cell("Boot SE"),
        header_cell(&format!("{level} lower")),
        header_cell(&format!("{level} upper")),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for effect in &summary.effects {
        let excludes_zero = effect.lower > 0.0 || effect.upper < 0.0;
        let name = if excludes_zero {
            Cell::new(&effect.name).add_attribute(Attribute::Bold)
        } else {
            Cell::new(&effect.name)
        };
        table.add_row(vec![
            name,
            number_cell(effect.estimate),
            number_cell(effect.mean),
            number_cell(effect.std_error),
            number_cell(effect.lower),
            number_cell(effect.upper),
        ]);
    }
    println!();
    println!(
        "Cluster bootstrap: {} of {} replicates succeeded (seed {})",
        summary.successful, summary.requested, summary.seed
    );
    println!("{table}");
}

pub fn print_outputs(files: &EffectFiles, extra: &[PathBuf]) {
    println!();
    println!("Indirect effects: {}", files.indirect.display());
    println!("Direct effect: {}", files.direct.display());
    println!("Total effect: {}", files.total.display());
    for path in extra {
        println!("Written: {}", path.display());
    }
}

pub fn print_check(outcome: &CheckOutcome) {
    let shape = &outcome.shape;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Property"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Observations"), Cell::new(shape.n_obs)]);
    table.add_row(vec![Cell::new("Individuals"), Cell::new(shape.n_individuals)]);
    table.add_row(vec![
        Cell::new("Time periods"),
        Cell::new(shape.n_time_periods),
    ]);
    table.add_row(vec![
        Cell::new("Duplicate (id, time) pairs"),
        if shape.duplicate_keys > 0 {
            Cell::new(shape.duplicate_keys)
                .fg(Color::Red)
                .add_attribute(Attribute::Bold)
        } else {
            dim_cell(shape.duplicate_keys)
        },
    ]);
    table.add_row(vec![Cell::new("Balanced"), yes_no_cell(shape.balanced)]);
    table.add_row(vec![Cell::new("Panel data"), yes_no_cell(outcome.is_panel)]);
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn model_cell(model: &str) -> Cell {
    Cell::new(model)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn kind_cell(kind: EffectKind) -> Cell {
    let color = match kind {
        EffectKind::Indirect => Color::Green,
        EffectKind::Direct => Color::Yellow,
        EffectKind::Total => Color::Magenta,
    };
    Cell::new(kind.as_str()).fg(color)
}

fn number_cell(value: f64) -> Cell {
    if value.is_finite() {
        Cell::new(format!("{value:.4}"))
    } else {
        dim_cell("NA")
    }
}

fn yes_no_cell(value: bool) -> Cell {
    if value {
        Cell::new("yes").fg(Color::Green)
    } else {
        Cell::new("no").fg(Color::Red).add_attribute(Attribute::Bold)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

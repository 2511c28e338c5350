//! Presentation of mediation results.
//!
//! - [`render`]: plain-text summary, detailed and comparison reports.
//! - [`charts`]: the values behind effect bar charts, residual plots and
//!   conditional-effect lines.
//! - [`export`]: CSV files for effects, comparisons and processed data,
//!   plus a JSON summary.

pub mod charts;
pub mod export;
pub mod render;

pub use charts::{
    ConditionalLine, EffectBar, ResidualPoint, conditional_lines, effect_bars, residual_points,
};
pub use export::{
    EffectFiles, ModelSummary, ResultSummary, comparison_path, write_comparison_csv, write_effect_csvs, write_json_summary,
    write_processed_data, write_text_report,
};
pub use render::{render_comparison, render_detailed, render_summary};

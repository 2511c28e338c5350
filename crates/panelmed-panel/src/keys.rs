//! Index key extraction and level coding.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use panelmed_ingest::{IngestError, column_key_values, parse_f64};
use panelmed_model::{PanelError, Result};
use polars::prelude::DataFrame;

/// Rendered key values of an index column.
pub(crate) fn index_keys(data: &DataFrame, column: &str, role: &str) -> Result<Vec<String>> {
    column_key_values(data, column).map_err(|err| match err {
        IngestError::ColumnNotFound { column } => {
            PanelError::configuration(role, format!("column '{column}' not found in data"))
        }
        other => PanelError::DataFrame {
            message: other.to_string(),
        },
    })
}

/// Distinct levels of `keys` in panel order: numerically when every key
/// parses as a number, lexicographically otherwise.
pub(crate) fn ordered_levels(keys: &[String]) -> Vec<String> {
    let distinct: BTreeSet<&str> = keys.iter().map(String::as_str).collect();
    let mut levels: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    let numeric: Option<Vec<f64>> = levels.iter().map(|key| parse_f64(key)).collect();
    if let Some(values) = numeric {
        let mut paired: Vec<(f64, String)> = values.into_iter().zip(levels).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        levels = paired.into_iter().map(|(_, key)| key).collect();
    }
    levels
}

/// Position of every key within `levels`.
pub(crate) fn encode(keys: &[String], levels: &[String]) -> Vec<usize> {
    let lookup: HashMap<&str, usize> = levels
        .iter()
        .enumerate()
        .map(|(idx, key)| (key.as_str(), idx))
        .collect();
    keys.iter()
        .map(|key| lookup.get(key.as_str()).copied().unwrap_or(usize::MAX))
        .collect()
}

/// Row order sorting by individual code, then period code.
pub(crate) fn panel_order(individuals: &[usize], periods: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..individuals.len()).collect();
    order.sort_by(|&a, &b| match individuals[a].cmp(&individuals[b]) {
        Ordering::Equal => periods[a].cmp(&periods[b]),
        other => other,
    });
    order
}

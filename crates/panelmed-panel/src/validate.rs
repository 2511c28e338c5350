//! Panel structure checks.

use std::collections::{HashMap, HashSet};

use panelmed_ingest::{column_key_values, has_column};
use panelmed_model::Result;
use polars::prelude::DataFrame;

use crate::keys::index_keys;

/// Heuristic check that `data` looks like a panel indexed by `id` and `time`.
///
/// Returns `false` when either name is absent or not a column. Otherwise
/// returns whether there are more rows than distinct individuals and more
/// rows than distinct periods. Duplicated (id, time) pairs are not detected
/// here; [`crate::prepare`] rejects them.
pub fn is_panel(data: &DataFrame, id: Option<&str>, time: Option<&str>) -> bool {
    let (Some(id), Some(time)) = (id, time) else {
        return false;
    };
    if !has_column(data, id) || !has_column(data, time) {
        return false;
    }
    let (Ok(ids), Ok(periods)) = (column_key_values(data, id), column_key_values(data, time))
    else {
        return false;
    };
    let n_individuals = ids.iter().collect::<HashSet<_>>().len();
    let n_time = periods.iter().collect::<HashSet<_>>().len();
    data.height() > n_individuals.max(n_time)
}

/// Counts describing the index structure of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelShape {
    pub n_obs: usize,
    pub n_individuals: usize,
    pub n_time_periods: usize,
    /// Number of rows repeating an (id, time) pair seen earlier.
    pub duplicate_keys: usize,
    /// Every individual is observed exactly once in every period.
    pub balanced: bool,
}

impl PanelShape {
    /// The [`is_panel`] verdict expressed on the counts.
    pub fn looks_like_panel(&self) -> bool {
        self.n_obs > self.n_individuals.max(self.n_time_periods)
    }
}

/// Describe the panel structure; missing columns are a configuration error.
pub fn panel_shape(data: &DataFrame, id: &str, time: &str) -> Result<PanelShape> {
    let ids = index_keys(data, id, "id")?;
    let periods = index_keys(data, time, "time")?;

    let n_time_periods = periods.iter().collect::<HashSet<_>>().len();
    let mut pairs = HashSet::with_capacity(ids.len());
    let mut per_individual: HashMap<&str, usize> = HashMap::new();
    let mut duplicate_keys = 0usize;
    for (individual, period) in ids.iter().zip(&periods) {
        if pairs.insert((individual.as_str(), period.as_str())) {
            *per_individual.entry(individual.as_str()).or_default() += 1;
        } else {
            duplicate_keys += 1;
        }
    }
    let balanced = duplicate_keys == 0
        && per_individual
            .values()
            .all(|&count| count == n_time_periods);

    Ok(PanelShape {
        n_obs: data.height(),
        n_individuals: per_individual.len(),
        n_time_periods,
        duplicate_keys,
        balanced,
    })
}

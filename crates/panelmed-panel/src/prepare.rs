//! Panel preparation: index checks, sorting and balancing.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use panelmed_ingest::{IngestError, column_f64_values, parse_f64};
use panelmed_model::{PanelError, PanelSpec, Result};
use polars::prelude::{DataFrame, IdxCa, IdxSize, NewChunkedArray};
use tracing::{debug, warn};

use crate::keys::{encode, index_keys, ordered_levels, panel_order};

/// A dataset sorted by individual and period, ready for estimation.
///
/// Rows are grouped by individual, each group ordered by period. Individual
/// and period codes index into [`PanelFrame::individual_keys`] and
/// [`PanelFrame::period_keys`]. Every individual owns one contiguous range
/// of rows.
#[derive(Debug, Clone)]
pub struct PanelFrame {
    data: DataFrame,
    spec: PanelSpec,
    individual_keys: Vec<String>,
    period_keys: Vec<String>,
    individual_codes: Vec<usize>,
    period_codes: Vec<usize>,
    /// Row range of each individual code.
    ranges: Vec<Range<usize>>,
    /// Position of each period level on the time axis.
    period_times: Vec<f64>,
    balanced: bool,
    dropped_individuals: usize,
}

/// Sort `data` into panel order and apply the balancing policy of `spec`.
///
/// With `spec.balance`, individuals not observed in every period of the
/// table are dropped. The input frame is left untouched.
pub fn prepare(data: &DataFrame, spec: &PanelSpec) -> Result<PanelFrame> {
    let ids = index_keys(data, &spec.id, "id")?;
    let periods = index_keys(data, &spec.time, "time")?;

    if let Some(row) = ids.iter().position(String::is_empty) {
        return Err(PanelError::configuration(
            "id",
            format!("missing value in column '{}' at row {row}", spec.id),
        ));
    }
    if let Some(row) = periods.iter().position(String::is_empty) {
        return Err(PanelError::configuration(
            "time",
            format!("missing value in column '{}' at row {row}", spec.time),
        ));
    }

    let mut seen = HashSet::with_capacity(ids.len());
    for (individual, period) in ids.iter().zip(&periods) {
        if !seen.insert((individual.as_str(), period.as_str())) {
            return Err(PanelError::configuration(
                "index",
                format!(
                    "duplicate (id, time) pair ({individual}, {period}) in columns ({}, {})",
                    spec.id, spec.time
                ),
            ));
        }
    }

    let period_levels = ordered_levels(&periods);
    let n_periods = period_levels.len();

    let mut individual_levels = ordered_levels(&ids);
    let mut dropped_individuals = 0usize;
    if spec.balance {
        let mut counts: HashMap<&str, usize> = HashMap::with_capacity(individual_levels.len());
        for id in &ids {
            *counts.entry(id.as_str()).or_default() += 1;
        }
        let full: Vec<String> = individual_levels
            .iter()
            .filter(|level| counts.get(level.as_str()) == Some(&n_periods))
            .cloned()
            .collect();
        dropped_individuals = individual_levels.len() - full.len();
        if full.is_empty() {
            return Err(PanelError::configuration(
                "balance",
                "no individual is observed in every time period",
            ));
        }
        if dropped_individuals > 0 {
            warn!(
                dropped = dropped_individuals,
                kept = full.len(),
                periods = n_periods,
                "dropped individuals not observed in every period"
            );
        }
        individual_levels = full;
    }

    let all_individual_codes = encode(&ids, &individual_levels);
    let all_period_codes = encode(&periods, &period_levels);
    let order: Vec<usize> = panel_order(&all_individual_codes, &all_period_codes)
        .into_iter()
        .filter(|&row| all_individual_codes[row] != usize::MAX)
        .collect();

    let individual_codes: Vec<usize> = order.iter().map(|&row| all_individual_codes[row]).collect();
    let period_codes: Vec<usize> = order.iter().map(|&row| all_period_codes[row]).collect();
    let sorted = take_rows(data, &order)?;

    let frame = PanelFrame::from_parts(
        sorted,
        spec.clone(),
        individual_levels,
        period_levels,
        individual_codes,
        period_codes,
        dropped_individuals,
    );
    debug!(
        rows = frame.n_obs(),
        individuals = frame.n_individuals(),
        periods = frame.n_time_periods(),
        balanced = frame.is_balanced(),
        "prepared panel"
    );
    Ok(frame)
}

fn take_rows(data: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = rows.iter().map(|&row| row as IdxSize).collect();
    let idx = IdxCa::from_vec("row".into(), idx);
    Ok(data.take(&idx)?)
}

impl PanelFrame {
    fn from_parts(
        data: DataFrame,
        spec: PanelSpec,
        individual_keys: Vec<String>,
        period_keys: Vec<String>,
        individual_codes: Vec<usize>,
        period_codes: Vec<usize>,
        dropped_individuals: usize,
    ) -> Self {
        // Period levels can go unused once individuals are dropped or resampled.
        let used: HashSet<usize> = period_codes.iter().copied().collect();
        let n_periods = used.len();
        let mut ranges = vec![0..0; individual_keys.len()];
        let mut start = 0;
        for row in 1..=individual_codes.len() {
            if row == individual_codes.len() || individual_codes[row] != individual_codes[start] {
                ranges[individual_codes[start]] = start..row;
                start = row;
            }
        }
        let balanced = ranges.iter().all(|range| range.len() == n_periods);
        let period_times = period_keys
            .iter()
            .map(|key| parse_f64(key))
            .collect::<Option<Vec<f64>>>()
            .unwrap_or_else(|| (0..period_keys.len()).map(|idx| idx as f64).collect());
        Self {
            data,
            spec,
            individual_keys,
            period_keys,
            individual_codes,
            period_codes,
            ranges,
            period_times,
            balanced,
            dropped_individuals,
        }
    }

    /// The sorted DataFrame.
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn spec(&self) -> &PanelSpec {
        &self.spec
    }

    pub fn n_obs(&self) -> usize {
        self.data.height()
    }

    pub fn n_individuals(&self) -> usize {
        self.individual_keys.len()
    }

    /// Number of distinct periods present in the prepared rows.
    pub fn n_time_periods(&self) -> usize {
        self.period_codes.iter().collect::<HashSet<_>>().len()
    }

    pub fn individual_keys(&self) -> &[String] {
        &self.individual_keys
    }

    pub fn period_keys(&self) -> &[String] {
        &self.period_keys
    }

    /// Individual code of every row.
    pub fn individual_codes(&self) -> &[usize] {
        &self.individual_codes
    }

    /// Period code of every row.
    pub fn period_codes(&self) -> &[usize] {
        &self.period_codes
    }

    pub fn is_balanced(&self) -> bool {
        self.balanced
    }

    /// Individuals removed by balancing.
    pub fn dropped_individuals(&self) -> usize {
        self.dropped_individuals
    }

    /// Numeric values of `column` in panel order; missing or non-numeric
    /// cells are `None`.
    pub fn numeric(&self, column: &str) -> Result<Vec<Option<f64>>> {
        column_f64_values(&self.data, column).map_err(|err| match err {
            IngestError::ColumnNotFound { column } => PanelError::configuration(
                "variables",
                format!("column '{column}' not found in data"),
            ),
            other => PanelError::DataFrame {
                message: other.to_string(),
            },
        })
    }

    /// Values of `column` lagged by `k` periods within each individual.
    ///
    /// The lag of a row observed at time `t` is the same individual's value
    /// at `t - k`, or `None` when that period was not observed. Numeric time
    /// keys are used as they are; other keys count by level position.
    pub fn lagged(&self, column: &str, k: usize) -> Result<Vec<Option<f64>>> {
        let values = self.numeric(column)?;
        if k == 0 {
            return Ok(values);
        }
        let mut lagged = vec![None; values.len()];
        for range in &self.ranges {
            let periods = &self.period_codes[range.clone()];
            for row in range.clone() {
                let target = self.period_times[self.period_codes[row]] - k as f64;
                let found = periods
                    .binary_search_by(|&code| self.period_times[code].total_cmp(&target));
                if let Ok(offset) = found {
                    lagged[row] = values[range.start + offset];
                }
            }
        }
        Ok(lagged)
    }

    /// Rows of `individual`, in period order. Unknown codes have no rows.
    pub fn rows_of(&self, individual: usize) -> Range<usize> {
        self.ranges.get(individual).cloned().unwrap_or(0..0)
    }

    /// Build a panel from a draw of individuals (with repetition).
    ///
    /// Every draw becomes its own individual, keyed `<key>#<draw>`, so a
    /// repeated individual contributes independent groups.
    pub fn resample(&self, draws: &[usize]) -> Result<PanelFrame> {
        let mut rows = Vec::with_capacity(self.n_obs());
        let mut individual_codes = Vec::with_capacity(self.n_obs());
        let mut individual_keys = Vec::with_capacity(draws.len());
        for (draw, &individual) in draws.iter().enumerate() {
            let key = self.individual_keys.get(individual).ok_or_else(|| {
                PanelError::configuration(
                    "resample",
                    format!("individual index {individual} out of range"),
                )
            })?;
            individual_keys.push(format!("{key}#{draw}"));
            for row in self.rows_of(individual) {
                rows.push(row);
                individual_codes.push(draw);
            }
        }
        let period_codes = rows.iter().map(|&row| self.period_codes[row]).collect();
        let data = take_rows(&self.data, &rows)?;
        Ok(PanelFrame::from_parts(
            data,
            self.spec.clone(),
            individual_keys,
            self.period_keys.clone(),
            individual_codes,
            period_codes,
            0,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, IntoColumn, NamedFrom, Series};

    fn frame() -> DataFrame {
        let columns: Vec<Column> = vec![
            Series::new("id".into(), vec![2i64, 1, 1, 2, 3]).into_column(),
            Series::new("t".into(), vec![2i64, 2, 1, 1, 1]).into_column(),
            Series::new("x".into(), vec![22.0, 12.0, 11.0, 21.0, 31.0]).into_column(),
        ];
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn lag_respects_individual_boundaries() {
        let panel = prepare(&frame(), &PanelSpec::new("id", "t")).unwrap();
        assert_eq!(panel.n_individuals(), 2);
        assert_eq!(
            panel.numeric("x").unwrap(),
            vec![Some(11.0), Some(12.0), Some(21.0), Some(22.0)]
        );
        assert_eq!(
            panel.lagged("x", 1).unwrap(),
            vec![None, Some(11.0), None, Some(21.0)]
        );
        assert_eq!(panel.lagged("x", 2).unwrap(), vec![None; 4]);
    }

    fn gapped() -> DataFrame {
        let columns: Vec<Column> = vec![
            Series::new("id".into(), vec![1i64, 1, 1, 2, 2, 2, 2]).into_column(),
            Series::new("t".into(), vec![1i64, 2, 4, 1, 2, 3, 4]).into_column(),
            Series::new("x".into(), vec![10.0, 20.0, 40.0, 1.0, 2.0, 3.0, 4.0]).into_column(),
        ];
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn lag_does_not_bridge_missing_periods() {
        let spec = PanelSpec::new("id", "t").with_balance(false);
        let panel = prepare(&gapped(), &spec).unwrap();
        assert!(!panel.is_balanced());
        assert_eq!(
            panel.lagged("x", 1).unwrap(),
            vec![None, Some(10.0), None, None, Some(1.0), Some(2.0), Some(3.0)]
        );
        assert_eq!(
            panel.lagged("x", 2).unwrap(),
            vec![None, None, Some(20.0), None, None, Some(1.0), Some(2.0)]
        );
    }

    #[test]
    fn lag_follows_numeric_time_when_every_individual_skips_a_period() {
        let columns: Vec<Column> = vec![
            Series::new("id".into(), vec!["a", "a", "a", "b", "b", "b"]).into_column(),
            Series::new("year".into(), vec![2001i64, 2002, 2004, 2001, 2002, 2004]).into_column(),
            Series::new("x".into(), vec![1.0, 2.0, 4.0, 5.0, 6.0, 8.0]).into_column(),
        ];
        let df = DataFrame::new(columns).unwrap();
        let panel = prepare(&df, &PanelSpec::new("id", "year")).unwrap();
        assert!(panel.is_balanced());
        assert_eq!(
            panel.lagged("x", 1).unwrap(),
            vec![None, Some(1.0), None, None, Some(5.0), None]
        );
    }

    #[test]
    fn text_periods_lag_by_level_position() {
        let columns: Vec<Column> = vec![
            Series::new("id".into(), vec![1i64, 1, 1]).into_column(),
            Series::new("wave".into(), vec!["w1", "w2", "w3"]).into_column(),
            Series::new("x".into(), vec![1.0, 2.0, 3.0]).into_column(),
        ];
        let df = DataFrame::new(columns).unwrap();
        let panel = prepare(&df, &PanelSpec::new("id", "wave")).unwrap();
        assert_eq!(
            panel.lagged("x", 1).unwrap(),
            vec![None, Some(1.0), Some(2.0)]
        );
    }

    #[test]
    fn rows_of_returns_contiguous_ranges() {
        let spec = PanelSpec::new("id", "t").with_balance(false);
        let panel = prepare(&gapped(), &spec).unwrap();
        assert_eq!(panel.rows_of(0), 0..3);
        assert_eq!(panel.rows_of(1), 3..7);
        assert_eq!(panel.rows_of(5), 0..0);
    }

    #[test]
    fn resample_makes_distinct_individuals() {
        let panel = prepare(&frame(), &PanelSpec::new("id", "t")).unwrap();
        let boot = panel.resample(&[1, 1]).unwrap();
        assert_eq!(boot.n_individuals(), 2);
        assert_eq!(boot.individual_codes(), &[0, 0, 1, 1]);
        assert_eq!(boot.individual_keys(), &["2#0", "2#1"]);
        assert_eq!(
            boot.numeric("x").unwrap(),
            vec![Some(21.0), Some(22.0), Some(21.0), Some(22.0)]
        );
        assert!(boot.is_balanced());
        assert!(panel.resample(&[7]).is_err());
    }
}

//! SAS Transport (XPT) reader.
//!
//! Decoding is done by `xportrs`; this module only turns the decoded member
//! into a DataFrame. Numeric variables become `Float64` columns with SAS
//! missing values as nulls, character variables become right-trimmed
//! string columns.

use std::path::Path;

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use tracing::debug;
use xportrs::{ColumnData, Xpt};

use crate::error::{IngestError, Result};

/// Read the first member of an XPT file into a DataFrame.
pub fn read_xpt_table(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let dataset = Xpt::read(path).map_err(|e| IngestError::malformed(path, e.to_string()))?;

    let mut columns: Vec<Column> = Vec::new();
    for variable in dataset.columns() {
        let name = variable.name();
        let series = match variable.data() {
            ColumnData::F64(values) => Series::new(name.into(), values.clone()),
            ColumnData::String(values) => {
                let trimmed: Vec<Option<&str>> = values
                    .iter()
                    .map(|value| value.as_deref().map(str::trim_end))
                    .collect();
                Series::new(name.into(), trimmed)
            }
            _ => {
                return Err(IngestError::malformed(
                    path,
                    format!("variable '{name}' is neither numeric nor character"),
                ));
            }
        };
        columns.push(series.into_column());
    }

    let df = DataFrame::new(columns)?;
    debug!(
        path = %path.display(),
        variables = df.width(),
        rows = df.height(),
        "parsed transport member"
    );
    Ok(df)
}

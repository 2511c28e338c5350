//! Polars AnyValue utility functions.
//!
//! Helpers for turning DataFrame columns into plain numeric vectors and
//! string keys.

use polars::prelude::{AnyValue, DataFrame};

use crate::error::{IngestError, Result};

/// Cell rendered as a panel key: nulls are empty, strings are trimmed and
/// integral floats lose their fractional part.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.trim().to_string(),
        AnyValue::StringOwned(ref s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// `2.50` becomes `"2.5"` and `10.0` becomes `"10"`.
pub fn format_numeric(v: f64) -> String {
    let text = v.to_string();
    match text.split_once('.') {
        Some(_) => text.trim_end_matches('0').trim_end_matches('.').to_string(),
        None => text,
    }
}

/// Numeric reading of a cell. Text is parsed, booleans count as 0/1, and
/// anything missing or non-finite is `None`.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    let parsed = match value {
        AnyValue::Null => None,
        AnyValue::Boolean(flag) => Some(f64::from(u8::from(flag))),
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(ref s) => parse_f64(s),
        other => other.extract::<f64>(),
    };
    parsed.filter(|v| v.is_finite())
}

/// Parses a string as f64, returning None for invalid, empty or SAS-style
/// missing (".") strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed.eq_ignore_ascii_case("na") {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Column names of a DataFrame as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Returns true if the DataFrame has a column called `name`.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names()
        .into_iter()
        .any(|column| column.as_str() == name)
}

/// Numeric values of a column; missing and unparsable cells are `None`.
pub fn column_f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name).map_err(|_| IngestError::ColumnNotFound {
        column: name.to_string(),
    })?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        values.push(any_to_f64(column.get(idx)?));
    }
    Ok(values)
}

/// Values of a column rendered as trimmed string keys; nulls become "".
pub fn column_key_values(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df.column(name).map_err(|_| IngestError::ColumnNotFound {
        column: name.to_string(),
    })?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        values.push(any_to_string(column.get(idx)?));
    }
    Ok(values)
}

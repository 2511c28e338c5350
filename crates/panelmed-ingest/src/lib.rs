//! Dataset loading for panel mediation analysis.
//!
//! Reads delimited text (`.csv`, `.tsv`, `.txt`) and SAS Transport
//! (`.xpt`) files into Polars DataFrames, plus helpers that turn columns
//! into numeric vectors and index keys.

mod error;
pub mod polars_utils;
mod reader;
mod xpt;

pub use error::{IngestError, Result};
pub use polars_utils::{
    any_to_f64, any_to_string, column_f64_values, column_key_values, column_names, has_column,
    parse_f64,
};
pub use reader::{TableFormat, read_delimited, read_table};
pub use xpt::read_xpt_table;

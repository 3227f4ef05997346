//! Shared utilities for deweather crates.
//!
//! Polars value conversions and column extraction helpers used across the
//! workspace.

pub mod frame;
pub mod polars;

pub use frame::{
    ColumnKind, bool_values, epoch_seconds, f64_values, has_column, string_values,
    units_per_second,
};
pub use self::polars::{any_to_string, format_numeric, format_rounded};

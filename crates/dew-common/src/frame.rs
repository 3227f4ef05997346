//! Column-level helpers over Polars data frames.

use polars::prelude::{DataFrame, DataType, PolarsError, PolarsResult, TimeUnit};

const SECONDS_PER_DAY: i64 = 86_400;

/// Broad storage class of a column, used to pick an imputation or encoding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    Boolean,
    Temporal,
    Other,
}

impl ColumnKind {
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnKind::Integer,
            DataType::Float32 | DataType::Float64 => ColumnKind::Float,
            DataType::String => ColumnKind::Text,
            DataType::Boolean => ColumnKind::Boolean,
            DataType::Date | DataType::Datetime(_, _) => ColumnKind::Temporal,
            _ => ColumnKind::Other,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Numeric (or boolean) column values widened to `f64`.
pub fn f64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df.column(name)?.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// Textual column values; non-string columns are cast first.
pub fn string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let series = df.column(name)?.as_materialized_series().cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

pub fn bool_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<bool>>> {
    let series = df.column(name)?.as_materialized_series().cast(&DataType::Boolean)?;
    Ok(series.bool()?.into_iter().collect())
}

/// Number of physical units per second for a datetime time unit.
pub fn units_per_second(unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => 1_000_000_000,
        TimeUnit::Microseconds => 1_000_000,
        TimeUnit::Milliseconds => 1_000,
    }
}

/// Whole seconds since the Unix epoch for a `Date` or `Datetime` column.
///
/// Uses the physical value, so the result does not depend on the column's
/// time zone. Sub-second precision is floored. Other dtypes yield an
/// `InvalidOperation` error.
pub fn epoch_seconds(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let series = df.column(name)?.as_materialized_series();
    let scale = match series.dtype() {
        DataType::Datetime(unit, _) => Scale::Divide(units_per_second(*unit)),
        DataType::Date => Scale::Multiply(SECONDS_PER_DAY),
        other => {
            return Err(PolarsError::InvalidOperation(
                format!("`{name}` is {other}, expected a date or datetime").into(),
            ));
        }
    };
    let physical = series.cast(&DataType::Int64)?;
    Ok(physical
        .i64()?
        .into_iter()
        .map(|value| value.map(|v| scale.apply(v)))
        .collect())
}

#[derive(Clone, Copy)]
enum Scale {
    Divide(i64),
    Multiply(i64),
}

impl Scale {
    fn apply(self, value: i64) -> i64 {
        match self {
            Scale::Divide(per_second) => value.div_euclid(per_second),
            Scale::Multiply(factor) => value * factor,
        }
    }
}

use polars::prelude::{DataFrame, DataType};

use dew_model::{DATE, Result, SchemaError};

/// Ensures `date` exists and holds dates or datetimes. Nulls are allowed here.
pub(crate) fn require_timestamp(df: &DataFrame) -> Result<()> {
    let column = df.column(DATE).map_err(|_| SchemaError::MissingColumn {
        column: DATE.to_string(),
    })?;
    match column.dtype() {
        DataType::Datetime(_, _) | DataType::Date => Ok(()),
        other => Err(SchemaError::InvalidType {
            column: DATE.to_string(),
            expected: "a date or datetime".to_string(),
            found: other.to_string(),
        }
        .into()),
    }
}

/// Physical `date` values, comparable within one frame at full precision.
pub(crate) fn physical_timestamps(df: &DataFrame) -> Result<Vec<Option<i64>>> {
    require_timestamp(df)?;
    let physical = df
        .column(DATE)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    Ok(physical.i64()?.into_iter().collect())
}

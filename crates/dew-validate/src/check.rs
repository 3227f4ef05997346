//! Required-column checks for observation tables.

use polars::prelude::{DataFrame, DataType};
use tracing::debug;

use dew_common::has_column;
use dew_model::{DATE, DATE_UNIX, SET, SchemaError, SetLabel, VALUE};

/// Which set of requirements a table must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Untouched input: only the timestamp column is required.
    Raw,
    /// Output of preparation: split labels, target and trend column too.
    Prepared,
}

impl CheckMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckMode::Raw => "raw",
            CheckMode::Prepared => "prepared",
        }
    }
}

/// Checks `df` against `mode` and hands it back unchanged on success.
///
/// Timestamps are never coerced: a `date` column stored as text or numbers
/// is rejected.
pub fn check_data(df: DataFrame, mode: CheckMode) -> Result<DataFrame, SchemaError> {
    validate_frame(&df, mode)?;
    Ok(df)
}

/// Borrowing form of [`check_data`].
pub fn validate_frame(df: &DataFrame, mode: CheckMode) -> Result<(), SchemaError> {
    check_date(df)?;
    if mode == CheckMode::Prepared {
        require(df, SET)?;
        set_labels(df)?;
        require(df, VALUE)?;
        require(df, DATE_UNIX)?;
    }
    debug!(mode = mode.as_str(), rows = df.height(), "table passed schema check");
    Ok(())
}

fn require(df: &DataFrame, column: &str) -> Result<(), SchemaError> {
    if has_column(df, column) {
        Ok(())
    } else {
        Err(SchemaError::MissingColumn {
            column: column.to_string(),
        })
    }
}

fn check_date(df: &DataFrame) -> Result<(), SchemaError> {
    require(df, DATE)?;
    let column = df.column(DATE).map_err(|_| SchemaError::MissingColumn {
        column: DATE.to_string(),
    })?;
    if !is_timestamp(column.dtype()) {
        return Err(SchemaError::InvalidType {
            column: DATE.to_string(),
            expected: "a date or datetime".to_string(),
            found: column.dtype().to_string(),
        });
    }
    let nulls = column.null_count();
    if nulls > 0 {
        return Err(SchemaError::MissingTimestamps {
            column: DATE.to_string(),
            count: nulls,
        });
    }
    Ok(())
}

pub(crate) fn is_timestamp(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Parses the `set` column, rejecting anything but `training` and `testing`.
pub(crate) fn set_labels(df: &DataFrame) -> Result<Vec<SetLabel>, SchemaError> {
    let column = df.column(SET).map_err(|_| SchemaError::MissingColumn {
        column: SET.to_string(),
    })?;
    let invalid_type = || SchemaError::InvalidType {
        column: SET.to_string(),
        expected: "text".to_string(),
        found: column.dtype().to_string(),
    };
    if column.dtype() != &DataType::String {
        return Err(invalid_type());
    }
    let values = column.as_materialized_series().str().map_err(|_| invalid_type())?;
    values
        .into_iter()
        .map(|value| match value {
            Some(text) => text
                .parse::<SetLabel>()
                .map_err(|label| SchemaError::InvalidSetLabel { label }),
            None => Err(SchemaError::InvalidSetLabel {
                label: "null".to_string(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{IntoColumn, NamedFrom, Series};

    fn dated(values: &[Option<i32>]) -> Series {
        Series::new(DATE.into(), values)
            .cast(&DataType::Date)
            .expect("cast date")
    }

    #[test]
    fn raw_accepts_date_column() {
        let df = DataFrame::new(vec![dated(&[Some(1), Some(2)]).into_column()]).expect("frame");
        assert!(check_data(df, CheckMode::Raw).is_ok());
    }

    #[test]
    fn string_dates_are_not_coerced() {
        let df = DataFrame::new(vec![
            Series::new(DATE.into(), &["2020-01-01"]).into_column(),
        ])
        .expect("frame");
        let err = check_data(df, CheckMode::Raw).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidType { ref column, .. } if column == DATE));
    }

    #[test]
    fn null_timestamps_are_counted() {
        let df = DataFrame::new(vec![dated(&[Some(1), None, None]).into_column()]).expect("frame");
        assert_eq!(
            check_data(df, CheckMode::Raw).unwrap_err(),
            SchemaError::MissingTimestamps {
                column: DATE.to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn null_set_label_is_invalid() {
        let df = DataFrame::new(vec![
            Series::new(SET.into(), &[Some("training"), None]).into_column(),
        ])
        .expect("frame");
        assert_eq!(
            set_labels(&df).unwrap_err(),
            SchemaError::InvalidSetLabel {
                label: "null".to_string()
            }
        );
    }
}

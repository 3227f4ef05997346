//! Raw and prepared checks over realistic tables.

use dew_model::{DATE, DATE_UNIX, SET, SchemaError, VALUE};
use dew_validate::{CheckMode, PreparedTable, check_data};
use polars::prelude::{DataFrame, DataType, IntoColumn, NamedFrom, Series, TimeUnit};

fn hourly_dates(n: i64) -> Series {
    let millis: Vec<i64> = (0..n).map(|h| 1_577_836_800_000 + h * 3_600_000).collect();
    Series::new(DATE.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .expect("cast datetime")
}

fn raw_table() -> DataFrame {
    DataFrame::new(vec![
        hourly_dates(3).into_column(),
        Series::new(VALUE.into(), &[Some(1.0), None, Some(3.0)]).into_column(),
        Series::new("temp".into(), &[10.0, 11.0, 12.0]).into_column(),
    ])
    .expect("frame")
}

#[test]
fn raw_check_passes_through_unchanged() {
    let df = raw_table();
    let checked = check_data(df.clone(), CheckMode::Raw).expect("raw check");
    assert!(checked.equals_missing(&df));
}

#[test]
fn missing_date_is_reported_first() {
    let df = DataFrame::new(vec![
        Series::new(VALUE.into(), &[1.0]).into_column(),
    ])
    .expect("frame");
    assert_eq!(
        check_data(df, CheckMode::Prepared).unwrap_err(),
        SchemaError::MissingColumn {
            column: DATE.to_string()
        }
    );
}

#[test]
fn numeric_dates_are_rejected() {
    let df = DataFrame::new(vec![Series::new(DATE.into(), &[1i64, 2]).into_column()])
        .expect("frame");
    let err = check_data(df, CheckMode::Raw).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidType { .. }));
    assert!(err.to_string().contains("`date`"));
}

#[test]
fn prepared_mode_requires_split_labels() {
    let err = check_data(raw_table(), CheckMode::Prepared).unwrap_err();
    assert_eq!(
        err,
        SchemaError::MissingColumn {
            column: SET.to_string()
        }
    );
}

#[test]
fn prepared_mode_requires_trend_column() {
    let mut df = raw_table();
    df.with_column(Series::new(SET.into(), &["training", "training", "testing"]))
        .expect("add set");
    let err = PreparedTable::new(df).unwrap_err();
    assert_eq!(
        err,
        SchemaError::MissingColumn {
            column: DATE_UNIX.to_string()
        }
    );
}

#[test]
fn non_text_labels_are_rejected() {
    let mut df = raw_table();
    df.with_column(Series::new(SET.into(), &[1i32, 0, 1]))
        .expect("add set");
    let err = check_data(df, CheckMode::Prepared).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidType { ref column, .. } if column == SET));
}

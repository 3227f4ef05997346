//! Calendar and trend columns derived from `date`.

use chrono::{DateTime, Datelike, Timelike, Utc};
use polars::prelude::{DataFrame, NamedFrom, Series};
use tracing::info;

use dew_common::epoch_seconds;
use dew_model::{DATE, DerivedColumn, Result};
use dew_validate::TableSchema;

use crate::timestamps::require_timestamp;

/// Adds `date_unix`, `day_julian`, `weekday` and `hour`.
///
/// With `replace = false` only absent columns are computed and existing ones
/// are trusted as-is. Calendar fields follow the UTC wall clock.
pub fn add_date_variables(mut df: DataFrame, replace: bool) -> Result<DataFrame> {
    require_timestamp(&df)?;
    let targets = if replace {
        DerivedColumn::ALL.to_vec()
    } else {
        TableSchema::of(&df).missing_derived()
    };
    if targets.is_empty() {
        return Ok(df);
    }

    let seconds = epoch_seconds(&df, DATE)?;
    let instants: Vec<Option<DateTime<Utc>>> = seconds
        .iter()
        .map(|s| s.and_then(|s| DateTime::from_timestamp(s, 0)))
        .collect();

    for column in &targets {
        df.with_column(derive(*column, &seconds, &instants))?;
    }
    info!(
        columns = ?targets.iter().map(|c| c.name()).collect::<Vec<_>>(),
        "derived date variables"
    );
    Ok(df)
}

fn derive(
    column: DerivedColumn,
    seconds: &[Option<i64>],
    instants: &[Option<DateTime<Utc>>],
) -> Series {
    let name = column.name().into();
    let calendar = |field: fn(&DateTime<Utc>) -> u32| -> Vec<Option<i32>> {
        instants
            .iter()
            .map(|instant| instant.as_ref().map(|dt| field(dt) as i32))
            .collect()
    };
    match column {
        DerivedColumn::DateUnix => Series::new(name, seconds),
        DerivedColumn::DayJulian => Series::new(name, calendar(|dt| dt.ordinal())),
        DerivedColumn::Weekday => {
            Series::new(name, calendar(|dt| dt.weekday().number_from_monday()))
        }
        DerivedColumn::Hour => Series::new(name, calendar(|dt| dt.hour())),
    }
}

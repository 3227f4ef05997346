//! Filling of missing covariate values.
//!
//! Numbers take the column median, text and booleans the column mode.
//! In float columns `NaN` counts as missing, the same as null.
//! Statistics are computed once per column from its own non-missing values,
//! so running the imputer twice changes nothing.

use std::collections::BTreeMap;

use polars::prelude::{BooleanChunked, DataFrame, DataType, NamedFrom, Series};
use tracing::{debug, info, warn};

use dew_common::{ColumnKind, bool_values, f64_values, string_values};
use dew_model::{Result, VALUE};

/// Fills nulls column by column; optionally drops rows without a target first.
pub fn impute_values(df: DataFrame, drop_missing_target: bool) -> Result<DataFrame> {
    let mut df = if drop_missing_target {
        drop_missing_targets(df)?
    } else {
        df
    };

    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    let mut filled_columns = 0usize;
    for name in names {
        let column = df.column(&name)?;
        let dtype = column.dtype().clone();
        let nulls = match ColumnKind::of(&dtype) {
            ColumnKind::Float => missing_floats(&df, &name)?,
            _ => column.null_count(),
        };
        if nulls == 0 {
            continue;
        }
        if nulls == df.height() {
            warn!(column = %name, "column has no values to impute from, left unchanged");
            continue;
        }
        let filled = match ColumnKind::of(&dtype) {
            ColumnKind::Integer | ColumnKind::Float => fill_numeric(&df, &name, &dtype)?,
            ColumnKind::Text => fill_text(&df, &name)?,
            ColumnKind::Boolean => fill_boolean(&df, &name)?,
            ColumnKind::Temporal | ColumnKind::Other => {
                debug!(column = %name, dtype = %dtype, "column type is not imputed");
                continue;
            }
        };
        df.with_column(filled)?;
        filled_columns += 1;
        debug!(column = %name, filled = nulls, "imputed missing values");
    }
    info!(columns = filled_columns, rows = df.height(), "imputation finished");
    Ok(df)
}

/// Removes rows whose `value` is null or `NaN`; a table without `value` is returned as is.
pub fn drop_missing_targets(df: DataFrame) -> Result<DataFrame> {
    if df.get_column_index(VALUE).is_none() {
        return Ok(df);
    }
    let target = df.column(VALUE)?;
    let mask: BooleanChunked = if ColumnKind::of(target.dtype()) == ColumnKind::Float {
        f64_values(&df, VALUE)?
            .into_iter()
            .map(|value| value.is_some_and(|v| !v.is_nan()))
            .collect()
    } else {
        target.as_materialized_series().is_not_null()
    };
    let before = df.height();
    let kept = df.filter(&mask)?;
    if kept.height() < before {
        info!(dropped = before - kept.height(), "dropped rows with a missing target");
    }
    Ok(kept)
}

fn missing_floats(df: &DataFrame, name: &str) -> Result<usize> {
    Ok(f64_values(df, name)?
        .iter()
        .filter(|value| !value.is_some_and(|v| !v.is_nan()))
        .count())
}

fn fill_numeric(df: &DataFrame, name: &str, dtype: &DataType) -> Result<Series> {
    let values: Vec<Option<f64>> = f64_values(df, name)?
        .into_iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect();
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let Some(mut fill) = median(&present) else {
        return Ok(df.column(name)?.as_materialized_series().clone());
    };
    if ColumnKind::of(dtype) == ColumnKind::Integer {
        fill = fill.round();
    }
    let filled: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(fill)).collect();
    Ok(Series::new(name.into(), filled).cast(dtype)?)
}

fn fill_text(df: &DataFrame, name: &str) -> Result<Series> {
    let values = string_values(df, name)?;
    let fill = text_mode(values.iter().flatten().map(String::as_str)).unwrap_or_default();
    let filled: Vec<String> = values
        .into_iter()
        .map(|v| v.unwrap_or_else(|| fill.clone()))
        .collect();
    Ok(Series::new(name.into(), filled))
}

fn fill_boolean(df: &DataFrame, name: &str) -> Result<Series> {
    let values = bool_values(df, name)?;
    let fill = bool_mode(values.iter().flatten().copied());
    let filled: Vec<bool> = values.into_iter().map(|v| v.unwrap_or(fill)).collect();
    Ok(Series::new(name.into(), filled))
}

/// Median of `values`; the mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent value; ties go to the lexicographically smallest.
pub fn text_mode<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}

/// Most frequent boolean; ties go to `false`.
pub fn bool_mode(values: impl IntoIterator<Item = bool>) -> bool {
    let (trues, falses) = values
        .into_iter()
        .fold((0usize, 0usize), |(t, f), v| if v { (t + 1, f) } else { (t, f + 1) });
    trues > falses
}

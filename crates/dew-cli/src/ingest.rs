//! CSV ingestion and output.
//!
//! A text `date` column is parsed into a millisecond `Datetime` column; every
//! other column keeps the type Polars infers.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::{
    CsvReadOptions, CsvWriter, DataFrame, DataType, NamedFrom, NullValues, SerReader, SerWriter,
    Series, TimeUnit,
};
use thiserror::Error;
use tracing::{debug, info};

use dew_common::string_values;
use dew_model::DATE;

/// Cell contents read as missing.
const NULL_TOKENS: &[&str] = &["", "NA", "NaN", "nan", "null"];

/// Timestamp layouts tried after RFC 3339, in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    #[error("unrecognised timestamp '{value}' in row {row} of {path}")]
    InvalidTimestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Parses one timestamp; offsets are converted to UTC, naive values taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Reads an observation table from `path`.
pub fn read_observations(path: &Path) -> Result<DataFrame, IngestError> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let parse_error = |e: polars::prelude::PolarsError| IngestError::CsvParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let null_values = NullValues::AllColumns(NULL_TOKENS.iter().map(|t| (*t).into()).collect());
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .map_parse_options(|options| options.with_null_values(Some(null_values.clone())))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(parse_error)?
        .finish()
        .map_err(parse_error)?;
    if df.height() == 0 {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }

    if df
        .column(DATE)
        .is_ok_and(|column| column.dtype() == &DataType::String)
    {
        let parsed = parse_date_column(&df, path)?;
        df.with_column(parsed).map_err(parse_error)?;
        debug!(column = DATE, "parsed text timestamps");
    }
    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read observations"
    );
    Ok(df)
}

fn parse_date_column(df: &DataFrame, path: &Path) -> Result<Series, IngestError> {
    let parse_error = |e: polars::prelude::PolarsError| IngestError::CsvParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let texts = string_values(df, DATE).map_err(parse_error)?;
    let mut millis = Vec::with_capacity(texts.len());
    for (row, text) in texts.into_iter().enumerate() {
        let value = match text {
            None => None,
            Some(text) => match parse_timestamp(&text) {
                Some(dt) => Some(dt.and_utc().timestamp_millis()),
                None => {
                    return Err(IngestError::InvalidTimestamp {
                        path: path.to_path_buf(),
                        row: row + 1,
                        value: text,
                    });
                }
            },
        };
        millis.push(value);
    }
    Series::new(DATE.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(parse_error)
}

/// Writes `df` to `path` as CSV with a header row.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), IngestError> {
    let write_error = |message: String| IngestError::Write {
        path: path.to_path_buf(),
        message,
    };
    let mut file = File::create(path).map_err(|e| write_error(e.to_string()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| write_error(e.to_string()))?;
    info!(path = %path.display(), rows = df.height(), "wrote CSV");
    Ok(())
}

//! Error taxonomy shared by every deweather crate.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Missing or malformed required columns. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("input must contain a `{column}` column")]
    MissingColumn { column: String },

    #[error("`{column}` must be {expected}, found {found}")]
    InvalidType {
        column: String,
        expected: String,
        found: String,
    },

    #[error("`{column}` must not contain missing values ({count} found)")]
    MissingTimestamps { column: String, count: usize },

    #[error("`set` can only take the values `training` and `testing`, found `{label}`")]
    InvalidSetLabel { label: String },

    #[error("cannot rename `{source_column}` to `{target}`: `{target}` already exists")]
    ColumnConflict {
        source_column: String,
        target: String,
    },
}

/// Inputs the caller has to fix: degenerate splits and bad feature lists.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum DataError {
    #[error("split fraction must be strictly between 0 and 1, got {fraction}")]
    InvalidFraction { fraction: f64 },

    #[error("feature list is empty")]
    NoFeatures,

    #[error("feature `{name}` is listed more than once")]
    DuplicateFeature { name: String },

    #[error("feature `{name}` is not within the input table")]
    UnknownFeature { name: String },

    #[error("column `{name}` cannot be resampled")]
    ProtectedColumn { name: String },

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("training set has {count} rows with a missing target value")]
    MissingTargetValues { count: usize },
}

/// Failures of the regression backend or of a fitted predictor.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum TrainingError {
    #[error("insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("target has zero variance")]
    ConstantTarget,

    #[error("no candidate estimators configured")]
    NoCandidates,

    #[error("time budget of {budget_secs}s exhausted before any candidate was scored")]
    BudgetExhausted { budget_secs: u64 },

    #[error("feature `{name}` has unsupported type {dtype}")]
    UnsupportedFeature { name: String, dtype: String },

    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// Top-level error returned by the pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeweatherError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("training error: {0}")]
    Training(#[from] TrainingError),

    #[error("DataFrame error: {0}")]
    Polars(#[from] PolarsError),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, DeweatherError>;

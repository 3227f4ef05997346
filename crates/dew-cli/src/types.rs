use std::path::PathBuf;

use polars::prelude::DataFrame;

use dew_stats::ModelStats;

#[derive(Debug)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub report: Option<PathBuf>,
    pub rows: usize,
    pub training_rows: usize,
    pub testing_rows: usize,
    pub features: Vec<String>,
    pub model: String,
    pub training: ModelStats,
    pub testing: ModelStats,
    pub timestamps: usize,
    /// Leading rows of the deweathered series.
    pub preview: DataFrame,
}

#[derive(Debug)]
pub struct PrepareSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    pub training_rows: usize,
    pub testing_rows: usize,
    pub columns: Vec<String>,
}

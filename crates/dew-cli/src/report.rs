//! JSON run report.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use dew_model::RunConfig;
use dew_stats::ModelStats;

/// Everything needed to reproduce and judge a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    pub training_rows: usize,
    pub testing_rows: usize,
    pub features: Vec<String>,
    /// Description of the fitted model.
    pub model: String,
    pub training: ModelStats,
    pub testing: ModelStats,
    /// Rows in the deweathered series.
    pub timestamps: usize,
    pub duration_ms: u64,
    pub config: RunConfig,
}

/// Writes `report` to `path` as pretty-printed JSON.
pub fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serialize run report")?;
    fs::write(path, json).with_context(|| format!("write report {}", path.display()))?;
    Ok(())
}

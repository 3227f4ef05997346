//! Run configuration: optional TOML file plus command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use dew_model::{Estimator, Metric, RunConfig, SplitMethod};

/// Loads `path`, or the defaults when no file is given.
///
/// Missing keys take their default values.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let config: RunConfig =
        toml::from_str(&text).with_context(|| format!("parse config {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Renders `config` as TOML.
pub fn render_config(config: &RunConfig) -> Result<String> {
    toml::to_string_pretty(config).context("serialize config")
}

/// Settings shared by every subcommand that builds a [`RunConfig`].
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// TOML configuration file; command-line options take precedence.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Name of the observed target column.
    #[arg(long = "value-column", value_name = "NAME")]
    pub value_column: Option<String>,

    /// Model features (comma separated). Defaults to every non-reserved column.
    #[arg(long = "features", value_name = "NAMES", value_delimiter = ',')]
    pub features: Vec<String>,

    /// Leave missing covariate values as they are.
    #[arg(long = "no-impute")]
    pub no_impute: bool,

    /// Drop rows whose target value is missing.
    #[arg(long = "drop-missing-target")]
    pub drop_missing_target: bool,

    /// Recompute date_unix, day_julian, weekday and hour even if present.
    #[arg(long = "replace-derived")]
    pub replace_derived: bool,

    /// Split method: random or time_series.
    #[arg(long = "split-method", value_name = "METHOD")]
    pub split_method: Option<SplitMethod>,

    /// Share of rows used for training.
    #[arg(long = "fraction", value_name = "FRACTION")]
    pub fraction: Option<f64>,

    #[arg(long = "split-seed", value_name = "SEED")]
    pub split_seed: Option<u64>,

    /// Model search time budget in seconds.
    #[arg(long = "time-budget", value_name = "SECS")]
    pub time_budget: Option<u64>,

    /// Metric used to rank candidate models.
    #[arg(long = "metric", value_name = "METRIC")]
    pub metric: Option<Metric>,

    /// Estimators to try (comma separated): linear, tree, forest.
    #[arg(long = "estimators", value_name = "NAMES", value_delimiter = ',')]
    pub estimators: Vec<Estimator>,

    #[arg(long = "train-seed", value_name = "SEED")]
    pub train_seed: Option<u64>,

    /// Number of resampling iterations.
    #[arg(long = "n-samples", value_name = "N")]
    pub n_samples: Option<usize>,

    /// Resample as permutations instead of drawing with replacement.
    #[arg(long = "no-replace")]
    pub no_replace: bool,

    /// Columns to resample (comma separated). Defaults to the features minus date_unix.
    #[arg(long = "variables", value_name = "NAMES", value_delimiter = ',')]
    pub variables: Vec<String>,

    /// Base seed for resampling.
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Worker threads for resampling. Defaults to every core.
    #[arg(long = "workers", value_name = "N")]
    pub workers: Option<usize>,
}

impl ConfigArgs {
    /// Loads the configuration file and applies every given override.
    pub fn resolve(&self) -> Result<RunConfig> {
        let mut config = load_config(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(column) = &self.value_column {
            config.prepare.value_column = column.clone();
        }
        if !self.features.is_empty() {
            config.features = self.features.clone();
        }
        if self.no_impute {
            config.prepare.impute = false;
        }
        if self.drop_missing_target {
            config.prepare.drop_missing_target = true;
        }
        if self.replace_derived {
            config.prepare.replace_derived = true;
        }
        if let Some(method) = self.split_method {
            config.prepare.split.method = method;
        }
        if let Some(fraction) = self.fraction {
            config.prepare.split.fraction = fraction;
        }
        if let Some(seed) = self.split_seed {
            config.prepare.split.seed = seed;
        }
        if let Some(secs) = self.time_budget {
            config.train.time_budget_secs = secs;
        }
        if let Some(metric) = self.metric {
            config.train.metric = metric;
        }
        if !self.estimators.is_empty() {
            config.train.estimators = self.estimators.clone();
        }
        if let Some(seed) = self.train_seed {
            config.train.seed = seed;
        }
        if let Some(n_samples) = self.n_samples {
            config.normalise.n_samples = n_samples;
        }
        if self.no_replace {
            config.normalise.replace = false;
        }
        if !self.variables.is_empty() {
            config.normalise.variables = Some(self.variables.clone());
        }
        if let Some(seed) = self.seed {
            config.normalise.seed = seed;
        }
        if self.workers.is_some() {
            config.normalise.workers = self.workers;
        }
    }
}

//! Configuration for preparation, training and resampling.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::columns::VALUE;

/// Policy used to assign rows to the training and testing sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    /// Uniformly sampled training rows.
    #[default]
    Random,
    /// Leading rows in original order; testing is the forward holdout.
    TimeSeries,
}

impl FromStr for SplitMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(SplitMethod::Random),
            "time_series" => Ok(SplitMethod::TimeSeries),
            other => Err(format!("unknown split method `{other}`")),
        }
    }
}

/// Options for the set splitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub method: SplitMethod,
    /// Share of rows assigned to training, strictly between 0 and 1.
    pub fraction: f64,
    /// Seed for the random split.
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            method: SplitMethod::Random,
            fraction: 0.75,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn new(method: SplitMethod, fraction: f64) -> Self {
        Self {
            method,
            fraction,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Options for turning a raw observation table into a prepared table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareOptions {
    /// Name of the observed target column in the input table.
    pub value_column: String,
    /// Fill missing values (median for numbers, mode for text).
    pub impute: bool,
    /// Remove rows whose target is missing before imputing.
    pub drop_missing_target: bool,
    /// Recompute derived date columns even if they already exist.
    pub replace_derived: bool,
    pub split: SplitConfig,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            value_column: VALUE.to_string(),
            impute: true,
            drop_missing_target: false,
            replace_derived: false,
            split: SplitConfig::default(),
        }
    }
}

impl PrepareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value_column(mut self, column: impl Into<String>) -> Self {
        self.value_column = column.into();
        self
    }

    pub fn with_impute(mut self, enable: bool) -> Self {
        self.impute = enable;
        self
    }

    pub fn with_drop_missing_target(mut self, enable: bool) -> Self {
        self.drop_missing_target = enable;
        self
    }

    pub fn with_replace_derived(mut self, enable: bool) -> Self {
        self.replace_derived = enable;
        self
    }

    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }
}

/// Regression metric used to rank candidate models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Mae,
    Mse,
    #[default]
    R2,
    Rmse,
    Mape,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Mae => "mae",
            Metric::Mse => "mse",
            Metric::R2 => "r2",
            Metric::Rmse => "rmse",
            Metric::Mape => "mape",
        }
    }

    /// R² ranks upwards, every error metric downwards.
    pub fn higher_is_better(self) -> bool {
        matches!(self, Metric::R2)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mae" => Ok(Metric::Mae),
            "mse" => Ok(Metric::Mse),
            "r2" => Ok(Metric::R2),
            "rmse" => Ok(Metric::Rmse),
            "mape" => Ok(Metric::Mape),
            other => Err(format!("unknown metric `{other}`")),
        }
    }
}

/// Candidate estimator families understood by the built-in backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    /// Ridge regression on standardised features.
    Linear,
    /// Single CART regression tree.
    Tree,
    /// Bagged regression trees.
    Forest,
}

impl Estimator {
    pub fn as_str(self) -> &'static str {
        match self {
            Estimator::Linear => "linear",
            Estimator::Tree => "tree",
            Estimator::Forest => "forest",
        }
    }
}

impl fmt::Display for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Estimator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Estimator::Linear),
            "tree" => Ok(Estimator::Tree),
            "forest" => Ok(Estimator::Forest),
            other => Err(format!("unknown estimator `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    Regression,
}

/// Settings handed to the regression backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Wall-clock ceiling for the model search, in seconds.
    pub time_budget_secs: u64,
    pub metric: Metric,
    /// Allow-list of estimators, tried in order.
    pub estimators: Vec<Estimator>,
    pub task: TaskKind,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            time_budget_secs: 60,
            metric: Metric::R2,
            estimators: vec![Estimator::Linear, Estimator::Tree, Estimator::Forest],
            task: TaskKind::Regression,
            seed: 7_654_321,
        }
    }
}

impl TrainConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }

    pub fn with_time_budget_secs(mut self, secs: u64) -> Self {
        self.time_budget_secs = secs;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_estimators(mut self, estimators: Vec<Estimator>) -> Self {
        self.estimators = estimators;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Settings for the resampling normaliser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormaliseConfig {
    /// Columns to resample. `None` means every feature except `date_unix`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
    /// Number of resampling iterations.
    pub n_samples: usize,
    /// Draw row indices with replacement.
    pub replace: bool,
    /// Base seed; iteration `i` uses stream `i` of this seed.
    pub seed: u64,
    /// Degree of parallelism. `None` uses every available core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl Default for NormaliseConfig {
    fn default() -> Self {
        Self {
            variables: None,
            n_samples: 300,
            replace: true,
            seed: 7_654_321,
            workers: None,
        }
    }
}

impl NormaliseConfig {
    pub fn new(n_samples: usize) -> Self {
        Self {
            n_samples,
            ..Self::default()
        }
    }

    pub fn with_variables(mut self, variables: Vec<String>) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }
}

/// Everything one end-to-end run needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Model features. Empty means every non-reserved column of the prepared table.
    pub features: Vec<String>,
    pub prepare: PrepareOptions,
    pub train: TrainConfig,
    pub normalise: NormaliseConfig,
}

impl RunConfig {
    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = features;
        self
    }
}

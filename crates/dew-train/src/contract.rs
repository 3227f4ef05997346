//! The seam between the pipeline and a model-search backend.

use std::fmt;

use polars::prelude::DataFrame;

use dew_model::{TrainConfig, TrainingError};

/// A fitted regression model.
///
/// Predictors are shared read-only across resampling workers, hence the
/// `Send + Sync` bound.
pub trait Predictor: Send + Sync + fmt::Debug {
    /// Predicts one value per row of `frame`, in row order.
    ///
    /// `frame` may carry extra columns; only the feature columns are read.
    fn predict(&self, frame: &DataFrame) -> Result<Vec<f64>, TrainingError>;

    /// Feature columns the model was trained on, in training order.
    fn features(&self) -> &[String];

    /// Short human-readable summary of the selected model.
    fn describe(&self) -> String;
}

/// Fits a [`Predictor`] from feature columns and a numeric target.
pub trait RegressionBackend: Send + Sync {
    fn name(&self) -> &str;

    /// `features` holds exactly the feature columns; `target` is aligned with
    /// its rows and free of missing values.
    fn fit(
        &self,
        features: &DataFrame,
        target: &[f64],
        config: &TrainConfig,
    ) -> Result<Box<dyn Predictor>, TrainingError>;
}

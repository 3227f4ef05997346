//! End-to-end deweathering: prepare, train, normalise.

use std::time::Instant;

use polars::prelude::DataFrame;
use tracing::{info, info_span};

use dew_model::{Result, RunConfig};
use dew_train::{Predictor, RegressionBackend, train_model};
use dew_validate::PreparedTable;

use crate::normalise::normalise;
use crate::prepare::{default_feature_names, prepare_data};
use crate::progress::ProgressObserver;

/// Everything a run produces.
#[derive(Debug)]
pub struct DeweatherRun {
    /// The prepared table the model was trained on.
    pub prepared: PreparedTable,
    pub predictor: Box<dyn Predictor>,
    /// Features the model was trained with, after defaulting.
    pub features: Vec<String>,
    /// `date`, `Observed` and `Deweathered`, one row per timestamp.
    pub normalised: DataFrame,
}

/// Runs preparation, training and normalisation in sequence.
///
/// When `config.features` is empty, every non-reserved column of the
/// prepared table is used.
pub fn run_deweather(
    df: DataFrame,
    config: &RunConfig,
    backend: &dyn RegressionBackend,
    observer: &dyn ProgressObserver,
) -> Result<DeweatherRun> {
    let span = info_span!("deweather");
    let _guard = span.enter();
    let start = Instant::now();

    let prepared = prepare_data(df, &config.prepare)?;
    let features = if config.features.is_empty() {
        default_feature_names(&prepared)
    } else {
        config.features.clone()
    };
    let predictor = train_model(&prepared, &features, &config.train, backend)?;
    let normalised = normalise(
        predictor.as_ref(),
        &prepared,
        &features,
        &config.normalise,
        observer,
    )?;

    info!(
        rows = prepared.height(),
        timestamps = normalised.height(),
        duration_ms = start.elapsed().as_millis() as u64,
        "deweathering finished"
    );
    Ok(DeweatherRun {
        prepared,
        predictor,
        features,
        normalised,
    })
}

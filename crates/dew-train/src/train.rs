//! Training entry point: precondition checks around a backend call.

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::{info, info_span};

use dew_common::f64_values;
use dew_model::{DataError, Result, SetLabel, TrainConfig, VALUE};
use dew_validate::PreparedTable;

use crate::contract::{Predictor, RegressionBackend};

/// Rejects empty, duplicated or unknown feature names.
pub fn check_features(prepared: &PreparedTable, features: &[String]) -> Result<()> {
    if features.is_empty() {
        return Err(DataError::NoFeatures.into());
    }
    let mut seen = BTreeSet::new();
    for name in features {
        if !seen.insert(name.as_str()) {
            return Err(DataError::DuplicateFeature { name: name.clone() }.into());
        }
    }
    for name in features {
        if !prepared.has_column(name) {
            return Err(DataError::UnknownFeature { name: name.clone() }.into());
        }
    }
    Ok(())
}

/// Fits a predictor of `value` from `features` on the training subset.
///
/// Feature checks run before the backend is invoked, so a bad feature list
/// never costs a model search.
pub fn train_model(
    prepared: &PreparedTable,
    features: &[String],
    config: &TrainConfig,
    backend: &dyn RegressionBackend,
) -> Result<Box<dyn Predictor>> {
    let span = info_span!("train", backend = backend.name(), features = features.len());
    let _guard = span.enter();

    check_features(prepared, features)?;
    let training = prepared.subset(SetLabel::Training)?;
    if training.height() == 0 {
        return Err(DataError::EmptyTrainingSet.into());
    }

    let target = f64_values(&training, VALUE)?;
    let missing = target
        .iter()
        .filter(|value| !value.is_some_and(f64::is_finite))
        .count();
    if missing > 0 {
        return Err(DataError::MissingTargetValues { count: missing }.into());
    }
    let target: Vec<f64> = target.into_iter().flatten().collect();

    let inputs = training.select(features.iter().map(String::as_str))?;

    let start = Instant::now();
    let predictor = backend.fit(&inputs, &target, config)?;
    info!(
        rows = target.len(),
        model = %predictor.describe(),
        duration_ms = start.elapsed().as_millis() as u64,
        "model trained"
    );
    Ok(predictor)
}

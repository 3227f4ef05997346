//! Resampling normalisation.
//!
//! Each iteration replaces the resampled covariates with a joint draw of
//! their rows, keeps every other column (including the `date_unix` trend)
//! in place, and predicts. Averaging those predictions per timestamp
//! yields the deweathered series.
//!
//! Iteration `i` depends only on the inputs, the seed and `i`: it draws from
//! stream `i` of a ChaCha8 generator seeded with `seed`. Iterations run in
//! parallel batches but their predictions are folded in iteration order, so
//! the result does not depend on the number of workers.

use std::collections::BTreeSet;
use std::time::Instant;

use polars::prelude::{
    DataFrame, DataType, IdxCa, IdxSize, IntoColumn, NamedFrom, NewChunkedArray, Series,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use tracing::{info, info_span};

use dew_common::f64_values;
use dew_model::{
    DATE, DATE_UNIX, DEWEATHERED, DataError, DeweatherError, NormaliseConfig, OBSERVED, Result,
    TrainingError, VALUE, is_protected,
};
use dew_train::Predictor;
use dew_validate::PreparedTable;

use crate::progress::ProgressObserver;
use crate::timestamps::physical_timestamps;

/// Iterations handed to the pool per worker between progress checkpoints.
const ITERATIONS_PER_WORKER: usize = 4;

/// Columns to resample: the explicit list, or every feature except `date_unix`.
pub fn resample_variables(
    prepared: &PreparedTable,
    features: &[String],
    config: &NormaliseConfig,
) -> Result<Vec<String>> {
    let variables: Vec<String> = match &config.variables {
        Some(variables) => variables.clone(),
        None => features
            .iter()
            .filter(|name| name.as_str() != DATE_UNIX)
            .cloned()
            .collect(),
    };
    let mut seen = BTreeSet::new();
    for name in &variables {
        if is_protected(name) {
            return Err(DataError::ProtectedColumn { name: name.clone() }.into());
        }
        if !prepared.has_column(name) {
            return Err(DataError::UnknownFeature { name: name.clone() }.into());
        }
        if !seen.insert(name.as_str()) {
            return Err(DataError::DuplicateFeature { name: name.clone() }.into());
        }
    }
    Ok(variables)
}

/// Row positions drawn for iteration `iteration`.
pub fn draw_indices(n: usize, replace: bool, seed: u64, iteration: usize) -> Vec<IdxSize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(iteration as u64);
    if n == 0 {
        return Vec::new();
    }
    if replace {
        (0..n).map(|_| rng.gen_range(0..n) as IdxSize).collect()
    } else {
        let mut permutation: Vec<IdxSize> = (0..n).map(|i| i as IdxSize).collect();
        permutation.shuffle(&mut rng);
        permutation
    }
}

/// Rows grouped by identical timestamp, in ascending time order.
struct TimestampGroups {
    /// Group of each row.
    group_of: Vec<usize>,
    /// First row of each group, used to recover the timestamp value.
    first_rows: Vec<IdxSize>,
    sizes: Vec<usize>,
}

impl TimestampGroups {
    fn of(df: &DataFrame) -> Result<Self> {
        let keys = physical_timestamps(df)?;
        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by_key(|&i| keys[i]);

        let mut group_of = vec![0; keys.len()];
        let mut first_rows = Vec::new();
        let mut sizes: Vec<usize> = Vec::new();
        let mut previous = None;
        for row in order {
            if previous != Some(keys[row]) {
                previous = Some(keys[row]);
                first_rows.push(row as IdxSize);
                sizes.push(0);
            }
            let group = sizes.len() - 1;
            group_of[row] = group;
            sizes[group] += 1;
        }
        Ok(Self {
            group_of,
            first_rows,
            sizes,
        })
    }

    fn len(&self) -> usize {
        self.sizes.len()
    }
}

/// Produces the deweathered series for `prepared`.
///
/// The output has one row per distinct timestamp, ascending, with columns
/// `date`, `Observed` (mean observed value) and `Deweathered` (mean
/// prediction over every row and iteration at that timestamp).
pub fn normalise(
    predictor: &dyn Predictor,
    prepared: &PreparedTable,
    features: &[String],
    config: &NormaliseConfig,
    observer: &dyn ProgressObserver,
) -> Result<DataFrame> {
    let span = info_span!("normalise", n_samples = config.n_samples, replace = config.replace);
    let _guard = span.enter();

    let variables = resample_variables(prepared, features, config)?;
    let frame = prepared.frame();
    let n = frame.height();
    if config.n_samples == 0 || n == 0 {
        return empty_output(frame);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.unwrap_or(0))
        .build()
        .map_err(|e| DeweatherError::WorkerPool(e.to_string()))?;
    let batch_size = pool.current_num_threads().max(1) * ITERATIONS_PER_WORKER;

    let originals: Vec<Series> = variables
        .iter()
        .map(|name| -> Result<Series> {
            Ok(frame.column(name)?.as_materialized_series().clone())
        })
        .collect::<Result<_>>()?;
    let run_iteration = |iteration: usize| -> Result<Vec<f64>> {
        let drawn = draw_indices(n, config.replace, config.seed, iteration);
        let indices = IdxCa::from_vec("idx".into(), drawn);
        let mut resampled = frame.clone();
        for original in &originals {
            resampled.with_column(original.take(&indices)?)?;
        }
        let predictions = predictor.predict(&resampled)?;
        if predictions.len() != n {
            return Err(TrainingError::Prediction(format!(
                "predictor returned {} values for {n} rows",
                predictions.len()
            ))
            .into());
        }
        Ok(predictions)
    };

    let start = Instant::now();
    let mut sums = vec![0.0; n];
    let total = config.n_samples;
    observer.on_start(total);
    let mut completed = 0;
    while completed < total {
        let end = (completed + batch_size).min(total);
        let batch: Vec<Vec<f64>> = pool.install(|| {
            (completed..end)
                .into_par_iter()
                .map(&run_iteration)
                .collect::<Result<Vec<_>>>()
        })?;
        for predictions in batch {
            for (sum, prediction) in sums.iter_mut().zip(predictions) {
                *sum += prediction;
            }
        }
        completed = end;
        observer.on_progress(completed, total);
    }
    observer.on_finish(total);

    let groups = TimestampGroups::of(frame)?;
    let output = aggregate(frame, &groups, &sums, total)?;
    info!(
        variables = ?variables,
        workers = pool.current_num_threads(),
        timestamps = output.height(),
        duration_ms = start.elapsed().as_millis() as u64,
        "normalisation finished"
    );
    Ok(output)
}

fn aggregate(
    frame: &DataFrame,
    groups: &TimestampGroups,
    sums: &[f64],
    n_samples: usize,
) -> Result<DataFrame> {
    let observed = f64_values(frame, VALUE)?;
    let mut prediction_totals = vec![0.0; groups.len()];
    let mut observed_totals = vec![0.0; groups.len()];
    let mut observed_counts = vec![0usize; groups.len()];
    for (row, &group) in groups.group_of.iter().enumerate() {
        prediction_totals[group] += sums[row];
        if let Some(value) = observed[row].filter(|v| !v.is_nan()) {
            observed_totals[group] += value;
            observed_counts[group] += 1;
        }
    }

    let deweathered: Vec<f64> = prediction_totals
        .iter()
        .zip(&groups.sizes)
        .map(|(total, size)| total / (size * n_samples) as f64)
        .collect();
    let observed: Vec<Option<f64>> = observed_totals
        .iter()
        .zip(&observed_counts)
        .map(|(total, &count)| (count > 0).then(|| total / count as f64))
        .collect();

    let first_rows = IdxCa::from_vec("idx".into(), groups.first_rows.clone());
    let dates = frame.column(DATE)?.as_materialized_series().take(&first_rows)?;
    Ok(DataFrame::new(vec![
        dates.into_column(),
        Series::new(OBSERVED.into(), observed).into_column(),
        Series::new(DEWEATHERED.into(), deweathered).into_column(),
    ])?)
}

fn empty_output(frame: &DataFrame) -> Result<DataFrame> {
    let date_dtype = frame.column(DATE)?.dtype().clone();
    Ok(DataFrame::new(vec![
        Series::new_empty(DATE.into(), &date_dtype).into_column(),
        Series::new_empty(OBSERVED.into(), &DataType::Float64).into_column(),
        Series::new_empty(DEWEATHERED.into(), &DataType::Float64).into_column(),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_depend_only_on_seed_and_iteration() {
        assert_eq!(draw_indices(10, true, 1, 3), draw_indices(10, true, 1, 3));
        assert_ne!(draw_indices(10, true, 1, 3), draw_indices(10, true, 1, 4));
        assert!(draw_indices(10, true, 1, 0).iter().all(|&i| i < 10));
    }

    #[test]
    fn without_replacement_draws_a_permutation() {
        let mut drawn = draw_indices(25, false, 9, 2);
        drawn.sort_unstable();
        assert_eq!(drawn, (0..25).collect::<Vec<IdxSize>>());
    }

    #[test]
    fn empty_table_draws_nothing() {
        assert!(draw_indices(0, true, 1, 0).is_empty());
    }
}

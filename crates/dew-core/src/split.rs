//! Assignment of rows to training and testing sets.

use polars::prelude::{DataFrame, IdxCa, IdxSize, NamedFrom, NewChunkedArray, Series};
use rand::SeedableRng;
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use dew_model::{DataError, ROW_ID, Result, SET, SetLabel, SplitConfig, SplitMethod};

use crate::timestamps::physical_timestamps;

/// Number of training rows for `n` rows and a training share of `fraction`.
pub fn training_size(method: SplitMethod, fraction: f64, n: usize) -> usize {
    let exact = fraction * n as f64;
    let size = match method {
        SplitMethod::Random => exact.round_ties_even(),
        SplitMethod::TimeSeries => exact.floor(),
    };
    (size as usize).min(n)
}

/// Adds `rowid` and `set`, then orders rows by (`date`, `rowid`).
///
/// `rowid` is the row position on entry and replaces any existing column of
/// that name. Empty training or testing subsets are logged, not rejected.
pub fn split_into_sets(mut df: DataFrame, config: &SplitConfig) -> Result<DataFrame> {
    let fraction = config.fraction;
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(DataError::InvalidFraction { fraction }.into());
    }
    let n = df.height();
    let n_train = training_size(config.method, fraction, n);

    let mut training = vec![false; n];
    match config.method {
        SplitMethod::Random => {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
            for index in sample(&mut rng, n, n_train).into_vec() {
                training[index] = true;
            }
        }
        SplitMethod::TimeSeries => training[..n_train].fill(true),
    }

    let labels: Vec<&str> = training
        .iter()
        .map(|&is_training| {
            if is_training {
                SetLabel::Training.as_str()
            } else {
                SetLabel::Testing.as_str()
            }
        })
        .collect();
    let row_ids: Vec<u32> = (0..n as u32).collect();
    df.with_column(Series::new(ROW_ID.into(), row_ids))?;
    df.with_column(Series::new(SET.into(), labels))?;

    let keys = physical_timestamps(&df)?;
    let mut order: Vec<usize> = (0..n).collect();
    // Stable: equal timestamps keep their row order, i.e. ascending rowid.
    order.sort_by_key(|&i| keys[i].unwrap_or(i64::MIN));
    let order: Vec<IdxSize> = order.into_iter().map(|i| i as IdxSize).collect();
    let df = df.take(&IdxCa::from_vec("idx".into(), order))?;

    let n_test = n - n_train;
    if n_train == 0 || n_test == 0 {
        warn!(training = n_train, testing = n_test, "split produced an empty subset");
    }
    info!(
        method = ?config.method,
        training = n_train,
        testing = n_test,
        "split rows into sets"
    );
    Ok(df)
}

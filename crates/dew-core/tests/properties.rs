//! Property tests for the splitter, the imputer and the normaliser.

use std::collections::BTreeMap;

use dew_common::{epoch_seconds, f64_values, string_values};
use dew_core::{
    NoProgress, draw_indices, impute_values, normalise, prepare_data, split_into_sets,
    training_size,
};
use dew_model::{
    DATE, DEWEATHERED, NormaliseConfig, OBSERVED, PrepareOptions, ROW_ID, SET, SplitConfig,
    SplitMethod, TrainingError, VALUE,
};
use dew_train::Predictor;
use polars::prelude::{
    DataFrame, DataType, IdxCa, IntoColumn, NamedFrom, NewChunkedArray, Series,
};
use proptest::prelude::*;

/// Predicts `3 * temp - wind`.
#[derive(Debug)]
struct Linear {
    features: Vec<String>,
}

impl Predictor for Linear {
    fn predict(&self, frame: &DataFrame) -> Result<Vec<f64>, TrainingError> {
        let read = |name: &str| {
            f64_values(frame, name).map_err(|e| TrainingError::Prediction(e.to_string()))
        };
        Ok(read("temp")?
            .iter()
            .zip(read("wind")?)
            .map(|(t, w)| 3.0 * t.unwrap_or(0.0) - w.unwrap_or(0.0))
            .collect())
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn describe(&self) -> String {
        "linear".to_string()
    }
}

fn covariates() -> Vec<String> {
    vec!["temp".to_string(), "wind".to_string()]
}

fn observations(days: &[i32]) -> DataFrame {
    let n = days.len();
    let mut df = dated(days);
    df.with_column(Series::new(
        VALUE.into(),
        (0..n).map(|i| i as f64).collect::<Vec<_>>(),
    ))
    .expect("value");
    df.with_column(Series::new(
        "temp".into(),
        (0..n).map(|i| ((i * 3) % 7) as f64).collect::<Vec<_>>(),
    ))
    .expect("temp");
    df.with_column(Series::new(
        "wind".into(),
        (0..n).map(|i| (i % 4) as f64 + 0.5).collect::<Vec<_>>(),
    ))
    .expect("wind");
    df
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0)
}

fn dated(days: &[i32]) -> DataFrame {
    DataFrame::new(vec![
        Series::new(DATE.into(), days)
            .cast(&DataType::Date)
            .expect("date")
            .into_column(),
    ])
    .expect("frame")
}

fn split_method() -> impl Strategy<Value = SplitMethod> {
    prop_oneof![Just(SplitMethod::Random), Just(SplitMethod::TimeSeries)]
}

proptest! {
    #[test]
    fn split_partitions_every_row(
        days in prop::collection::vec(0i32..400, 1..80),
        fraction in 0.01f64..0.99,
        method in split_method(),
        seed in any::<u64>(),
    ) {
        let n = days.len();
        let config = SplitConfig::new(method, fraction).with_seed(seed);
        let out = split_into_sets(dated(&days), &config).expect("split");
        prop_assert_eq!(out.height(), n);

        let labels = string_values(&out, SET).expect("set");
        let training = labels.iter().filter(|l| l.as_deref() == Some("training")).count();
        let testing = labels.iter().filter(|l| l.as_deref() == Some("testing")).count();
        prop_assert_eq!(training, training_size(method, fraction, n));
        prop_assert_eq!(training + testing, n);

        let mut row_ids: Vec<usize> = f64_values(&out, ROW_ID)
            .expect("rowid")
            .into_iter()
            .map(|id| id.map_or(usize::MAX, |id| id as usize))
            .collect();
        row_ids.sort_unstable();
        prop_assert_eq!(row_ids, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn imputing_twice_changes_nothing(
        values in prop::collection::vec(prop::option::of(-1e6f64..1e6), 2..40),
        labels in prop::collection::vec(prop::option::of("[a-c]"), 2..40),
    ) {
        prop_assume!(values.iter().any(Option::is_some));
        let len = values.len().min(labels.len());
        let days: Vec<i32> = (0..len as i32).collect();
        let mut df = dated(&days);
        df.with_column(Series::new("x".into(), &values[..len])).expect("x");
        df.with_column(Series::new("site".into(), &labels[..len])).expect("site");

        let once = impute_values(df, false).expect("impute");
        let twice = impute_values(once.clone(), false).expect("impute");
        prop_assert!(once.equals_missing(&twice));
        if values[..len].iter().any(Option::is_some) {
            prop_assert_eq!(once.column("x").expect("x").null_count(), 0);
        }
    }

    #[test]
    fn time_series_training_precedes_testing(
        days in prop::collection::vec(0i32..400, 2..80),
        fraction in 0.01f64..0.99,
    ) {
        let mut days = days;
        days.sort_unstable();
        let config = SplitConfig::new(SplitMethod::TimeSeries, fraction);
        let out = split_into_sets(dated(&days), &config).expect("split");

        let dates = epoch_seconds(&out, DATE).expect("dates");
        let labels = string_values(&out, SET).expect("set");
        let of_set = |set: &str| -> Vec<i64> {
            dates
                .iter()
                .zip(&labels)
                .filter(|(_, label)| label.as_deref() == Some(set))
                .filter_map(|(date, _)| *date)
                .collect()
        };
        let training = of_set("training");
        let testing = of_set("testing");
        if let (Some(last), Some(first)) = (training.iter().max(), testing.iter().min()) {
            prop_assert!(last <= first, "training {last} after testing {first}");
        }
    }

    #[test]
    fn normalised_series_averages_every_draw(
        days in prop::collection::vec(0i32..6, 4..30),
        n_samples in 1usize..8,
        workers in 1usize..4,
        replace in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let prepared = prepare_data(observations(&days), &PrepareOptions::default())
            .expect("prepare");
        let predictor = Linear { features: covariates() };
        let config = NormaliseConfig::new(n_samples)
            .with_replace(replace)
            .with_seed(seed)
            .with_workers(Some(workers));
        let out = normalise(&predictor, &prepared, &covariates(), &config, &NoProgress)
            .expect("normalise");

        let serial = normalise(
            &predictor,
            &prepared,
            &covariates(),
            &config.clone().with_workers(Some(1)),
            &NoProgress,
        )
        .expect("normalise");
        prop_assert!(out.equals_missing(&serial));

        let frame = prepared.frame();
        let n = frame.height();
        let mut row_sums = vec![0.0; n];
        for iteration in 0..n_samples {
            let indices = IdxCa::from_vec("idx".into(), draw_indices(n, replace, seed, iteration));
            let mut resampled = frame.clone();
            for name in covariates() {
                let column = frame
                    .column(&name)
                    .expect("column")
                    .as_materialized_series()
                    .take(&indices)
                    .expect("take");
                resampled.with_column(column).expect("replace");
            }
            let predictions = predictor.predict(&resampled).expect("predict");
            for (sum, prediction) in row_sums.iter_mut().zip(predictions) {
                *sum += prediction;
            }
        }

        let dates = epoch_seconds(frame, DATE).expect("dates");
        let values = f64_values(frame, VALUE).expect("value");
        let mut groups: BTreeMap<i64, (f64, f64, usize)> = BTreeMap::new();
        for row in 0..n {
            let key = dates[row].expect("date");
            let entry = groups.entry(key).or_insert((0.0, 0.0, 0));
            entry.0 += values[row].expect("value");
            entry.1 += row_sums[row];
            entry.2 += 1;
        }

        prop_assert_eq!(out.height(), groups.len());
        let out_dates = epoch_seconds(&out, DATE).expect("dates");
        let observed = f64_values(&out, OBSERVED).expect("observed");
        let deweathered = f64_values(&out, DEWEATHERED).expect("deweathered");
        for (row, (key, (value_total, prediction_total, size))) in groups.into_iter().enumerate() {
            prop_assert_eq!(out_dates[row], Some(key));
            let expected_observed = value_total / size as f64;
            let expected_deweathered = prediction_total / (size * n_samples) as f64;
            prop_assert!(close(observed[row].expect("observed"), expected_observed));
            prop_assert!(close(deweathered[row].expect("deweathered"), expected_deweathered));
        }
    }
}

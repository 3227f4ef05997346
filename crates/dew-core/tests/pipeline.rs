//! End-to-end runs through preparation, training and normalisation.

use std::sync::Mutex;

use dew_common::f64_values;
use dew_model::{
    DATE, DATE_UNIX, DEWEATHERED, DataError, DeweatherError, NormaliseConfig, OBSERVED,
    PrepareOptions, RunConfig, SchemaError, SplitConfig, SplitMethod, TrainConfig, TrainingError,
    VALUE,
};
use dew_core::{
    NoProgress, ProgressObserver, default_feature_names, draw_indices, normalise, prepare_data,
    resample_variables, run_deweather,
};
use dew_train::{Predictor, RegressionBackend};
use polars::prelude::{
    DataFrame, DataType, IdxCa, IntoColumn, NamedFrom, NewChunkedArray, Series,
};

/// Predicts `temp + 2 * wind`.
#[derive(Debug)]
struct WeightedSum {
    features: Vec<String>,
}

impl Predictor for WeightedSum {
    fn predict(&self, frame: &DataFrame) -> Result<Vec<f64>, TrainingError> {
        let read = |name: &str| {
            f64_values(frame, name).map_err(|e| TrainingError::Prediction(e.to_string()))
        };
        let temp = read("temp")?;
        let wind = read("wind")?;
        Ok(temp
            .iter()
            .zip(&wind)
            .map(|(t, w)| t.unwrap_or(0.0) + 2.0 * w.unwrap_or(0.0))
            .collect())
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn describe(&self) -> String {
        "weighted sum".to_string()
    }
}

struct WeightedSumBackend;

impl RegressionBackend for WeightedSumBackend {
    fn name(&self) -> &str {
        "weighted-sum"
    }

    fn fit(
        &self,
        features: &DataFrame,
        _target: &[f64],
        _config: &TrainConfig,
    ) -> Result<Box<dyn Predictor>, TrainingError> {
        let features = features
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        Ok(Box::new(WeightedSum { features }))
    }
}

#[derive(Default)]
struct RecordingProgress {
    checkpoints: Mutex<Vec<usize>>,
}

impl ProgressObserver for RecordingProgress {
    fn on_progress(&self, completed: usize, _total: usize) {
        if let Ok(mut checkpoints) = self.checkpoints.lock() {
            checkpoints.push(completed);
        }
    }
}

fn daily_table(n: usize) -> DataFrame {
    let days: Vec<i32> = (0..n as i32).collect();
    let temp: Vec<f64> = (0..n).map(|i| 10.0 + (i % 11) as f64).collect();
    let wind: Vec<f64> = (0..n).map(|i| ((i * 7) % 5) as f64).collect();
    let value: Vec<f64> = (0..n)
        .map(|i| temp[i] + 2.0 * wind[i] + (i % 3) as f64)
        .collect();
    DataFrame::new(vec![
        Series::new(DATE.into(), days)
            .cast(&DataType::Date)
            .expect("date")
            .into_column(),
        Series::new(VALUE.into(), value).into_column(),
        Series::new("temp".into(), temp).into_column(),
        Series::new("wind".into(), wind).into_column(),
    ])
    .expect("frame")
}

fn features() -> Vec<String> {
    vec!["temp".to_string(), "wind".to_string()]
}

/// Per-row mean prediction over `n_samples` replayed draws of `variables`.
fn replayed_means(
    predictor: &dyn Predictor,
    frame: &DataFrame,
    variables: &[String],
    config: &NormaliseConfig,
) -> Vec<f64> {
    let n = frame.height();
    let mut sums = vec![0.0; n];
    for iteration in 0..config.n_samples {
        let drawn = draw_indices(n, config.replace, config.seed, iteration);
        let indices = IdxCa::from_vec("idx".into(), drawn);
        let mut resampled = frame.clone();
        for name in variables {
            let column = frame
                .column(name)
                .expect("column")
                .as_materialized_series()
                .take(&indices)
                .expect("take");
            resampled.with_column(column).expect("replace");
        }
        let predictions = predictor.predict(&resampled).expect("predict");
        for (sum, prediction) in sums.iter_mut().zip(predictions) {
            *sum += prediction;
        }
    }
    sums.into_iter()
        .map(|sum| sum / config.n_samples as f64)
        .collect()
}

fn run_config(n_samples: usize) -> RunConfig {
    RunConfig {
        normalise: NormaliseConfig::new(n_samples).with_seed(11),
        ..RunConfig::default()
    }
    .with_features(features())
}

#[test]
fn hundred_days_end_to_end() {
    let df = daily_table(100);
    let observed = f64_values(&df, VALUE).expect("value");
    let run = run_deweather(df, &run_config(50), &WeightedSumBackend, &NoProgress)
        .expect("run");

    assert_eq!(run.prepared.count(dew_model::SetLabel::Training), 75);
    assert_eq!(run.prepared.count(dew_model::SetLabel::Testing), 25);
    assert_eq!(run.features, features());

    let out = &run.normalised;
    assert_eq!(out.height(), 100);
    assert_eq!(
        out.get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .collect::<Vec<_>>(),
        vec![DATE, OBSERVED, DEWEATHERED]
    );
    assert_eq!(out.column(DATE).expect("date").dtype(), &DataType::Date);
    assert_eq!(f64_values(out, OBSERVED).expect("observed"), observed);
    assert!(
        f64_values(out, DEWEATHERED)
            .expect("deweathered")
            .iter()
            .all(|v| v.is_some_and(f64::is_finite))
    );

    let expected = replayed_means(
        run.predictor.as_ref(),
        run.prepared.frame(),
        &features(),
        &NormaliseConfig::new(50).with_seed(11),
    );
    let deweathered = f64_values(out, DEWEATHERED).expect("deweathered");
    for (row, (actual, expected)) in deweathered.iter().zip(&expected).enumerate() {
        let actual = actual.expect("present");
        assert!(
            (actual - expected).abs() < 1e-9,
            "row {row}: {actual} != {expected}"
        );
    }
}

#[test]
fn result_does_not_depend_on_worker_count() {
    let prepared = prepare_data(daily_table(60), &PrepareOptions::default()).expect("prepare");
    let predictor = WeightedSum {
        features: features(),
    };
    let run = |workers| {
        let config = NormaliseConfig::new(23).with_seed(3).with_workers(Some(workers));
        normalise(&predictor, &prepared, &features(), &config, &NoProgress).expect("normalise")
    };
    let single = run(1);
    assert!(single.equals_missing(&run(2)));
    assert!(single.equals_missing(&run(5)));
}

#[test]
fn single_permutation_matches_one_prediction_pass() {
    let prepared = prepare_data(daily_table(30), &PrepareOptions::default()).expect("prepare");
    let predictor = WeightedSum {
        features: features(),
    };
    let config = NormaliseConfig::new(1).with_replace(false).with_seed(8);
    let out = normalise(&predictor, &prepared, &features(), &config, &NoProgress)
        .expect("normalise");

    let frame = prepared.frame();
    let indices = IdxCa::from_vec("idx".into(), draw_indices(frame.height(), false, 8, 0));
    let mut resampled = frame.clone();
    for name in features() {
        let drawn = frame
            .column(&name)
            .expect("column")
            .as_materialized_series()
            .take(&indices)
            .expect("take");
        resampled.with_column(drawn).expect("replace");
    }
    let expected: Vec<Option<f64>> = predictor
        .predict(&resampled)
        .expect("predict")
        .into_iter()
        .map(Some)
        .collect();
    assert_eq!(f64_values(&out, DEWEATHERED).expect("deweathered"), expected);
}

#[test]
fn repeated_timestamps_are_averaged() {
    let mut df = daily_table(12);
    let days: Vec<i32> = (0..12).map(|i| i / 2).collect();
    df.with_column(
        Series::new(DATE.into(), days)
            .cast(&DataType::Date)
            .expect("date"),
    )
    .expect("date");
    let prepared = prepare_data(df, &PrepareOptions::default()).expect("prepare");
    let predictor = WeightedSum {
        features: features(),
    };
    let out = normalise(
        &predictor,
        &prepared,
        &features(),
        &NormaliseConfig::new(4),
        &NoProgress,
    )
    .expect("normalise");
    assert_eq!(out.height(), 6);
}

#[test]
fn zero_samples_yield_an_empty_series() {
    let prepared = prepare_data(daily_table(10), &PrepareOptions::default()).expect("prepare");
    let predictor = WeightedSum {
        features: features(),
    };
    let out = normalise(
        &predictor,
        &prepared,
        &features(),
        &NormaliseConfig::new(0),
        &NoProgress,
    )
    .expect("normalise");
    assert_eq!(out.height(), 0);
    assert_eq!(out.width(), 3);
}

#[test]
fn progress_reaches_the_total() {
    let prepared = prepare_data(daily_table(20), &PrepareOptions::default()).expect("prepare");
    let predictor = WeightedSum {
        features: features(),
    };
    let progress = RecordingProgress::default();
    let config = NormaliseConfig::new(17).with_workers(Some(2));
    normalise(&predictor, &prepared, &features(), &config, &progress).expect("normalise");

    let checkpoints = progress.checkpoints.lock().expect("lock").clone();
    assert_eq!(checkpoints.last(), Some(&17));
    assert!(checkpoints.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn renamed_value_column_is_used() {
    let mut df = daily_table(40);
    df.rename(VALUE, "no2".into()).expect("rename");
    let mut config = run_config(5);
    config.prepare = PrepareOptions::default()
        .with_value_column("no2")
        .with_split(SplitConfig::new(SplitMethod::TimeSeries, 0.5));
    let run = run_deweather(df, &config, &WeightedSumBackend, &NoProgress).expect("run");
    assert!(run.prepared.has_column(VALUE));
    assert!(!run.prepared.has_column("no2"));
    assert_eq!(run.prepared.count(dew_model::SetLabel::Training), 20);
}

#[test]
fn value_column_conflict_is_rejected() {
    let mut df = daily_table(10);
    df.with_column(Series::new("no2".into(), vec![1.0; 10]))
        .expect("no2");
    let options = PrepareOptions::default().with_value_column("no2");
    let err = prepare_data(df, &options).unwrap_err();
    assert!(matches!(
        err,
        DeweatherError::Schema(SchemaError::ColumnConflict { .. })
    ));
}

#[test]
fn missing_date_stops_before_training() {
    let df = daily_table(10).drop(DATE).expect("drop");
    let err = run_deweather(df, &run_config(5), &WeightedSumBackend, &NoProgress).unwrap_err();
    assert!(matches!(
        err,
        DeweatherError::Schema(SchemaError::MissingColumn { .. })
    ));
}

#[test]
fn default_features_exclude_reserved_columns() {
    let prepared = prepare_data(daily_table(10), &PrepareOptions::default()).expect("prepare");
    let names = dew_core::default_feature_names(&prepared);
    assert_eq!(
        names,
        vec!["temp", "wind", "date_unix", "day_julian", "weekday", "hour"]
    );
}

#[test]
fn missing_targets_are_dropped_without_imputation() {
    let mut df = daily_table(8);
    df.with_column(Series::new(
        VALUE.into(),
        &[Some(1.0), None, Some(3.0), Some(4.0), None, Some(6.0), Some(7.0), Some(8.0)],
    ))
    .expect("value");
    let options = PrepareOptions::default()
        .with_impute(false)
        .with_drop_missing_target(true);
    let prepared = prepare_data(df, &options).expect("prepare");
    assert_eq!(prepared.height(), 6);
    assert_eq!(prepared.frame().column(VALUE).expect("value").null_count(), 0);
}

#[test]
fn missing_targets_are_kept_unless_dropped() {
    let mut df = daily_table(4);
    df.with_column(Series::new(VALUE.into(), &[Some(1.0), None, Some(3.0), None]))
        .expect("value");
    let prepared = prepare_data(df, &PrepareOptions::default().with_impute(false))
        .expect("prepare");
    assert_eq!(prepared.height(), 4);
    assert_eq!(prepared.frame().column(VALUE).expect("value").null_count(), 2);
}

#[test]
fn default_resampling_keeps_the_trend_fixed() {
    let prepared = prepare_data(daily_table(10), &PrepareOptions::default()).expect("prepare");
    let names = default_feature_names(&prepared);
    assert!(names.iter().any(|name| name == DATE_UNIX));

    let variables =
        resample_variables(&prepared, &names, &NormaliseConfig::new(5)).expect("variables");
    assert!(!variables.iter().any(|name| name == DATE_UNIX));
    assert_eq!(variables, vec!["temp", "wind", "day_julian", "weekday", "hour"]);
}

#[test]
fn explicit_resampling_variables_are_checked() {
    let prepared = prepare_data(daily_table(10), &PrepareOptions::default()).expect("prepare");
    let check = |names: &[&str]| {
        let config =
            NormaliseConfig::new(5).with_variables(names.iter().map(|n| n.to_string()).collect());
        resample_variables(&prepared, &features(), &config)
    };

    assert_eq!(check(&["wind"]).expect("variables"), vec!["wind"]);
    assert!(matches!(
        check(&[VALUE]).unwrap_err(),
        DeweatherError::Data(DataError::ProtectedColumn { .. })
    ));
    assert!(matches!(
        check(&["pressure"]).unwrap_err(),
        DeweatherError::Data(DataError::UnknownFeature { .. })
    ));
    assert!(matches!(
        check(&["temp", "temp"]).unwrap_err(),
        DeweatherError::Data(DataError::DuplicateFeature { .. })
    ));
}

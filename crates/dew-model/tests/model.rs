//! Serialisation tests for the configuration model.

use dew_model::{
    Estimator, Metric, NormaliseConfig, RunConfig, SplitConfig, SplitMethod, TrainConfig,
};

#[test]
fn default_run_config_json() {
    let config = RunConfig::default();
    let json = serde_json::to_string_pretty(&config).expect("serialize config");
    insta::assert_snapshot!(json, @r#"
    {
      "features": [],
      "prepare": {
        "value_column": "value",
        "impute": true,
        "drop_missing_target": false,
        "replace_derived": false,
        "split": {
          "method": "random",
          "fraction": 0.75,
          "seed": 42
        }
      },
      "train": {
        "time_budget_secs": 60,
        "metric": "r2",
        "estimators": [
          "linear",
          "tree",
          "forest"
        ],
        "task": "regression",
        "seed": 7654321
      },
      "normalise": {
        "n_samples": 300,
        "replace": true,
        "seed": 7654321
      }
    }
    "#);
}

#[test]
fn partial_toml_fills_defaults() {
    let text = r#"
features = ["temp", "wind"]

[prepare]
value_column = "no2"

[prepare.split]
method = "time_series"

[train]
metric = "rmse"
estimators = ["tree"]

[normalise]
n_samples = 50
replace = false
workers = 2
"#;
    let config: RunConfig = toml::from_str(text).expect("parse toml");
    assert_eq!(config.features, vec!["temp", "wind"]);
    assert_eq!(config.prepare.value_column, "no2");
    assert!(config.prepare.impute);
    assert_eq!(config.prepare.split.method, SplitMethod::TimeSeries);
    assert_eq!(config.prepare.split.fraction, 0.75);
    assert_eq!(config.train.metric, Metric::Rmse);
    assert_eq!(config.train.estimators, vec![Estimator::Tree]);
    assert_eq!(config.train.time_budget_secs, 60);
    assert_eq!(config.normalise.n_samples, 50);
    assert!(!config.normalise.replace);
    assert_eq!(config.normalise.workers, Some(2));
    assert_eq!(config.normalise.variables, None);
}

#[test]
fn toml_round_trip() {
    let config = RunConfig {
        features: vec!["temp".to_string()],
        train: TrainConfig::default().with_metric(Metric::Mae),
        normalise: NormaliseConfig::new(10).with_variables(vec!["temp".to_string()]),
        ..RunConfig::default()
    };
    let text = toml::to_string(&config).expect("serialize toml");
    let round: RunConfig = toml::from_str(&text).expect("parse toml");
    assert_eq!(round, config);
}

#[test]
fn split_config_builder() {
    let split = SplitConfig::new(SplitMethod::TimeSeries, 0.5).with_seed(7);
    assert_eq!(split.method, SplitMethod::TimeSeries);
    assert_eq!(split.fraction, 0.5);
    assert_eq!(split.seed, 7);
}

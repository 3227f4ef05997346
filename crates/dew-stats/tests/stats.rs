//! Statistics over a prepared table and their general bounds.

use dew_model::{DATE, DATE_UNIX, SET, SetLabel, TrainingError, VALUE};
use dew_stats::{compute_stats, model_stats};
use dew_train::Predictor;
use dew_validate::PreparedTable;
use polars::prelude::{DataFrame, DataType, IntoColumn, NamedFrom, Series};
use proptest::prelude::*;

/// Predicts every row as `offset` above its observed value.
#[derive(Debug)]
struct Shifted {
    offset: f64,
    features: Vec<String>,
}

impl Predictor for Shifted {
    fn predict(&self, frame: &DataFrame) -> Result<Vec<f64>, TrainingError> {
        let values = dew_common::f64_values(frame, VALUE)
            .map_err(|e| TrainingError::Prediction(e.to_string()))?;
        Ok(values
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN) + self.offset)
            .collect())
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn describe(&self) -> String {
        format!("shifted by {}", self.offset)
    }
}

fn table() -> PreparedTable {
    let n = 8;
    let labels: Vec<&str> = (0..n)
        .map(|i| if i < 6 { "training" } else { "testing" })
        .collect();
    let frame = DataFrame::new(vec![
        Series::new(DATE.into(), (0..n).collect::<Vec<i32>>())
            .cast(&DataType::Date)
            .expect("date")
            .into_column(),
        Series::new(VALUE.into(), (1..=n).map(f64::from).collect::<Vec<_>>()).into_column(),
        Series::new(DATE_UNIX.into(), (0..n as i64).collect::<Vec<_>>()).into_column(),
        Series::new(SET.into(), labels).into_column(),
    ])
    .expect("frame");
    PreparedTable::new(frame).expect("prepared")
}

#[test]
fn stats_cover_only_the_requested_subset() {
    let predictor = Shifted {
        offset: 1.0,
        features: vec![DATE_UNIX.to_string()],
    };
    let testing = model_stats(&predictor, &table(), SetLabel::Testing).expect("stats");
    assert_eq!(testing.n, 2);
    assert!((testing.mb - 1.0).abs() < 1e-12);
    assert!((testing.rmse - 1.0).abs() < 1e-12);

    let training = model_stats(&predictor, &table(), SetLabel::Training).expect("stats");
    assert_eq!(training.n, 6);
    assert!((training.r - 1.0).abs() < 1e-12);
}

proptest! {
    #[test]
    fn bounded_statistics(
        pairs in prop::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 3..50),
    ) {
        let (observed, modelled): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let stats = compute_stats(&observed, &modelled);
        prop_assert_eq!(stats.n, observed.len());
        prop_assert!(stats.mge >= 0.0);
        prop_assert!(stats.rmse >= stats.mge - 1e-9);
        prop_assert!(stats.fac2.is_nan() || (0.0..=1.0).contains(&stats.fac2));
        prop_assert!(stats.ioa.is_nan() || (-1.0..=1.0).contains(&stats.ioa));
        prop_assert!(stats.r.is_nan() || (-1.0..=1.0).contains(&stats.r));
        prop_assert!(stats.p_value.is_nan() || (0.0..=1.0).contains(&stats.p_value));
    }
}

//! Regression scores used to rank candidate models.
//!
//! Every function returns `NaN` when the inputs are empty or of unequal
//! length.

use dew_model::Metric;

/// Mean absolute error. Lower is better.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    sum / actual.len() as f64
}

/// Mean squared error. Lower is better.
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    sum / actual.len() as f64
}

pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

/// Mean absolute percentage error as a fraction.
///
/// Rows whose actual value is zero are skipped; `NaN` if none remain.
pub fn mape(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let (sum, count) = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| a.abs() > 1e-10)
        .fold((0.0, 0usize), |(sum, count), (a, p)| {
            (sum + ((a - p) / a).abs(), count + 1)
        });
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Coefficient of determination. Higher is better; `NaN` for a constant target.
pub fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let total: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if total <= f64::EPSILON {
        return f64::NAN;
    }
    let residual: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    1.0 - residual / total
}

pub fn score(metric: Metric, actual: &[f64], predicted: &[f64]) -> f64 {
    match metric {
        Metric::Mae => mae(actual, predicted),
        Metric::Mse => mse(actual, predicted),
        Metric::R2 => r2(actual, predicted),
        Metric::Rmse => rmse(actual, predicted),
        Metric::Mape => mape(actual, predicted),
    }
}

/// True when `candidate` ranks strictly ahead of `incumbent`.
///
/// Non-finite scores never win.
pub fn is_better(metric: Metric, candidate: f64, incumbent: f64) -> bool {
    if !candidate.is_finite() {
        return false;
    }
    if !incumbent.is_finite() {
        return true;
    }
    if metric.higher_is_better() {
        candidate > incumbent
    } else {
        candidate < incumbent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTUAL: [f64; 4] = [1.0, 2.0, 3.0, 4.0];
    const PREDICTED: [f64; 4] = [1.5, 2.0, 2.5, 4.0];

    #[test]
    fn error_metrics() {
        assert!((mae(&ACTUAL, &PREDICTED) - 0.25).abs() < 1e-12);
        assert!((mse(&ACTUAL, &PREDICTED) - 0.125).abs() < 1e-12);
        assert!((rmse(&ACTUAL, &PREDICTED) - 0.125f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn r2_of_perfect_fit_is_one() {
        assert_eq!(r2(&ACTUAL, &ACTUAL), 1.0);
        assert!((r2(&ACTUAL, &PREDICTED) - 0.9).abs() < 1e-12);
        assert!(r2(&[2.0, 2.0], &[2.0, 2.0]).is_nan());
    }

    #[test]
    fn mape_skips_zero_actuals() {
        let value = mape(&[0.0, 2.0], &[5.0, 1.0]);
        assert!((value - 0.5).abs() < 1e-12);
        assert!(mape(&[0.0], &[1.0]).is_nan());
    }

    #[test]
    fn mismatched_lengths_are_nan() {
        assert!(mae(&[1.0], &[]).is_nan());
        assert!(score(Metric::R2, &[], &[]).is_nan());
    }

    #[test]
    fn ranking_follows_metric_direction() {
        assert!(is_better(Metric::R2, 0.9, 0.5));
        assert!(is_better(Metric::Rmse, 0.5, 0.9));
        assert!(!is_better(Metric::Mae, f64::NAN, 1.0));
        assert!(is_better(Metric::Mae, 1.0, f64::NAN));
    }
}

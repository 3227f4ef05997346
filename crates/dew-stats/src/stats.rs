//! Model statistics: FAC2, bias and error measures, correlation, COE and IOA.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;

use dew_common::f64_values;
use dew_model::{Result, SetLabel, TrainingError, VALUE};
use dew_train::Predictor;
use dew_validate::PreparedTable;

/// Agreement between modelled and observed values.
///
/// Quantities that are undefined for the given pairs (for example `r` with a
/// constant series) are `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelStats {
    /// Number of pairs where both values are finite.
    pub n: usize,
    /// Fraction of pairs with modelled/observed between 0.5 and 2.
    pub fac2: f64,
    /// Mean bias.
    pub mb: f64,
    /// Mean gross error.
    pub mge: f64,
    /// Normalised mean bias.
    pub nmb: f64,
    /// Normalised mean gross error.
    pub nmge: f64,
    pub rmse: f64,
    /// Pearson correlation.
    pub r: f64,
    /// Two-sided p-value of `r` under a Student t distribution.
    pub p_value: f64,
    /// Coefficient of efficiency.
    pub coe: f64,
    /// Index of agreement.
    pub ioa: f64,
}

impl ModelStats {
    /// Rows in the order they are usually reported.
    pub fn rows(&self) -> [(&'static str, f64); 11] {
        [
            ("n", self.n as f64),
            ("FAC2", self.fac2),
            ("MB", self.mb),
            ("MGE", self.mge),
            ("NMB", self.nmb),
            ("NMGE", self.nmge),
            ("RMSE", self.rmse),
            ("r", self.r),
            ("p_value", self.p_value),
            ("COE", self.coe),
            ("IOA", self.ioa),
        ]
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Statistics over the pairs where both values are finite.
///
/// Slices of different lengths are compared up to the shorter one.
pub fn compute_stats(observed: &[f64], modelled: &[f64]) -> ModelStats {
    let pairs: Vec<(f64, f64)> = observed
        .iter()
        .zip(modelled)
        .filter(|(o, m)| o.is_finite() && m.is_finite())
        .map(|(&o, &m)| (o, m))
        .collect();
    let n = pairs.len();
    if n == 0 {
        return ModelStats {
            n,
            fac2: f64::NAN,
            mb: f64::NAN,
            mge: f64::NAN,
            nmb: f64::NAN,
            nmge: f64::NAN,
            rmse: f64::NAN,
            r: f64::NAN,
            p_value: f64::NAN,
            coe: f64::NAN,
            ioa: f64::NAN,
        };
    }
    let count = n as f64;

    let ratios: Vec<f64> = pairs
        .iter()
        .map(|(o, m)| m / o)
        .filter(|q| q.is_finite())
        .collect();
    let fac2 = ratio(
        ratios.iter().filter(|q| (0.5..=2.0).contains(*q)).count() as f64,
        ratios.len() as f64,
    );

    let sum_obs: f64 = pairs.iter().map(|(o, _)| o).sum();
    let bias: f64 = pairs.iter().map(|(o, m)| m - o).sum();
    let gross: f64 = pairs.iter().map(|(o, m)| (m - o).abs()).sum();
    let squared: f64 = pairs.iter().map(|(o, m)| (m - o).powi(2)).sum();

    let mean_obs = sum_obs / count;
    let spread: f64 = pairs.iter().map(|(o, _)| (o - mean_obs).abs()).sum();

    let coe = 1.0 - ratio(gross, spread);
    let ioa = if gross <= 2.0 * spread {
        1.0 - ratio(gross, 2.0 * spread)
    } else {
        ratio(2.0 * spread, gross) - 1.0
    };

    let (r, p_value) = pearson(&pairs);
    ModelStats {
        n,
        fac2,
        mb: bias / count,
        mge: gross / count,
        nmb: ratio(bias, sum_obs),
        nmge: ratio(gross, sum_obs),
        rmse: (squared / count).sqrt(),
        r,
        p_value,
        coe,
        ioa,
    }
}

/// Pearson correlation and its two-sided p-value.
fn pearson(pairs: &[(f64, f64)]) -> (f64, f64) {
    let n = pairs.len() as f64;
    let mean_o = pairs.iter().map(|(o, _)| o).sum::<f64>() / n;
    let mean_m = pairs.iter().map(|(_, m)| m).sum::<f64>() / n;
    let (mut cov, mut var_o, mut var_m) = (0.0, 0.0, 0.0);
    for (o, m) in pairs {
        cov += (o - mean_o) * (m - mean_m);
        var_o += (o - mean_o).powi(2);
        var_m += (m - mean_m).powi(2);
    }
    let r = ratio(cov, (var_o * var_m).sqrt()).clamp(-1.0, 1.0);
    if r.is_nan() || pairs.len() < 3 {
        return (r, f64::NAN);
    }
    if r.abs() == 1.0 {
        return (r, 0.0);
    }
    let freedom = n - 2.0;
    let t = r * (freedom / (1.0 - r * r)).sqrt();
    let p_value = match StudentsT::new(0.0, 1.0, freedom) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).min(1.0),
        Err(_) => f64::NAN,
    };
    (r, p_value)
}

/// Predicts on the `set` subset of `prepared` and scores against `value`.
pub fn model_stats(
    predictor: &dyn Predictor,
    prepared: &PreparedTable,
    set: SetLabel,
) -> Result<ModelStats> {
    let subset = prepared.subset(set)?;
    if subset.height() == 0 {
        debug!(set = %set, "no rows to evaluate");
        return Ok(compute_stats(&[], &[]));
    }
    let modelled = predictor.predict(&subset)?;
    if modelled.len() != subset.height() {
        return Err(TrainingError::Prediction(format!(
            "predictor returned {} values for {} rows",
            modelled.len(),
            subset.height()
        ))
        .into());
    }
    let observed: Vec<f64> = f64_values(&subset, VALUE)?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    Ok(compute_stats(&observed, &modelled))
}

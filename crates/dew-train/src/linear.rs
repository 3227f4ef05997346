//! Ridge regression on standardised features.

use dew_model::TrainingError;

use crate::matrix::Matrix;

/// Fitted ridge model, stored in the original feature scale.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeRegression {
    lambda: f64,
    intercept: f64,
    means: Vec<f64>,
    scales: Vec<f64>,
    coefficients: Vec<f64>,
}

impl RidgeRegression {
    /// Fits `y ~ x` minimising `|y - Xb|^2 / n + lambda * |b|^2` over the
    /// standardised columns of `x`. Constant columns get a zero coefficient.
    pub fn fit(x: &Matrix, y: &[f64], lambda: f64) -> Result<Self, TrainingError> {
        let n = x.rows();
        let d = x.cols();
        if n == 0 || y.len() != n {
            return Err(TrainingError::InsufficientData {
                required: 1,
                actual: n.min(y.len()),
            });
        }
        let nf = n as f64;
        let y_mean = y.iter().sum::<f64>() / nf;

        let mut means = vec![0.0; d];
        let mut scales = vec![1.0; d];
        for j in 0..d {
            let column = x.column(j);
            let mean = column.iter().sum::<f64>() / nf;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / nf;
            means[j] = mean;
            scales[j] = if var > 1e-12 { var.sqrt() } else { 0.0 };
        }

        let standardised = |i: usize, j: usize| {
            if scales[j] == 0.0 {
                0.0
            } else {
                (x.get(i, j) - means[j]) / scales[j]
            }
        };

        // Normal equations: (Z'Z / n + lambda I) b = Z'(y - mean) / n
        let mut gram = vec![0.0; d * d];
        let mut rhs = vec![0.0; d];
        for i in 0..n {
            let z: Vec<f64> = (0..d).map(|j| standardised(i, j)).collect();
            let centred = y[i] - y_mean;
            for a in 0..d {
                rhs[a] += z[a] * centred / nf;
                for b in 0..=a {
                    gram[a * d + b] += z[a] * z[b] / nf;
                }
            }
        }
        for a in 0..d {
            for b in 0..a {
                gram[b * d + a] = gram[a * d + b];
            }
            gram[a * d + a] += lambda;
        }

        let beta = cholesky_solve(&gram, &rhs, d)?;
        let coefficients: Vec<f64> = beta
            .iter()
            .zip(&scales)
            .map(|(b, s)| if *s == 0.0 { 0.0 } else { b / s })
            .collect();
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&means)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        Ok(Self {
            lambda,
            intercept,
            means,
            scales,
            coefficients,
        })
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

/// Solves `A x = b` for a symmetric positive-definite `A` (row-major, `d x d`).
fn cholesky_solve(a: &[f64], b: &[f64], d: usize) -> Result<Vec<f64>, TrainingError> {
    let mut l = vec![0.0; d * d];
    for i in 0..d {
        for j in 0..=i {
            let mut sum = a[i * d + j];
            for k in 0..j {
                sum -= l[i * d + k] * l[j * d + k];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(TrainingError::NumericalFailure(
                        "normal equations are not positive definite".to_string(),
                    ));
                }
                l[i * d + i] = sum.sqrt();
            } else {
                l[i * d + j] = sum / l[j * d + j];
            }
        }
    }

    // Forward substitution: L z = b
    let mut z = vec![0.0; d];
    for i in 0..d {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i * d + k] * z[k];
        }
        z[i] = sum / l[i * d + i];
    }
    // Back substitution: L' x = z
    let mut x = vec![0.0; d];
    for i in (0..d).rev() {
        let mut sum = z[i];
        for k in i + 1..d {
            sum -= l[k * d + i] * x[k];
        }
        x[i] = sum / l[i * d + i];
    }
    Ok(x)
}

//! Conversion of feature columns into a numeric design matrix.

use polars::prelude::DataFrame;

use dew_common::{ColumnKind, epoch_seconds, f64_values, string_values};
use dew_model::TrainingError;

use crate::matrix::Matrix;

#[derive(Debug, Clone, PartialEq)]
enum Encoding {
    /// Numbers, booleans and timestamps (as epoch seconds).
    Numeric { temporal: bool },
    /// Text mapped to the position of its level in the sorted training levels.
    Ordinal { levels: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
struct EncodedColumn {
    name: String,
    encoding: Encoding,
    /// Substitute for missing and unseen values: the training mean.
    fill: f64,
}

/// Learned mapping from feature columns to matrix columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEncoder {
    columns: Vec<EncodedColumn>,
    names: Vec<String>,
}

impl FeatureEncoder {
    /// Learns the encoding of `names` from the training rows in `frame`.
    pub fn fit(frame: &DataFrame, names: &[String]) -> Result<Self, TrainingError> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let dtype = frame
                .column(name)
                .map_err(|_| TrainingError::Prediction(format!("missing feature `{name}`")))?
                .dtype()
                .clone();
            let encoding = match ColumnKind::of(&dtype) {
                ColumnKind::Integer | ColumnKind::Float | ColumnKind::Boolean => {
                    Encoding::Numeric { temporal: false }
                }
                ColumnKind::Temporal => Encoding::Numeric { temporal: true },
                ColumnKind::Text => {
                    let mut levels: Vec<String> = text(frame, name)?.into_iter().flatten().collect();
                    levels.sort();
                    levels.dedup();
                    Encoding::Ordinal { levels }
                }
                ColumnKind::Other => {
                    return Err(TrainingError::UnsupportedFeature {
                        name: name.clone(),
                        dtype: dtype.to_string(),
                    });
                }
            };
            let mut column = EncodedColumn {
                name: name.clone(),
                encoding,
                fill: 0.0,
            };
            let raw = column.raw_values(frame)?;
            let observed: Vec<f64> = raw.into_iter().flatten().collect();
            if !observed.is_empty() {
                column.fill = observed.iter().sum::<f64>() / observed.len() as f64;
            }
            columns.push(column);
        }
        Ok(Self {
            columns,
            names: names.to_vec(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Encodes every row of `frame`. Extra columns are ignored.
    pub fn transform(&self, frame: &DataFrame) -> Result<Matrix, TrainingError> {
        let rows = frame.height();
        let mut encoded = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let values = column
                .raw_values(frame)?
                .into_iter()
                .map(|value| value.unwrap_or(column.fill))
                .collect();
            encoded.push(values);
        }
        Ok(Matrix::from_columns(&encoded, rows))
    }
}

impl EncodedColumn {
    /// Numeric view of the column; `None` marks a value that needs the fill.
    fn raw_values(&self, frame: &DataFrame) -> Result<Vec<Option<f64>>, TrainingError> {
        let name = self.name.as_str();
        let values = match &self.encoding {
            Encoding::Numeric { temporal: false } => f64_values(frame, name)
                .map_err(|err| prediction_error(name, &err))?
                .into_iter()
                .map(|value| value.filter(|v| v.is_finite()))
                .collect(),
            Encoding::Numeric { temporal: true } => epoch_seconds(frame, name)
                .map_err(|err| prediction_error(name, &err))?
                .into_iter()
                .map(|value| value.map(|v| v as f64))
                .collect(),
            Encoding::Ordinal { levels } => text(frame, name)?
                .into_iter()
                .map(|value| {
                    value.and_then(|v| levels.binary_search(&v).ok().map(|code| code as f64))
                })
                .collect(),
        };
        Ok(values)
    }
}

fn text(frame: &DataFrame, name: &str) -> Result<Vec<Option<String>>, TrainingError> {
    string_values(frame, name).map_err(|err| prediction_error(name, &err))
}

fn prediction_error(name: &str, err: &impl std::fmt::Display) -> TrainingError {
    TrainingError::Prediction(format!("cannot read feature `{name}`: {err}"))
}

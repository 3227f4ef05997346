//! Schema-checked prepared tables.

use polars::prelude::{BooleanChunked, DataFrame, DataType, NewChunkedArray, PolarsResult};

use dew_common::has_column;
use dew_model::{DATE, DerivedColumn, SET, SchemaError, SetLabel, VALUE};

use crate::check::{CheckMode, set_labels, validate_frame};

/// Column layout of an observation table, captured once.
///
/// Downstream stages consult these flags instead of probing the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// Dtype of the `date` column, if present.
    pub date_dtype: Option<DataType>,
    pub has_value: bool,
    pub has_set: bool,
    derived: [bool; DerivedColumn::ALL.len()],
    pub columns: Vec<String>,
}

impl TableSchema {
    pub fn of(df: &DataFrame) -> Self {
        let date_dtype = df.column(DATE).ok().map(|column| column.dtype().clone());
        let derived = DerivedColumn::ALL.map(|column| has_column(df, column.name()));
        Self {
            date_dtype,
            has_value: has_column(df, VALUE),
            has_set: has_column(df, SET),
            derived,
            columns: df
                .get_column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }

    pub fn has_derived(&self, column: DerivedColumn) -> bool {
        self.derived[column as usize]
    }

    /// Derived columns that still need to be computed.
    pub fn missing_derived(&self) -> Vec<DerivedColumn> {
        DerivedColumn::ALL
            .into_iter()
            .filter(|column| !self.has_derived(*column))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }
}

/// An observation table that passed the prepared-mode check.
///
/// Only constructible through [`PreparedTable::new`], so holders can rely on
/// `date`, `value`, `set` and `date_unix` being present and well formed.
#[derive(Debug, Clone)]
pub struct PreparedTable {
    frame: DataFrame,
    schema: TableSchema,
    labels: Vec<SetLabel>,
}

impl PreparedTable {
    pub fn new(frame: DataFrame) -> Result<Self, SchemaError> {
        validate_frame(&frame, CheckMode::Prepared)?;
        let labels = set_labels(&frame)?;
        let schema = TableSchema::of(&frame);
        Ok(Self {
            frame,
            schema,
            labels,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Split label of every row, in frame order.
    pub fn labels(&self) -> &[SetLabel] {
        &self.labels
    }

    pub fn count(&self, label: SetLabel) -> usize {
        self.labels.iter().filter(|row| **row == label).count()
    }

    /// Rows carrying `label`, in frame order.
    pub fn subset(&self, label: SetLabel) -> PolarsResult<DataFrame> {
        let mask: Vec<bool> = self.labels.iter().map(|row| *row == label).collect();
        let mask = BooleanChunked::from_slice("mask".into(), &mask);
        self.frame.filter(&mask)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.contains(name)
    }
}

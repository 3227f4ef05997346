//! Data preparation pipeline with ordered step execution.
//!
//! Each step implements [`PreparationStep`] and runs in order over the
//! table being prepared.
//!
//! # Standard Pipeline Order
//!
//! 1. **CheckRawStep** - `date` is present, temporal and complete
//! 2. **ValueColumnStep** - rename the target column to `value`
//! 3. **DropMissingTargetStep** - drop rows without a target (only when asked)
//! 4. **ImputeStep** - fill missing values (skipped when imputation is off)
//! 5. **DateVariablesStep** - derive `date_unix`, `day_julian`, `weekday`, `hour`
//! 6. **SplitStep** - assign `rowid` and `set`
//!
//! The result is then checked in prepared mode and wrapped in a
//! [`PreparedTable`].

use std::time::Instant;

use polars::prelude::DataFrame;
use tracing::{debug, info, info_span};

use dew_model::{PrepareOptions, Result, SchemaError, VALUE, is_protected};
use dew_validate::{CheckMode, PreparedTable, check_data};

use crate::features::add_date_variables;
use crate::impute::{drop_missing_targets, impute_values};
use crate::split::split_into_sets;

/// A single step in the preparation pipeline.
pub trait PreparationStep: Send + Sync {
    /// Transforms `df` in place.
    fn execute(&self, df: &mut DataFrame, options: &PrepareOptions) -> Result<()>;

    /// Name recorded in the execution log.
    fn step_name(&self) -> &str;

    /// Whether this step should be skipped for `options`.
    fn should_skip(&self, _options: &PrepareOptions) -> bool {
        false
    }
}

/// Names of the steps that actually ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparationState {
    pub executed_steps: Vec<String>,
}

/// An ordered pipeline of preparation steps.
pub struct PreparationPipeline {
    steps: Vec<Box<dyn PreparationStep>>,
}

impl Default for PreparationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl PreparationPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step to the end of the pipeline.
    pub fn add_step(mut self, step: Box<dyn PreparationStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Run every step in order, stopping at the first failure.
    pub fn execute(
        &self,
        mut df: DataFrame,
        options: &PrepareOptions,
    ) -> Result<(DataFrame, PreparationState)> {
        let mut state = PreparationState::default();
        for step in &self.steps {
            if step.should_skip(options) {
                debug!(step = step.step_name(), "step skipped");
                continue;
            }
            step.execute(&mut df, options)?;
            state.executed_steps.push(step.step_name().to_string());
        }
        Ok((df, state))
    }

    /// List step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.step_name()).collect()
    }
}

/// Build the standard preparation pipeline.
pub fn build_default_pipeline() -> PreparationPipeline {
    PreparationPipeline::new()
        .add_step(Box::new(CheckRawStep))
        .add_step(Box::new(ValueColumnStep))
        .add_step(Box::new(DropMissingTargetStep))
        .add_step(Box::new(ImputeStep))
        .add_step(Box::new(DateVariablesStep))
        .add_step(Box::new(SplitStep))
}

/// Step 1: reject tables without usable timestamps.
pub struct CheckRawStep;

impl PreparationStep for CheckRawStep {
    fn execute(&self, df: &mut DataFrame, _options: &PrepareOptions) -> Result<()> {
        *df = check_data(std::mem::take(df), CheckMode::Raw)?;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "check_raw"
    }
}

/// Step 2: rename the configured target column to `value`.
pub struct ValueColumnStep;

impl PreparationStep for ValueColumnStep {
    fn execute(&self, df: &mut DataFrame, options: &PrepareOptions) -> Result<()> {
        rename_value_column(df, &options.value_column)
    }

    fn step_name(&self) -> &str {
        "value_column"
    }
}

/// Step 3: remove rows whose target is missing.
pub struct DropMissingTargetStep;

impl PreparationStep for DropMissingTargetStep {
    fn execute(&self, df: &mut DataFrame, _options: &PrepareOptions) -> Result<()> {
        *df = drop_missing_targets(std::mem::take(df))?;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "drop_missing_target"
    }

    fn should_skip(&self, options: &PrepareOptions) -> bool {
        !options.drop_missing_target
    }
}

/// Step 4: fill missing values.
pub struct ImputeStep;

impl PreparationStep for ImputeStep {
    fn execute(&self, df: &mut DataFrame, _options: &PrepareOptions) -> Result<()> {
        *df = impute_values(std::mem::take(df), false)?;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "impute"
    }

    fn should_skip(&self, options: &PrepareOptions) -> bool {
        !options.impute
    }
}

/// Step 5: derive calendar and trend columns.
pub struct DateVariablesStep;

impl PreparationStep for DateVariablesStep {
    fn execute(&self, df: &mut DataFrame, options: &PrepareOptions) -> Result<()> {
        *df = add_date_variables(std::mem::take(df), options.replace_derived)?;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "date_variables"
    }
}

/// Step 6: assign rows to training and testing.
pub struct SplitStep;

impl PreparationStep for SplitStep {
    fn execute(&self, df: &mut DataFrame, options: &PrepareOptions) -> Result<()> {
        *df = split_into_sets(std::mem::take(df), &options.split)?;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "split"
    }
}

fn rename_value_column(df: &mut DataFrame, column: &str) -> Result<()> {
    if df.get_column_index(column).is_none() {
        return Err(SchemaError::MissingColumn {
            column: column.to_string(),
        }
        .into());
    }
    if column == VALUE {
        return Ok(());
    }
    if df.get_column_index(VALUE).is_some() {
        return Err(SchemaError::ColumnConflict {
            source_column: column.to_string(),
            target: VALUE.to_string(),
        }
        .into());
    }
    df.rename(column, VALUE.into())?;
    Ok(())
}

/// Runs the standard pipeline and returns the checked result.
pub fn prepare_data(df: DataFrame, options: &PrepareOptions) -> Result<PreparedTable> {
    let span = info_span!("prepare", rows = df.height(), columns = df.width());
    let _guard = span.enter();
    let start = Instant::now();

    let (df, state) = build_default_pipeline().execute(df, options)?;
    let prepared = PreparedTable::new(df)?;
    info!(
        steps = ?state.executed_steps,
        rows = prepared.height(),
        duration_ms = start.elapsed().as_millis() as u64,
        "data prepared"
    );
    Ok(prepared)
}

/// Every column that can serve as a model feature.
pub fn default_feature_names(prepared: &PreparedTable) -> Vec<String> {
    prepared
        .schema()
        .columns
        .iter()
        .filter(|name| !is_protected(name))
        .cloned()
        .collect()
}

//! Deweathering engine: preparation, resampling normalisation and the
//! end-to-end pipeline.
//!
//! A run goes through [`prepare_data`], then [`dew_train::train_model`],
//! then [`normalise`]. [`run_deweather`] chains the three.

pub mod features;
pub mod impute;
pub mod normalise;
pub mod pipeline;
pub mod prepare;
pub mod progress;
pub mod split;
mod timestamps;

pub use features::add_date_variables;
pub use impute::{bool_mode, drop_missing_targets, impute_values, median, text_mode};
pub use normalise::{draw_indices, normalise, resample_variables};
pub use pipeline::{DeweatherRun, run_deweather};
pub use prepare::{
    PreparationPipeline, PreparationState, PreparationStep, build_default_pipeline,
    default_feature_names, prepare_data,
};
pub use progress::{NoProgress, ProgressObserver, TracingProgress};
pub use split::{split_into_sets, training_size};

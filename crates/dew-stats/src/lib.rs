//! Agreement statistics between observed and modelled values.
//!
//! [`compute_stats`] works on plain slices; [`model_stats`] predicts on one
//! subset of a [`PreparedTable`] and compares against its `value` column.
//!
//! [`PreparedTable`]: dew_validate::PreparedTable

mod stats;

pub use stats::{ModelStats, compute_stats, model_stats};

//! Model training for the deweather pipeline.
//!
//! [`train_model`] validates a feature list against a [`PreparedTable`] and
//! delegates the fit to a [`RegressionBackend`]. [`AutoRegressor`] is the
//! built-in backend: a seeded search over ridge, tree and forest candidates.
//!
//! [`PreparedTable`]: dew_validate::PreparedTable

pub mod contract;
pub mod encode;
pub mod forest;
pub mod linear;
pub mod matrix;
pub mod metrics;
pub mod search;
pub mod train;
pub mod tree;

pub use contract::{Predictor, RegressionBackend};
pub use encode::FeatureEncoder;
pub use search::{AutoPredictor, AutoRegressor, Candidate, CandidateScore};
pub use train::{check_features, train_model};

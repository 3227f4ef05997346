pub mod columns;
pub mod error;
pub mod options;

pub use columns::{
    DATE, DATE_UNIX, DEWEATHERED, DerivedColumn, OBSERVED, PROTECTED_COLUMNS, ROW_ID, SET,
    SetLabel, VALUE, is_protected,
};
pub use error::{DataError, DeweatherError, Result, SchemaError, TrainingError};
pub use options::{
    Estimator, Metric, NormaliseConfig, PrepareOptions, RunConfig, SplitConfig, SplitMethod,
    TaskKind, TrainConfig,
};

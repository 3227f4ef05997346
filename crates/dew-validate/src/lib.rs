//! Schema validation for deweather observation tables.
//!
//! [`check_data`] guards the entry and exit of preparation; [`PreparedTable`]
//! is the checked form every later stage consumes.

pub mod check;
pub mod prepared;

pub use check::{CheckMode, check_data, validate_frame};
pub use prepared::{PreparedTable, TableSchema};

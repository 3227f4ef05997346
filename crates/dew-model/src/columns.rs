//! Reserved column names and labels of the observation table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Timestamp column every input table must carry.
pub const DATE: &str = "date";
/// Observed target column after the value column has been renamed.
pub const VALUE: &str = "value";
/// Split label column added by the set splitter.
pub const SET: &str = "set";
/// Original row position, assigned before splitting.
pub const ROW_ID: &str = "rowid";
/// Output column holding the observed value per timestamp.
pub const OBSERVED: &str = "Observed";
/// Output column holding the resampled counterfactual mean.
pub const DEWEATHERED: &str = "Deweathered";

/// Columns that are never treated as covariates or resampled.
pub const PROTECTED_COLUMNS: &[&str] = &[DATE, VALUE, SET, ROW_ID];

/// Returns true when `name` is one of the reserved bookkeeping columns.
pub fn is_protected(name: &str) -> bool {
    PROTECTED_COLUMNS.contains(&name)
}

/// Calendar and trend features derived from the `date` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedColumn {
    /// Seconds since the Unix epoch; the trend axis held fixed while resampling.
    DateUnix,
    /// Day of the year, 1-366.
    DayJulian,
    /// ISO weekday, Monday = 1 through Sunday = 7.
    Weekday,
    /// Hour of the day, 0-23.
    Hour,
}

impl DerivedColumn {
    pub const ALL: [DerivedColumn; 4] = [
        DerivedColumn::DateUnix,
        DerivedColumn::DayJulian,
        DerivedColumn::Weekday,
        DerivedColumn::Hour,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DerivedColumn::DateUnix => "date_unix",
            DerivedColumn::DayJulian => "day_julian",
            DerivedColumn::Weekday => "weekday",
            DerivedColumn::Hour => "hour",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.name() == name)
    }
}

impl fmt::Display for DerivedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of the trend feature.
pub const DATE_UNIX: &str = "date_unix";

/// Training/testing label stored in the `set` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetLabel {
    Training,
    Testing,
}

impl SetLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            SetLabel::Training => "training",
            SetLabel::Testing => "testing",
        }
    }
}

impl fmt::Display for SetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "training" => Ok(SetLabel::Training),
            "testing" => Ok(SetLabel::Testing),
            other => Err(other.to_string()),
        }
    }
}

//! Library side of the `deweather` command: ingestion, configuration,
//! logging, progress display and run reports.

pub mod config;
pub mod ingest;
pub mod logging;
pub mod progress;
pub mod report;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use dew_cli::config::render_config;
use dew_cli::ingest::{read_observations, write_csv};
use dew_cli::progress::BarProgress;
use dew_cli::report::{RunReport, write_report};
use dew_core::{DeweatherRun, TracingProgress, prepare_data, run_deweather};
use dew_model::SetLabel;
use dew_stats::model_stats;
use dew_train::AutoRegressor;

use crate::cli::{ConfigCommandArgs, PrepareArgs, RunArgs};
use crate::types::{PrepareSummary, RunSummary};

pub fn run(args: &RunArgs) -> Result<RunSummary> {
    let start = Instant::now();
    let span = info_span!("run", input = %args.input.display());
    let _guard = span.enter();

    let config = args.config.resolve()?;
    let df = read_observations(&args.input)?;
    let backend = AutoRegressor::default();
    let DeweatherRun {
        prepared,
        predictor,
        features,
        mut normalised,
    } = if args.no_progress {
        run_deweather(df, &config, &backend, &TracingProgress::default())
    } else {
        run_deweather(df, &config, &backend, &BarProgress::new())
    }
    .context("deweather run failed")?;

    let training = model_stats(predictor.as_ref(), &prepared, SetLabel::Training)
        .context("training statistics")?;
    let testing = model_stats(predictor.as_ref(), &prepared, SetLabel::Testing)
        .context("testing statistics")?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sibling_path(&args.input, "deweathered"));
    write_csv(&mut normalised, &output)?;

    let summary = RunSummary {
        input: args.input.clone(),
        output,
        report: args.report.clone(),
        rows: prepared.height(),
        training_rows: prepared.count(SetLabel::Training),
        testing_rows: prepared.count(SetLabel::Testing),
        features,
        model: predictor.describe(),
        training,
        testing,
        timestamps: normalised.height(),
        preview: normalised.head(Some(args.preview)),
    };
    let duration_ms = start.elapsed().as_millis() as u64;
    if let Some(path) = &summary.report {
        let report = RunReport {
            input: summary.input.clone(),
            output: summary.output.clone(),
            rows: summary.rows,
            training_rows: summary.training_rows,
            testing_rows: summary.testing_rows,
            features: summary.features.clone(),
            model: summary.model.clone(),
            training: summary.training,
            testing: summary.testing,
            timestamps: summary.timestamps,
            duration_ms,
            config,
        };
        write_report(&report, path)?;
    }
    info!(duration_ms, "run finished");
    Ok(summary)
}

pub fn prepare(args: &PrepareArgs) -> Result<PrepareSummary> {
    let span = info_span!("prepare_command", input = %args.input.display());
    let _guard = span.enter();

    let config = args.config.resolve()?;
    let df = read_observations(&args.input)?;
    let prepared = prepare_data(df, &config.prepare).context("preparation failed")?;
    let training_rows = prepared.count(SetLabel::Training);
    let testing_rows = prepared.count(SetLabel::Testing);
    let columns = prepared.schema().columns.clone();
    let mut frame = prepared.into_frame();

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sibling_path(&args.input, "prepared"));
    write_csv(&mut frame, &output)?;
    Ok(PrepareSummary {
        input: args.input.clone(),
        output,
        rows: frame.height(),
        training_rows,
        testing_rows,
        columns,
    })
}

pub fn show_config(args: &ConfigCommandArgs) -> Result<String> {
    let config = args.config.resolve()?;
    render_config(&config)
}

/// `<dir>/<stem>_<suffix>.csv` next to `input`.
fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_{suffix}.csv"))
}

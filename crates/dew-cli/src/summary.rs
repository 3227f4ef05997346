use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use polars::prelude::DataFrame;

use dew_common::{any_to_string, format_rounded};
use dew_model::{DATE, DEWEATHERED, OBSERVED};
use dew_stats::ModelStats;

use crate::types::{PrepareSummary, RunSummary};

pub fn print_run_summary(summary: &RunSummary) {
    println!("Input: {}", summary.input.display());
    println!("Output: {}", summary.output.display());
    if let Some(path) = &summary.report {
        println!("Report: {}", path.display());
    }
    println!(
        "Rows: {} ({} training, {} testing)",
        summary.rows, summary.training_rows, summary.testing_rows
    );
    println!("Features: {}", summary.features.join(", "));
    println!("Model: {}", summary.model);

    println!("{}", stats_table(&summary.training, &summary.testing));
    if summary.preview.height() > 0 {
        println!(
            "First {} of {} timestamps:",
            summary.preview.height(),
            summary.timestamps
        );
        println!("{}", preview_table(&summary.preview));
    }
}

pub fn print_prepare_summary(summary: &PrepareSummary) {
    println!("Input: {}", summary.input.display());
    println!("Output: {}", summary.output.display());
    let mut table = Table::new();
    table.set_header(vec![header_cell("Set"), header_cell("Rows")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("training"), Cell::new(summary.training_rows)]);
    table.add_row(vec![Cell::new("testing"), Cell::new(summary.testing_rows)]);
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(summary.rows).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    println!("Columns: {}", summary.columns.join(", "));
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn stats_table(training: &ModelStats, testing: &ModelStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Statistic"),
        header_cell("Training"),
        header_cell("Testing"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for ((name, train), (_, test)) in training.rows().into_iter().zip(testing.rows()) {
        table.add_row(vec![Cell::new(name), stat_cell(train), stat_cell(test)]);
    }
    table
}

fn preview_table(preview: &DataFrame) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell(DATE),
        header_cell(OBSERVED),
        header_cell(DEWEATHERED),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    let columns: Vec<_> = [DATE, OBSERVED, DEWEATHERED]
        .iter()
        .filter_map(|name| preview.column(name).ok())
        .map(|column| column.as_materialized_series())
        .collect();
    for row in 0..preview.height() {
        let cells: Vec<Cell> = columns
            .iter()
            .map(|series| match series.get(row) {
                Ok(value) => match value.extract::<f64>() {
                    Some(v) if series.dtype().is_float() => Cell::new(format_rounded(v, 3)),
                    _ => Cell::new(any_to_string(value)),
                },
                Err(_) => dim_cell("-"),
            })
            .collect();
        table.add_row(cells);
    }
    table
}

fn stat_cell(value: f64) -> Cell {
    if value.is_nan() {
        dim_cell("-")
    } else {
        Cell::new(format_rounded(value, 4))
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

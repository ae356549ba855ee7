use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use impact_cli::RunResult;
use impact_core::{PipelineOutcome, SchemaValidation};
use impact_model::{GateFailure, RunReport};

pub fn print_run_summary(result: &RunResult) {
    println!("Member: {}", result.member_id);
    println!("Datasets: {}", result.datasets.join(", "));
    if let Some(path) = &result.output {
        println!("Delivery: {}", path.display());
    }
    if let Some(path) = &result.report {
        println!("Report: {}", path.display());
    }
    if !result.written_mappings.is_empty() {
        println!("Field mappings written: {}", result.written_mappings.len());
    }
    match &result.outcome {
        PipelineOutcome::Completed { report, .. } => print_report(report),
        PipelineOutcome::Halted { failure, .. } => print_gate_failure(failure),
    }
}

fn print_report(report: &RunReport) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Result"), header_cell("Count")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![
        Cell::new("Rows to upload"),
        Cell::new(report.num_rows_to_upload)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Dropped rows"),
        count_cell(report.dropped_rows.len(), Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Invalid values"),
        count_cell(report.dropped_values.len(), Color::Yellow),
    ]);
    println!("{table}");

    let mut drops: BTreeMap<String, usize> = BTreeMap::new();
    for dropped in &report.dropped_rows {
        *drops.entry(dropped.reason.to_string()).or_default() += 1;
    }
    print_counts("Dropped rows:", "Reason", &drops, Color::Red);

    let mut invalid: BTreeMap<String, usize> = BTreeMap::new();
    for value in &report.dropped_values {
        *invalid.entry(value.field_name.clone()).or_default() += 1;
    }
    print_counts("Invalid values:", "Field", &invalid, Color::Yellow);
}

fn print_counts(title: &str, label: &str, counts: &BTreeMap<String, usize>, color: Color) {
    if counts.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell(label), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (key, count) in counts {
        table.add_row(vec![Cell::new(key), count_cell(*count, color)]);
    }
    println!();
    println!("{title}");
    println!("{table}");
}

pub fn print_gate_failure(failure: &GateFailure) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Target"), header_cell("Failure")]);
    apply_summary_table_style(&mut table);
    for (target, message) in failure.lines() {
        table.add_row(vec![
            Cell::new(target)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(message),
        ]);
    }
    println!();
    println!("Run halted at the {} gate:", failure.gate_name());
    println!("{table}");
}

pub fn print_schema_validation(validation: &SchemaValidation) {
    if validation.is_valid() {
        println!("Schema is valid.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Schema issue")]);
    apply_table_style(&mut table);
    for message in validation.messages() {
        table.add_row(vec![Cell::new(message).fg(Color::Red)]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
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

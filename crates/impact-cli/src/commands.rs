use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use impact_cli::{ModifiedWindow, RunConfig, RunRequest, RunResult, execute_run};
use impact_core::{
    SchemaValidation, drop_rows_without_intake_records, read_delivery_csv, validate_schema,
    write_delivery_csv,
};
use impact_ingest::load_table_schema;

use crate::cli::{CheckSchemaArgs, FilterIntakeArgs, RunArgs};

pub fn run(args: &RunArgs) -> Result<RunResult> {
    let file = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let flags = RunConfig {
        member_id: args.member_id.clone(),
        row_format: args.column_format.then_some(false),
        delimiter: args.delimiter.clone(),
        schema: args.schema.clone(),
        column_mapping: args.column_mapping.clone(),
        field_mappings: args.field_mappings.clone(),
        datasets: args.datasets.clone(),
        output: args.output.clone(),
        report: args.report.clone(),
    };
    let settings = file.merged_with(flags).into_settings()?;
    let request = RunRequest::new(settings)
        .with_window(ModifiedWindow {
            since: args.modified_since,
            until: args.modified_until,
        })
        .with_overwrite_mappings(args.overwrite_mappings)
        .with_remove_unapproved_source(!args.keep_unapproved)
        .with_write_mappings(args.write_mappings);
    execute_run(&request)
}

pub fn check_schema(args: &CheckSchemaArgs) -> Result<SchemaValidation> {
    let schema = load_table_schema(&args.schema)?;
    Ok(validate_schema(&schema))
}

/// Returns the number of rows removed.
pub fn filter_intake(args: &FilterIntakeArgs) -> Result<usize> {
    let response = fs::read_to_string(&args.response)
        .with_context(|| format!("read response: {}", args.response.display()))?;
    let frame = read_delivery_csv(&args.input)?;
    let (mut filtered, dropped) = drop_rows_without_intake_records(&frame, &response)?;
    let output = args.output.as_ref().unwrap_or(&args.input);
    write_delivery_csv(&mut filtered, output)?;
    info!(
        path = %output.display(),
        rows = filtered.height(),
        dropped = dropped.len(),
        "wrote filtered delivery csv"
    );
    Ok(dropped.len())
}

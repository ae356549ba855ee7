//! File-level orchestration of one `impact run`.
//!
//! Loads the schema, mapping sheets and datasets, runs the pipeline and writes
//! whatever outputs were asked for.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use impact_core::{
    PipelineInput, PipelineOutcome, extract_modified_in_range, run_pipeline, write_delivery_csv,
};
use impact_ingest::{
    dataset_name, expand_dataset_paths, load_field_mapping_sheets, load_table_schema, read_dataset,
    read_sheet, write_field_mappings,
};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::config::RunSettings;

/// Inclusive `LastModifiedDate` window; an open end is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifiedWindow {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl ModifiedWindow {
    pub fn is_open(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }

    fn bounds(&self) -> (NaiveDate, NaiveDate) {
        (
            self.since.unwrap_or(NaiveDate::MIN),
            self.until.unwrap_or(NaiveDate::MAX),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub settings: RunSettings,
    pub window: ModifiedWindow,
    pub overwrite_mappings: bool,
    pub remove_unapproved_source: bool,
    pub write_mappings: bool,
}

impl RunRequest {
    pub fn new(settings: RunSettings) -> Self {
        Self {
            settings,
            window: ModifiedWindow::default(),
            overwrite_mappings: false,
            remove_unapproved_source: true,
            write_mappings: false,
        }
    }

    #[must_use]
    pub fn with_window(mut self, window: ModifiedWindow) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub fn with_overwrite_mappings(mut self, overwrite: bool) -> Self {
        self.overwrite_mappings = overwrite;
        self
    }

    #[must_use]
    pub fn with_remove_unapproved_source(mut self, remove: bool) -> Self {
        self.remove_unapproved_source = remove;
        self
    }

    #[must_use]
    pub fn with_write_mappings(mut self, write: bool) -> Self {
        self.write_mappings = write;
        self
    }
}

/// What a run produced.
#[derive(Debug)]
pub struct RunResult {
    pub member_id: String,
    pub datasets: Vec<String>,
    pub outcome: PipelineOutcome,
    pub output: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub written_mappings: Vec<PathBuf>,
}

impl RunResult {
    pub fn is_halted(&self) -> bool {
        !self.outcome.is_completed()
    }
}

pub fn execute_run(request: &RunRequest) -> Result<RunResult> {
    let settings = &request.settings;
    let span = info_span!("run", member_id = %settings.member_id);
    let _guard = span.enter();
    let start = Instant::now();

    if request.write_mappings && settings.field_mappings.is_none() {
        bail!("--write-mappings needs a field mapping directory (--field-mappings)");
    }

    let schema = load_table_schema(&settings.schema)?;
    let column_mapping = read_sheet(&settings.column_mapping)?;
    let field_mappings = match &settings.field_mappings {
        Some(dir) => load_field_mapping_sheets(dir, &schema)?,
        None => Default::default(),
    };

    let paths = expand_dataset_paths(&settings.datasets)?;
    if paths.is_empty() {
        bail!("no dataset files found");
    }
    let mut input = PipelineInput::new(column_mapping).with_field_mappings(field_mappings);
    let mut names = Vec::with_capacity(paths.len());
    for path in &paths {
        let mut table = read_dataset(path)?;
        if !request.window.is_open() {
            let (since, until) = request.window.bounds();
            let before = table.height();
            table = extract_modified_in_range(&table, since, until);
            debug!(
                dataset = %path.display(),
                before,
                after = table.height(),
                "applied modified-date window"
            );
        }
        let name = dataset_name(path);
        info!(dataset = %name, rows = table.height(), "loaded dataset");
        names.push(name.clone());
        input = input.with_dataset(name, table);
    }

    let options = settings
        .pipeline_options()
        .with_overwrite_mappings(request.overwrite_mappings)
        .with_remove_unapproved_source(request.remove_unapproved_source);
    let mut outcome = run_pipeline(&schema, &input, &options)?;

    let mut output = None;
    let mut report = None;
    match &mut outcome {
        PipelineOutcome::Completed {
            dataset,
            report: run_report,
            ..
        } => {
            if let Some(path) = &settings.output {
                ensure_parent(path)?;
                write_delivery_csv(dataset, path)?;
                info!(path = %path.display(), rows = dataset.height(), "wrote delivery csv");
                output = Some(path.clone());
            }
            if let Some(path) = &settings.report {
                write_json(path, &*run_report)?;
                report = Some(path.clone());
            }
        }
        PipelineOutcome::Halted { failure, .. } => {
            warn!(gate = failure.gate_name(), "run halted before delivery");
            if let Some(path) = &settings.report {
                write_json(path, &*failure)?;
                report = Some(path.clone());
            }
        }
    }

    let mut written_mappings = Vec::new();
    if request.write_mappings
        && let (Some(dir), Some(mappings)) = (&settings.field_mappings, outcome.field_mappings())
    {
        written_mappings = write_field_mappings(dir, mappings)?;
    }

    info!(
        duration_ms = start.elapsed().as_millis(),
        completed = outcome.is_completed(),
        "run finished"
    );
    Ok(RunResult {
        member_id: settings.member_id.clone(),
        datasets: names,
        outcome,
        output,
        report,
        written_mappings,
    })
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value).context("serialize report")?;
    fs::write(path, json).with_context(|| format!("write report: {}", path.display()))?;
    info!(path = %path.display(), "wrote report");
    Ok(())
}

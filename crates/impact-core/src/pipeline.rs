//! Run pipeline with ordered step execution.
//!
//! Each step implements [`PipelineStep`] and either lets the run continue or
//! halts it with a [`GateFailure`]. Fatal conditions are errors.
//!
//! # Standard Pipeline Order
//!
//! 1. **SchemaCheckStep** - schema self-validation
//! 2. **ColumnMappingGateStep** - raw column-mapping sheet checks
//! 3. **ColumnMappingStep** - sheet to [`ColumnMapping`]
//! 4. **FieldMappingGateStep** - raw field-mapping sheet checks and conversion
//! 5. **DatasetShapeGateStep** - dataset columns against mapping and schema
//! 6. **ShapeStep** - shape, concatenate and blank-fill the datasets
//! 7. **MappingResolutionStep** - generate mappings and merge with the stored ones
//! 8. **ApprovalGateStep** - every resolved mapping entry approved
//! 9. **ProcessStep** - transforms, casting, row drops
//! 10. **DeliveryStep** - most-recent-wins frame for upload
//!
//! # Example
//!
//! ```ignore
//! use impact_core::{PipelineInput, PipelineOptions, build_default_pipeline};
//!
//! let pipeline = build_default_pipeline();
//! let outcome = pipeline.execute(&schema, &input, &PipelineOptions::new("member-1"))?;
//! ```

use anyhow::{Context, Result, anyhow};
use impact_map::{MappingGenerator, resolve_mappings};
use impact_model::{
    ColumnMapping, FieldMapping, FieldMappings, GateFailure, RunReport, Table, TableSchema,
};
use polars::prelude::DataFrame;
use tracing::{error, info};

use crate::delivery::shape_for_delivery;
use crate::gates::{
    validate_approvals, validate_column_mapping, validate_dataset_shapes, validate_field_mappings,
};
use crate::processing_context::{PipelineContext, PipelineInput, PipelineOptions};
use crate::processor::{DataProcessor, ProcessedData};
use crate::schema_check::validate_schema;
use crate::shape::{ShapeTransformer, fill_missing};

/// Whether the run goes on after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Halt(GateFailure),
}

/// A single step of the run.
pub trait PipelineStep: Send + Sync {
    fn execute(
        &self,
        ctx: &PipelineContext<'_>,
        state: &mut PipelineState,
    ) -> Result<StepOutcome>;

    /// Human-readable name for this step (for logging/debugging).
    fn step_name(&self) -> &str;

    /// Default implementation always runs the step.
    fn should_skip(&self, _ctx: &PipelineContext<'_>) -> bool {
        false
    }
}

/// Mutable state shared across pipeline steps.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub column_mapping: Option<ColumnMapping>,
    /// Stored mappings that passed the field-mapping gate.
    pub source_mappings: FieldMappings,
    /// Shaped and concatenated datasets.
    pub shaped: Option<Table>,
    /// Generated mappings merged with the stored ones.
    pub field_mappings: Option<FieldMappings>,
    pub processed: Option<ProcessedData>,
    pub delivery: Option<DataFrame>,
    /// Step execution log for debugging.
    pub executed_steps: Vec<String>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed {
        dataset: DataFrame,
        field_mappings: FieldMappings,
        report: RunReport,
    },
    /// `field_mappings` is set when the run got as far as resolving them.
    Halted {
        failure: GateFailure,
        field_mappings: Option<FieldMappings>,
    },
}

impl PipelineOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Resolved mappings to persist, if any.
    pub fn field_mappings(&self) -> Option<&FieldMappings> {
        match self {
            Self::Completed { field_mappings, .. } => Some(field_mappings),
            Self::Halted { field_mappings, .. } => field_mappings.as_ref(),
        }
    }
}

/// An ordered pipeline of steps.
pub struct ImpactPipeline {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Default for ImpactPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ImpactPipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    #[must_use]
    pub fn add_step(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.step_name()).collect()
    }

    pub fn execute(
        &self,
        schema: &TableSchema,
        input: &PipelineInput,
        options: &PipelineOptions,
    ) -> Result<PipelineOutcome> {
        let mut state = PipelineState::new();
        self.execute_with_state(schema, input, options, &mut state)
    }

    /// Runs every step in order, stopping at the first halt.
    pub fn execute_with_state(
        &self,
        schema: &TableSchema,
        input: &PipelineInput,
        options: &PipelineOptions,
        state: &mut PipelineState,
    ) -> Result<PipelineOutcome> {
        let ctx = PipelineContext::new(schema, input, options);
        for step in &self.steps {
            if step.should_skip(&ctx) {
                continue;
            }
            info!(step = step.step_name(), "running pipeline step");
            let outcome = step
                .execute(&ctx, state)
                .with_context(|| format!("pipeline step {} failed", step.step_name()))?;
            state.executed_steps.push(step.step_name().to_string());
            if let StepOutcome::Halt(failure) = outcome {
                for (target, message) in failure.lines() {
                    error!("{} validation failed for {target}: {message}", failure.gate_name());
                }
                return Ok(PipelineOutcome::Halted {
                    failure,
                    field_mappings: state.field_mappings.clone(),
                });
            }
        }
        finish(state)
    }
}

fn finish(state: &mut PipelineState) -> Result<PipelineOutcome> {
    let dataset = state
        .delivery
        .take()
        .ok_or_else(|| anyhow!("pipeline finished without a delivery frame"))?;
    let processed = state.processed.take().unwrap_or_default();
    let report = RunReport {
        num_rows_to_upload: dataset.height(),
        dropped_rows: processed.dropped_rows,
        dropped_values: processed.invalid_values,
    };
    info!(rows = report.num_rows_to_upload, "pipeline completed");
    Ok(PipelineOutcome::Completed {
        dataset,
        field_mappings: state.field_mappings.take().unwrap_or_default(),
        report,
    })
}

// ============================================================================
// Standard Pipeline Steps
// ============================================================================

pub struct SchemaCheckStep;

impl PipelineStep for SchemaCheckStep {
    fn execute(
        &self,
        ctx: &PipelineContext<'_>,
        _state: &mut PipelineState,
    ) -> Result<StepOutcome> {
        let validation = validate_schema(ctx.schema);
        if validation.is_valid() {
            Ok(StepOutcome::Continue)
        } else {
            Ok(StepOutcome::Halt(GateFailure::SchemaInvalid(validation.messages())))
        }
    }

    fn step_name(&self) -> &str {
        "schema_check"
    }
}

pub struct ColumnMappingGateStep;

impl PipelineStep for ColumnMappingGateStep {
    fn execute(
        &self,
        ctx: &PipelineContext<'_>,
        _state: &mut PipelineState,
    ) -> Result<StepOutcome> {
        let failures = validate_column_mapping(
            &ctx.input.column_mapping,
            ctx.schema,
            ctx.options.row_format,
        );
        if failures.is_empty() {
            Ok(StepOutcome::Continue)
        } else {
            Ok(StepOutcome::Halt(GateFailure::ColumnMapping(failures)))
        }
    }

    fn step_name(&self) -> &str {
        "column_mapping_gate"
    }
}

pub struct ColumnMappingStep;

impl PipelineStep for ColumnMappingStep {
    fn execute(
        &self,
        ctx: &PipelineContext<'_>,
        state: &mut PipelineState,
    ) -> Result<StepOutcome> {
        let mapping = ColumnMapping::from_sheet(&ctx.input.column_mapping)
            .context("convert column mapping")?;
        state.column_mapping = Some(mapping);
        Ok(StepOutcome::Continue)
    }

    fn step_name(&self) -> &str {
        "column_mapping"
    }
}

pub struct FieldMappingGateStep;

impl PipelineStep for FieldMappingGateStep {
    fn execute(
        &self,
        ctx: &PipelineContext<'_>,
        state: &mut PipelineState,
    ) -> Result<StepOutcome> {
        let failures = validate_field_mappings(&ctx.input.field_mappings, ctx.schema);
        if !failures.is_empty() {
            return Ok(StepOutcome::Halt(GateFailure::FieldMappings(failures)));
        }
        for (field, sheet) in &ctx.input.field_mappings {
            let mapping = FieldMapping::from_sheet(sheet)
                .with_context(|| format!("convert field mapping for {field}"))?;
            state.source_mappings.insert(field.clone(), mapping);
        }
        Ok(StepOutcome::Continue)
    }

    fn step_name(&self) -> &str {
        "field_mapping_gate"
    }
}

pub struct DatasetShapeGateStep;

impl PipelineStep for DatasetShapeGateStep {
    fn execute(
        &self,
        ctx: &PipelineContext<'_>,
        state: &mut PipelineState,
    ) -> Result<StepOutcome> {
        let mapping = column_mapping(state)?;
        let failures = validate_dataset_shapes(
            &ctx.input.datasets,
            ctx.schema,
            mapping,
            ctx.options.row_format,
        );
        if failures.is_empty() {
            Ok(StepOutcome::Continue)
        } else {
            Ok(StepOutcome::Halt(GateFailure::DatasetShape(failures)))
        }
    }

    fn step_name(&self) -> &str {
        "dataset_shape_gate"
    }

    fn should_skip(&self, ctx: &PipelineContext<'_>) -> bool {
        ctx.input.datasets.is_empty()
    }
}

pub struct ShapeStep;

impl PipelineStep for ShapeStep {
    fn execute(
        &self,
        ctx: &PipelineContext<'_>,
        state: &mut PipelineState,
    ) -> Result<StepOutcome> {
        let mapping = column_mapping(state)?;
        let transformer = ShapeTransformer::new(
            &ctx.options.member_id,
            ctx.schema,
            mapping,
            ctx.options.row_format,
        )
        .with_delimiter(&ctx.options.multiple_value_delimiter);
        let parts: Vec<Table> = ctx
            .input
            .datasets
            .iter()
            .map(|(name, dataset)| {
                let shaped = transformer.transform(dataset);
                info!(dataset = %name, rows = shaped.height(), "shaped dataset");
                shaped
            })
            .collect();
        let mut combined = Table::concat(parts);
        fill_missing(&mut combined);
        state.shaped = Some(combined);
        Ok(StepOutcome::Continue)
    }

    fn step_name(&self) -> &str {
        "shape"
    }
}

pub struct MappingResolutionStep;

impl PipelineStep for MappingResolutionStep {
    fn execute(
        &self,
        ctx: &PipelineContext<'_>,
        state: &mut PipelineState,
    ) -> Result<StepOutcome> {
        let shaped = shaped(state)?;
        let generated = MappingGenerator::new(ctx.schema).generate(shaped)?;
        let resolved = resolve_mappings(
            &generated,
            &state.source_mappings,
            ctx.options.resolve_options(),
        );
        state.field_mappings = Some(resolved);
        Ok(StepOutcome::Continue)
    }

    fn step_name(&self) -> &str {
        "mapping_resolution"
    }
}

pub struct ApprovalGateStep;

impl PipelineStep for ApprovalGateStep {
    fn execute(
        &self,
        _ctx: &PipelineContext<'_>,
        state: &mut PipelineState,
    ) -> Result<StepOutcome> {
        let Some(mappings) = &state.field_mappings else {
            return Ok(StepOutcome::Continue);
        };
        let failures = validate_approvals(mappings);
        if failures.is_empty() {
            Ok(StepOutcome::Continue)
        } else {
            Ok(StepOutcome::Halt(GateFailure::Approval(failures)))
        }
    }

    fn step_name(&self) -> &str {
        "approval_gate"
    }
}

pub struct ProcessStep;

impl PipelineStep for ProcessStep {
    fn execute(
        &self,
        ctx: &PipelineContext<'_>,
        state: &mut PipelineState,
    ) -> Result<StepOutcome> {
        let empty = FieldMappings::new();
        let mappings = state.field_mappings.as_ref().unwrap_or(&empty);
        let processed = DataProcessor::new(ctx.schema, mappings).process(shaped(state)?);
        info!(
            rows = processed.table.height(),
            dropped_rows = processed.dropped_rows.len(),
            invalid_values = processed.invalid_values.len(),
            "processed dataset"
        );
        state.processed = Some(processed);
        Ok(StepOutcome::Continue)
    }

    fn step_name(&self) -> &str {
        "process"
    }
}

pub struct DeliveryStep;

impl PipelineStep for DeliveryStep {
    fn execute(
        &self,
        _ctx: &PipelineContext<'_>,
        state: &mut PipelineState,
    ) -> Result<StepOutcome> {
        let processed = state
            .processed
            .as_ref()
            .ok_or_else(|| anyhow!("delivery requires processed data"))?;
        state.delivery = Some(shape_for_delivery(&processed.table)?);
        Ok(StepOutcome::Continue)
    }

    fn step_name(&self) -> &str {
        "delivery"
    }
}

fn column_mapping(state: &PipelineState) -> Result<&ColumnMapping> {
    state
        .column_mapping
        .as_ref()
        .ok_or_else(|| anyhow!("column mapping not converted yet"))
}

fn shaped(state: &PipelineState) -> Result<&Table> {
    state
        .shaped
        .as_ref()
        .ok_or_else(|| anyhow!("datasets not shaped yet"))
}

/// Builds the standard ten-step pipeline.
pub fn build_default_pipeline() -> ImpactPipeline {
    ImpactPipeline::new()
        .add_step(Box::new(SchemaCheckStep))
        .add_step(Box::new(ColumnMappingGateStep))
        .add_step(Box::new(ColumnMappingStep))
        .add_step(Box::new(FieldMappingGateStep))
        .add_step(Box::new(DatasetShapeGateStep))
        .add_step(Box::new(ShapeStep))
        .add_step(Box::new(MappingResolutionStep))
        .add_step(Box::new(ApprovalGateStep))
        .add_step(Box::new(ProcessStep))
        .add_step(Box::new(DeliveryStep))
}

/// Runs the standard pipeline.
pub fn run_pipeline(
    schema: &TableSchema,
    input: &PipelineInput,
    options: &PipelineOptions,
) -> Result<PipelineOutcome> {
    build_default_pipeline().execute(schema, input, options)
}

pub mod cast;
pub mod delivery;
pub mod filter;
pub mod gates;
pub mod pipeline;
pub mod processing_context;
pub mod processor;
pub mod redact;
pub mod schema_check;
pub mod shape;
pub mod states;
pub mod transform;

pub use cast::{CastFailure, cast_failure_reason, cast_value, parse_any_date};
pub use delivery::{
    DATE_COLUMN, frame_strings, read_delivery_csv, shape_for_delivery, table_to_frame,
    write_delivery_csv,
};
pub use filter::{
    LAST_MODIFIED_COLUMN, drop_rows_without_intake_records, extract_modified_in_range,
    find_case_numbers,
};
pub use gates::{
    validate_approvals, validate_column_mapping, validate_dataset_shape, validate_dataset_shapes,
    validate_field_mapping, validate_field_mappings,
};
pub use pipeline::{
    ApprovalGateStep, ColumnMappingGateStep, ColumnMappingStep, DatasetShapeGateStep,
    DeliveryStep, FieldMappingGateStep, ImpactPipeline, MappingResolutionStep, PipelineOutcome,
    PipelineState, PipelineStep, ProcessStep, SchemaCheckStep, ShapeStep, StepOutcome,
    build_default_pipeline, run_pipeline,
};
pub use processing_context::{PipelineContext, PipelineInput, PipelineOptions};
pub use processor::{DataProcessor, ProcessedData};
pub use redact::{REDACTED_VALUE, log_data_enabled, redact_value, set_log_data_enabled};
pub use schema_check::{SchemaIssue, SchemaValidation, validate_schema};
pub use shape::{
    DEFAULT_MULTIPLE_VALUE_DELIMITER, FORCE_OVERWRITE_VALUE, ShapeTransformer, fill_missing,
    normalize_text,
};
pub use states::{UsState, abbreviation};
pub use transform::{TransformKind, Transformed};

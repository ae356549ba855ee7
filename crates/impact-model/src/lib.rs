pub mod check;
pub mod diagnostics;
pub mod error;
pub mod mapping;
pub mod schema;
pub mod table;
pub mod value;

pub use check::{CheckFailure, CheckFailures, GateFailure};
pub use diagnostics::{DropReason, DroppedRow, InvalidValue, RunReport, ValueId};
pub use error::{ModelError, Result};
pub use mapping::{
    APPROVED_COLUMN, Approval, COLUMN_MAPPING_HEADERS, ColumnMapping, ColumnTarget,
    FIELD_MAPPING_HEADERS, FIELD_NAME_COLUMN, FieldMapping, FieldMappings, INPUT_COLUMN,
    INTERNAL_COLUMN_NAME, MappingEntry, OUTPUT_COLUMN,
};
pub use schema::{
    CASE_NUMBER_FIELD, DateFormat, EnumMapping, FORCE_OVERWRITE_FIELD, FieldKind,
    MEMBER_ORGANIZATION_FIELD, MILESTONE_FLAG_FIELD, MilestoneBinding, MilestoneColumns,
    RECORD_KEY_FIELDS, Range, SOC_FIELD, STATE_FIELD, SchemaDescriptor, SchemaField,
    TableSchema,
};
pub use table::{RowSnapshot, Sheet, Table};
pub use value::CellValue;

//! Per-run diagnostics: invalid values and dropped rows.

use std::fmt;

use serde::Serialize;

use crate::table::RowSnapshot;
use crate::value::CellValue;

/// Identifies one cell for invalid-value reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ValueId {
    pub case_number: CellValue,
    pub field_name: String,
    pub milestone_flag: CellValue,
    /// Value before any transform.
    pub original_value: CellValue,
}

/// A cell that failed transform or casting and was blanked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidValue {
    pub case_number: CellValue,
    pub field_name: String,
    pub milestone_flag: CellValue,
    pub original_value: CellValue,
    pub reason: String,
}

impl InvalidValue {
    pub fn new(id: &ValueId, reason: impl Into<String>) -> Self {
        Self {
            case_number: id.case_number.clone(),
            field_name: id.field_name.clone(),
            milestone_flag: id.milestone_flag.clone(),
            original_value: id.original_value.clone(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum DropReason {
    /// Required fields that ended up missing, in schema order.
    MissingRequired(Vec<String>),
    Duplicate,
    NoIntakeRecord,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired(fields) => {
                write!(f, "invalid or missing value for {}", fields.join(", "))
            }
            Self::Duplicate => f.write_str("duplicate record"),
            Self::NoIntakeRecord => f.write_str("no matching intake record"),
        }
    }
}

/// A row excluded from the output, with its original content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedRow {
    pub row: RowSnapshot,
    pub reason: DropReason,
}

/// Bundle returned with a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub num_rows_to_upload: usize,
    pub dropped_rows: Vec<DroppedRow>,
    pub dropped_values: Vec<InvalidValue>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.dropped_rows.is_empty() && self.dropped_values.is_empty()
    }
}

//! Structured gate failures.
//!
//! Each validation gate returns its failures as data so the caller can turn
//! them into a notification; none of these are errors.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// One failed check with its typed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum CheckFailure {
    /// Columns outside the allowed set.
    ColumnsNotInSet { failed_values: Vec<String> },
    /// Positions of columns without a header.
    UnnamedColumns { failed_values: Vec<String> },
    /// Header mismatch; `failed_values` holds the found header per mismatched position.
    ColumnsNotOrdered {
        failed_values: Vec<Option<String>>,
        expected: Vec<String>,
    },
    ValuesNotInSet {
        failed_values: Vec<String>,
        column_name: String,
    },
    ValuesNotUnique {
        failed_values: Vec<String>,
        column_name: String,
    },
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnsNotInSet { failed_values } => {
                write!(f, "unexpected columns: {}", failed_values.join(", "))
            }
            Self::UnnamedColumns { failed_values } => {
                write!(f, "columns without a header at: {}", failed_values.join(", "))
            }
            Self::ColumnsNotOrdered {
                failed_values,
                expected,
            } => {
                let found: Vec<&str> = failed_values
                    .iter()
                    .map(|value| value.as_deref().unwrap_or("<none>"))
                    .collect();
                write!(
                    f,
                    "expected columns [{}], found [{}]",
                    expected.join(", "),
                    found.join(", ")
                )
            }
            Self::ValuesNotInSet {
                failed_values,
                column_name,
            } => write!(
                f,
                "values in '{column_name}' not allowed: {}",
                failed_values.join(", ")
            ),
            Self::ValuesNotUnique {
                failed_values,
                column_name,
            } => write!(
                f,
                "duplicate values in '{column_name}': {}",
                failed_values.join(", ")
            ),
        }
    }
}

pub type CheckFailures = Vec<CheckFailure>;

/// Why the pipeline stopped at a gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "gate", content = "failures", rename_all = "snake_case")]
pub enum GateFailure {
    /// Schema self-validation messages.
    SchemaInvalid(Vec<String>),
    ColumnMapping(CheckFailures),
    /// Keyed by field name.
    FieldMappings(BTreeMap<String, CheckFailures>),
    /// Keyed by dataset name.
    DatasetShape(BTreeMap<String, CheckFailures>),
    /// Keyed by field name.
    Approval(BTreeMap<String, CheckFailures>),
}

impl GateFailure {
    pub fn gate_name(&self) -> &'static str {
        match self {
            Self::SchemaInvalid(_) => "schema",
            Self::ColumnMapping(_) => "column mapping",
            Self::FieldMappings(_) => "field mappings",
            Self::DatasetShape(_) => "dataset shape",
            Self::Approval(_) => "mapping approval",
        }
    }

    /// Flattened `(target, message)` lines for display.
    pub fn lines(&self) -> Vec<(String, String)> {
        fn keyed(map: &BTreeMap<String, CheckFailures>) -> Vec<(String, String)> {
            map.iter()
                .flat_map(|(key, failures)| {
                    failures
                        .iter()
                        .map(move |failure| (key.clone(), failure.to_string()))
                })
                .collect()
        }
        match self {
            Self::SchemaInvalid(issues) => issues
                .iter()
                .map(|issue| ("schema".to_string(), issue.clone()))
                .collect(),
            Self::ColumnMapping(failures) => failures
                .iter()
                .map(|failure| ("column mapping".to_string(), failure.to_string()))
                .collect(),
            Self::FieldMappings(map) | Self::DatasetShape(map) | Self::Approval(map) => keyed(map),
        }
    }
}

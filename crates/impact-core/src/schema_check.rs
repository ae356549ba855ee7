//! Schema self-validation.
//!
//! A consistency check over the loaded schema, independent of any dataset.
//! Every issue is collected and logged; nothing fails fast.

use std::fmt;

use impact_model::{FieldKind, TableSchema};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SchemaIssue {
    MilestoneOutOfRange {
        field: String,
        index: i64,
    },
    CustomNameOutOfRange {
        field: String,
        index: i64,
        column: String,
    },
    EnumMappingNotInteger {
        field: String,
    },
    EnumMappingWithoutBounds {
        field: String,
    },
    /// `missing` lists at most [`MAX_LISTED_MISSING`] values; `missing_count` is the full tally.
    EnumMappingIncomplete {
        field: String,
        missing: Vec<i64>,
        missing_count: u64,
    },
    MissingMilestoneNames,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MilestoneOutOfRange { field, index } => write!(
                f,
                "Schema error for field '{field}': Milestone index {index} out of range."
            ),
            Self::CustomNameOutOfRange {
                field,
                index,
                column,
            } => write!(
                f,
                "Error for field '{field}': Milestone index {index} out of range for custom milestone field name: '{column}'"
            ),
            Self::EnumMappingNotInteger { field } => write!(
                f,
                "Error for field '{field}': Enums with numerical mappings should be of type `integer`."
            ),
            Self::EnumMappingWithoutBounds { field } => write!(
                f,
                "Error for field '{field}': Enums with numerical mappings should have min/max constraints."
            ),
            Self::EnumMappingIncomplete {
                field,
                missing,
                missing_count,
            } => {
                let mut listed: Vec<String> = missing.iter().map(ToString::to_string).collect();
                if *missing_count > missing.len() as u64 {
                    listed.push(format!("... {missing_count} in total"));
                }
                write!(
                    f,
                    "Error for field '{field}': Enum mapping should have value for every number between `minimum` and `maximum`. Missing values: {{{}}}",
                    listed.join(", ")
                )
            }
            Self::MissingMilestoneNames => {
                f.write_str("Schema must include column-based milestone names.")
            }
        }
    }
}

/// Longest list of missing enum values carried by one issue.
pub const MAX_LISTED_MISSING: usize = 20;

/// Outcome of [`validate_schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaValidation {
    pub issues: Vec<SchemaIssue>,
}

impl SchemaValidation {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

/// Checks milestone bindings and integer enum mappings.
pub fn validate_schema(schema: &TableSchema) -> SchemaValidation {
    let mut issues = Vec::new();
    let milestone_count = schema.milestone_names().map_or(0, <[String]>::len) as i64;
    let in_range = |index: i64| (0..milestone_count).contains(&index);

    for field in schema.fields() {
        if let Some(binding) = &field.milestones {
            for &index in &binding.indices {
                if !in_range(index) {
                    issues.push(SchemaIssue::MilestoneOutOfRange {
                        field: field.name.clone(),
                        index,
                    });
                }
            }
            for (&index, column) in &binding.custom_names {
                if !in_range(index) {
                    issues.push(SchemaIssue::CustomNameOutOfRange {
                        field: field.name.clone(),
                        index,
                        column: column.clone(),
                    });
                }
            }
        }

        let FieldKind::Integer {
            range,
            enum_mapping: Some(enum_mapping),
        } = &field.kind
        else {
            continue;
        };
        if field.declared_type != "integer" {
            issues.push(SchemaIssue::EnumMappingNotInteger {
                field: field.name.clone(),
            });
        }
        let (Some(minimum), Some(maximum)) = (range.minimum, range.maximum) else {
            issues.push(SchemaIssue::EnumMappingWithoutBounds {
                field: field.name.clone(),
            });
            continue;
        };
        let values = enum_mapping.values();
        let bounds = minimum..=maximum;
        let covered = values.iter().filter(|value| bounds.contains(value)).count() as i128;
        let required = (i128::from(maximum) - i128::from(minimum) + 1).max(0);
        if covered != required || covered != values.len() as i128 {
            let missing = bounds
                .filter(|value| !values.contains(value))
                .take(MAX_LISTED_MISSING)
                .collect();
            issues.push(SchemaIssue::EnumMappingIncomplete {
                field: field.name.clone(),
                missing,
                missing_count: u64::try_from(required - covered).unwrap_or(u64::MAX),
            });
        }
    }

    if schema.milestone_names().is_none() {
        issues.push(SchemaIssue::MissingMilestoneNames);
    }

    for issue in &issues {
        error!("{issue}");
    }
    SchemaValidation { issues }
}

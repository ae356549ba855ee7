//! Table schema model.
//!
//! The schema arrives as a Frictionless-style JSON descriptor extended with
//! milestone and enum-mapping attributes. [`TableSchema::from_descriptor`]
//! converts it into typed [`SchemaField`]s; the conversion is lenient so that
//! descriptor inconsistencies can still be reported by schema self-validation.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Field whose values are SOC codes truncated before casting.
pub const SOC_FIELD: &str = "SOC";
/// Field whose values are resolved to US state abbreviations.
pub const STATE_FIELD: &str = "State";
pub const CASE_NUMBER_FIELD: &str = "CaseNumber";
pub const MILESTONE_FLAG_FIELD: &str = "MilestoneFlag";
pub const MEMBER_ORGANIZATION_FIELD: &str = "MemberOrganization";
pub const FORCE_OVERWRITE_FIELD: &str = "ForceOverWrite";

/// Key identifying one participant-milestone record.
pub const RECORD_KEY_FIELDS: [&str; 3] = [
    CASE_NUMBER_FIELD,
    MILESTONE_FLAG_FIELD,
    MEMBER_ORGANIZATION_FIELD,
];

const DEFAULT_TRUE_VALUES: [&str; 4] = ["true", "True", "TRUE", "1"];
const DEFAULT_FALSE_VALUES: [&str; 4] = ["false", "False", "FALSE", "0"];

// ============================================================================
// Descriptor (serialized form)
// ============================================================================

/// Serialized schema document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_based_milestone_names: Option<Vec<String>>,
}

/// Serialized field entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub constraints: ConstraintsDescriptor,
    #[serde(default)]
    pub true_values: Option<Vec<String>>,
    #[serde(default)]
    pub false_values: Option<Vec<String>>,
    #[serde(default)]
    pub group_char: Option<String>,
    #[serde(default)]
    pub decimal_char: Option<String>,
    #[serde(default, rename = "enum_mapping")]
    pub enum_mapping: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, rename = "milestones")]
    pub milestones: Option<Vec<i64>>,
    #[serde(default, rename = "custom_milestone_field_names")]
    pub custom_milestone_field_names: Option<BTreeMap<String, String>>,
    #[serde(default, rename = "allows_multiple")]
    pub allows_multiple: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintsDescriptor {
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<serde_json::Number>,
    #[serde(default)]
    pub maximum: Option<serde_json::Number>,
    #[serde(default)]
    pub pattern: Option<String>,
}

// ============================================================================
// Typed model
// ============================================================================

/// Inclusive numeric bounds; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Range<T> {
    pub minimum: Option<T>,
    pub maximum: Option<T>,
}

impl<T: PartialOrd + Copy> Range<T> {
    pub fn contains(&self, value: T) -> bool {
        self.minimum.is_none_or(|min| value >= min) && self.maximum.is_none_or(|max| value <= max)
    }

    pub fn is_bounded(&self) -> bool {
        self.minimum.is_some() || self.maximum.is_some()
    }
}

/// Ordered label to integer table of an integer enum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumMapping {
    entries: Vec<(String, i64)>,
}

impl EnumMapping {
    pub fn new(entries: Vec<(String, i64)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, value)| *value)
    }

    /// Case-insensitive lookup; the last matching label wins.
    pub fn get_ignore_case(&self, label: &str) -> Option<i64> {
        let lowered = label.to_lowercase();
        self.entries
            .iter()
            .rev()
            .find(|(key, _)| key.to_lowercase() == lowered)
            .map(|(_, value)| *value)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> BTreeSet<i64> {
        self.entries.iter().map(|(_, value)| *value).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How `date` fields parse their input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DateFormat {
    /// ISO `YYYY-MM-DD`.
    #[default]
    Iso,
    /// Any recognisable date, month-first when ambiguous.
    Any,
    /// An explicit strftime pattern.
    Pattern(String),
}

impl DateFormat {
    fn from_descriptor(format: Option<&str>) -> Self {
        match format.map(str::trim) {
            None | Some("") | Some("default") => Self::Iso,
            Some("any") => Self::Any,
            Some(pattern) => Self::Pattern(pattern.trim_start_matches("fmt:").to_string()),
        }
    }
}

/// Semantic type of a field, carrying only the attributes that type needs.
#[derive(Debug, Clone)]
pub enum FieldKind {
    String {
        enum_values: Option<Vec<String>>,
        pattern: Option<Regex>,
    },
    Integer {
        range: Range<i64>,
        enum_mapping: Option<EnumMapping>,
    },
    Number {
        range: Range<f64>,
        group_char: Option<String>,
        decimal_char: String,
    },
    Boolean {
        true_values: Vec<String>,
        false_values: Vec<String>,
    },
    Date {
        format: DateFormat,
    },
    /// Any other declared type; values pass through casting unchanged.
    Other {
        type_name: String,
    },
}

impl FieldKind {
    pub fn type_name(&self) -> &str {
        match self {
            Self::String { .. } => "string",
            Self::Integer { .. } => "integer",
            Self::Number { .. } => "number",
            Self::Boolean { .. } => "boolean",
            Self::Date { .. } => "date",
            Self::Other { type_name } => type_name,
        }
    }
}

/// Which milestones a field is reported for in column format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneBinding {
    pub indices: Vec<i64>,
    /// Column names overriding `milestone_name + field_name`, by milestone index.
    pub custom_names: BTreeMap<i64, String>,
}

#[derive(Debug, Clone)]
pub struct SchemaField {
    pub name: String,
    /// The `type` written in the descriptor, kept for self-validation.
    pub declared_type: String,
    pub kind: FieldKind,
    pub required: bool,
    pub allows_multiple: bool,
    /// `None` for administrative fields.
    pub milestones: Option<MilestoneBinding>,
}

impl SchemaField {
    /// Enum and boolean fields carry a field mapping.
    pub fn is_enum(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::String {
                enum_values: Some(_),
                ..
            } | FieldKind::Integer {
                enum_mapping: Some(_),
                ..
            }
        )
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.kind, FieldKind::Boolean { .. })
    }

    /// Valid canonical options for value mapping, in declaration order.
    ///
    /// Booleans offer `trueValues` then `falseValues`; integer enums their labels.
    pub fn enum_options(&self) -> Vec<String> {
        match &self.kind {
            FieldKind::Boolean {
                true_values,
                false_values,
            } => true_values.iter().chain(false_values).cloned().collect(),
            FieldKind::Integer {
                enum_mapping: Some(mapping),
                ..
            } => mapping.labels().map(str::to_string).collect(),
            FieldKind::String {
                enum_values: Some(values),
                ..
            } => values.clone(),
            _ => Vec::new(),
        }
    }

    pub fn enum_mapping(&self) -> Option<&EnumMapping> {
        match &self.kind {
            FieldKind::Integer { enum_mapping, .. } => enum_mapping.as_ref(),
            _ => None,
        }
    }

    fn from_descriptor(descriptor: &FieldDescriptor) -> Result<Self> {
        let name = descriptor.name.trim().to_string();
        if name.is_empty() {
            return Err(ModelError::EmptyFieldName);
        }
        let declared_type = descriptor
            .field_type
            .clone()
            .unwrap_or_else(|| "string".to_string());
        let constraints = &descriptor.constraints;
        let enum_mapping = descriptor.enum_mapping.as_ref().map(|map| {
            EnumMapping::new(
                map.iter()
                    .filter_map(|(label, value)| value.as_i64().map(|v| (label.clone(), v)))
                    .collect(),
            )
        });

        // An enum mapping always makes an integer enum, whatever the declared type.
        let kind = if enum_mapping.is_some() {
            FieldKind::Integer {
                range: int_range(constraints),
                enum_mapping,
            }
        } else {
            match declared_type.as_str() {
                "string" => FieldKind::String {
                    enum_values: constraints.enum_values.as_ref().map(|values| {
                        values.iter().map(json_scalar_to_string).collect()
                    }),
                    pattern: compile_pattern(&name, constraints.pattern.as_deref())?,
                },
                "integer" => FieldKind::Integer {
                    range: int_range(constraints),
                    enum_mapping: None,
                },
                "number" => FieldKind::Number {
                    range: Range {
                        minimum: constraints.minimum.as_ref().and_then(serde_json::Number::as_f64),
                        maximum: constraints.maximum.as_ref().and_then(serde_json::Number::as_f64),
                    },
                    group_char: descriptor.group_char.clone().filter(|c| !c.is_empty()),
                    decimal_char: descriptor
                        .decimal_char
                        .clone()
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| ".".to_string()),
                },
                "boolean" => FieldKind::Boolean {
                    true_values: descriptor
                        .true_values
                        .clone()
                        .unwrap_or_else(|| DEFAULT_TRUE_VALUES.map(String::from).to_vec()),
                    false_values: descriptor
                        .false_values
                        .clone()
                        .unwrap_or_else(|| DEFAULT_FALSE_VALUES.map(String::from).to_vec()),
                },
                "date" => FieldKind::Date {
                    format: DateFormat::from_descriptor(descriptor.format.as_deref()),
                },
                other => FieldKind::Other {
                    type_name: other.to_string(),
                },
            }
        };

        let milestones = match &descriptor.milestones {
            None => None,
            Some(indices) => {
                let mut custom_names = BTreeMap::new();
                if let Some(custom) = &descriptor.custom_milestone_field_names {
                    for (key, column) in custom {
                        let index = key.trim().parse::<i64>().map_err(|_| {
                            ModelError::InvalidMilestoneKey {
                                field: name.clone(),
                                key: key.clone(),
                            }
                        })?;
                        custom_names.insert(index, column.clone());
                    }
                }
                Some(MilestoneBinding {
                    indices: indices.clone(),
                    custom_names,
                })
            }
        };

        Ok(Self {
            name,
            declared_type,
            kind,
            required: constraints.required,
            allows_multiple: descriptor.allows_multiple,
            milestones,
        })
    }
}

fn int_range(constraints: &ConstraintsDescriptor) -> Range<i64> {
    Range {
        minimum: constraints.minimum.as_ref().and_then(number_as_i64),
        maximum: constraints.maximum.as_ref().and_then(number_as_i64),
    }
}

fn number_as_i64(number: &serde_json::Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|value| value.fract() == 0.0)
            .map(|value| value as i64)
    })
}

fn json_scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn compile_pattern(field: &str, pattern: Option<&str>) -> Result<Option<Regex>> {
    let Some(pattern) = pattern else {
        return Ok(None);
    };
    Regex::new(&format!("^(?:{pattern})$"))
        .map(Some)
        .map_err(|source| ModelError::InvalidPattern {
            field: field.to_string(),
            source,
        })
}

/// Column-format column names for one milestone: column name to field name.
pub type MilestoneColumns = Vec<(String, String)>;

/// Immutable, validated-on-load field collection.
#[derive(Debug, Clone)]
pub struct TableSchema {
    fields: Vec<SchemaField>,
    milestone_names: Option<Vec<String>>,
}

impl TableSchema {
    pub fn new(fields: Vec<SchemaField>, milestone_names: Option<Vec<String>>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ModelError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Self {
            fields,
            milestone_names,
        })
    }

    pub fn from_descriptor(descriptor: &SchemaDescriptor) -> Result<Self> {
        let fields = descriptor
            .fields
            .iter()
            .map(SchemaField::from_descriptor)
            .collect::<Result<Vec<_>>>()?;
        Self::new(fields, descriptor.column_based_milestone_names.clone())
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    /// Declared milestone names, if the schema lists them.
    pub fn milestone_names(&self) -> Option<&[String]> {
        self.milestone_names.as_deref()
    }

    pub fn required_field_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name.as_str())
            .collect()
    }

    /// Enum fields followed by boolean fields, in schema order.
    pub fn mappable_fields(&self) -> Vec<&SchemaField> {
        self.fields
            .iter()
            .filter(|field| field.is_enum())
            .chain(self.fields.iter().filter(|field| field.is_boolean()))
            .collect()
    }

    /// Fields without milestone bindings.
    pub fn admin_field_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.milestones.is_none())
            .map(|field| field.name.as_str())
            .collect()
    }

    /// Column-format names grouped by milestone, in milestone order.
    ///
    /// Each column is `milestone_name + field_name` unless the field declares
    /// a custom name for that milestone. Out-of-range indices are skipped.
    pub fn milestone_columns(&self) -> Vec<(String, MilestoneColumns)> {
        let names = self.milestone_names().unwrap_or_default();
        let mut grouped: Vec<(String, MilestoneColumns)> = names
            .iter()
            .map(|name| (name.clone(), Vec::new()))
            .collect();
        for field in &self.fields {
            let Some(binding) = &field.milestones else {
                continue;
            };
            for &index in &binding.indices {
                let Some((milestone, columns)) = usize::try_from(index)
                    .ok()
                    .and_then(|idx| grouped.get_mut(idx))
                else {
                    continue;
                };
                let column = binding
                    .custom_names
                    .get(&index)
                    .cloned()
                    .unwrap_or_else(|| format!("{milestone}{}", field.name));
                columns.push((column, field.name.clone()));
            }
        }
        grouped
    }

    /// Names a dataset column may carry after column mapping.
    pub fn valid_field_names(&self, row_format: bool) -> Vec<String> {
        if row_format {
            return self.fields.iter().map(|field| field.name.clone()).collect();
        }
        let mut names: Vec<String> = self
            .admin_field_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for (_, columns) in self.milestone_columns() {
            names.extend(columns.into_iter().map(|(column, _)| column));
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(json: &str) -> SchemaDescriptor {
        serde_json::from_str(json).expect("parse descriptor")
    }

    fn sample_schema() -> TableSchema {
        TableSchema::from_descriptor(&descriptor(
            r#"{
                "column_based_milestone_names": ["Intake", "Exit"],
                "fields": [
                    {"name": "CaseNumber", "constraints": {"required": true}},
                    {"name": "Wage", "type": "number", "milestones": [0, 1]},
                    {"name": "Score", "type": "integer", "milestones": [1],
                     "custom_milestone_field_names": {"1": "ExitScoreCustom"},
                     "constraints": {"minimum": 1, "maximum": 2},
                     "enum_mapping": {"Low": 1, "High": 2}},
                    {"name": "Flag", "type": "boolean", "trueValues": ["Y"], "falseValues": ["N"]}
                ]
            }"#,
        ))
        .expect("schema")
    }

    #[test]
    fn kinds_are_typed() {
        let schema = sample_schema();
        assert!(matches!(
            schema.field("Wage").unwrap().kind,
            FieldKind::Number { .. }
        ));
        let score = schema.field("Score").unwrap();
        assert!(score.is_enum());
        assert_eq!(score.enum_options(), vec!["Low", "High"]);
        assert_eq!(score.enum_mapping().unwrap().get_ignore_case("high"), Some(2));
        assert_eq!(
            schema.field("Flag").unwrap().enum_options(),
            vec!["Y", "N"]
        );
    }

    #[test]
    fn enum_labels_keep_declaration_order() {
        let descriptor: SchemaDescriptor = serde_json::from_str(
            r#"{"fields": [{"name": "Agreement", "type": "integer",
                            "constraints": {"minimum": 1, "maximum": 4},
                            "enum_mapping": {"Strongly Disagree": 1, "Disagree": 2,
                                             "Agree": 3, "Strongly Agree": 4}}]}"#,
        )
        .unwrap();
        let schema = TableSchema::from_descriptor(&descriptor).unwrap();
        let field = schema.field("Agreement").unwrap();
        assert_eq!(
            field.enum_options(),
            vec!["Strongly Disagree", "Disagree", "Agree", "Strongly Agree"]
        );
        let labels: Vec<&str> = field.enum_mapping().unwrap().labels().collect();
        assert_eq!(labels, field.enum_options());
    }

    #[test]
    fn column_format_names() {
        let schema = sample_schema();
        let columns = schema.milestone_columns();
        assert_eq!(columns[0].0, "Intake");
        assert_eq!(
            columns[0].1,
            vec![("IntakeWage".to_string(), "Wage".to_string())]
        );
        assert_eq!(
            columns[1].1,
            vec![
                ("ExitWage".to_string(), "Wage".to_string()),
                ("ExitScoreCustom".to_string(), "Score".to_string()),
            ]
        );
        assert_eq!(
            schema.valid_field_names(false),
            vec!["CaseNumber", "Flag", "IntakeWage", "ExitWage", "ExitScoreCustom"]
        );
        assert_eq!(schema.valid_field_names(true).len(), 4);
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let result = TableSchema::from_descriptor(&descriptor(
            r#"{"fields": [{"name": "A"}, {"name": "A"}]}"#,
        ));
        assert!(matches!(result, Err(ModelError::DuplicateField(name)) if name == "A"));
    }

    #[test]
    fn patterns_are_anchored() {
        let schema = TableSchema::from_descriptor(&descriptor(
            r#"{"fields": [{"name": "SOC", "constraints": {"pattern": "[0-9]{2}-[0-9]{4}"}}]}"#,
        ))
        .unwrap();
        let FieldKind::String {
            pattern: Some(pattern),
            ..
        } = &schema.field("SOC").unwrap().kind
        else {
            panic!("expected string pattern");
        };
        assert!(pattern.is_match("15-2030"));
        assert!(!pattern.is_match("1511-2030"));
    }
}

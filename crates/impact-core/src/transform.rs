//! Field-specific transforms applied before casting.
//!
//! Each transform maps one non-blank value to its canonical form, or fails
//! with a human-readable reason.

use impact_model::{CellValue, FieldKind, FieldMapping, SOC_FIELD, STATE_FIELD, SchemaField};

use crate::states;

/// Outcome of a transform or cast: the new value, or why it is invalid.
pub type Transformed = Result<CellValue, String>;

/// Which transform a field gets, chosen by type and name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Enum,
    Soc,
    State,
    Integer,
}

impl TransformKind {
    pub fn for_field(field: &SchemaField) -> Option<Self> {
        if field.is_enum() || field.is_boolean() {
            Some(Self::Enum)
        } else if field.name == SOC_FIELD {
            Some(Self::Soc)
        } else if field.name == STATE_FIELD {
            Some(Self::State)
        } else if matches!(field.kind, FieldKind::Integer { .. }) {
            Some(Self::Integer)
        } else {
            None
        }
    }

    pub fn apply(
        self,
        field: &SchemaField,
        mapping: Option<&FieldMapping>,
        value: &CellValue,
    ) -> Transformed {
        match self {
            Self::Enum => transform_enum(field, mapping, value),
            Self::Soc => transform_soc(value),
            Self::State => transform_state(value),
            Self::Integer => transform_int(value),
        }
    }
}

/// Normalizes boolean, integer-enum and string-enum values.
///
/// Integral input for an integer enum is accepted as-is; otherwise the field
/// mapping is consulted before a case-insensitive match on the options.
pub fn transform_enum(
    field: &SchemaField,
    mapping: Option<&FieldMapping>,
    value: &CellValue,
) -> Transformed {
    let val = match &field.kind {
        FieldKind::Boolean { .. } => match value.as_integral() {
            Some(number) => number.to_string(),
            None => value.to_string(),
        },
        FieldKind::Integer { .. } => {
            if let Some(number) = value.as_integral() {
                return Ok(CellValue::Integer(number));
            }
            value.to_string()
        }
        _ => value.to_string(),
    };
    let enum_mapping = field.enum_mapping();

    if let Some(entry) = mapping.and_then(|mapping| mapping.get(&val)) {
        let Some(output) = &entry.output else {
            return Ok(CellValue::Missing);
        };
        return match enum_mapping {
            Some(enum_mapping) => enum_mapping
                .get(output)
                .map(CellValue::Integer)
                .ok_or_else(|| not_in_value_set(field, &val)),
            None => Ok(CellValue::text(output.clone())),
        };
    }

    if let Some(enum_mapping) = enum_mapping {
        if let Some(number) = enum_mapping.get_ignore_case(&val) {
            return Ok(CellValue::Integer(number));
        }
    } else {
        let lowered = val.to_lowercase();
        if let Some(option) = field
            .enum_options()
            .into_iter()
            .find(|option| option.to_lowercase() == lowered)
        {
            return Ok(CellValue::Text(option));
        }
    }
    Err(not_in_value_set(field, &val))
}

fn not_in_value_set(field: &SchemaField, val: &str) -> String {
    let mut reason = format!("{val} is not in field mapping or valid value set");
    if field.is_boolean() {
        reason.push_str(&format!(" ({})", quoted_list(&field.enum_options())));
    }
    reason
}

/// Renders `['a', 'b']`.
fn quoted_list(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|value| {
            if value.contains('\'') && !value.contains('"') {
                format!("\"{value}\"")
            } else {
                format!("'{}'", value.replace('\'', "\\'"))
            }
        })
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Truncates an SOC code at its first `.`; the format is checked when casting.
pub fn transform_soc(value: &CellValue) -> Transformed {
    match value {
        CellValue::Text(text) => {
            let trimmed = text.trim();
            let code = trimmed.split('.').next().unwrap_or(trimmed);
            Ok(CellValue::text(code))
        }
        other => Err(format!("{other} is not a string")),
    }
}

pub fn transform_state(value: &CellValue) -> Transformed {
    states::abbreviation(&value.to_string())
        .map(CellValue::text)
        .ok_or_else(|| format!("{value} is not a valid state"))
}

pub fn transform_int(value: &CellValue) -> Transformed {
    value
        .as_integral()
        .map(CellValue::Integer)
        .ok_or_else(|| format!("{value} is not an integer"))
}

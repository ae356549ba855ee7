//! Schema-driven casting of transformed cell values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use impact_model::{CellValue, DateFormat, FieldKind, Range, SOC_FIELD, SchemaField};

/// Why a value failed to cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastFailure {
    /// Parsed, but outside the field's minimum/maximum.
    OutOfRange,
    /// Wrong type, not in the enum set, or not matching the pattern.
    Invalid,
}

const ANY_DATE_FORMATS: [&str; 14] = [
    "%Y-%m-%d",
    "%m-%d-%y",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%m.%d.%Y",
    "%Y%m%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const ANY_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

/// Parses a date month-first, accepting date-time forms.
pub fn parse_any_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    ANY_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            ANY_DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|datetime| datetime.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|datetime| datetime.date_naive())
        })
}

fn parse_date(raw: &str, format: &DateFormat) -> Option<NaiveDate> {
    match format {
        DateFormat::Iso => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok(),
        DateFormat::Any => parse_any_date(raw),
        DateFormat::Pattern(pattern) => NaiveDate::parse_from_str(raw.trim(), pattern)
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw.trim(), pattern)
                    .ok()
                    .map(|datetime| datetime.date())
            }),
    }
}

fn check_range<T: PartialOrd + Copy>(value: T, range: &Range<T>) -> Result<(), CastFailure> {
    if range.contains(value) {
        Ok(())
    } else {
        Err(CastFailure::OutOfRange)
    }
}

/// Casts a transformed, non-blank value to the field's declared type.
pub fn cast_value(field: &SchemaField, value: &CellValue) -> Result<CellValue, CastFailure> {
    match &field.kind {
        FieldKind::String {
            enum_values,
            pattern,
        } => {
            let CellValue::Text(text) = value else {
                return Err(CastFailure::Invalid);
            };
            if enum_values
                .as_ref()
                .is_some_and(|values| !values.iter().any(|v| v == text))
            {
                return Err(CastFailure::Invalid);
            }
            if pattern.as_ref().is_some_and(|p| !p.is_match(text)) {
                return Err(CastFailure::Invalid);
            }
            Ok(value.clone())
        }
        FieldKind::Integer { range, .. } => {
            let number = match value {
                CellValue::Integer(number) => *number,
                CellValue::Text(text) => text.trim().parse::<i64>().map_err(|_| CastFailure::Invalid)?,
                _ => return Err(CastFailure::Invalid),
            };
            check_range(number, range)?;
            Ok(CellValue::Integer(number))
        }
        FieldKind::Number {
            range,
            group_char,
            decimal_char,
        } => {
            let raw = match value {
                CellValue::Integer(number) => number.to_string(),
                CellValue::Text(text) | CellValue::Decimal(text) => text.trim().to_string(),
                _ => return Err(CastFailure::Invalid),
            };
            let mut canonical = raw;
            if let Some(group) = group_char {
                canonical = canonical.replace(group.as_str(), "");
            }
            if decimal_char != "." {
                canonical = canonical.replace(decimal_char.as_str(), ".");
            }
            let number = canonical
                .parse::<f64>()
                .map_err(|_| CastFailure::Invalid)?;
            check_range(number, range)?;
            Ok(CellValue::Decimal(canonical))
        }
        FieldKind::Boolean {
            true_values,
            false_values,
        } => match value {
            CellValue::Bool(flag) => Ok(CellValue::Bool(*flag)),
            CellValue::Text(text) => {
                let token = text.trim();
                if true_values.iter().any(|v| v == token) {
                    Ok(CellValue::Bool(true))
                } else if false_values.iter().any(|v| v == token) {
                    Ok(CellValue::Bool(false))
                } else {
                    Err(CastFailure::Invalid)
                }
            }
            _ => Err(CastFailure::Invalid),
        },
        FieldKind::Date { format } => match value {
            CellValue::Date(date) => Ok(CellValue::Date(*date)),
            CellValue::Text(text) => parse_date(text, format)
                .map(CellValue::Date)
                .ok_or(CastFailure::Invalid),
            _ => Err(CastFailure::Invalid),
        },
        FieldKind::Other { .. } => Ok(value.clone()),
    }
}

/// Human-readable reason for a cast failure.
pub fn cast_failure_reason(field: &SchemaField, value: &CellValue, failure: CastFailure) -> String {
    if failure == CastFailure::OutOfRange {
        let bounds = match &field.kind {
            FieldKind::Integer { range, .. } => Some((
                range.minimum.map(|v| v.to_string()),
                range.maximum.map(|v| v.to_string()),
            )),
            FieldKind::Number { range, .. } => Some((
                range.minimum.map(format_bound),
                range.maximum.map(format_bound),
            )),
            _ => None,
        };
        match bounds {
            Some((Some(min), Some(max))) => {
                return format!("{} must be within the range [{min}, {max}]", field.name);
            }
            Some((None, Some(max))) => {
                return format!("{} must be less than or equal to {max}", field.name);
            }
            Some((Some(min), None)) => {
                return format!("{} must be greater than or equal to {min}", field.name);
            }
            _ => {}
        }
    }
    if matches!(field.kind, FieldKind::Date { .. }) {
        return format!("{value} is not a valid date");
    }
    if field.name == SOC_FIELD {
        return "SOC should be in the format ##-####".to_string();
    }
    format!("{value} is not a valid {}", field.kind.type_name())
}

fn format_bound(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

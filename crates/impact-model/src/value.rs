//! Cell values flowing through shaping, processing and delivery.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// A single table cell.
///
/// `Missing` is the only blank sentinel: shaping produces `Text`/`List`
/// values, processing turns them into typed variants or `Missing`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Missing,
    Text(String),
    Integer(i64),
    /// Canonical decimal text (group separators removed, `.` as decimal point).
    Decimal(String),
    Bool(bool),
    Date(NaiveDate),
    List(Vec<CellValue>),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Builds a list of text values.
    pub fn text_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(|v| Self::Text(v.into())).collect())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Missing values and whitespace-only text are blank.
    ///
    /// Blank values are never invalid; they simply become `Missing`.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Parses the value as a float the way a lenient numeric reader would.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Text(text) | Self::Decimal(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Returns the integer value when the cell reads as an integral number
    /// (`3`, `"3"`, `"3.0"`).
    pub fn as_integral(&self) -> Option<i64> {
        if let Self::Integer(value) = self {
            return Some(*value);
        }
        let number = self.as_f64()?;
        if !number.is_finite()
            || number.fract() != 0.0
            || number < i64::MIN as f64
            || number >= i64::MAX as f64
        {
            return None;
        }
        Some(number as i64)
    }

    /// True when the cell reads as an integral number.
    pub fn is_int(&self) -> bool {
        self.as_integral().is_some()
    }

    /// Text used for CSV delivery: booleans as `True`/`False`, lists joined with `,`.
    pub fn to_delivery_string(&self) -> Option<String> {
        match self {
            Self::Missing => None,
            Self::List(items) => Some(
                items
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Text(text) | Self::Decimal(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

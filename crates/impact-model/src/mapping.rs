//! Column and field mappings.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{ModelError, Result};
use crate::table::Sheet;

pub const INPUT_COLUMN: &str = "Input";
pub const OUTPUT_COLUMN: &str = "Output";
pub const APPROVED_COLUMN: &str = "Approved";
pub const FIELD_MAPPING_HEADERS: [&str; 3] = [INPUT_COLUMN, OUTPUT_COLUMN, APPROVED_COLUMN];

pub const INTERNAL_COLUMN_NAME: &str = "Internal Column Name";
pub const FIELD_NAME_COLUMN: &str = "Mission Impact Field Name";
pub const COLUMN_MAPPING_HEADERS: [&str; 2] = [INTERNAL_COLUMN_NAME, FIELD_NAME_COLUMN];

/// Human sign-off state of a mapping entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Approval {
    Approved,
    #[default]
    NotApproved,
}

impl Approval {
    pub fn label(self) -> &'static str {
        match self {
            Self::Approved => "Yes",
            Self::NotApproved => "No",
        }
    }

    pub fn is_approved(self) -> bool {
        self == Self::Approved
    }

    /// Cell values accepted in the `Approved` column.
    pub fn is_valid_label(value: &str) -> bool {
        value.parse::<Self>().is_ok()
    }
}

impl FromStr for Approval {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "Yes" => Ok(Self::Approved),
            "No" | "None" | "" => Ok(Self::NotApproved),
            other => Err(ModelError::InvalidApproval(other.to_string())),
        }
    }
}

impl fmt::Display for Approval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingEntry {
    /// Canonical value, or `None` when the raw value is unmappable.
    pub output: Option<String>,
    pub approval: Approval,
}

impl MappingEntry {
    pub fn new(output: Option<String>, approval: Approval) -> Self {
        let output = output.filter(|value| !value.trim().is_empty());
        Self { output, approval }
    }
}

/// Raw observed value to canonical value, for one enum or boolean field.
///
/// Keys are unique and keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    entries: Vec<(String, MappingEntry)>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry; a replaced entry keeps its position.
    pub fn insert(&mut self, input: impl Into<String>, entry: MappingEntry) {
        let input = input.into();
        match self.entries.iter_mut().find(|(key, _)| *key == input) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((input, entry)),
        }
    }

    pub fn get(&self, input: &str) -> Option<&MappingEntry> {
        self.entries
            .iter()
            .find(|(key, _)| key == input)
            .map(|(_, entry)| entry)
    }

    pub fn contains(&self, input: &str) -> bool {
        self.get(input).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappingEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry that has not been approved.
    pub fn retain_approved(&mut self) {
        self.entries.retain(|(_, entry)| entry.approval.is_approved());
    }

    /// Inputs still waiting for approval, in order.
    pub fn unapproved_inputs(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.approval.is_approved())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Builds a mapping from an `Input, Output, Approved` sheet.
    pub fn from_sheet(sheet: &Sheet) -> Result<Self> {
        let inputs = required_column(sheet, INPUT_COLUMN)?;
        let outputs = required_column(sheet, OUTPUT_COLUMN)?;
        let approvals = required_column(sheet, APPROVED_COLUMN)?;
        let mut mapping = Self::new();
        for ((input, output), approval) in inputs.into_iter().zip(outputs).zip(approvals) {
            mapping.insert(
                input,
                MappingEntry::new(Some(output.to_string()), approval.parse()?),
            );
        }
        Ok(mapping)
    }

    /// Tabular form with a blank `Output` for unmappable entries.
    pub fn to_sheet(&self) -> Sheet {
        Sheet::new(
            FIELD_MAPPING_HEADERS.map(String::from).to_vec(),
            self.entries
                .iter()
                .map(|(input, entry)| {
                    vec![
                        input.clone(),
                        entry.output.clone().unwrap_or_default(),
                        entry.approval.label().to_string(),
                    ]
                })
                .collect(),
        )
    }
}

impl FromIterator<(String, MappingEntry)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (String, MappingEntry)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (input, entry) in iter {
            mapping.insert(input, entry);
        }
        mapping
    }
}

/// Field mappings keyed by schema field name.
pub type FieldMappings = BTreeMap<String, FieldMapping>;

/// Where an incoming column goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ColumnTarget {
    Field(String),
    Drop,
}

/// Local column name to canonical field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    targets: BTreeMap<String, ColumnTarget>,
}

impl ColumnMapping {
    pub fn new(targets: BTreeMap<String, ColumnTarget>) -> Self {
        Self { targets }
    }

    /// Builds the mapping from a two-column sheet; a blank target drops the column.
    pub fn from_sheet(sheet: &Sheet) -> Result<Self> {
        let internal = required_column(sheet, INTERNAL_COLUMN_NAME)?;
        let fields = required_column(sheet, FIELD_NAME_COLUMN)?;
        let targets = internal
            .into_iter()
            .zip(fields)
            .filter(|(name, _)| !name.trim().is_empty())
            .map(|(name, field)| {
                let field = field.trim();
                let target = if field.is_empty() {
                    ColumnTarget::Drop
                } else {
                    ColumnTarget::Field(field.to_string())
                };
                (name.trim().to_string(), target)
            })
            .collect();
        Ok(Self { targets })
    }

    pub fn get(&self, column: &str) -> Option<&ColumnTarget> {
        self.targets.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.targets.contains_key(column)
    }

    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    pub fn dropped_columns(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .filter(|(_, target)| **target == ColumnTarget::Drop)
            .map(|(name, _)| name.as_str())
    }

    /// Rename pairs for columns that are kept.
    pub fn renames(&self) -> BTreeMap<String, String> {
        self.targets
            .iter()
            .filter_map(|(name, target)| match target {
                ColumnTarget::Field(field) => Some((name.clone(), field.clone())),
                ColumnTarget::Drop => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

fn required_column<'a>(sheet: &'a Sheet, name: &str) -> Result<Vec<&'a str>> {
    sheet
        .column(name)
        .ok_or_else(|| ModelError::MissingSheetColumn(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(headers: &[&str], rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            headers.iter().map(|h| (*h).to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| (*c).to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn approval_labels() {
        assert_eq!("Yes".parse::<Approval>().unwrap(), Approval::Approved);
        assert_eq!("".parse::<Approval>().unwrap(), Approval::NotApproved);
        assert_eq!("None".parse::<Approval>().unwrap(), Approval::NotApproved);
        assert!("maybe".parse::<Approval>().is_err());
    }

    #[test]
    fn field_mapping_from_sheet() {
        let mapping = FieldMapping::from_sheet(&sheet(
            &FIELD_MAPPING_HEADERS,
            &[&["Y", "yes", "Yes"], &["Maybe", "", "No"]],
        ))
        .unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get("Y").unwrap().output.as_deref(), Some("yes"));
        assert_eq!(mapping.get("Maybe").unwrap().output, None);
        assert_eq!(mapping.unapproved_inputs(), vec!["Maybe"]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut mapping = FieldMapping::new();
        mapping.insert("a", MappingEntry::new(Some("x".into()), Approval::NotApproved));
        mapping.insert("b", MappingEntry::new(None, Approval::NotApproved));
        mapping.insert("a", MappingEntry::new(Some("y".into()), Approval::Approved));
        let keys: Vec<&str> = mapping.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(mapping.get("a").unwrap().output.as_deref(), Some("y"));
        mapping.retain_approved();
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn column_mapping_blank_target_drops() {
        let mapping = ColumnMapping::from_sheet(&sheet(
            &COLUMN_MAPPING_HEADERS,
            &[&["Case #", "CaseNumber"], &["Notes", ""]],
        ))
        .unwrap();
        assert_eq!(mapping.get("Notes"), Some(&ColumnTarget::Drop));
        assert_eq!(mapping.dropped_columns().collect::<Vec<_>>(), vec!["Notes"]);
        assert_eq!(
            mapping.renames().get("Case #").map(String::as_str),
            Some("CaseNumber")
        );
    }

    #[test]
    fn missing_header_is_reported() {
        let result = FieldMapping::from_sheet(&sheet(&["Input", "Output"], &[]));
        assert!(matches!(result, Err(ModelError::MissingSheetColumn(c)) if c == "Approved"));
    }
}

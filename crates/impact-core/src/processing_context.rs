use std::collections::BTreeMap;

use impact_map::ResolveOptions;
use impact_model::{Sheet, Table, TableSchema};

use crate::shape::DEFAULT_MULTIPLE_VALUE_DELIMITER;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Stamped into `MemberOrganization` on every row.
    pub member_id: String,
    /// Datasets already hold one row per (case, milestone).
    pub row_format: bool,
    pub multiple_value_delimiter: String,
    pub overwrite_mappings: bool,
    pub remove_unapproved_source: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            member_id: String::new(),
            row_format: true,
            multiple_value_delimiter: DEFAULT_MULTIPLE_VALUE_DELIMITER.to_string(),
            overwrite_mappings: false,
            remove_unapproved_source: true,
        }
    }
}

impl PipelineOptions {
    pub fn new(member_id: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_row_format(mut self, row_format: bool) -> Self {
        self.row_format = row_format;
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.multiple_value_delimiter = delimiter.into();
        self
    }

    #[must_use]
    pub fn with_overwrite_mappings(mut self, overwrite: bool) -> Self {
        self.overwrite_mappings = overwrite;
        self
    }

    #[must_use]
    pub fn with_remove_unapproved_source(mut self, remove: bool) -> Self {
        self.remove_unapproved_source = remove;
        self
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions::default()
            .with_overwrite(self.overwrite_mappings)
            .with_remove_unapproved_source(self.remove_unapproved_source)
    }
}

/// Raw inputs of one run, before any gate has looked at them.
#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    /// Named datasets in submission order.
    pub datasets: Vec<(String, Table)>,
    pub column_mapping: Sheet,
    /// Stored field-mapping sheets keyed by field name.
    pub field_mappings: BTreeMap<String, Sheet>,
}

impl PipelineInput {
    pub fn new(column_mapping: Sheet) -> Self {
        Self {
            column_mapping,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_dataset(mut self, name: impl Into<String>, dataset: Table) -> Self {
        self.datasets.push((name.into(), dataset));
        self
    }

    #[must_use]
    pub fn with_field_mappings(mut self, field_mappings: BTreeMap<String, Sheet>) -> Self {
        self.field_mappings = field_mappings;
        self
    }
}

/// Read-only view handed to every pipeline step.
#[derive(Debug, Clone, Copy)]
pub struct PipelineContext<'a> {
    pub schema: &'a TableSchema,
    pub input: &'a PipelineInput,
    pub options: &'a PipelineOptions,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        schema: &'a TableSchema,
        input: &'a PipelineInput,
        options: &'a PipelineOptions,
    ) -> Self {
        Self {
            schema,
            input,
            options,
        }
    }
}

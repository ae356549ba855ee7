//! Dataset shape transformation.
//!
//! Renames columns per the column mapping, melts column-format data into one
//! row per (case, milestone), normalizes every cell to trimmed text, splits
//! multi-value fields and stamps the administrative columns.

use std::collections::{BTreeMap, BTreeSet};

use impact_model::{
    CellValue, ColumnMapping, FORCE_OVERWRITE_FIELD, MEMBER_ORGANIZATION_FIELD,
    MILESTONE_FLAG_FIELD, Table, TableSchema,
};
use tracing::debug;

/// Value stamped into the `ForceOverWrite` column.
pub const FORCE_OVERWRITE_VALUE: &str = "1";

/// Default separator for multi-value cells.
pub const DEFAULT_MULTIPLE_VALUE_DELIMITER: &str = ";";

pub struct ShapeTransformer<'a> {
    member_id: &'a str,
    schema: &'a TableSchema,
    column_mapping: &'a ColumnMapping,
    row_format: bool,
    delimiter: &'a str,
}

impl<'a> ShapeTransformer<'a> {
    pub fn new(
        member_id: &'a str,
        schema: &'a TableSchema,
        column_mapping: &'a ColumnMapping,
        row_format: bool,
    ) -> Self {
        Self {
            member_id,
            schema,
            column_mapping,
            row_format,
            delimiter: DEFAULT_MULTIPLE_VALUE_DELIMITER,
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: &'a str) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Shapes one dataset; an empty dataset is returned unchanged.
    pub fn transform(&self, dataset: &Table) -> Table {
        if dataset.is_empty() {
            return dataset.clone();
        }
        let mut shaped = self.rename_and_melt(dataset);
        normalize_text(&mut shaped);
        self.split_multiple_values(&mut shaped);
        shaped.fill_column(MEMBER_ORGANIZATION_FIELD, &CellValue::text(self.member_id));
        shaped.fill_column(FORCE_OVERWRITE_FIELD, &CellValue::text(FORCE_OVERWRITE_VALUE));
        shaped
    }

    fn rename_and_melt(&self, dataset: &Table) -> Table {
        let dropped: BTreeSet<String> = self
            .column_mapping
            .dropped_columns()
            .filter(|name| dataset.has_column(name))
            .map(str::to_string)
            .collect();
        let mut renamed = dataset.clone();
        renamed.drop_columns(&dropped);
        renamed.rename_columns(&self.column_mapping.renames());
        if self.row_format {
            renamed
        } else {
            self.column_to_row_format(&renamed)
        }
    }

    /// Stacks one row-set per milestone that has any data.
    fn column_to_row_format(&self, dataset: &Table) -> Table {
        let admin: Vec<String> = self
            .schema
            .admin_field_names()
            .into_iter()
            .filter(|name| dataset.has_column(name))
            .map(str::to_string)
            .collect();

        let mut parts = Vec::new();
        for (milestone, columns) in self.schema.milestone_columns() {
            let present: Vec<(String, String)> = columns
                .into_iter()
                .filter(|(column, _)| dataset.has_column(column))
                .collect();
            let rows: Vec<usize> = (0..dataset.height())
                .filter(|&row| {
                    present
                        .iter()
                        .any(|(column, _)| !dataset.value(row, column).is_missing())
                })
                .collect();
            if rows.is_empty() {
                debug!(milestone = %milestone, "no data for milestone");
                continue;
            }
            let column_names: Vec<String> =
                present.iter().map(|(column, _)| column.clone()).collect();
            let mut part = dataset.select(&column_names, &rows);
            let renames: BTreeMap<String, String> = present.into_iter().collect();
            part.rename_columns(&renames);
            let admin_part = dataset.select(&admin, &rows);
            for column in admin_part.columns() {
                if let Some(values) = admin_part.column_values(column) {
                    part.set_column(column, values);
                }
            }
            part.fill_column(MILESTONE_FLAG_FIELD, &CellValue::text(milestone.clone()));
            parts.push(part);
        }
        Table::concat(parts)
    }

    fn split_multiple_values(&self, table: &mut Table) {
        for field in self.schema.fields().iter().filter(|f| f.allows_multiple) {
            table.map_column(&field.name, |value| match value {
                CellValue::Text(text) => {
                    CellValue::text_list(text.split(self.delimiter).map(str::trim))
                }
                other => other,
            });
        }
    }
}

/// Missing cells become empty text, every cell is rendered as trimmed text.
pub fn normalize_text(table: &mut Table) {
    table.map_cells(|value| CellValue::text(value.to_string().trim()));
}

/// Replaces `Missing` with empty text.
pub fn fill_missing(table: &mut Table) {
    table.map_cells(|value| match value {
        CellValue::Missing => CellValue::text(""),
        other => other,
    });
}

use std::collections::{BTreeMap, BTreeSet};

use impact_model::{CheckFailure, CheckFailures, ColumnMapping, Table, TableSchema};

/// Prefix given to columns read without a header.
pub const UNNAMED_PREFIX: &str = "Unnamed: ";

/// Checks that a raw dataset only carries mapped or schema columns.
pub fn validate_dataset_shape(
    dataset: &Table,
    schema: &TableSchema,
    column_mapping: &ColumnMapping,
    row_format: bool,
) -> CheckFailures {
    let mut failures = Vec::new();
    let valid: BTreeSet<String> = column_mapping
        .local_names()
        .map(str::to_string)
        .chain(schema.valid_field_names(row_format))
        .collect();

    let unexpected: BTreeSet<&String> = dataset
        .columns()
        .iter()
        .filter(|column| !column.contains(UNNAMED_PREFIX.trim_end()))
        .filter(|column| !valid.contains(*column))
        .collect();
    if !unexpected.is_empty() {
        failures.push(CheckFailure::ColumnsNotInSet {
            failed_values: unexpected.into_iter().cloned().collect(),
        });
    }

    let unnamed: BTreeSet<String> = dataset
        .columns()
        .iter()
        .filter(|column| column.contains("Unnamed"))
        .map(|column| column.get(UNNAMED_PREFIX.len()..).unwrap_or_default().to_string())
        .collect();
    if !unnamed.is_empty() {
        failures.push(CheckFailure::UnnamedColumns {
            failed_values: unnamed.into_iter().collect(),
        });
    }
    failures
}

/// Failures per dataset name; datasets that pass are left out.
pub fn validate_dataset_shapes(
    datasets: &[(String, Table)],
    schema: &TableSchema,
    column_mapping: &ColumnMapping,
    row_format: bool,
) -> BTreeMap<String, CheckFailures> {
    datasets
        .iter()
        .filter_map(|(name, dataset)| {
            let failures = validate_dataset_shape(dataset, schema, column_mapping, row_format);
            (!failures.is_empty()).then(|| (name.clone(), failures))
        })
        .collect()
}

//! Validation gates.
//!
//! Each gate inspects one input and returns the failed checks as data; an
//! empty result means the gate passed.

mod approval;
mod column_mapping;
mod dataset_shape;
mod field_mapping;

pub use approval::validate_approvals;
pub use column_mapping::validate_column_mapping;
pub use dataset_shape::{UNNAMED_PREFIX, validate_dataset_shape, validate_dataset_shapes};
pub use field_mapping::{validate_field_mapping, validate_field_mappings};

use std::collections::BTreeSet;

use impact_model::{CheckFailure, Sheet};

/// Blank cells are treated as null and skipped by value checks.
fn non_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Header must equal `expected` position by position.
fn expect_columns_ordered(sheet: &Sheet, expected: &[&str]) -> Option<CheckFailure> {
    let len = sheet.headers.len().max(expected.len());
    let mismatched: Vec<Option<String>> = (0..len)
        .filter(|&idx| sheet.headers.get(idx).map(String::as_str) != expected.get(idx).copied())
        .map(|idx| sheet.headers.get(idx).cloned())
        .collect();
    if mismatched.is_empty() {
        return None;
    }
    Some(CheckFailure::ColumnsNotOrdered {
        failed_values: mismatched,
        expected: expected.iter().map(|name| (*name).to_string()).collect(),
    })
}

/// Non-blank values of `column` must be unique; duplicates are reported once, sorted.
fn expect_values_unique(sheet: &Sheet, column: &str) -> Option<CheckFailure> {
    let values = sheet.column(column)?;
    let mut seen = BTreeSet::new();
    let duplicates: BTreeSet<&str> = values
        .into_iter()
        .filter(|value| non_blank(value))
        .filter(|value| !seen.insert(*value))
        .collect();
    if duplicates.is_empty() {
        return None;
    }
    Some(CheckFailure::ValuesNotUnique {
        failed_values: duplicates.into_iter().map(str::to_string).collect(),
        column_name: column.to_string(),
    })
}

/// Non-blank values of `column` must satisfy `allowed`; failures keep their order.
fn expect_values_in_set<F>(sheet: &Sheet, column: &str, allowed: F) -> Option<CheckFailure>
where
    F: Fn(&str) -> bool,
{
    let values = sheet.column(column)?;
    let failed: Vec<String> = values
        .into_iter()
        .filter(|value| non_blank(value) && !allowed(value))
        .map(str::to_string)
        .collect();
    if failed.is_empty() {
        return None;
    }
    Some(CheckFailure::ValuesNotInSet {
        failed_values: failed,
        column_name: column.to_string(),
    })
}

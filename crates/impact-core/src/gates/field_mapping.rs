use std::collections::BTreeMap;

use impact_model::{
    APPROVED_COLUMN, Approval, CheckFailures, FIELD_MAPPING_HEADERS, INPUT_COLUMN, OUTPUT_COLUMN,
    Sheet, TableSchema,
};

use super::{expect_columns_ordered, expect_values_in_set, expect_values_unique};

/// Checks one raw field-mapping sheet against its field's options.
///
/// A field unknown to the schema has no options, so any output fails.
pub fn validate_field_mapping(sheet: &Sheet, field_name: &str, schema: &TableSchema) -> CheckFailures {
    if let Some(failure) = expect_columns_ordered(sheet, &FIELD_MAPPING_HEADERS) {
        return vec![failure];
    }
    let options = schema
        .field(field_name)
        .map(|field| field.enum_options())
        .unwrap_or_default();
    [
        expect_values_unique(sheet, INPUT_COLUMN),
        expect_values_in_set(sheet, OUTPUT_COLUMN, |value| {
            options.iter().any(|option| option == value)
        }),
        expect_values_in_set(sheet, APPROVED_COLUMN, Approval::is_valid_label),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Failures per field; fields that pass are left out.
pub fn validate_field_mappings(
    sheets: &BTreeMap<String, Sheet>,
    schema: &TableSchema,
) -> BTreeMap<String, CheckFailures> {
    sheets
        .iter()
        .filter_map(|(field, sheet)| {
            let failures = validate_field_mapping(sheet, field, schema);
            (!failures.is_empty()).then(|| (field.clone(), failures))
        })
        .collect()
}

use impact_model::{
    COLUMN_MAPPING_HEADERS, CheckFailures, FIELD_NAME_COLUMN, INTERNAL_COLUMN_NAME, Sheet,
    TableSchema,
};

use super::{expect_columns_ordered, expect_values_in_set, expect_values_unique};

/// Checks a raw column-mapping sheet.
///
/// A wrong header stops the remaining checks.
pub fn validate_column_mapping(
    sheet: &Sheet,
    schema: &TableSchema,
    row_format: bool,
) -> CheckFailures {
    if let Some(failure) = expect_columns_ordered(sheet, &COLUMN_MAPPING_HEADERS) {
        return vec![failure];
    }
    let valid_names = schema.valid_field_names(row_format);
    [
        expect_values_unique(sheet, INTERNAL_COLUMN_NAME),
        expect_values_in_set(sheet, FIELD_NAME_COLUMN, |value| {
            valid_names.iter().any(|name| name == value)
        }),
    ]
    .into_iter()
    .flatten()
    .collect()
}

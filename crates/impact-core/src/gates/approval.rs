use std::collections::BTreeMap;

use impact_model::{APPROVED_COLUMN, CheckFailure, CheckFailures, FieldMappings};

/// Every resolved entry must be approved; failures list the inputs awaiting approval.
pub fn validate_approvals(mappings: &FieldMappings) -> BTreeMap<String, CheckFailures> {
    mappings
        .iter()
        .filter_map(|(field, mapping)| {
            let pending = mapping.unapproved_inputs();
            (!pending.is_empty()).then(|| {
                (
                    field.clone(),
                    vec![CheckFailure::ValuesNotInSet {
                        failed_values: pending,
                        column_name: APPROVED_COLUMN.to_string(),
                    }],
                )
            })
        })
        .collect()
}

//! Tests for impact-model types.

use impact_model::{
    Approval, FieldKind, FieldMapping, MappingEntry, SchemaDescriptor, TableSchema,
};
use proptest::prelude::*;

fn entry_strategy() -> impl Strategy<Value = (String, Option<String>, bool)> {
    (
        "[A-Za-z0-9 ]{1,12}",
        proptest::option::of("[A-Za-z]{1,8}"),
        any::<bool>(),
    )
}

proptest! {
    #[test]
    fn field_mapping_sheet_round_trip(entries in proptest::collection::vec(entry_strategy(), 0..20)) {
        let mapping: FieldMapping = entries
            .into_iter()
            .map(|(input, output, approved)| {
                let approval = if approved { Approval::Approved } else { Approval::NotApproved };
                (input, MappingEntry::new(output, approval))
            })
            .collect();
        let round = FieldMapping::from_sheet(&mapping.to_sheet()).unwrap();
        prop_assert_eq!(round, mapping);
    }
}

#[test]
fn integer_enum_mapping_overrides_declared_type() {
    let descriptor: SchemaDescriptor = serde_json::from_str(
        r#"{"fields": [{"name": "Score", "type": "string",
            "enum_mapping": {"Disagree": 1, "Agree": 2}}]}"#,
    )
    .unwrap();
    let schema = TableSchema::from_descriptor(&descriptor).unwrap();
    let field = schema.field("Score").unwrap();
    assert_eq!(field.declared_type, "string");
    assert!(matches!(field.kind, FieldKind::Integer { .. }));
}

#[test]
fn boolean_defaults_follow_descriptor_conventions() {
    let descriptor: SchemaDescriptor =
        serde_json::from_str(r#"{"fields": [{"name": "Flag", "type": "boolean"}]}"#).unwrap();
    let schema = TableSchema::from_descriptor(&descriptor).unwrap();
    assert_eq!(
        schema.field("Flag").unwrap().enum_options(),
        vec!["true", "True", "TRUE", "1", "false", "False", "FALSE", "0"]
    );
    assert!(schema.milestone_names().is_none());
}

use std::collections::BTreeMap;

use impact_core::{validate_column_mapping, validate_field_mapping};
use impact_model::{CheckFailure, SchemaDescriptor, Sheet, TableSchema};

fn schema() -> TableSchema {
    let descriptor: SchemaDescriptor =
        serde_json::from_str(include_str!("fixtures/mission_impact_schema.json")).unwrap();
    TableSchema::from_descriptor(&descriptor).unwrap()
}

fn sheet(headers: &[&str], rows: &[[&str; 2]]) -> Sheet {
    Sheet::new(
        headers.iter().map(|h| (*h).to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
            .collect(),
    )
}

#[test]
fn column_mapping_targets_depend_on_format() {
    let mapping = sheet(
        &["Internal Column Name", "Mission Impact Field Name"],
        &[
            ["Case", "CaseNumber"],
            ["Wage at intake", "IntakeHourlyWage"],
            ["Case", "CaseNumber"],
            ["Scratch", ""],
        ],
    );
    let schema = schema();

    assert_eq!(
        validate_column_mapping(&mapping, &schema, false),
        vec![CheckFailure::ValuesNotUnique {
            failed_values: vec!["Case".to_string()],
            column_name: "Internal Column Name".to_string(),
        }]
    );
    assert_eq!(
        validate_column_mapping(&mapping, &schema, true),
        vec![
            CheckFailure::ValuesNotUnique {
                failed_values: vec!["Case".to_string()],
                column_name: "Internal Column Name".to_string(),
            },
            CheckFailure::ValuesNotInSet {
                failed_values: vec!["IntakeHourlyWage".to_string()],
                column_name: "Mission Impact Field Name".to_string(),
            },
        ]
    );
}

#[test]
fn field_mapping_outputs_must_be_options() {
    let schema = schema();
    let mapping = Sheet::new(
        vec!["Input".into(), "Output".into(), "Approved".into()],
        vec![
            vec!["Strongly agreed".into(), "Strongly Agree".into(), "Yes".into()],
            vec!["meh".into(), "".into(), "None".into()],
            vec!["ok".into(), "Fine".into(), "".into()],
        ],
    );
    assert_eq!(
        validate_field_mapping(&mapping, "SelfEfficacyScore1", &schema),
        vec![CheckFailure::ValuesNotInSet {
            failed_values: vec!["Fine".to_string()],
            column_name: "Output".to_string(),
        }]
    );
    // Unknown fields have no valid outputs.
    let failures = validate_field_mapping(&mapping, "NotAField", &schema);
    assert_eq!(failures.len(), 1);

    let empty: BTreeMap<String, Sheet> = BTreeMap::new();
    assert!(impact_core::validate_field_mappings(&empty, &schema).is_empty());
}

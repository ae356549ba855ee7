//! Cell and row processing against the Mission Impact fixture schema.

use impact_core::{DataProcessor, ProcessedData};
use impact_model::{
    Approval, CellValue, DropReason, FieldMapping, FieldMappings, MappingEntry, SchemaDescriptor,
    Table, TableSchema,
};

fn schema() -> TableSchema {
    let descriptor: SchemaDescriptor =
        serde_json::from_str(include_str!("fixtures/mission_impact_schema.json")).unwrap();
    TableSchema::from_descriptor(&descriptor).unwrap()
}

fn text(values: &[&str]) -> Vec<CellValue> {
    values.iter().map(|value| CellValue::text(*value)).collect()
}

/// Shaped rows for cases `C1..Cn`, all at Intake for member `M`.
fn shaped(extra: Vec<(&str, Vec<CellValue>)>) -> Table {
    let height = extra.first().map_or(1, |(_, values)| values.len());
    let cases: Vec<String> = (1..=height).map(|idx| format!("C{idx}")).collect();
    let mut columns = vec![
        ("CaseNumber", cases.iter().map(CellValue::text).collect()),
        ("MilestoneFlag", vec![CellValue::text("Intake"); height]),
        ("MemberOrganization", vec![CellValue::text("M"); height]),
    ];
    columns.extend(extra);
    Table::from_columns(columns)
}

fn process(table: &Table, mappings: &FieldMappings) -> ProcessedData {
    let schema = schema();
    DataProcessor::new(&schema, mappings).process(table)
}

#[test]
fn rows_missing_required_fields_are_dropped_with_their_original_content() {
    let table = Table::from_columns(vec![
        ("CaseNumber", text(&["C1", "", "C3"])),
        ("MilestoneFlag", text(&["Intake", "Intake", "Bogus"])),
        ("MemberOrganization", text(&["M", "M", "M"])),
        ("HourlyWage", text(&["8.8", "9", ""])),
    ]);
    let processed = process(&table, &FieldMappings::new());

    assert_eq!(processed.table.height(), 1);
    assert_eq!(processed.table.value(0, "CaseNumber"), CellValue::text("C1"));
    assert_eq!(
        processed.table.value(0, "HourlyWage"),
        CellValue::Decimal("8.8".to_string())
    );

    assert_eq!(processed.dropped_rows.len(), 2);
    assert_eq!(
        processed.dropped_rows[0].reason,
        DropReason::MissingRequired(vec!["CaseNumber".to_string()])
    );
    assert_eq!(processed.dropped_rows[0].row["HourlyWage"], CellValue::text("9"));
    assert_eq!(
        processed.dropped_rows[1].reason,
        DropReason::MissingRequired(vec!["MilestoneFlag".to_string()])
    );
    assert_eq!(
        processed.dropped_rows[1].row["MilestoneFlag"],
        CellValue::text("Bogus")
    );
    assert_eq!(
        processed.invalid_values[0].reason,
        "Bogus is not in field mapping or valid value set"
    );
}

#[test]
fn every_row_of_a_duplicate_group_is_dropped() {
    let table = Table::from_columns(vec![
        ("CaseNumber", text(&["C1", "C2", "C1"])),
        ("MilestoneFlag", text(&["Intake", "Intake", "Intake"])),
        ("MemberOrganization", text(&["M", "M", "M"])),
        ("HourlyWage", text(&["10", "11", "12"])),
    ]);
    let processed = process(&table, &FieldMappings::new());

    assert_eq!(processed.table.height(), 1);
    assert_eq!(processed.table.value(0, "CaseNumber"), CellValue::text("C2"));
    let dropped: Vec<_> = processed
        .dropped_rows
        .iter()
        .map(|dropped| (dropped.reason.clone(), dropped.row["HourlyWage"].clone()))
        .collect();
    assert_eq!(
        dropped,
        vec![
            (DropReason::Duplicate, CellValue::text("10")),
            (DropReason::Duplicate, CellValue::text("12")),
        ]
    );
}

#[test]
fn integer_enum_accepts_numbers_labels_and_checks_range() {
    let table = shaped(vec![(
        "SelfEfficacyScore1",
        text(&["3.0", "Agree", "10", "wrong", ""]),
    )]);
    let processed = process(&table, &FieldMappings::new());

    let scores = processed.table.column_values("SelfEfficacyScore1").unwrap();
    assert_eq!(
        scores,
        vec![
            CellValue::Integer(3),
            CellValue::Integer(4),
            CellValue::Missing,
            CellValue::Missing,
            CellValue::Missing,
        ]
    );
    let reasons: Vec<&str> = processed
        .invalid_values
        .iter()
        .map(|invalid| invalid.reason.as_str())
        .collect();
    assert_eq!(
        reasons,
        vec![
            "wrong is not in field mapping or valid value set",
            "SelfEfficacyScore1 must be within the range [1, 5]",
        ]
    );
}

#[test]
fn integer_strings_beyond_i64_are_not_saturated() {
    let table = shaped(vec![("SelfEfficacyScore1", text(&["3e0", "1e30", "-1e30"]))]);
    let processed = process(&table, &FieldMappings::new());

    let scores = processed.table.column_values("SelfEfficacyScore1").unwrap();
    assert_eq!(
        scores,
        vec![CellValue::Integer(3), CellValue::Missing, CellValue::Missing]
    );
    let reasons: Vec<&str> = processed
        .invalid_values
        .iter()
        .map(|invalid| invalid.reason.as_str())
        .collect();
    assert_eq!(
        reasons,
        vec![
            "1e30 is not in field mapping or valid value set",
            "-1e30 is not in field mapping or valid value set",
        ]
    );
}

#[test]
fn multi_value_cells_collapse_when_any_element_is_invalid() {
    let table = shaped(vec![(
        "Barriers",
        vec![
            CellValue::text_list(["g"]),
            CellValue::text_list(["veteran", ""]),
            CellValue::text_list(["Veteran", "g"]),
        ],
    )]);
    let processed = process(&table, &FieldMappings::new());

    let barriers = processed.table.column_values("Barriers").unwrap();
    assert_eq!(
        barriers,
        vec![
            CellValue::Missing,
            CellValue::text_list(["Veteran"]),
            CellValue::Missing,
        ]
    );
    assert_eq!(processed.invalid_values.len(), 2);
    assert_eq!(
        processed.invalid_values[0].original_value,
        CellValue::text_list(["g"])
    );
    assert_eq!(
        processed.invalid_values[0].reason,
        "g is not in field mapping or valid value set"
    );
}

#[test]
fn booleans_resolve_through_their_token_lists() {
    let table = shaped(vec![(
        "ConvictedInLastYear",
        text(&["2", "Y", "1.0", "maybe"]),
    )]);
    let processed = process(&table, &FieldMappings::new());

    assert_eq!(
        processed.table.column_values("ConvictedInLastYear").unwrap(),
        vec![
            CellValue::Bool(false),
            CellValue::Bool(true),
            CellValue::Bool(true),
            CellValue::Missing,
        ]
    );
    assert_eq!(
        processed.invalid_values[0].reason,
        "maybe is not in field mapping or valid value set (['yes', 'Y', '1', 'no', 'N', '2'])"
    );
}

#[test]
fn soc_and_state_are_normalized() {
    let table = shaped(vec![
        ("SOC", text(&["15-2030.04", "1511-2030.00"])),
        ("State", text(&["Kentucky", "RANDOM STATE"])),
    ]);
    let processed = process(&table, &FieldMappings::new());

    assert_eq!(processed.table.value(0, "SOC"), CellValue::text("15-2030"));
    assert_eq!(processed.table.value(0, "State"), CellValue::text("KY"));
    assert_eq!(processed.table.value(1, "SOC"), CellValue::Missing);
    assert_eq!(processed.table.value(1, "State"), CellValue::Missing);
    let reasons: Vec<&str> = processed
        .invalid_values
        .iter()
        .map(|invalid| invalid.reason.as_str())
        .collect();
    assert_eq!(
        reasons,
        vec![
            "SOC should be in the format ##-####",
            "RANDOM STATE is not a valid state",
        ]
    );
}

#[test]
fn approved_mappings_are_applied_and_unknown_columns_pass_through() {
    let gender: FieldMapping = [
        ("F", Some("Female")),
        ("Prefer not to say", None),
    ]
    .into_iter()
    .map(|(input, output)| {
        (
            input.to_string(),
            MappingEntry::new(output.map(str::to_string), Approval::Approved),
        )
    })
    .collect();
    let mappings = FieldMappings::from([("Gender".to_string(), gender)]);
    let table = shaped(vec![
        ("Gender", text(&["F", "Prefer not to say", "male"])),
        ("Notes", text(&["keep", " me ", ""])),
    ]);
    let processed = process(&table, &mappings);

    assert_eq!(
        processed.table.column_values("Gender").unwrap(),
        vec![CellValue::text("Female"), CellValue::Missing, CellValue::text("Male")]
    );
    assert_eq!(
        processed.table.column_values("Notes").unwrap(),
        text(&["keep", " me ", ""])
    );
    assert!(processed.invalid_values.is_empty());
}

#[test]
fn absent_required_columns_drop_every_row() {
    let table = Table::from_columns(vec![
        ("CaseNumber", text(&["C1"])),
        ("MilestoneFlag", text(&["Exit"])),
    ]);
    let processed = process(&table, &FieldMappings::new());
    assert!(processed.table.is_empty());
    assert_eq!(
        processed.dropped_rows[0].reason,
        DropReason::MissingRequired(vec!["MemberOrganization".to_string()])
    );
}

//! End-to-end runs of the standard pipeline.

use std::collections::BTreeMap;

use impact_core::{
    PipelineContext, PipelineInput, PipelineOptions, PipelineOutcome, PipelineState,
    PipelineStep, StepOutcome, build_default_pipeline, frame_strings, run_pipeline,
};
use impact_model::{Approval, CellValue, GateFailure, SchemaDescriptor, Sheet, Table, TableSchema};

fn schema() -> TableSchema {
    let descriptor: SchemaDescriptor =
        serde_json::from_str(include_str!("fixtures/mission_impact_schema.json")).unwrap();
    TableSchema::from_descriptor(&descriptor).unwrap()
}

fn sheet(headers: &[&str], rows: &[&[&str]]) -> Sheet {
    Sheet::new(
        headers.iter().map(|h| (*h).to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
            .collect(),
    )
}

fn column_mapping() -> Sheet {
    sheet(
        &["Internal Column Name", "Mission Impact Field Name"],
        &[&["Case ID", "CaseNumber"], &["Notes", ""]],
    )
}

fn gender_mapping(approved: &str) -> BTreeMap<String, Sheet> {
    BTreeMap::from([(
        "Gender".to_string(),
        sheet(&["Input", "Output", "Approved"], &[&["F", "Female", approved]]),
    )])
}

fn cell(value: &str) -> CellValue {
    if value.is_empty() {
        CellValue::Missing
    } else {
        CellValue::text(value)
    }
}

fn column(values: &[&str]) -> Vec<CellValue> {
    values.iter().map(|value| cell(value)).collect()
}

/// Column-format export with Intake data only.
fn intake_export() -> Table {
    Table::from_columns(vec![
        ("Case ID", column(&["C1", "C2"])),
        ("Notes", column(&["called twice", ""])),
        ("IntakeDate", column(&["1/5/2023", "2/1/2023"])),
        ("IntakeState", column(&["Kentucky", "ky"])),
        ("IntakeGender", column(&["female", "F"])),
        ("IntakeConvictedInLastYear", column(&["yes", "2"])),
        ("IntakeHourlyWage", column(&["12.50", ""])),
    ])
}

fn options() -> PipelineOptions {
    PipelineOptions::new("member-7").with_row_format(false)
}

#[test]
fn default_pipeline_has_standard_steps() {
    let pipeline = build_default_pipeline();
    assert_eq!(
        pipeline.step_names(),
        vec![
            "schema_check",
            "column_mapping_gate",
            "column_mapping",
            "field_mapping_gate",
            "dataset_shape_gate",
            "shape",
            "mapping_resolution",
            "approval_gate",
            "process",
            "delivery",
        ]
    );
}

#[test]
fn column_format_export_is_delivered() {
    let input = PipelineInput::new(column_mapping())
        .with_dataset("export.csv", intake_export())
        .with_field_mappings(gender_mapping("Yes"));
    let outcome = run_pipeline(&schema(), &input, &options()).unwrap();

    let PipelineOutcome::Completed {
        dataset,
        field_mappings,
        report,
    } = outcome
    else {
        panic!("expected a completed run, got {outcome:?}");
    };
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.num_rows_to_upload, 2);

    // Most recent first.
    assert_eq!(
        frame_strings(&dataset, "CaseNumber").unwrap(),
        vec![Some("C2".to_string()), Some("C1".to_string())]
    );
    assert_eq!(
        frame_strings(&dataset, "Date").unwrap(),
        vec![Some("2023-02-01".to_string()), Some("2023-01-05".to_string())]
    );
    assert_eq!(
        frame_strings(&dataset, "Gender").unwrap(),
        vec![Some("Female".to_string()), Some("Female".to_string())]
    );
    assert_eq!(
        frame_strings(&dataset, "State").unwrap(),
        vec![Some("KY".to_string()), Some("KY".to_string())]
    );
    assert_eq!(
        frame_strings(&dataset, "ConvictedInLastYear").unwrap(),
        vec![Some("False".to_string()), Some("True".to_string())]
    );
    assert_eq!(
        frame_strings(&dataset, "MilestoneFlag").unwrap(),
        vec![Some("Intake".to_string()), Some("Intake".to_string())]
    );
    assert_eq!(
        frame_strings(&dataset, "MemberOrganization").unwrap(),
        vec![Some("member-7".to_string()), Some("member-7".to_string())]
    );
    assert!(dataset.column("Notes").is_err());

    let gender = &field_mappings["Gender"];
    assert_eq!(gender.get("F").unwrap().output.as_deref(), Some("Female"));
    assert_eq!(gender.get("F").unwrap().approval, Approval::Approved);
}

#[test]
fn unapproved_guess_halts_with_resolved_mappings() {
    let input = PipelineInput::new(column_mapping())
        .with_dataset("export.csv", intake_export())
        .with_field_mappings(gender_mapping("No"));
    let outcome = run_pipeline(&schema(), &input, &options()).unwrap();

    let PipelineOutcome::Halted {
        failure,
        field_mappings,
    } = outcome
    else {
        panic!("expected the approval gate to halt the run");
    };
    insta::assert_snapshot!(
        serde_json::to_string(&failure).unwrap(),
        @r#"{"gate":"approval","failures":{"Gender":[{"check":"values_not_in_set","failed_values":["F"],"column_name":"Approved"}]}}"#
    );
    let gender = &field_mappings.unwrap()["Gender"];
    assert_eq!(gender.get("F").unwrap().output, None);
    assert_eq!(gender.get("F").unwrap().approval, Approval::NotApproved);
}

#[test]
fn wrong_column_mapping_header_halts_first() {
    let input = PipelineInput::new(sheet(
        &["Internal Name", "Mission Impact Field Name"],
        &[&["Case ID", "CaseNumber"]],
    ))
    .with_dataset("export.csv", intake_export());
    let outcome = run_pipeline(&schema(), &input, &options()).unwrap();

    let PipelineOutcome::Halted { failure, .. } = outcome else {
        panic!("expected the column mapping gate to halt the run");
    };
    insta::assert_snapshot!(
        serde_json::to_string(&failure).unwrap(),
        @r#"{"gate":"column_mapping","failures":[{"check":"columns_not_ordered","failed_values":["Internal Name"],"expected":["Internal Column Name","Mission Impact Field Name"]}]}"#
    );
}

#[test]
fn unexpected_dataset_columns_halt_the_run() {
    let mut export = intake_export();
    export.fill_column("Favorite Color", &CellValue::text("blue"));
    export.fill_column("Unnamed: 9", &CellValue::Missing);
    let input = PipelineInput::new(column_mapping()).with_dataset("export.csv", export);
    let outcome = run_pipeline(&schema(), &input, &options()).unwrap();

    let PipelineOutcome::Halted { failure, .. } = outcome else {
        panic!("expected the dataset shape gate to halt the run");
    };
    insta::assert_snapshot!(
        serde_json::to_string(&failure).unwrap(),
        @r#"{"gate":"dataset_shape","failures":{"export.csv":[{"check":"columns_not_in_set","failed_values":["Favorite Color"]},{"check":"unnamed_columns","failed_values":["9"]}]}}"#
    );
}

#[test]
fn invalid_field_mapping_sheet_halts_the_run() {
    let mappings = BTreeMap::from([(
        "Gender".to_string(),
        sheet(
            &["Input", "Output", "Approved"],
            &[&["F", "Woman", "Yes"], &["F", "Female", "Maybe"]],
        ),
    )]);
    let input = PipelineInput::new(column_mapping())
        .with_dataset("export.csv", intake_export())
        .with_field_mappings(mappings);
    let outcome = run_pipeline(&schema(), &input, &options()).unwrap();

    let PipelineOutcome::Halted { failure, .. } = outcome else {
        panic!("expected the field mapping gate to halt the run");
    };
    let GateFailure::FieldMappings(failures) = &failure else {
        panic!("unexpected gate {failure:?}");
    };
    assert_eq!(failures["Gender"].len(), 3);
}

#[test]
fn schema_issues_halt_before_any_data_is_read() {
    let descriptor: SchemaDescriptor =
        serde_json::from_str(r#"{"fields": [{"name": "CaseNumber", "milestones": [2]}]}"#).unwrap();
    let schema = TableSchema::from_descriptor(&descriptor).unwrap();
    let outcome =
        run_pipeline(&schema, &PipelineInput::new(column_mapping()), &options()).unwrap();

    let PipelineOutcome::Halted { failure, .. } = outcome else {
        panic!("expected the schema check to halt the run");
    };
    assert_eq!(
        failure,
        GateFailure::SchemaInvalid(vec![
            "Schema error for field 'CaseNumber': Milestone index 2 out of range.".to_string(),
            "Schema must include column-based milestone names.".to_string(),
        ])
    );
}

#[test]
fn custom_steps_can_be_appended() {
    struct CountRows;
    impl PipelineStep for CountRows {
        fn execute(
            &self,
            _ctx: &PipelineContext<'_>,
            state: &mut PipelineState,
        ) -> anyhow::Result<StepOutcome> {
            let rows = state.delivery.as_ref().map_or(0, |df| df.height());
            assert_eq!(rows, 2);
            Ok(StepOutcome::Continue)
        }

        fn step_name(&self) -> &str {
            "count_rows"
        }
    }

    let pipeline = build_default_pipeline().add_step(Box::new(CountRows));
    let input = PipelineInput::new(column_mapping())
        .with_dataset("export.csv", intake_export())
        .with_field_mappings(gender_mapping("Yes"));
    let mut state = PipelineState::new();
    let outcome = pipeline
        .execute_with_state(&schema(), &input, &options(), &mut state)
        .unwrap();
    assert!(outcome.is_completed());
    assert_eq!(state.executed_steps.last().map(String::as_str), Some("count_rows"));
}

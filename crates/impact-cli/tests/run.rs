//! Runs against files on disk.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use impact_cli::{ModifiedWindow, RunConfig, RunRequest, execute_run};
use impact_core::PipelineOutcome;

const SCHEMA: &str = include_str!("fixtures/mission_impact_schema.json");

const EXPORT: &str = "\
Case ID,Notes,IntakeDate,IntakeState,IntakeGender,IntakeConvictedInLastYear,LastModifiedDate
C1,called twice,1/5/2023,Kentucky,female,yes,2023-03-01 10:00:00
C2,,2/1/2023,ky,F,2,2023-03-15 08:30:00
C3,,2/9/2023,ky,F,2,2022-12-31 23:59:59
";

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Lays out a member workspace and returns its config.
fn workspace(dir: &Path) -> RunConfig {
    write(dir, "schema.json", SCHEMA);
    write(
        dir,
        "column_mapping.csv",
        "Internal Column Name,Mission Impact Field Name\nCase ID,CaseNumber\nNotes,\n",
    );
    write(dir, "exports/march.csv", EXPORT);
    write(
        dir,
        "impact.toml",
        r#"
member_id = "member-7"
row_format = false
schema = "schema.json"
column_mapping = "column_mapping.csv"
field_mappings = "mappings"
datasets = ["exports"]
output = "out/delivery.csv"
report = "out/report.json"
"#,
    );
    RunConfig::load(&dir.join("impact.toml")).unwrap()
}

fn march_2023() -> ModifiedWindow {
    ModifiedWindow {
        since: NaiveDate::from_ymd_opt(2023, 3, 1),
        until: NaiveDate::from_ymd_opt(2023, 3, 31),
    }
}

#[test]
fn unapproved_values_halt_and_persist_guesses() {
    let dir = tempfile::tempdir().unwrap();
    let settings = workspace(dir.path()).into_settings().unwrap();
    let request = RunRequest::new(settings)
        .with_window(march_2023())
        .with_write_mappings(true);

    let result = execute_run(&request).unwrap();

    assert!(result.is_halted());
    assert_eq!(result.datasets, vec!["march.csv".to_string()]);
    assert!(!dir.path().join("out/delivery.csv").exists());
    let report = fs::read_to_string(dir.path().join("out/report.json")).unwrap();
    assert!(report.contains("\"gate\": \"approval\""), "{report}");

    let gender = fs::read_to_string(dir.path().join("mappings/Gender.csv")).unwrap();
    assert!(gender.starts_with("Input,Output,Approved"), "{gender}");
    assert!(gender.contains("F,,No"), "{gender}");
}

#[test]
fn approved_mappings_produce_a_delivery_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());
    write(
        dir.path(),
        "mappings/Gender.csv",
        "Input,Output,Approved\nF,Female,Yes\n",
    );
    let request = RunRequest::new(config.into_settings().unwrap()).with_window(march_2023());

    let result = execute_run(&request).unwrap();

    let PipelineOutcome::Completed { report, .. } = &result.outcome else {
        panic!("expected a completed run, got {:?}", result.outcome);
    };
    // C3 falls outside the modified-date window.
    assert_eq!(report.num_rows_to_upload, 2);
    assert!(report.is_clean(), "{report:?}");

    let delivery = fs::read_to_string(dir.path().join("out/delivery.csv")).unwrap();
    let header = delivery.lines().next().unwrap();
    assert!(header.contains("CaseNumber"));
    assert!(!header.contains("LastModifiedDate"));
    assert!(!header.contains("Notes"));
    assert!(!delivery.contains("C3"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out/report.json")).unwrap())
            .unwrap();
    assert_eq!(json["num_rows_to_upload"], 2);
}

#[test]
fn write_mappings_requires_a_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig {
        field_mappings: None,
        ..workspace(dir.path())
    };
    let request = RunRequest::new(config.into_settings().unwrap()).with_write_mappings(true);
    let error = execute_run(&request).unwrap_err();
    assert!(error.to_string().contains("--field-mappings"));
}

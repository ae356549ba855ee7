//! Delivery shaping: the processed table as an upload-ready frame.
//!
//! Every column becomes a nullable string column. Rows are ordered by `Date`
//! (most recent first) and only the first row per record key is kept, so the
//! latest submission of a record wins.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use impact_model::{RECORD_KEY_FIELDS, Table};
use polars::prelude::{
    BooleanChunked, Column, CsvReadOptions, CsvWriter, DataFrame, DataType, NewChunkedArray,
    SerReader, SerWriter, UInt32Chunked,
};
use tracing::{info, warn};

/// Column the delivery sort is keyed on.
pub const DATE_COLUMN: &str = "Date";

/// Converts a processed table into a frame of nullable string columns.
pub fn table_to_frame(table: &Table) -> Result<DataFrame> {
    let columns: Vec<Column> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<Option<String>> = table
                .rows()
                .iter()
                .map(|row| row.get(idx).and_then(|value| value.to_delivery_string()))
                .collect();
            Column::new(name.as_str().into(), values)
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// String values of one column, `None` for nulls.
pub fn frame_strings(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(column)
        .with_context(|| format!("missing column {column}"))?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let values = series.str()?;
    Ok(values
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Sorts by `Date` descending (nulls last, stable) and keeps the first row per
/// (CaseNumber, MilestoneFlag, MemberOrganization).
pub fn shape_for_delivery(table: &Table) -> Result<DataFrame> {
    let mut df = table_to_frame(table)?;
    sort_by_date_desc(&mut df)?;
    keep_first_per_record(&mut df)?;
    Ok(df)
}

fn sort_by_date_desc(df: &mut DataFrame) -> Result<()> {
    if df.column(DATE_COLUMN).is_err() {
        warn!("no {DATE_COLUMN} column; delivery rows left in input order");
        return Ok(());
    }
    let dates = frame_strings(df, DATE_COLUMN)?;
    let mut indices: Vec<u32> = (0..df.height()).map(|idx| idx as u32).collect();
    indices.sort_by(|a, b| match (&dates[*a as usize], &dates[*b as usize]) {
        (Some(left), Some(right)) => right.cmp(left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    let idx = UInt32Chunked::from_vec("idx".into(), indices);
    *df = df.take(&idx)?;
    Ok(())
}

fn keep_first_per_record(df: &mut DataFrame) -> Result<()> {
    if RECORD_KEY_FIELDS
        .iter()
        .any(|name| df.column(name).is_err())
    {
        warn!("record key columns missing; delivery dedupe skipped");
        return Ok(());
    }
    info!("Length of dataset *before* dedupe: {}", df.height());
    let keys: Vec<Vec<Option<String>>> = RECORD_KEY_FIELDS
        .iter()
        .map(|name| frame_strings(df, name))
        .collect::<Result<_>>()?;
    let mut seen = HashSet::new();
    let keep: Vec<bool> = (0..df.height())
        .map(|row| {
            let key: Vec<Option<&str>> = keys.iter().map(|column| column[row].as_deref()).collect();
            seen.insert(key)
        })
        .collect();
    let mask = BooleanChunked::from_slice("dedupe".into(), &keep);
    *df = df.filter(&mask)?;
    info!("Length of dataset *after* dedupe: {}", df.height());
    Ok(())
}

/// Writes the frame as CSV with a header row.
pub fn write_delivery_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Reads a delivery CSV back with every column as string.
pub fn read_delivery_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("open {}", path.display()))?
        .finish()
        .with_context(|| format!("parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use impact_model::CellValue;

    use super::*;

    fn processed() -> Table {
        Table::from_columns(vec![
            (
                "CaseNumber",
                vec![CellValue::text("C1"), CellValue::text("C1"), CellValue::text("C2")],
            ),
            (
                "MilestoneFlag",
                vec![CellValue::text("Intake"), CellValue::text("Intake"), CellValue::text("Intake")],
            ),
            (
                "MemberOrganization",
                vec![CellValue::text("M"), CellValue::text("M"), CellValue::text("M")],
            ),
            (
                "Date",
                vec![
                    CellValue::Date(chrono::NaiveDate::from_ymd_opt(2023, 1, 5).unwrap()),
                    CellValue::Date(chrono::NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()),
                    CellValue::Missing,
                ],
            ),
            (
                "Barriers",
                vec![
                    CellValue::text_list(["a", "b"]),
                    CellValue::Bool(true),
                    CellValue::Missing,
                ],
            ),
        ])
    }

    #[test]
    fn most_recent_record_wins() {
        let df = shape_for_delivery(&processed()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            frame_strings(&df, "Date").unwrap(),
            vec![Some("2023-03-01".to_string()), None]
        );
        assert_eq!(
            frame_strings(&df, "Barriers").unwrap(),
            vec![Some("True".to_string()), None]
        );
    }

    #[test]
    fn lists_are_comma_joined() {
        let df = table_to_frame(&processed()).unwrap();
        assert_eq!(
            frame_strings(&df, "Barriers").unwrap()[0],
            Some("a,b".to_string())
        );
    }

    #[test]
    fn csv_round_trip_keeps_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delivery.csv");
        let mut df = shape_for_delivery(&processed()).unwrap();
        write_delivery_csv(&mut df, &path).unwrap();
        let back = read_delivery_csv(&path).unwrap();
        assert_eq!(back.height(), 2);
        assert_eq!(
            frame_strings(&back, "CaseNumber").unwrap(),
            vec![Some("C1".to_string()), Some("C2".to_string())]
        );
    }
}

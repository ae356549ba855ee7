use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use impact_model::{CellValue, Sheet, Table};

/// Header given to a column whose header cell is blank.
pub fn unnamed_header(index: usize) -> String {
    format!("Unnamed: {index}")
}

fn normalize_header(raw: &str, index: usize) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        unnamed_header(index)
    } else {
        trimmed.to_string()
    }
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Reads the header row and non-blank records, every cell trimmed.
fn read_records(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("read csv: {}", path.display()))?;
    let mut records = reader.records();
    let Some(header) = records.next() else {
        return Ok((Vec::new(), Vec::new()));
    };
    let header = header.with_context(|| format!("read header: {}", path.display()))?;
    let headers: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, value)| normalize_header(value, idx))
        .collect();

    let mut rows = Vec::new();
    for record in records {
        let record = record.with_context(|| format!("read record: {}", path.display()))?;
        let row: Vec<String> = (0..headers.len())
            .map(|idx| normalize_cell(record.get(idx).unwrap_or("")))
            .collect();
        if row.iter().all(String::is_empty) {
            continue;
        }
        rows.push(row);
    }
    Ok((headers, rows))
}

/// Reads a mapping file as raw strings so gates can inspect its header.
pub fn read_sheet(path: &Path) -> Result<Sheet> {
    let (headers, rows) = read_records(path)?;
    Ok(Sheet::new(headers, rows))
}

/// Reads an organization export; empty cells become `Missing`.
pub fn read_dataset(path: &Path) -> Result<Table> {
    let (headers, rows) = read_records(path)?;
    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(
            row.into_iter()
                .map(|value| {
                    if value.is_empty() {
                        CellValue::Missing
                    } else {
                        CellValue::Text(value)
                    }
                })
                .collect(),
        );
    }
    Ok(table)
}

pub fn write_sheet(path: &Path, sheet: &Sheet) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create csv: {}", path.display()))?;
    writer
        .write_record(&sheet.headers)
        .with_context(|| format!("write header: {}", path.display()))?;
    for row in &sheet.rows {
        writer
            .write_record(row)
            .with_context(|| format!("write record: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush csv: {}", path.display()))?;
    Ok(())
}

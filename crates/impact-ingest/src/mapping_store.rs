//! Field mappings persisted as one `<FieldName>.csv` per field.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use impact_model::{FieldMappings, Sheet, TableSchema};
use tracing::{debug, info};

use crate::csv_table::{read_sheet, write_sheet};

pub fn mapping_path(dir: &Path, field: &str) -> PathBuf {
    dir.join(format!("{field}.csv"))
}

/// Loads the stored sheets of every schema field that has a non-empty file.
///
/// A missing directory means nothing is stored yet.
pub fn load_field_mapping_sheets(
    dir: &Path,
    schema: &TableSchema,
) -> Result<BTreeMap<String, Sheet>> {
    let mut sheets = BTreeMap::new();
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "no field mapping directory");
        return Ok(sheets);
    }
    for field in schema.field_names() {
        let path = mapping_path(dir, field);
        if !path.is_file() {
            continue;
        }
        let sheet = read_sheet(&path)?;
        if sheet.headers.is_empty() {
            continue;
        }
        debug!(field, rows = sheet.rows.len(), "loaded field mapping");
        sheets.insert(field.to_string(), sheet);
    }
    Ok(sheets)
}

/// Writes every non-empty mapping, replacing existing files.
pub fn write_field_mappings(dir: &Path, mappings: &FieldMappings) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create mapping directory: {}", dir.display()))?;
    let mut written = Vec::new();
    for (field, mapping) in mappings {
        if mapping.is_empty() {
            continue;
        }
        let path = mapping_path(dir, field);
        write_sheet(&path, &mapping.to_sheet())?;
        written.push(path);
    }
    info!(dir = %dir.display(), files = written.len(), "wrote field mappings");
    Ok(written)
}

//! Schema document loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use impact_model::{SchemaDescriptor, TableSchema};
use tracing::debug;

/// Parses a schema document; unknown keys are ignored.
pub fn parse_table_schema(json: &str) -> Result<TableSchema> {
    let descriptor: SchemaDescriptor =
        serde_json::from_str(json).context("parse schema document")?;
    TableSchema::from_descriptor(&descriptor).context("build table schema")
}

pub fn load_table_schema(path: &Path) -> Result<TableSchema> {
    let json =
        fs::read_to_string(path).with_context(|| format!("read schema: {}", path.display()))?;
    let schema =
        parse_table_schema(&json).with_context(|| format!("load schema: {}", path.display()))?;
    debug!(path = %path.display(), fields = schema.fields().len(), "loaded table schema");
    Ok(schema)
}

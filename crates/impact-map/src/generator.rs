//! Proposes mappings for enum and boolean values that are not yet valid.

use impact_model::{CellValue, FieldMapping, FieldMappings, SchemaField, Table, TableSchema};
use tracing::{debug, info};

use crate::builder::MappingTableBuilder;
use crate::error::Result;
use crate::score::{FUZZY_MATCH_THRESHOLD, extract_one};

/// True when the text parses as a float.
pub fn is_num(raw: &str) -> bool {
    raw.trim().parse::<f64>().is_ok()
}

/// Scans a shaped dataset and proposes unapproved field mappings.
pub struct MappingGenerator<'a> {
    schema: &'a TableSchema,
}

impl<'a> MappingGenerator<'a> {
    pub fn new(schema: &'a TableSchema) -> Self {
        Self { schema }
    }

    /// Generates mappings for every mappable field present in `dataset`.
    ///
    /// Only non-empty mappings are returned.
    pub fn generate(&self, dataset: &Table) -> Result<FieldMappings> {
        let mut mappings = FieldMappings::new();
        for field in self.schema.mappable_fields() {
            let Some(values) = dataset.column_values(&field.name) else {
                continue;
            };
            let mapping = generate_for_field(field, &values)?;
            if mapping.is_empty() {
                continue;
            }
            info!(
                field = %field.name,
                entries = mapping.len(),
                "generated field mapping"
            );
            mappings.insert(field.name.clone(), mapping);
        }
        Ok(mappings)
    }
}

/// Builds one field's mapping from its observed values.
pub fn generate_for_field(
    field: &SchemaField,
    values: &[CellValue],
) -> Result<FieldMapping> {
    let options = field.enum_options();
    let lowered: Vec<String> = options.iter().map(|option| option.to_lowercase()).collect();
    let mut builder = MappingTableBuilder::new();

    for value in values {
        let raw_values: Vec<String> = match value {
            CellValue::Missing => continue,
            CellValue::List(items) if field.allows_multiple => {
                items.iter().map(ToString::to_string).collect()
            }
            other => vec![other.to_string()],
        };
        for raw in raw_values {
            if raw.is_empty()
                || is_num(&raw)
                || lowered.contains(&raw.to_lowercase())
                || builder.contains(&raw)
            {
                continue;
            }
            let mapped = extract_one(&raw, options.iter().map(String::as_str))
                .filter(|(_, score)| *score > FUZZY_MATCH_THRESHOLD)
                .map(|(option, _)| option.to_string());
            debug!(field = %field.name, mapped = ?mapped, "proposed mapping");
            builder.insert(&raw, mapped)?;
        }
    }
    Ok(builder.build())
}

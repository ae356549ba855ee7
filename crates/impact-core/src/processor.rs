//! Cell and row processing: transforms, casting, required-field and
//! duplicate dropping.
//!
//! Processing runs column by column. Every cell is first transformed by its
//! field-specific transform (enum mapping, SOC truncation, state lookup,
//! integer parsing) and then cast to the field's declared type. A value that
//! fails either stage becomes `Missing` and is reported once, with the first
//! reason encountered.
//!
//! Row policy, in order:
//! 1. required columns are processed (absent ones are added as all-missing);
//! 2. rows with any missing required value are dropped;
//! 3. every row of a duplicate (CaseNumber, MilestoneFlag, MemberOrganization)
//!    group is dropped;
//! 4. the remaining schema columns are processed;
//! 5. columns outside the schema pass through.

use std::collections::HashMap;

use impact_model::{
    CASE_NUMBER_FIELD, CellValue, DropReason, DroppedRow, FieldMappings, InvalidValue,
    MILESTONE_FLAG_FIELD, RECORD_KEY_FIELDS, SchemaField, Table, TableSchema, ValueId,
};
use tracing::{error, info};

use crate::cast::{cast_failure_reason, cast_value};
use crate::redact::redact_value;
use crate::transform::{TransformKind, Transformed};

/// Identifier of one cell plus the first reason it was found invalid.
#[derive(Debug, Clone)]
struct CellRecord {
    id: ValueId,
    reason: Option<String>,
}

/// Result of [`DataProcessor::process`].
#[derive(Debug, Clone, Default)]
pub struct ProcessedData {
    pub table: Table,
    pub invalid_values: Vec<InvalidValue>,
    pub dropped_rows: Vec<DroppedRow>,
}

/// Validates and casts a shaped dataset against the schema.
pub struct DataProcessor<'a> {
    schema: &'a TableSchema,
    field_mappings: &'a FieldMappings,
    invalid_values: Vec<InvalidValue>,
    dropped_rows: Vec<DroppedRow>,
}

impl<'a> DataProcessor<'a> {
    pub fn new(schema: &'a TableSchema, field_mappings: &'a FieldMappings) -> Self {
        Self {
            schema,
            field_mappings,
            invalid_values: Vec::new(),
            dropped_rows: Vec::new(),
        }
    }

    /// Processes the whole dataset, consuming the processor.
    pub fn process(mut self, dataset: &Table) -> ProcessedData {
        let mut table = dataset.clone();
        // Row positions in `dataset` for every row still in `table`.
        let mut origin: Vec<usize> = (0..dataset.height()).collect();
        let schema = self.schema;
        let required: Vec<&SchemaField> = schema.fields().iter().filter(|f| f.required).collect();

        for field in &required {
            if table.has_column(&field.name) {
                self.process_column(&mut table, field);
            } else {
                table.fill_column(&field.name, &CellValue::Missing);
            }
        }

        self.drop_missing_required(&mut table, &mut origin, dataset, &required);
        self.drop_duplicates(&mut table, &mut origin, dataset);

        for field in schema.fields() {
            if !field.required && table.has_column(&field.name) {
                self.process_column(&mut table, field);
            }
        }

        ProcessedData {
            table,
            invalid_values: self.invalid_values,
            dropped_rows: self.dropped_rows,
        }
    }

    fn drop_missing_required(
        &mut self,
        table: &mut Table,
        origin: &mut Vec<usize>,
        dataset: &Table,
        required: &[&SchemaField],
    ) {
        let mut keep = Vec::with_capacity(table.height());
        for (row, &source_row) in origin.iter().enumerate() {
            let missing: Vec<String> = required
                .iter()
                .filter(|field| table.value(row, &field.name).is_missing())
                .map(|field| field.name.clone())
                .collect();
            if missing.is_empty() {
                keep.push(true);
                continue;
            }
            let originals: Vec<String> = missing
                .iter()
                .map(|name| {
                    let original = dataset.value(source_row, name).to_string();
                    format!("{name}: {}", redact_value(&original))
                })
                .collect();
            error!(
                "Dropping row {source_row} due to invalid/missing value for critical field(s): {}",
                originals.join(", ")
            );
            self.dropped_rows.push(DroppedRow {
                row: dataset.row_snapshot(source_row),
                reason: DropReason::MissingRequired(missing),
            });
            keep.push(false);
        }
        table.retain_rows(&keep);
        retain_origin(origin, &keep);
    }

    fn drop_duplicates(&mut self, table: &mut Table, origin: &mut Vec<usize>, dataset: &Table) {
        info!("Length of dataset *before* dedupe: {}", table.height());
        let keys: Vec<Vec<CellValue>> = (0..table.height())
            .map(|row| {
                RECORD_KEY_FIELDS
                    .iter()
                    .map(|name| table.value(row, name))
                    .collect()
            })
            .collect();
        let mut counts: HashMap<&[CellValue], usize> = HashMap::new();
        for key in &keys {
            *counts.entry(key.as_slice()).or_default() += 1;
        }
        let keep: Vec<bool> = keys.iter().map(|key| counts[key.as_slice()] == 1).collect();

        for (row, kept) in keep.iter().enumerate() {
            if *kept {
                continue;
            }
            error!(
                "Dropping row with CaseNumber {} due to duplicate values in the uploaded file",
                redact_value(&table.value(row, CASE_NUMBER_FIELD).to_string())
            );
            self.dropped_rows.push(DroppedRow {
                row: dataset.row_snapshot(origin[row]),
                reason: DropReason::Duplicate,
            });
        }
        table.retain_rows(&keep);
        retain_origin(origin, &keep);
        info!("Length of dataset *after* dedupe: {}", table.height());
    }

    /// Transforms then casts one column in place.
    fn process_column(&mut self, table: &mut Table, field: &SchemaField) {
        let Some(values) = table.column_values(&field.name) else {
            return;
        };
        let mut records: Vec<CellRecord> = values
            .iter()
            .enumerate()
            .map(|(row, original)| CellRecord {
                id: ValueId {
                    case_number: table.value(row, CASE_NUMBER_FIELD),
                    field_name: field.name.clone(),
                    milestone_flag: table.value(row, MILESTONE_FLAG_FIELD),
                    original_value: original.clone(),
                },
                reason: None,
            })
            .collect();

        let mut values = values;
        if let Some(kind) = TransformKind::for_field(field) {
            let field_mappings = self.field_mappings;
            let mapping = field_mappings.get(&field.name);
            values = self.apply_stage(field, values, &mut records, |value| {
                kind.apply(field, mapping, value)
            });
        }
        values = self.apply_stage(field, values, &mut records, |value| {
            cast_value(field, value).map_err(|failure| cast_failure_reason(field, value, failure))
        });
        table.set_column(&field.name, values);
    }

    fn apply_stage<F>(
        &mut self,
        field: &SchemaField,
        values: Vec<CellValue>,
        records: &mut [CellRecord],
        function: F,
    ) -> Vec<CellValue>
    where
        F: Fn(&CellValue) -> Transformed,
    {
        values
            .into_iter()
            .zip(records.iter_mut())
            .map(|(value, record)| {
                if value.is_blank() {
                    CellValue::Missing
                } else if field.allows_multiple {
                    self.apply_multiple(&function, value, record)
                } else {
                    match function(&value) {
                        Ok(result) => result,
                        Err(reason) => self.report_invalid(record, Some(reason), false),
                    }
                }
            })
            .collect()
    }

    /// Applies `function` to every element of a multi-value cell.
    ///
    /// One invalid element invalidates the whole cell.
    fn apply_multiple<F>(
        &mut self,
        function: &F,
        value: CellValue,
        record: &mut CellRecord,
    ) -> CellValue
    where
        F: Fn(&CellValue) -> Transformed,
    {
        let CellValue::List(items) = value else {
            return self.report_invalid(record, Some(format!("{value} is not a list")), false);
        };
        let mut results = Vec::with_capacity(items.len());
        let mut all_valid = true;
        for item in &items {
            if item.is_blank() {
                continue;
            }
            match function(item) {
                Ok(result) => results.push(result),
                Err(reason) => {
                    self.report_invalid(record, Some(reason), true);
                    all_valid = false;
                }
            }
        }
        if !all_valid {
            return self.report_invalid(record, None, false);
        }
        results.retain(|result| !result.is_missing());
        if results.is_empty() {
            CellValue::Missing
        } else {
            CellValue::List(results)
        }
    }

    /// Keeps the first reason; unless suppressed, logs and records the value.
    fn report_invalid(
        &mut self,
        record: &mut CellRecord,
        reason: Option<String>,
        suppress: bool,
    ) -> CellValue {
        if record.reason.is_none() {
            record.reason = reason;
        }
        if !suppress {
            let reason = record.reason.clone().unwrap_or_default();
            error!(
                "(Case Number: {}, Milestone: {}) Invalid value for {}: {}. Reason: {}",
                redact_value(&record.id.case_number.to_string()),
                record.id.milestone_flag,
                record.id.field_name,
                redact_value(&record.id.original_value.to_string()),
                redact_value(&reason),
            );
            self.invalid_values.push(InvalidValue::new(&record.id, reason));
        }
        CellValue::Missing
    }
}

fn retain_origin(origin: &mut Vec<usize>, keep: &[bool]) {
    let mut flags = keep.iter();
    origin.retain(|_| flags.next().copied().unwrap_or(true));
}

//! In-memory tabular data.
//!
//! `Table` carries typed cells for datasets; `Sheet` is the raw string form
//! used for mapping files before they are validated.

use std::collections::{BTreeMap, BTreeSet};

use crate::value::CellValue;

/// A row snapshot keyed by column name, used in diagnostics.
pub type RowSnapshot = BTreeMap<String, CellValue>;

/// A row-major table with named columns.
///
/// Every row has exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from column-major data.
    ///
    /// Shorter columns are padded with `Missing`.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<CellValue>)>,
        S: Into<String>,
    {
        let (names, data): (Vec<String>, Vec<Vec<CellValue>>) = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .unzip();
        let height = data.iter().map(Vec::len).max().unwrap_or(0);
        let mut rows = vec![Vec::with_capacity(names.len()); height];
        for column in data {
            let len = column.len();
            for (row, value) in rows.iter_mut().zip(column) {
                row.push(value);
            }
            for row in rows.iter_mut().skip(len) {
                row.push(CellValue::Missing);
            }
        }
        Self {
            columns: names,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// A table is empty when it has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Appends a row, padding or truncating it to the table width.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Missing);
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(idx))
    }

    /// Returns the cell or `Missing` when the row or column does not exist.
    pub fn value(&self, row: usize, column: &str) -> CellValue {
        self.cell(row, column).cloned().unwrap_or_default()
    }

    /// Clones a column's values, or `None` when the column is absent.
    pub fn column_values(&self, name: &str) -> Option<Vec<CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    /// Replaces a column's values, adding the column when absent.
    pub fn set_column(&mut self, name: &str, values: Vec<CellValue>) {
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(CellValue::Missing);
                }
                self.columns.len() - 1
            }
        };
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row[idx] = values.next().unwrap_or_default();
        }
    }

    /// Sets every cell of a column to `value`, adding the column when absent.
    pub fn fill_column(&mut self, name: &str, value: &CellValue) {
        let values = vec![value.clone(); self.rows.len()];
        self.set_column(name, values);
    }

    /// Applies `f` to every cell of a column in place.
    pub fn map_column<F>(&mut self, name: &str, mut f: F)
    where
        F: FnMut(CellValue) -> CellValue,
    {
        let Some(idx) = self.column_index(name) else {
            return;
        };
        for row in &mut self.rows {
            let value = std::mem::take(&mut row[idx]);
            row[idx] = f(value);
        }
    }

    /// Applies `f` to every cell of the table.
    pub fn map_cells<F>(&mut self, mut f: F)
    where
        F: FnMut(CellValue) -> CellValue,
    {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                let value = std::mem::take(cell);
                *cell = f(value);
            }
        }
    }

    pub fn drop_columns(&mut self, names: &BTreeSet<String>) {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|column| !names.contains(column))
            .collect();
        self.columns = retain_by_mask(std::mem::take(&mut self.columns), &keep);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), &keep);
        }
    }

    /// Renames columns found in `mapping`; others keep their names.
    pub fn rename_columns(&mut self, mapping: &BTreeMap<String, String>) {
        for column in &mut self.columns {
            if let Some(target) = mapping.get(column.as_str()) {
                column.clone_from(target);
            }
        }
    }

    /// Keeps rows whose mask entry is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        self.rows = retain_by_mask(std::mem::take(&mut self.rows), keep);
    }

    /// Returns a new table with the given columns (in that order) and rows.
    ///
    /// Absent columns are skipped.
    pub fn select(&self, columns: &[String], rows: &[usize]) -> Table {
        let indices: Vec<(usize, &String)> = columns
            .iter()
            .filter_map(|name| self.column_index(name).map(|idx| (idx, name)))
            .collect();
        let mut table = Table::new(indices.iter().map(|(_, name)| (*name).clone()).collect());
        for &row in rows {
            if let Some(cells) = self.rows.get(row) {
                table
                    .rows
                    .push(indices.iter().map(|(idx, _)| cells[*idx].clone()).collect());
            }
        }
        table
    }

    pub fn row_snapshot(&self, row: usize) -> RowSnapshot {
        let Some(cells) = self.rows.get(row) else {
            return RowSnapshot::new();
        };
        self.columns
            .iter()
            .cloned()
            .zip(cells.iter().cloned())
            .collect()
    }

    /// Stacks tables vertically over the sorted union of their columns.
    ///
    /// Cells of columns a table lacks are `Missing`.
    pub fn concat(tables: Vec<Table>) -> Table {
        let columns: BTreeSet<String> = tables
            .iter()
            .flat_map(|table| table.columns.iter().cloned())
            .collect();
        let columns: Vec<String> = columns.into_iter().collect();
        let mut combined = Table::new(columns.clone());
        for table in tables {
            let positions: Vec<Option<usize>> = columns
                .iter()
                .map(|name| table.column_index(name))
                .collect();
            for mut row in table.rows {
                combined.rows.push(
                    positions
                        .iter()
                        .map(|pos| match pos {
                            Some(idx) => std::mem::take(&mut row[*idx]),
                            None => CellValue::Missing,
                        })
                        .collect(),
                );
            }
        }
        combined
    }
}

fn retain_by_mask<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep.iter().copied().chain(std::iter::repeat(true)))
        .filter_map(|(item, keep)| keep.then_some(item))
        .collect()
}

/// Raw string table as read from a mapping file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Values of a column; short rows yield empty strings.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map_or("", String::as_str))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

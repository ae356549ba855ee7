//! Dataset filters applied around a run.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use impact_model::{CASE_NUMBER_FIELD, CellValue, DropReason, DroppedRow, RowSnapshot, Table};
use polars::prelude::{BooleanChunked, DataFrame, NewChunkedArray};
use regex::Regex;
use tracing::{info, warn};

use crate::cast::parse_any_date;
use crate::delivery::frame_strings;
use crate::redact::redact_value;

/// Timestamp column used by [`extract_modified_in_range`].
pub const LAST_MODIFIED_COLUMN: &str = "LastModifiedDate";

static CASE_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Case:\s(.*?)\s+Member:").expect("Invalid case number regex"));

/// Case numbers named in an upstream rejection response.
pub fn find_case_numbers(response: &str) -> Vec<String> {
    CASE_NUMBER_REGEX
        .captures_iter(response)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Removes rows whose case number was rejected for lacking an intake record.
pub fn drop_rows_without_intake_records(
    df: &DataFrame,
    response: &str,
) -> Result<(DataFrame, Vec<DroppedRow>)> {
    let rejected: BTreeSet<String> = find_case_numbers(response).into_iter().collect();
    if rejected.is_empty() || df.column(CASE_NUMBER_FIELD).is_err() {
        return Ok((df.clone(), Vec::new()));
    }
    let case_numbers = frame_strings(df, CASE_NUMBER_FIELD)?;
    let keep: Vec<bool> = case_numbers
        .iter()
        .map(|case| !case.as_ref().is_some_and(|case| rejected.contains(case)))
        .collect();

    let columns: Vec<(String, Vec<Option<String>>)> = df
        .get_column_names()
        .into_iter()
        .map(|name| Ok((name.to_string(), frame_strings(df, name)?)))
        .collect::<Result<_>>()?;
    let dropped: Vec<DroppedRow> = keep
        .iter()
        .enumerate()
        .filter(|(_, kept)| !**kept)
        .map(|(row, _)| {
            info!(
                "Dropping row with CaseNumber {} without an intake record",
                redact_value(case_numbers[row].as_deref().unwrap_or_default())
            );
            let snapshot: RowSnapshot = columns
                .iter()
                .map(|(name, values)| {
                    let value = values[row]
                        .as_ref()
                        .map_or(CellValue::Missing, |text| CellValue::text(text.clone()));
                    (name.clone(), value)
                })
                .collect();
            DroppedRow {
                row: snapshot,
                reason: DropReason::NoIntakeRecord,
            }
        })
        .collect();

    let mask = BooleanChunked::from_slice("intake".into(), &keep);
    Ok((df.filter(&mask)?, dropped))
}

/// Keeps rows last modified within `[start 00:00:00, end 23:59:59]` and
/// removes the timestamp column.
pub fn extract_modified_in_range(table: &Table, start: NaiveDate, end: NaiveDate) -> Table {
    if !table.has_column(LAST_MODIFIED_COLUMN) {
        return table.clone();
    }
    let lower = start.and_time(NaiveTime::MIN);
    let upper = end.and_hms_opt(23, 59, 59).unwrap_or(lower);
    let keep: Vec<bool> = (0..table.height())
        .map(|row| {
            let value = table.value(row, LAST_MODIFIED_COLUMN);
            match parse_timestamp(&value.to_string()) {
                Some(modified) => lower <= modified && modified <= upper,
                None => {
                    warn!(row, "unparseable {LAST_MODIFIED_COLUMN}; row excluded");
                    false
                }
            }
        })
        .collect();
    let mut filtered = table.clone();
    filtered.retain_rows(&keep);
    filtered.drop_columns(&BTreeSet::from([LAST_MODIFIED_COLUMN.to_string()]));
    filtered
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    let value = raw.trim();
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| parse_any_date(value).map(|date| date.and_time(NaiveTime::MIN)))
}

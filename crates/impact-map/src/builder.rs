//! Accumulates raw to canonical matches during one generator scan.

use std::collections::BTreeMap;

use impact_model::{Approval, FieldMapping, MappingEntry};

use crate::error::{MapError, Result};

/// Builder for one field's generated mapping.
///
/// Owned by the generator for a single scan, then consumed by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct MappingTableBuilder {
    order: Vec<String>,
    matches: BTreeMap<String, Option<String>>,
}

impl MappingTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.matches.contains_key(raw)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records `raw -> mapped`.
    ///
    /// Re-inserting the same pair is a no-op; a different target is a
    /// [`MapError::ConflictingMapping`].
    pub fn insert(&mut self, raw: &str, mapped: Option<String>) -> Result<()> {
        match self.matches.get(raw) {
            None => {
                self.order.push(raw.to_string());
                self.matches.insert(raw.to_string(), mapped);
                Ok(())
            }
            Some(existing) if *existing == mapped => Ok(()),
            Some(existing) => Err(MapError::ConflictingMapping {
                raw: raw.to_string(),
                existing: display_target(existing.as_deref()),
                attempted: display_target(mapped.as_deref()),
            }),
        }
    }

    /// Every generated entry starts out unapproved.
    pub fn build(mut self) -> FieldMapping {
        self.order
            .into_iter()
            .map(|raw| {
                let output = self.matches.remove(&raw).flatten();
                (raw, MappingEntry::new(output, Approval::NotApproved))
            })
            .collect()
    }
}

fn display_target(target: Option<&str>) -> String {
    target.unwrap_or("None").to_string()
}

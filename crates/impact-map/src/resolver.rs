//! Merges generated mappings with the stored ones.

use std::collections::BTreeSet;

use impact_model::{FieldMapping, FieldMappings};

/// Merge policy for [`resolve_mappings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// New entries replace stored entries with the same input.
    pub overwrite: bool,
    /// Stored entries that are not approved are discarded before merging.
    pub remove_unapproved_source: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            remove_unapproved_source: true,
        }
    }
}

impl ResolveOptions {
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn with_remove_unapproved_source(mut self, remove: bool) -> Self {
        self.remove_unapproved_source = remove;
        self
    }
}

/// Merges one field's mappings.
///
/// Without `overwrite`, an input present in `source` keeps its stored entry.
pub fn resolve_mapping(
    new: &FieldMapping,
    source: &FieldMapping,
    options: ResolveOptions,
) -> FieldMapping {
    let mut source = source.clone();
    if options.remove_unapproved_source {
        source.retain_approved();
    }
    let (mut merged, later) = if options.overwrite {
        (source, new.clone())
    } else {
        (new.clone(), source)
    };
    for (input, entry) in later.iter() {
        merged.insert(input, entry.clone());
    }
    merged
}

/// Merges every field present in either set; empty results are left out.
pub fn resolve_mappings(
    new: &FieldMappings,
    source: &FieldMappings,
    options: ResolveOptions,
) -> FieldMappings {
    let fields: BTreeSet<&String> = new.keys().chain(source.keys()).collect();
    let empty = FieldMapping::new();
    fields
        .into_iter()
        .filter_map(|field| {
            let resolved = resolve_mapping(
                new.get(field).unwrap_or(&empty),
                source.get(field).unwrap_or(&empty),
                options,
            );
            (!resolved.is_empty()).then(|| (field.clone(), resolved))
        })
        .collect()
}

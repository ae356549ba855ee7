//! Field-mapping generation and resolution.
//!
//! The generator proposes unapproved mappings for enum and boolean values it
//! cannot validate; the resolver merges them with previously stored mappings.

pub mod builder;
pub mod error;
pub mod generator;
pub mod resolver;
pub mod score;

pub use builder::MappingTableBuilder;
pub use error::{MapError, Result};
pub use generator::{MappingGenerator, generate_for_field, is_num};
pub use resolver::{ResolveOptions, resolve_mapping, resolve_mappings};
pub use score::{FUZZY_MATCH_THRESHOLD, extract_one, full_process, token_sort_ratio};

//! Error types for mapping operations.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// A raw value was matched to two different canonical values in one scan.
    #[error(
        "Raw field '{raw}' has already been matched with '{existing}', but is trying to be assigned to '{attempted}' as well"
    )]
    ConflictingMapping {
        raw: String,
        existing: String,
        attempted: String,
    },
}

pub type Result<T> = std::result::Result<T, MapError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("schema field name cannot be empty")]
    EmptyFieldName,
    #[error("duplicate schema field: {0}")]
    DuplicateField(String),
    #[error("invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid custom milestone key '{key}' for field '{field}'")]
    InvalidMilestoneKey { field: String, key: String },
    #[error("sheet is missing required column '{0}'")]
    MissingSheetColumn(String),
    #[error("invalid approval value: {0}")]
    InvalidApproval(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

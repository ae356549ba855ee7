//! Run configuration: a TOML file merged with command-line overrides.
//!
//! ```toml
//! member_id = "member-7"
//! row_format = false
//! delimiter = ";"
//! schema = "schema.json"
//! column_mapping = "column_mapping.csv"
//! field_mappings = "mappings"
//! datasets = ["exports"]
//! output = "out/delivery.csv"
//! report = "out/report.json"
//! ```
//!
//! Relative paths in the file are resolved against the file's directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use impact_core::{DEFAULT_MULTIPLE_VALUE_DELIMITER, PipelineOptions};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub member_id: Option<String>,
    pub row_format: Option<bool>,
    pub delimiter: Option<String>,
    pub schema: Option<PathBuf>,
    pub column_mapping: Option<PathBuf>,
    pub field_mappings: Option<PathBuf>,
    pub datasets: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

impl RunConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("parse run configuration")
    }

    /// Reads a TOML file, anchoring relative paths at its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("load config: {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        let anchor = |path: PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };
        self.schema = self.schema.map(anchor);
        self.column_mapping = self.column_mapping.map(anchor);
        self.field_mappings = self.field_mappings.map(anchor);
        self.output = self.output.map(anchor);
        self.report = self.report.map(anchor);
        self.datasets = self.datasets.into_iter().map(anchor).collect();
        self
    }

    /// Values set in `overrides` win; datasets are replaced when any are given.
    #[must_use]
    pub fn merged_with(self, overrides: RunConfig) -> Self {
        Self {
            member_id: overrides.member_id.or(self.member_id),
            row_format: overrides.row_format.or(self.row_format),
            delimiter: overrides.delimiter.or(self.delimiter),
            schema: overrides.schema.or(self.schema),
            column_mapping: overrides.column_mapping.or(self.column_mapping),
            field_mappings: overrides.field_mappings.or(self.field_mappings),
            datasets: if overrides.datasets.is_empty() {
                self.datasets
            } else {
                overrides.datasets
            },
            output: overrides.output.or(self.output),
            report: overrides.report.or(self.report),
        }
    }

    /// Checks that every required value is present.
    pub fn into_settings(self) -> Result<RunSettings> {
        let mut missing = Vec::new();
        if self.member_id.as_deref().is_none_or(|id| id.trim().is_empty()) {
            missing.push("member_id (--member-id)");
        }
        if self.schema.is_none() {
            missing.push("schema (--schema)");
        }
        if self.column_mapping.is_none() {
            missing.push("column_mapping (--column-mapping)");
        }
        if self.datasets.is_empty() {
            missing.push("datasets (DATASET arguments)");
        }
        let (Some(member_id), Some(schema), Some(column_mapping)) =
            (self.member_id, self.schema, self.column_mapping)
        else {
            bail!("missing run settings: {}", missing.join(", "));
        };
        if !missing.is_empty() {
            bail!("missing run settings: {}", missing.join(", "));
        }
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| DEFAULT_MULTIPLE_VALUE_DELIMITER.to_string());
        if delimiter.is_empty() {
            bail!("delimiter must not be empty");
        }
        Ok(RunSettings {
            member_id: member_id.trim().to_string(),
            row_format: self.row_format.unwrap_or(true),
            delimiter,
            schema,
            column_mapping,
            field_mappings: self.field_mappings,
            datasets: self.datasets,
            output: self.output,
            report: self.report,
        })
    }
}

/// A complete run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub member_id: String,
    pub row_format: bool,
    pub delimiter: String,
    pub schema: PathBuf,
    pub column_mapping: PathBuf,
    pub field_mappings: Option<PathBuf>,
    pub datasets: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

impl RunSettings {
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions::new(self.member_id.clone())
            .with_row_format(self.row_format)
            .with_delimiter(self.delimiter.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let file = RunConfig::from_toml(
            r#"
            member_id = "file-member"
            schema = "schema.json"
            column_mapping = "columns.csv"
            datasets = ["a.csv"]
            "#,
        )
        .unwrap();
        let flags = RunConfig {
            member_id: Some("flag-member".to_string()),
            row_format: Some(false),
            ..RunConfig::default()
        };
        let settings = file.merged_with(flags).into_settings().unwrap();
        assert_eq!(settings.member_id, "flag-member");
        assert!(!settings.row_format);
        assert_eq!(settings.delimiter, ";");
        assert_eq!(settings.datasets, vec![PathBuf::from("a.csv")]);
    }

    #[test]
    fn reports_every_missing_value() {
        let error = RunConfig::default().into_settings().unwrap_err();
        assert_eq!(
            error.to_string(),
            "missing run settings: member_id (--member-id), schema (--schema), \
             column_mapping (--column-mapping), datasets (DATASET arguments)"
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(RunConfig::from_toml("membr_id = \"x\"").is_err());
    }

    #[test]
    fn relative_paths_follow_config_dir() {
        let config = RunConfig {
            schema: Some(PathBuf::from("schema.json")),
            output: Some(PathBuf::from("/abs/out.csv")),
            ..RunConfig::default()
        }
        .relative_to(Path::new("/etc/impact"));
        assert_eq!(config.schema, Some(PathBuf::from("/etc/impact/schema.json")));
        assert_eq!(config.output, Some(PathBuf::from("/abs/out.csv")));
    }
}

//! Canonicalization settings
//!
//! The defaults describe product review records (`reviewID`, `asin`,
//! `overall`, `reviewText`). Other record shapes override the field names,
//! usually from a TOML file:
//!
//! ```toml
//! id_fields = ["order_id"]
//! partition_field = "sku"
//! rating_field = "score"
//! text_field = "comment"
//! missing_id = "reject"
//! ```
//!
//! Roots committed by tooling that coerced fields the Python way (`None`,
//! `True`, falsy identifiers skipped) need `value_style = "python"` together
//! with [`HexSha256Hasher`](crate::hashing::HexSha256Hasher).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What to do when a record has none of the identifier fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingIdPolicy {
    /// Use `content-<sha256 of the record content>` as the identifier
    #[default]
    ContentHash,
    /// Fail with [`Error::MissingIdentifier`]
    Reject,
}

/// How non-string field values become text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueStyle {
    /// JSON text: null is empty, booleans are `true`/`false`
    #[default]
    Json,
    /// Python `str()`: null is `None`, booleans are `True`/`False`, and
    /// `0`, `0.0` and `false` are not usable as identifiers
    Python,
}

/// Field mapping and delimiter used to build a canonical key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalConfig {
    /// Separator placed between the four key fields
    pub delimiter: char,
    /// Identifier fields in order of precedence
    pub id_fields: Vec<String>,
    /// Field holding the partition key, e.g. a product identifier
    pub partition_field: String,
    /// Field holding the rating
    pub rating_field: String,
    /// Field holding free text
    pub text_field: String,
    /// Fallback when no identifier field is present
    pub missing_id: MissingIdPolicy,
    /// Coercion of null, boolean and numeric values
    pub value_style: ValueStyle,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            delimiter: '|',
            id_fields: vec!["reviewID".into(), "reviewerID".into(), "id".into()],
            partition_field: "asin".into(),
            rating_field: "overall".into(),
            text_field: "reviewText".into(),
            missing_id: MissingIdPolicy::ContentHash,
            value_style: ValueStyle::Json,
        }
    }
}

impl CanonicalConfig {
    /// Parse a config from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(CanonicalConfig::from_toml_str("").unwrap(), CanonicalConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = CanonicalConfig::from_toml_str(
            r#"
            id_fields = ["order_id"]
            missing_id = "reject"
            value_style = "python"
            "#,
        )
        .unwrap();
        assert_eq!(config.value_style, ValueStyle::Python);
        assert_eq!(config.id_fields, vec!["order_id".to_string()]);
        assert_eq!(config.missing_id, MissingIdPolicy::Reject);
        assert_eq!(config.partition_field, "asin");
        assert_eq!(config.delimiter, '|');
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = CanonicalConfig::from_toml_str("missing_id = \"sometimes\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CanonicalConfig::from_path(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canon.toml");
        std::fs::write(&path, "text_field = \"body\"\n").unwrap();
        let config = CanonicalConfig::from_path(&path).unwrap();
        assert_eq!(config.text_field, "body");
    }
}

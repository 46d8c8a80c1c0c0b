//! Canonicalization of records into deterministic keys, and leaf derivation.
//!
//! A canonical key is four fields joined by a delimiter:
//!
//! ```text
//! record_id | PARTITION_KEY | rating | normalized text
//! ```
//!
//! The same record always yields the same key. The delimiter is not escaped,
//! so free text that contains it can collide with a differently split key.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use crate::config::{CanonicalConfig, MissingIdPolicy, ValueStyle};
use crate::error::{Error, Result};
use crate::hashing::{Digest, MerkleHasher, Sha256Hasher};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("tag pattern is valid"));

/// Field value as a record exposes it, before coercion to text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Number in its source text, e.g. `5` or `5.0`
    Number(Cow<'a, str>),
    /// String, or any other value in its serialized form
    Text(Cow<'a, str>),
}

impl FieldValue<'_> {
    /// Text form under the given coercion style. Null is empty for
    /// [`ValueStyle::Json`] and `None` for [`ValueStyle::Python`].
    pub fn render(&self, style: ValueStyle) -> Cow<'_, str> {
        match (self, style) {
            (FieldValue::Null, ValueStyle::Json) => Cow::Borrowed(""),
            (FieldValue::Null, ValueStyle::Python) => Cow::Borrowed("None"),
            (FieldValue::Bool(true), ValueStyle::Json) => Cow::Borrowed("true"),
            (FieldValue::Bool(false), ValueStyle::Json) => Cow::Borrowed("false"),
            (FieldValue::Bool(true), ValueStyle::Python) => Cow::Borrowed("True"),
            (FieldValue::Bool(false), ValueStyle::Python) => Cow::Borrowed("False"),
            (FieldValue::Number(n), _) | (FieldValue::Text(n), _) => Cow::Borrowed(n),
        }
    }

    /// Whether the value can serve as an identifier. Empty text and null
    /// never do; under [`ValueStyle::Python`] `false` and zero are skipped
    /// as well.
    fn is_identifier(&self, style: ValueStyle) -> bool {
        match (self, style) {
            (FieldValue::Null, _) => false,
            (FieldValue::Text(t), _) => !t.is_empty(),
            (FieldValue::Bool(b), ValueStyle::Python) => *b,
            (FieldValue::Number(n), ValueStyle::Python) => {
                n.parse::<f64>().map_or(true, |v| v != 0.0)
            }
            (_, ValueStyle::Json) => true,
        }
    }
}

/// A record that can be canonicalized
pub trait Record {
    /// Value of a field, `None` when absent
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Stable byte encoding of the whole record, used to derive an
    /// identifier for records that carry none
    fn content_bytes(&self) -> Vec<u8>;
}

impl Record for Value {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match self.get(name)? {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => FieldValue::Number(Cow::Owned(n.to_string())),
            Value::String(s) => FieldValue::Text(Cow::Borrowed(s)),
            other => FieldValue::Text(Cow::Owned(other.to_string())),
        })
    }

    fn content_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_sorted_json(self, &mut bytes);
        bytes
    }
}

/// Compact JSON with object keys in sorted order, whatever order the map
/// keeps them in
fn write_sorted_json(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push(b'{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(Value::String(key.clone()).to_string().as_bytes());
                out.push(b':');
                write_sorted_json(&map[key.as_str()], out);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_sorted_json(item, out);
            }
            out.push(b']');
        }
        scalar => out.extend_from_slice(scalar.to_string().as_bytes()),
    }
}

impl Record for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        self.get(name).map(|v| FieldValue::Text(Cow::Borrowed(v.as_str())))
    }

    fn content_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (key, value) in self {
            for part in [key, value] {
                bytes.extend_from_slice(&(part.len() as u64).to_le_bytes());
                bytes.extend_from_slice(part.as_bytes());
            }
        }
        bytes
    }
}

/// Deterministic byte string for one record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey {
    record_id: String,
    partition_key: String,
    rating: String,
    text: String,
    encoded: String,
}

impl CanonicalKey {
    /// Join already normalized fields
    pub fn new(
        record_id: impl Into<String>,
        partition_key: impl Into<String>,
        rating: impl Into<String>,
        text: impl Into<String>,
        delimiter: char,
    ) -> Self {
        let (record_id, partition_key, rating, text) =
            (record_id.into(), partition_key.into(), rating.into(), text.into());
        let mut encoded = String::with_capacity(
            record_id.len() + partition_key.len() + rating.len() + text.len() + 3,
        );
        for (i, part) in [&record_id, &partition_key, &rating, &text].into_iter().enumerate() {
            if i > 0 {
                encoded.push(delimiter);
            }
            encoded.push_str(part);
        }
        Self {
            record_id,
            partition_key,
            rating,
            text,
            encoded,
        }
    }

    /// Record identifier
    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// Upper-cased partition key
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Rating in string form
    pub fn rating(&self) -> &str {
        &self.rating
    }

    /// Normalized free text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The joined key
    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl AsRef<[u8]> for CanonicalKey {
    fn as_ref(&self) -> &[u8] {
        self.encoded.as_bytes()
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

/// Hash a canonical key into a leaf digest
pub fn derive_leaf<H: MerkleHasher>(key: &CanonicalKey) -> Digest {
    H::hash(key)
}

/// NFKC-normalize, replace `<...>` tags with a space, collapse whitespace,
/// trim and lower-case.
///
/// Whitespace includes the information separators U+001C..U+001F.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let composed: String = text.nfkc().collect();
    let untagged = TAG.replace_all(&composed, " ");
    untagged
        .split(is_space)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Turns records into canonical keys and leaf digests
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    config: CanonicalConfig,
}

impl Canonicalizer {
    /// Canonicalizer with the given field mapping
    pub fn new(config: CanonicalConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &CanonicalConfig {
        &self.config
    }

    /// Build the canonical key of one record.
    ///
    /// Only fails when the record has no identifier and the config uses
    /// [`MissingIdPolicy::Reject`].
    pub fn canonicalize<R: Record + ?Sized>(&self, record: &R) -> Result<CanonicalKey> {
        let style = self.config.value_style;
        let record_id = self.record_id(record)?;
        let partition_key = record
            .field(&self.config.partition_field)
            .filter(|v| *v != FieldValue::Null)
            .map(|v| v.render(style).trim_matches(is_space).to_uppercase())
            .unwrap_or_default();
        // a null rating renders per style, only a missing one is empty
        let rating = record
            .field(&self.config.rating_field)
            .map(|v| v.render(style).trim_matches(is_space).to_string())
            .unwrap_or_default();
        let text = record
            .field(&self.config.text_field)
            .filter(|v| *v != FieldValue::Null)
            .map(|v| normalize_text(&v.render(style)))
            .unwrap_or_default();
        Ok(CanonicalKey::new(
            record_id,
            partition_key,
            rating,
            text,
            self.config.delimiter,
        ))
    }

    /// Canonicalize and hash one record
    pub fn derive_leaf<H: MerkleHasher, R: Record + ?Sized>(&self, record: &R) -> Result<Digest> {
        Ok(derive_leaf::<H>(&self.canonicalize(record)?))
    }

    /// Leaf digests for a record sequence, in order
    pub fn derive_leaves<H, R>(&self, records: &[R]) -> Result<Vec<Digest>>
    where
        H: MerkleHasher,
        R: Record + Sync,
    {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            records
                .par_iter()
                .map(|record| self.derive_leaf::<H, R>(record))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            records
                .iter()
                .map(|record| self.derive_leaf::<H, R>(record))
                .collect()
        }
    }

    /// First aligned position whose canonical keys differ
    ///
    /// See [`crate::locate::locate_first_difference`] for the limits of
    /// positional comparison.
    pub fn locate_first_difference<R: Record>(
        &self,
        original: &[R],
        modified: &[R],
    ) -> Result<Option<usize>> {
        for (index, (a, b)) in original.iter().zip(modified).enumerate() {
            if self.canonicalize(a)? != self.canonicalize(b)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    fn record_id<R: Record + ?Sized>(&self, record: &R) -> Result<String> {
        let style = self.config.value_style;
        let found = self
            .config
            .id_fields
            .iter()
            .filter_map(|name| record.field(name))
            .find(|value| value.is_identifier(style));
        if let Some(id) = found {
            return Ok(id.render(style).into_owned());
        }
        match self.config.missing_id {
            MissingIdPolicy::ContentHash => {
                let id = format!(
                    "content-{}",
                    hex::encode(Sha256Hasher::hash(record.content_bytes()))
                );
                tracing::warn!(%id, "record has no identifier, using content hash");
                Ok(id)
            }
            MissingIdPolicy::Reject => Err(Error::MissingIdentifier {
                fields: self.config.id_fields.clone(),
            }),
        }
    }
}

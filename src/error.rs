//! Error types for merkle_audit

use std::path::PathBuf;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by tree, proof, canonicalization and config operations.
///
/// All of them are deterministic: retrying with the same input yields the
/// same error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A tree was requested over zero leaves, so there is no root
    #[error("cannot build a tree from an empty leaf sequence")]
    EmptyInput,

    /// A proof or update was requested for a position outside the leaf range
    #[error("index {index} is out of range for {len} leaves")]
    IndexOutOfRange {
        /// requested position
        index: usize,
        /// number of leaves in the tree
        len: usize,
    },

    /// A proof step is inconsistent with its direction or its position
    #[error("malformed proof at step {step}: {reason}")]
    MalformedProof {
        /// zero-based step, counted from the leaf
        step: usize,
        /// what is wrong with the step
        reason: &'static str,
    },

    /// A record carries none of the configured identifier fields and the
    /// configuration forbids deriving one
    #[error("record has none of the identifier fields {fields:?}")]
    MissingIdentifier {
        /// identifier fields that were searched
        fields: Vec<String>,
    },

    /// Text that should encode a digest does not
    #[error("invalid digest encoding: {0}")]
    InvalidDigest(String),

    /// Hex decoding failure
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),

    /// Configuration text could not be parsed
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("failed to read {path}")]
    Io {
        /// file that was being read
        path: PathBuf,
        /// underlying error
        #[source]
        source: std::io::Error,
    },
}

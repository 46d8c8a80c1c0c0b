//! Binary hash tree commitments over ordered record collections.
//!
//! Records are canonicalized into deterministic keys, hashed into 32-byte
//! leaves, and folded pairwise into a single root. The root detects any
//! modification, insertion or deletion of a record, and an inclusion proof
//! shows that one record belongs to a committed root without rehashing the
//! collection.
//!
//! A parent node hashes the concatenation of its children in *record order*.
//! A trailing node without a partner is promoted by hashing it alone:
//! ```text
//! parent hash = hash(left_child ++ right_child)
//! lone parent = hash(lone_child)
//! ```
//!
//! # Examples
//!
//! ```
//! use merkle_audit::{Canonicalizer, CommittedRoot, IntegritySession, MerkleTree};
//! use serde_json::json;
//!
//! let records = vec![
//!     json!({"reviewID": "r1", "asin": "b001", "overall": 5.0, "reviewText": "Great"}),
//!     json!({"reviewID": "r2", "asin": "b001", "overall": 2.0, "reviewText": "Meh"}),
//!     json!({"reviewID": "r3", "asin": "b002", "overall": 4.0, "reviewText": "Fine"}),
//! ];
//!
//! // build a tree and commit its root
//! let tree: MerkleTree = MerkleTree::from_records(&records, &Canonicalizer::default()).unwrap();
//! let committed = CommittedRoot::of(&tree);
//!
//! // prove and verify membership of one record
//! let proof = tree.gen_proof(2).unwrap();
//! assert!(tree.verify(&proof, &tree.leaves()[2]));
//!
//! // detect tampering
//! let session: IntegritySession =
//!     IntegritySession::from_records(&records, Canonicalizer::default()).unwrap();
//! let mut tampered = records.clone();
//! tampered[1]["reviewText"] = json!("Amazing");
//! let report = session.check_integrity(&committed, &tampered).unwrap();
//! assert!(!report.is_intact());
//! assert_eq!(report.first_difference, Some(1));
//! ```
//!
//! The free functions [`build`], [`update`], [`generate_proof`] and
//! [`verify_proof`] work directly on leaf slices:
//!
//! ```
//! use merkle_audit::{build, generate_proof, verify_proof, MerkleHasher, Sha256Hasher};
//!
//! let leaves: Vec<_> = ["x", "y", "z"].iter().map(Sha256Hasher::hash).collect();
//! let (layers, root) = build::<Sha256Hasher>(&leaves).unwrap();
//! assert_eq!(layers.len(), 3);
//!
//! let proof = generate_proof::<Sha256Hasher>(&leaves, 2).unwrap();
//! assert!(verify_proof::<Sha256Hasher>(&leaves[2], &proof, &root));
//! ```

#![warn(missing_docs, rust_2018_idioms, missing_debug_implementations)]

pub mod canonical;
pub use canonical::{derive_leaf, normalize_text, CanonicalKey, Canonicalizer, FieldValue, Record};
pub mod commit;
pub use commit::CommittedRoot;
pub mod config;
pub use config::{CanonicalConfig, MissingIdPolicy, ValueStyle};
pub mod error;
pub use error::{Error, Result};
pub mod hashing;
pub use hashing::{Digest, HexSha256Hasher, Keccak256Hasher, MerkleHasher, Sha256Hasher};
pub mod locate;
pub use locate::{changed_positions, locate_first_difference};
pub mod mtree;
pub use mtree::{build, generate_proof, update, Layer, MerkleTree};
pub mod proof;
pub use proof::{verify_proof, Direction, MerkleProof, ProofStep};
pub mod session;
pub use session::{IntegrityReport, IntegrityStatus, IntegritySession};

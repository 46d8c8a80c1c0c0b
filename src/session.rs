//! Caller-owned integrity session.
//!
//! A session bundles the canonicalizer and the tree built over a record
//! collection, so each operation receives its context explicitly instead of
//! reading process-wide state.

use crate::canonical::{Canonicalizer, Record};
use crate::commit::CommittedRoot;
use crate::error::Result;
use crate::hashing::{Digest, MerkleHasher, Sha256Hasher};
use crate::locate::changed_positions;
use crate::mtree::MerkleTree;
use crate::proof::MerkleProof;

/// Outcome of comparing a record collection against a committed root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityStatus {
    /// Recomputed root and leaf count match the commitment
    Intact,
    /// Anything else
    Tampered,
}

/// Result of [`IntegritySession::check_integrity`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Whether the collection still matches the commitment
    pub status: IntegrityStatus,
    /// First aligned position that differs from the session's leaves. Only a
    /// hint after insertions or deletions.
    pub first_difference: Option<usize>,
    /// Root of the checked collection, `None` when it is empty
    pub recomputed_root: Option<Digest>,
    /// Number of records checked
    pub leaf_count: usize,
}

impl IntegrityReport {
    /// True when no tampering was detected
    pub fn is_intact(&self) -> bool {
        self.status == IntegrityStatus::Intact
    }
}

/// Tree and canonicalizer for one record collection
#[derive(Debug, Clone)]
pub struct IntegritySession<H: MerkleHasher = Sha256Hasher> {
    canonicalizer: Canonicalizer,
    tree: MerkleTree<H>,
}

impl<H: MerkleHasher> IntegritySession<H> {
    /// Canonicalize `records` and build their tree
    pub fn from_records<R: Record + Sync>(
        records: &[R],
        canonicalizer: Canonicalizer,
    ) -> Result<Self> {
        let tree = MerkleTree::from_records(records, &canonicalizer)?;
        Ok(Self {
            canonicalizer,
            tree,
        })
    }

    /// Start from an existing tree
    pub fn with_tree(tree: MerkleTree<H>, canonicalizer: Canonicalizer) -> Self {
        Self {
            canonicalizer,
            tree,
        }
    }

    /// Current root
    pub fn root(&self) -> Digest {
        self.tree.root()
    }

    /// Current tree
    pub fn tree(&self) -> &MerkleTree<H> {
        &self.tree
    }

    /// Canonicalizer used for every record in this session
    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// Snapshot the current root as a trust anchor
    pub fn commit(&self) -> CommittedRoot {
        let committed = CommittedRoot::of(&self.tree);
        tracing::debug!(root = %committed, "committed root");
        committed
    }

    /// Inclusion proof for the record at `index`
    pub fn prove(&self, index: usize) -> Result<MerkleProof> {
        self.tree.gen_proof(index)
    }

    /// Check a proof for the record at `index` against `root`, which may be
    /// an older committed root
    pub fn verify(&self, index: usize, proof: &MerkleProof, root: &Digest) -> Result<bool> {
        let leaf = self.tree.leaf(index)?;
        Ok(proof.verify::<H>(&leaf, root))
    }

    /// Recompute the root of `records` and compare it with `committed`.
    ///
    /// When the record count is unchanged and a single aligned position
    /// differs, the new root comes from an incremental update of the
    /// session's tree; otherwise the tree is rebuilt.
    pub fn check_integrity<R: Record + Sync>(
        &self,
        committed: &CommittedRoot,
        records: &[R],
    ) -> Result<IntegrityReport> {
        let leaves = self.canonicalizer.derive_leaves::<H, R>(records)?;
        let mut changed = changed_positions(self.tree.leaves(), &leaves);
        let first_difference = changed.next();
        let single_edit = changed.next().is_none();

        let recomputed_root = match first_difference {
            _ if leaves.is_empty() => None,
            None if leaves.len() == self.tree.leaf_count() => Some(self.tree.root()),
            Some(index) if single_edit && leaves.len() == self.tree.leaf_count() => {
                Some(self.tree.update(index, leaves[index])?.root())
            }
            _ => Some(MerkleTree::<H>::from_leaves(leaves.clone())?.root()),
        };

        let status = match recomputed_root {
            Some(root) if committed.matches(&root, leaves.len()) => IntegrityStatus::Intact,
            _ => IntegrityStatus::Tampered,
        };
        if status == IntegrityStatus::Tampered {
            tracing::warn!(
                committed = %committed,
                recomputed = ?recomputed_root.map(hex::encode),
                first_difference,
                "tampering detected"
            );
        } else {
            tracing::debug!(leaves = leaves.len(), "collection intact");
        }

        Ok(IntegrityReport {
            status,
            first_difference,
            recomputed_root,
            leaf_count: leaves.len(),
        })
    }

    /// Replace the record at `index` and return the updated session
    pub fn replace<R: Record>(&self, index: usize, record: &R) -> Result<Self> {
        let leaf = self.canonicalizer.derive_leaf::<H, R>(record)?;
        Ok(Self {
            canonicalizer: self.canonicalizer.clone(),
            tree: self.tree.update(index, leaf)?,
        })
    }
}

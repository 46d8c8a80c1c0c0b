//! A Merkle tree over an ordered sequence of leaf digests.
//!
//! Layer 0 holds the leaves. Each following layer pairs adjacent nodes, and a
//! trailing node without a partner is promoted by hashing it alone:
//!
//! ```text
//! len(layer[d + 1]) = ceil(len(layer[d]) / 2)
//! parent            = hash(left ++ right)   or   hash(lone)
//! ```
//!
//! Leaf order is part of the root: permuting leaves changes the root.

use std::marker::PhantomData;

use crate::canonical::{Canonicalizer, Record};
use crate::error::{Error, Result};
use crate::hashing::{Digest, MerkleHasher, Sha256Hasher};
use crate::proof::{Direction, MerkleProof, ProofStep};

/// Layer in tree
pub type Layer = Vec<Digest>;

/// Build merkle trees, get proofs, and apply single-leaf updates.
///
/// All layers are kept so proofs and updates never refold the whole tree.
///
/// # Examples
///
/// ```
/// use merkle_audit::{MerkleHasher, MerkleTree, Sha256Hasher};
///
/// let leaves = vec![Sha256Hasher::hash("x"), Sha256Hasher::hash("y")];
/// let tree = MerkleTree::new(leaves.clone()).unwrap();
/// let proof = tree.gen_proof(0).unwrap();
/// assert!(tree.verify(&proof, &leaves[0]));
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MerkleTree<H: MerkleHasher = Sha256Hasher> {
    layers: Vec<Layer>,
    hasher: PhantomData<H>,
}

impl MerkleTree {
    /// Construct a SHA-256 tree from leaf digests
    pub fn new(leaves: Vec<Digest>) -> Result<Self> {
        Self::from_leaves(leaves)
    }
}

impl<H: MerkleHasher> MerkleTree<H> {
    /// Construct a tree from leaf digests. Fails on an empty sequence.
    pub fn from_leaves(leaves: Vec<Digest>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(Error::EmptyInput);
        }
        let layers = build_layers::<H>(leaves);
        tracing::debug!(
            leaves = layers[0].len(),
            depth = layers.len() - 1,
            "built merkle tree"
        );
        Ok(MerkleTree {
            layers,
            hasher: PhantomData,
        })
    }

    /// Canonicalize records and construct a tree over their leaves
    pub fn from_records<R: Record + Sync>(
        records: &[R],
        canonicalizer: &Canonicalizer,
    ) -> Result<Self> {
        Self::from_leaves(canonicalizer.derive_leaves::<H, R>(records)?)
    }

    /// return the root hash
    pub fn root(&self) -> Digest {
        // a tree always has at least one layer, and the last one has one node
        self.layers[self.layers.len() - 1][0]
    }

    /// Leaf digests in their original order
    pub fn leaves(&self) -> &[Digest] {
        &self.layers[0]
    }

    /// Every layer, leaves first and root last
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Depth is the distance of the furthest node from the root, which is
    /// also the length of every proof
    /// ```text
    ///          0
    ///        /   \
    ///       1     1
    ///      / \    |
    ///     2   2   2
    /// ```
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Leaf digest at `index`
    pub fn leaf(&self, index: usize) -> Result<Digest> {
        self.check_index(index)?;
        Ok(self.layers[0][index])
    }

    /// Return true if the digest is one of the leaves
    pub fn contains(&self, leaf: &Digest) -> bool {
        self.layers[0].contains(leaf)
    }

    /// Position of the first leaf equal to `leaf`
    pub fn position(&self, leaf: &Digest) -> Option<usize> {
        self.layers[0].iter().position(|e| e == leaf)
    }

    /// Index of the ancestor of `index` in every layer, leaf first, root last
    pub fn path_indices(&self, index: usize) -> Result<Vec<usize>> {
        self.check_index(index)?;
        let mut idx = index;
        let mut path = Vec::with_capacity(self.layers.len());
        for _ in &self.layers {
            path.push(idx);
            // integer halving gives the parent's index
            idx /= 2;
        }
        Ok(path)
    }

    /// Generate a merkle proof for the leaf at `index`
    pub fn gen_proof(&self, index: usize) -> Result<MerkleProof> {
        self.check_index(index)?;
        let mut idx = index;
        let mut steps = Vec::with_capacity(self.depth());
        for layer in &self.layers[..self.layers.len() - 1] {
            steps.push(step_for(layer, idx));
            idx /= 2;
        }
        Ok(MerkleProof::new(steps))
    }

    /// Verify that `leaf` is a member of this tree
    pub fn verify(&self, proof: &MerkleProof, leaf: &Digest) -> bool {
        proof.verify::<H>(leaf, &self.root())
    }

    /// Return a new tree with the leaf at `index` replaced.
    ///
    /// Only the digests on the path from that leaf to the root are
    /// recomputed; `self` is left untouched.
    pub fn update(&self, index: usize, new_leaf: Digest) -> Result<Self> {
        self.check_index(index)?;
        let mut updated = self.clone();
        updated.layers[0][index] = new_leaf;
        updated.recalculate_branch(index);
        tracing::debug!(
            index,
            old_root = %hex::encode(self.root()),
            new_root = %hex::encode(updated.root()),
            "updated leaf"
        );
        Ok(updated)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let len = self.leaf_count();
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    fn recalculate_branch(&mut self, leaf_idx: usize) {
        let mut node_idx = leaf_idx;
        for layer_idx in 0..self.layers.len() - 1 {
            let layer = &self.layers[layer_idx];
            // the changed node is a left child, a right child, or promoted
            let parent = match Direction::at(node_idx, layer.len()) {
                Direction::Left => H::hash_pair(&layer[node_idx - 1], &layer[node_idx]),
                Direction::Right => H::hash_pair(&layer[node_idx], &layer[node_idx + 1]),
                Direction::Single => H::hash_single(&layer[node_idx]),
            };
            node_idx /= 2;
            self.layers[layer_idx + 1][node_idx] = parent;
        }
    }
}

/// Fold a leaf sequence into all of its layers and return them with the root
pub fn build<H: MerkleHasher>(leaves: &[Digest]) -> Result<(Vec<Layer>, Digest)> {
    let tree = MerkleTree::<H>::from_leaves(leaves.to_vec())?;
    let root = tree.root();
    Ok((tree.layers, root))
}

/// Replace one leaf and recompute the root from the updated copy.
///
/// The input slice is not modified. The root always equals a fresh
/// [`build`] over the returned leaves.
pub fn update<H: MerkleHasher>(
    leaves: &[Digest],
    changed_index: usize,
    new_leaf: Digest,
) -> Result<(Vec<Digest>, Digest)> {
    if changed_index >= leaves.len() {
        return Err(Error::IndexOutOfRange {
            index: changed_index,
            len: leaves.len(),
        });
    }
    let mut updated = leaves.to_vec();
    updated[changed_index] = new_leaf;

    let mut layer = updated.clone();
    let mut idx = changed_index;
    while layer.len() > 1 {
        layer = parent_layer::<H>(&layer);
        idx /= 2;
        tracing::trace!(ancestor = idx, nodes = layer.len(), "refolded layer");
    }
    Ok((updated, layer[0]))
}

/// Proof for the leaf at `index`, folding layers on demand instead of
/// reading them from a built tree
pub fn generate_proof<H: MerkleHasher>(leaves: &[Digest], index: usize) -> Result<MerkleProof> {
    if index >= leaves.len() {
        return Err(Error::IndexOutOfRange {
            index,
            len: leaves.len(),
        });
    }
    let mut steps = Vec::new();
    let mut idx = index;
    let mut layer = leaves.to_vec();
    while layer.len() > 1 {
        steps.push(step_for(&layer, idx));
        layer = parent_layer::<H>(&layer);
        idx /= 2;
    }
    Ok(MerkleProof::new(steps))
}

fn step_for(layer: &[Digest], idx: usize) -> ProofStep {
    match Direction::at(idx, layer.len()) {
        Direction::Left => ProofStep::left(layer[idx - 1]),
        Direction::Right => ProofStep::right(layer[idx + 1]),
        Direction::Single => ProofStep::single(),
    }
}

/// Generate all layers from a non-empty vec of leaf hashes
fn build_layers<H: MerkleHasher>(leaves: Layer) -> Vec<Layer> {
    let mut layers = vec![leaves];
    // build layers up to root
    loop {
        let top = &layers[layers.len() - 1];
        if top.len() <= 1 {
            break;
        }
        let parent = parent_layer::<H>(top);
        tracing::trace!(layer = layers.len(), nodes = parent.len(), "folded layer");
        layers.push(parent);
    }
    layers
}

pub(crate) fn parent_layer<H: MerkleHasher>(layer: &[Digest]) -> Layer {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        layer.par_chunks(2).map(parent_of::<H>).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        layer.chunks(2).map(parent_of::<H>).collect()
    }
}

fn parent_of<H: MerkleHasher>(nodes: &[Digest]) -> Digest {
    match nodes {
        [left, right] => H::hash_pair(left, right),
        _ => H::hash_single(&nodes[0]),
    }
}

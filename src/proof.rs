//! Data types for merkle proofs
//!
//! A proof is the chain of siblings from a leaf up to (not including) the
//! root. Serialized, it is a list of steps:
//!
//! ```json
//! [{"sibling": "<64 hex chars>", "direction": "right"},
//!  {"sibling": null, "direction": "single"}]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hashing::{Digest, MerkleHasher};

/// Where the sibling sits relative to the running hash
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sibling is the left child, running hash is the right child
    Left,
    /// Sibling is the right child, running hash is the left child
    Right,
    /// No sibling, the node was promoted by re-hashing it alone
    Single,
}

impl Direction {
    /// Lowercase name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Single => "single",
        }
    }

    /// Direction recorded for the node at `index` in a layer of `len` nodes
    pub(crate) fn at(index: usize, len: usize) -> Self {
        if index % 2 == 1 {
            Direction::Left
        } else if index + 1 < len {
            Direction::Right
        } else {
            Direction::Single
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One level of a proof
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct ProofStep {
    /// Sibling digest, absent for [`Direction::Single`]
    #[serde(default, with = "hex_sibling")]
    pub sibling: Option<Digest>,
    /// Side of the sibling
    pub direction: Direction,
}

impl ProofStep {
    /// Paired step with the sibling on the left
    pub fn left(sibling: Digest) -> Self {
        Self {
            sibling: Some(sibling),
            direction: Direction::Left,
        }
    }

    /// Paired step with the sibling on the right
    pub fn right(sibling: Digest) -> Self {
        Self {
            sibling: Some(sibling),
            direction: Direction::Right,
        }
    }

    /// Promotion step
    pub fn single() -> Self {
        Self {
            sibling: None,
            direction: Direction::Single,
        }
    }

    /// Fold this step into the running hash
    fn apply<H: MerkleHasher>(&self, step: usize, running: &Digest) -> Result<Digest> {
        match (self.direction, &self.sibling) {
            (Direction::Left, Some(sibling)) => Ok(H::hash_pair(sibling, running)),
            (Direction::Right, Some(sibling)) => Ok(H::hash_pair(running, sibling)),
            (Direction::Single, None) => Ok(H::hash_single(running)),
            (Direction::Single, Some(_)) => Err(Error::MalformedProof {
                step,
                reason: "single step carries a sibling",
            }),
            (_, None) => Err(Error::MalformedProof {
                step,
                reason: "paired step is missing its sibling",
            }),
        }
    }
}

/// Chain of siblings up to the root
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerkleProof {
    steps: Vec<ProofStep>,
}

impl MerkleProof {
    /// Wrap an ordered list of steps, leaf level first
    pub fn new(steps: Vec<ProofStep>) -> Self {
        Self { steps }
    }

    /// Steps, leaf level first
    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    /// Number of steps, equal to the tree height for a well-formed proof
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True for the proof of a single-leaf tree
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check that every step has a sibling exactly when its direction needs one
    pub fn validate(&self) -> Result<()> {
        for (step, node) in self.steps.iter().enumerate() {
            let paired = node.direction != Direction::Single;
            if paired != node.sibling.is_some() {
                return Err(Error::MalformedProof {
                    step,
                    reason: if paired {
                        "paired step is missing its sibling"
                    } else {
                        "single step carries a sibling"
                    },
                });
            }
        }
        Ok(())
    }

    /// Check that the directions are the ones a tree of `leaf_count` leaves
    /// produces for the leaf at `index`
    pub fn check_shape(&self, index: usize, leaf_count: usize) -> Result<()> {
        if index >= leaf_count {
            return Err(Error::IndexOutOfRange {
                index,
                len: leaf_count,
            });
        }
        self.validate()?;
        let mut idx = index;
        let mut len = leaf_count;
        let mut step = 0;
        while len > 1 {
            let node = self.steps.get(step).ok_or(Error::MalformedProof {
                step,
                reason: "proof is shorter than the tree height",
            })?;
            if node.direction != Direction::at(idx, len) {
                return Err(Error::MalformedProof {
                    step,
                    reason: "direction does not match the leaf position",
                });
            }
            idx /= 2;
            len = len.div_ceil(2);
            step += 1;
        }
        if step != self.steps.len() {
            return Err(Error::MalformedProof {
                step,
                reason: "proof is longer than the tree height",
            });
        }
        Ok(())
    }

    /// Recompute the root implied by `leaf` and this proof
    pub fn compute_root<H: MerkleHasher>(&self, leaf: &Digest) -> Result<Digest> {
        self.steps
            .iter()
            .enumerate()
            .try_fold(*leaf, |running, (step, node)| node.apply::<H>(step, &running))
    }

    /// True when `leaf` and this proof recompute `root`.
    ///
    /// Malformed steps make verification fail rather than error.
    pub fn verify<H: MerkleHasher>(&self, leaf: &Digest, root: &Digest) -> bool {
        matches!(self.compute_root::<H>(leaf), Ok(computed) if &computed == root)
    }
}

impl<'a> IntoIterator for &'a MerkleProof {
    type Item = &'a ProofStep;
    type IntoIter = std::slice::Iter<'a, ProofStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl From<Vec<ProofStep>> for MerkleProof {
    fn from(steps: Vec<ProofStep>) -> Self {
        Self::new(steps)
    }
}

/// Verify `leaf` against `root`. Pure recomputation, so a root from an older
/// commit is fine.
///
/// Stricter than a plain running-hash loop: a `single` step that carries a
/// sibling is rejected instead of having its sibling ignored.
pub fn verify_proof<H: MerkleHasher>(leaf: &Digest, proof: &MerkleProof, root: &Digest) -> bool {
    proof.verify::<H>(leaf, root)
}

mod hex_sibling {
    use hex::FromHex;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use crate::hashing::Digest;

    pub fn serialize<S: Serializer>(value: &Option<Digest>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(digest) => serializer.serialize_str(&hex::encode(digest)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Digest>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|t| <Digest as FromHex>::from_hex(t.trim()).map_err(D::Error::custom))
            .transpose()
    }
}

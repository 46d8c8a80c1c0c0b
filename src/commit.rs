//! Committed roots, the trust anchor compared against fresh roots.
//!
//! Text form is the 64-character lowercase hex root, optionally followed by
//! `:<leaf count>`:
//!
//! ```text
//! 2d3f...9c1a
//! 2d3f...9c1a:1500000
//! ```

use std::fmt;
use std::str::FromStr;

use hex::FromHex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hashing::{Digest, MerkleHasher};
use crate::mtree::MerkleTree;

/// Root digest saved at commit time, with the leaf count when known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommittedRoot {
    /// Root digest
    #[serde(with = "hex::serde")]
    pub root: Digest,
    /// Number of leaves the root was computed over
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_count: Option<usize>,
}

impl CommittedRoot {
    /// Commit a root together with its leaf count
    pub fn new(root: Digest, leaf_count: usize) -> Self {
        Self {
            root,
            leaf_count: Some(leaf_count),
        }
    }

    /// Commit a bare root, as stored by tools that keep only the digest
    pub fn root_only(root: Digest) -> Self {
        Self {
            root,
            leaf_count: None,
        }
    }

    /// Commit the current state of a tree
    pub fn of<H: MerkleHasher>(tree: &MerkleTree<H>) -> Self {
        Self::new(tree.root(), tree.leaf_count())
    }

    /// Lowercase hex of the root
    pub fn root_hex(&self) -> String {
        hex::encode(self.root)
    }

    /// True when `root` equals the committed root and, if a leaf count was
    /// committed, `leaf_count` equals it too
    pub fn matches(&self, root: &Digest, leaf_count: usize) -> bool {
        self.root == *root && self.leaf_count.map_or(true, |count| count == leaf_count)
    }
}

impl fmt::Display for CommittedRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root_hex())?;
        if let Some(count) = self.leaf_count {
            write!(f, ":{count}")?;
        }
        Ok(())
    }
}

impl FromStr for CommittedRoot {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let text = text.trim();
        let (digest, count) = match text.split_once(':') {
            Some((digest, count)) => (digest, Some(count)),
            None => (text, None),
        };
        if digest.len() != 64 {
            return Err(Error::InvalidDigest(format!(
                "expected 64 hex characters, found {}",
                digest.len()
            )));
        }
        let root = <Digest as FromHex>::from_hex(digest)?;
        let leaf_count = count
            .map(|count| {
                count
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidDigest(format!("invalid leaf count {count:?}")))
            })
            .transpose()?;
        Ok(Self { root, leaf_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::Sha256Hasher;

    const ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn text_forms() {
        let root = Sha256Hasher::hash("abc");
        assert_eq!(CommittedRoot::root_only(root).to_string(), ABC);
        assert_eq!(CommittedRoot::new(root, 3).to_string(), format!("{ABC}:3"));

        let parsed: CommittedRoot = format!("  {}\n", ABC.to_uppercase()).parse().unwrap();
        assert_eq!(parsed, CommittedRoot::root_only(root));
        let parsed: CommittedRoot = format!("{ABC}:1500000").parse().unwrap();
        assert_eq!(parsed.leaf_count, Some(1_500_000));
    }

    #[test]
    fn rejects_bad_text() {
        assert!(matches!(
            "abcd".parse::<CommittedRoot>(),
            Err(Error::InvalidDigest(_))
        ));
        assert!(matches!(
            "zz".repeat(32).parse::<CommittedRoot>(),
            Err(Error::Hex(_))
        ));
        assert!(matches!(
            format!("{ABC}:many").parse::<CommittedRoot>(),
            Err(Error::InvalidDigest(_))
        ));
    }

    #[test]
    fn leaf_count_disambiguates() {
        let root = Sha256Hasher::hash("abc");
        assert!(CommittedRoot::root_only(root).matches(&root, 10));
        assert!(CommittedRoot::new(root, 10).matches(&root, 10));
        assert!(!CommittedRoot::new(root, 10).matches(&root, 11));
        assert!(!CommittedRoot::new(root, 10).matches(&Sha256Hasher::hash("abd"), 10));
    }

    #[test]
    fn json_form() {
        let root = Sha256Hasher::hash("abc");
        let json = serde_json::to_string(&CommittedRoot::new(root, 2)).unwrap();
        assert_eq!(json, format!(r#"{{"root":"{ABC}","leaf_count":2}}"#));
        let bare: CommittedRoot = serde_json::from_str(&format!(r#"{{"root":"{ABC}"}}"#)).unwrap();
        assert_eq!(bare, CommittedRoot::root_only(root));
    }

    #[test]
    fn of_tree() {
        let tree = MerkleTree::new(vec![[1; 32], [2; 32], [3; 32]]).unwrap();
        let committed = CommittedRoot::of(&tree);
        assert_eq!(committed.leaf_count, Some(3));
        assert!(committed.matches(&tree.root(), 3));
    }
}

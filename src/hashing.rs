//! Hashing for merkle_audit
//!
//! Every digest in a tree is 32 bytes. A hasher decides how leaves are hashed
//! and how children combine into a parent; the tree itself only ever calls
//! [`MerkleHasher::hash_pair`] and [`MerkleHasher::hash_single`].

use sha2::{Digest as _, Sha256};
use tiny_keccak::{Hasher, Keccak};

/// Fixed-size digest stored at every node of the tree
pub type Digest = [u8; 32];

/// Allows the use of a custom hashing algorithm
///
/// Trees built with one hasher can only be verified with the same hasher.
pub trait MerkleHasher: Clone {
    /// data -> hash
    fn hash<T: AsRef<[u8]>>(data: T) -> Digest;

    /// Parent of two paired children, `hash(left ++ right)`
    fn hash_pair(left: &Digest, right: &Digest) -> Digest {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(left);
        buf[32..].copy_from_slice(right);
        Self::hash(buf)
    }

    /// Parent of a lone trailing child. The node is promoted by re-hashing
    /// it, never by duplicating it.
    fn hash_single(lone: &Digest) -> Digest {
        Self::hash(lone)
    }
}

/// Default hasher, SHA-256 over raw bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Hasher;

impl MerkleHasher for Sha256Hasher {
    fn hash<T: AsRef<[u8]>>(data: T) -> Digest {
        Sha256::digest(data.as_ref()).into()
    }
}

/// Keccak-256 over raw bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keccak256Hasher;

impl MerkleHasher for Keccak256Hasher {
    fn hash<T: AsRef<[u8]>>(data: T) -> Digest {
        let mut output = [0u8; 32];
        let mut hasher = Keccak::v256();
        hasher.update(data.as_ref());
        hasher.finalize(&mut output);
        output
    }
}

/// SHA-256 where internal nodes hash the lowercase hex text of their
/// children instead of the raw bytes.
///
/// Leaves are the same as [`Sha256Hasher`]. Use this to check roots that were
/// committed by tooling which stored and combined digests as hex strings;
/// pair it with [`ValueStyle::Python`](crate::config::ValueStyle::Python) when
/// that tooling also coerced field values the Python way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexSha256Hasher;

impl MerkleHasher for HexSha256Hasher {
    fn hash<T: AsRef<[u8]>>(data: T) -> Digest {
        Sha256Hasher::hash(data)
    }

    fn hash_pair(left: &Digest, right: &Digest) -> Digest {
        let mut text = hex::encode(left);
        text.push_str(&hex::encode(right));
        Self::hash(text)
    }

    fn hash_single(lone: &Digest) -> Digest {
        Self::hash(hex::encode(lone))
    }
}

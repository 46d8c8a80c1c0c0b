#![cfg(feature = "parallel")]

use merkle_audit::{build, Canonicalizer, Digest, MerkleHasher, MerkleTree, Sha256Hasher};
use serde_json::{json, Value};

fn records(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "reviewerID": format!("A{i:05}"),
                "asin": format!("b{}", i % 7),
                "overall": (i % 5 + 1) as f64,
                "reviewText": format!("<p>Review {i}</p>")
            })
        })
        .collect()
}

fn sequential_root(leaves: &[Digest]) -> Digest {
    let mut layer = leaves.to_vec();
    while layer.len() > 1 {
        layer = layer
            .chunks(2)
            .map(|nodes| match nodes {
                [left, right] => Sha256Hasher::hash_pair(left, right),
                _ => Sha256Hasher::hash_single(&nodes[0]),
            })
            .collect();
    }
    layer[0]
}

#[test]
fn parallel_matches_sequential() {
    let canon = Canonicalizer::default();
    for count in [1usize, 2, 3, 1000, 4097] {
        let records = records(count);
        let parallel = canon.derive_leaves::<Sha256Hasher, _>(&records).unwrap();
        let sequential: Vec<Digest> = records
            .iter()
            .map(|r| canon.derive_leaf::<Sha256Hasher, _>(r).unwrap())
            .collect();
        assert_eq!(parallel, sequential);

        let (_, root) = build::<Sha256Hasher>(&parallel).unwrap();
        assert_eq!(root, sequential_root(&sequential));
        let tree = MerkleTree::new(parallel).unwrap();
        assert_eq!(tree.root(), root);
    }
}

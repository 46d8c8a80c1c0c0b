use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use merkle_audit::{generate_proof, Canonicalizer, Digest, MerkleHasher, MerkleTree, Sha256Hasher};
use serde_json::{json, Value};

fn make_leaves(count: usize) -> Vec<Digest> {
    (0..count)
        .map(|i| Sha256Hasher::hash((i as u64).to_le_bytes()))
        .collect()
}

fn make_records(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "reviewerID": format!("A{i:08}"),
                "asin": "b00005jnbq",
                "overall": (i % 5 + 1) as f64,
                "reviewText": format!("<p>Review   body number {i}</p>")
            })
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &size in &[1024usize, 16_384, 131_071] {
        let leaves = make_leaves(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &leaves, |b, leaves| {
            b.iter_batched(
                || leaves.clone(),
                |leaves| MerkleTree::new(leaves).unwrap(),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_leaves(c: &mut Criterion) {
    let canon = Canonicalizer::default();
    let records = make_records(10_000);
    let mut group = c.benchmark_group("derive_leaves");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("reviews", |b| {
        b.iter(|| canon.derive_leaves::<Sha256Hasher, _>(&records).unwrap());
    });
    group.finish();
}

fn bench_update_and_proof(c: &mut Criterion) {
    let size = 131_071;
    let leaves = make_leaves(size);
    let tree = MerkleTree::new(leaves.clone()).unwrap();
    let replacement = Sha256Hasher::hash("replacement");

    c.bench_function("update_path", |b| {
        b.iter(|| tree.update(size / 3, replacement).unwrap());
    });
    c.bench_function("update_full_fold", |b| {
        b.iter(|| merkle_audit::update::<Sha256Hasher>(&leaves, size / 3, replacement).unwrap());
    });
    c.bench_function("proof_from_layers", |b| {
        b.iter(|| tree.gen_proof(500).unwrap());
    });
    c.bench_function("proof_on_demand", |b| {
        b.iter(|| generate_proof::<Sha256Hasher>(&leaves, 500).unwrap());
    });
}

criterion_group!(benches, bench_build, bench_leaves, bench_update_and_proof);
criterion_main!(benches);

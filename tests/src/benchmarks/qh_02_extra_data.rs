//! # QH-02 Extra Data Benchmarks
//!
//! Encoding is dominated by RLP for the BFT families and by plain copies
//! for Clique; decoding cost grows linearly with the validator count.

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use qh_02_extra_data::{codec_for, ConsensusFamily};
use rand::Rng;
use shared_crypto::NodeKey;
use shared_types::Address;

const FAMILIES: [ConsensusFamily; 4] = [
    ConsensusFamily::Clique,
    ConsensusFamily::IbftLegacy,
    ConsensusFamily::Ibft2,
    ConsensusFamily::Qbft,
];

fn random_validators(count: usize) -> Vec<Address> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| Address::from(rng.gen::<[u8; 20]>()))
        .collect()
}

pub fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("qh-02-extra-data-encode");

    for count in [1usize, 4, 21, 100] {
        let validators = random_validators(count);
        group.throughput(Throughput::Elements(count as u64));
        for family in FAMILIES {
            let codec = codec_for(family);
            group.bench_with_input(
                BenchmarkId::new(family.as_str(), count),
                &validators,
                |b, validators| b.iter(|| black_box(codec.encode(black_box(validators)))),
            );
        }
    }
    group.finish();
}

pub fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("qh-02-extra-data-decode");
    let validators = random_validators(21);

    for family in FAMILIES {
        let codec = codec_for(family);
        let encoded = codec.encode(&validators);
        group.bench_function(family.as_str(), |b| {
            b.iter(|| black_box(codec.decode_validators(black_box(encoded.as_bytes())).is_ok()))
        });
    }
    group.finish();
}

pub fn bench_identity_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("qh-02-validator-identity");
    let keys: Vec<NodeKey> = (0..4).map(|_| NodeKey::generate()).collect();
    let identities: Vec<_> = keys.iter().map(NodeKey::identity).collect();
    let codec = codec_for(ConsensusFamily::Ibft2);

    group.bench_function("identity_from_node_key", |b| {
        b.iter(|| black_box(keys[0].identity()))
    });
    group.bench_function("encode_identities_4", |b| {
        b.iter(|| black_box(codec.encode_identities(black_box(&identities))))
    });
    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    bench_encode(c);
    bench_decode(c);
    bench_identity_derivation(c);
}

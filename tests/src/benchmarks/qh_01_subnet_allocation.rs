//! # QH-01 Subnet Allocation Benchmarks
//!
//! - `candidate_cidr`: pure, called once per allocation attempt
//! - Lease exhaustion: all 254 host addresses of a block, then the error path

use std::time::Duration;

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use qh_01_subnet_allocation::{candidate_cidr, AddressLease, CidrBlock, SubnetRange};

pub fn bench_candidate_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("qh-01-subnet-allocation");
    let range = SubnetRange::default();

    group.bench_function("candidate_cidr", |b| {
        let mut sequence = 0u32;
        b.iter(|| {
            sequence = sequence.wrapping_add(1);
            black_box(candidate_cidr(range, black_box(sequence)))
        })
    });
    group.finish();
}

pub fn bench_address_leasing(c: &mut Criterion) {
    let mut group = c.benchmark_group("qh-01-address-lease");
    group.measurement_time(Duration::from_secs(5));
    let block = CidrBlock::new(172, 29, 7);

    for members in [4usize, 32, 254] {
        group.throughput(Throughput::Elements(members as u64));
        group.bench_with_input(BenchmarkId::new("lease", members), &members, |b, &n| {
            b.iter(|| {
                let lease = AddressLease::new(block);
                for _ in 0..n {
                    black_box(lease.lease_address().ok());
                }
                lease
            })
        });
    }

    group.bench_function("exhausted_lease", |b| {
        let lease = AddressLease::new(block);
        while lease.lease_address().is_ok() {}
        b.iter(|| black_box(lease.lease_address().is_err()))
    });
    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    bench_candidate_sequence(c);
    bench_address_leasing(c);
}

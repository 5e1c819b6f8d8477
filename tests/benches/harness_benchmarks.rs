//! # Quorum-Harness Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | `qh-01-subnet-allocation` | candidate selection, full-lease exhaustion |
//! | `qh-02-extra-data` | encode / decode per family and validator count |

use criterion::{criterion_group, criterion_main, Criterion};
use qh_tests::benchmarks::{qh_01_subnet_allocation, qh_02_extra_data};

fn subnet_allocation(c: &mut Criterion) {
    qh_01_subnet_allocation::register_benchmarks(c);
}

fn extra_data(c: &mut Criterion) {
    qh_02_extra_data::register_benchmarks(c);
}

criterion_group!(benches, subnet_allocation, extra_data);
criterion_main!(benches);

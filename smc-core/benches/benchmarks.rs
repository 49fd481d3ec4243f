use criterion::{black_box, criterion_group, criterion_main, Criterion};

use smc_core::{smc_msig, smc_txn_settlement, Address, SuggestedParams};

fn addr(n: u8) -> Address {
    Address::from_digest([n; 32])
}

fn bench_msig_derivation(c: &mut Criterion) {
    c.bench_function("smc_msig", |b| {
        b.iter(|| {
            smc_msig(
                black_box(addr(1)),
                black_box(addr(2)),
                black_box(1024),
                black_box(2150),
                black_box(2200),
            )
        })
    });
}

fn bench_settlement_txn(c: &mut Criterion) {
    let msig = smc_msig(addr(1), addr(2), 1024, 2150, 2200);
    let sp = SuggestedParams {
        first_valid: 100,
        last_valid: 3000,
        min_fee: 1000,
    };
    c.bench_function("smc_txn_settlement", |b| {
        b.iter(|| {
            smc_txn_settlement(
                black_box(msig.address),
                black_box(addr(1)),
                black_box(addr(2)),
                black_box(2_000_000),
                black_box(2150),
                black_box(sp),
            )
        })
    });
}

criterion_group!(benches, bench_msig_derivation, bench_settlement_txn);
criterion_main!(benches);

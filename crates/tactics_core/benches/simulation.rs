//! Simulation benchmarks for tactics_core.
//!
//! Run with: `cargo bench -p tactics_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tactics_core::combat::{self, CombatRules};
use tactics_core::hex::{HexCoord, HexDirection};
use tactics_test_utils::fixtures::{board_with, guard, raider, skirmish, SpawnExt};

/// Resolution of one flanked backstab, the most expensive attack shape.
pub fn combat_benchmark(c: &mut Criterion) {
    let (board, ids) = board_with(
        10,
        10,
        vec![
            guard(4, 4),
            raider(4, 5).facing(HexDirection::North),
            raider(5, 4),
            raider(3, 4),
        ],
    );
    let rules = CombatRules::default();

    c.bench_function("resolve_flanked_backstab", |b| {
        b.iter(|| combat::resolve(black_box(&board), ids[0], ids[1], &rules))
    });

    let origin = HexCoord::new(4, 4);
    c.bench_function("adjacent_coordinates", |b| {
        b.iter(|| black_box(origin).adjacent_coordinates())
    });
}

/// Tick throughput of a self-playing skirmish.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("skirmish_200_ticks", |b| {
        b.iter_batched(
            || skirmish(7),
            |mut sim| {
                for _ in 0..200 {
                    black_box(sim.tick());
                }
                sim.state_hash()
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, combat_benchmark, simulation_benchmark);
criterion_main!(benches);

//! Criterion benchmarks for the hydrology pipeline.
//!
//! Benchmarks:
//!   - flow directions on a 256x256 noise terrain
//!   - full run with stochastic sources
//!   - full run with rainfall accumulation sources
//!
//! Run with: cargo bench --bench hydrology_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use river_generator::hydrology::{self, flow, HydrologyParams, SourceStrategy};
use river_generator::terrain::{self, TerrainParams};
use river_generator::tilemap::EdgeMode;

const SIZE: usize = 256;
const SEED: u64 = 42;

fn bench_flow_direction(c: &mut Criterion) {
    let heightmap = terrain::generate_heightmap(SIZE, SIZE, SEED, &TerrainParams::default());

    c.bench_function("flow_direction_256", |b| {
        b.iter(|| black_box(flow::compute_flow_direction(black_box(&heightmap), EdgeMode::Wrap)));
    });
}

fn bench_full_run(c: &mut Criterion) {
    let heightmap = terrain::generate_heightmap(SIZE, SIZE, SEED, &TerrainParams::default());
    let rain = terrain::generate_rain_map(SIZE, SIZE, SEED, 1.0);
    let params = HydrologyParams::default();

    let mut group = c.benchmark_group("hydrology_256");
    group.sample_size(10);

    group.bench_function("stochastic", |b| {
        b.iter(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(SEED);
            let strategy = SourceStrategy::Stochastic;
            black_box(hydrology::simulate_hydrology(&heightmap, strategy, &params, &mut rng))
        });
    });

    group.bench_function("accumulation", |b| {
        b.iter(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(SEED);
            let strategy = SourceStrategy::Accumulation(&rain);
            black_box(hydrology::simulate_hydrology(&heightmap, strategy, &params, &mut rng))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_flow_direction, bench_full_run);
criterion_main!(benches);

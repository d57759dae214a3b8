//! Profiling tool to find where a hydrology run spends its time

use std::error::Error;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use river_generator::hydrology::{self, HydrologyParams, Milestone, SourceStrategy};
use river_generator::terrain::{self, TerrainParams};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let width = 512;
    let height = 512;
    let seed = 1337u64;

    println!("=== Hydrology Profiling ===");
    println!("Map size: {}x{} ({} cells)", width, height, width * height);
    println!();

    let start = Instant::now();
    let heightmap = terrain::generate_heightmap(width, height, seed, &TerrainParams::default());
    let rain = terrain::generate_rain_map(width, height, seed, 1.0);
    println!("Terrain generation: {:?}", start.elapsed());

    let params = HydrologyParams::default();
    let runs = [
        ("stochastic", SourceStrategy::Stochastic),
        ("accumulation", SourceStrategy::Accumulation(&rain)),
    ];

    for (name, strategy) in runs {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut timings: Vec<(Milestone, Duration)> = Vec::with_capacity(5);
        let mut last = Instant::now();
        let start = last;

        let on_milestone = |m| {
            let now = Instant::now();
            timings.push((m, now - last));
            last = now;
        };
        let result = hydrology::simulate_hydrology_with_progress(
            &heightmap,
            strategy,
            &params,
            &mut rng,
            on_milestone,
        )?;
        let total = start.elapsed();

        println!("\n=== {} sources ===", name);
        for (milestone, time) in &timings {
            println!(
                "{:<16} {:>8.2}% ({:?})",
                format!("{:?}:", milestone),
                100.0 * time.as_secs_f64() / total.as_secs_f64(),
                time
            );
        }
        println!("─────────────────────────────────");
        println!("Total:           {:?}", total);
        println!(
            "Rivers: {}, lakes: {}, fallback searches: {}",
            result.stats.rivers, result.stats.lakes, result.stats.fallback_searches
        );
    }

    Ok(())
}

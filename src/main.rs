use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use river_generator::hydrology::{
    self, lakes, HydrologyParams, HydrologyStats, River, SourceStrategy,
};
use river_generator::terrain::{self, TerrainParams};
use river_generator::tilemap::{Coord, EdgeMode};

#[derive(Parser, Debug)]
#[command(name = "river_generator")]
#[command(about = "Generate rivers, lakes and eroded valleys on procedural terrain")]
struct Args {
    /// Width of the tilemap in cells
    #[arg(short = 'W', long, default_value = "256")]
    width: usize,

    /// Height of the tilemap in cells
    #[arg(short = 'H', long, default_value = "256")]
    height: usize,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Treat map edges as walls instead of wrapping around
    #[arg(long)]
    clamp: bool,

    /// Find sources by rainfall accumulation over a generated rain map
    #[arg(long)]
    rain: bool,

    /// Peak rainfall per cell for the generated rain map
    #[arg(long, default_value = "1.0")]
    rain_scale: f32,

    /// Load hydrology parameters from a JSON file
    #[arg(long)]
    config: Option<String>,

    /// Flood each lake seed outward over ground up to this much above it
    #[arg(long, num_args = 0..=1, default_missing_value = "0.01")]
    flood_lakes: Option<f32>,

    /// Write rivers, lakes and statistics to a JSON file
    #[arg(long)]
    summary: Option<String>,
}

#[derive(Serialize)]
struct Summary<'a> {
    seed: u64,
    width: usize,
    height: usize,
    rivers: &'a [River],
    lakes: &'a [Coord],
    stats: &'a HydrologyStats,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(|| rand::random());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    println!("Generating rivers with seed: {}", seed);
    println!("Map size: {}x{}", args.width, args.height);

    let mut params = match &args.config {
        Some(path) => HydrologyParams::from_json_file(path)?,
        None => HydrologyParams::default(),
    };
    if args.clamp {
        params.edge_mode = EdgeMode::Clamp;
    }

    println!("Generating heightmap...");
    let heightmap = terrain::generate_heightmap(args.width, args.height, seed, &TerrainParams::default());
    let above_sea = heightmap.iter().filter(|&(_, _, &h)| h > params.sea_level).count();
    println!(
        "{:.1}% of the map above sea level",
        100.0 * above_sea as f64 / (args.width * args.height).max(1) as f64
    );

    let rain_map = args
        .rain
        .then(|| terrain::generate_rain_map(args.width, args.height, seed, args.rain_scale));
    let strategy = match &rain_map {
        Some(rain) => SourceStrategy::Accumulation(rain),
        None => SourceStrategy::Stochastic,
    };

    println!("Simulating hydrology...");
    let report = |m: hydrology::Milestone| println!("  [{}/5] {:?}", m.index(), m);
    let mut result = hydrology::simulate_hydrology_with_progress(
        &heightmap,
        strategy,
        &params,
        &mut rng,
        report,
    )?;

    if let Some(margin) = args.flood_lakes {
        let mut flooded = 0;
        let mode = params.edge_mode;
        for &lake in &result.lakes {
            let level = result.heightmap[lake] + margin;
            let map = &mut result.lake_map;
            flooded += lakes::flood_fill(&result.heightmap, map, lake, level, mode);
        }
        println!("Flooded {} lake cells", flooded);
    }

    result.stats.print_summary();

    if let Some(path) = &args.summary {
        let summary = Summary {
            seed,
            width: args.width,
            height: args.height,
            rivers: &result.rivers,
            lakes: &result.lakes,
            stats: &result.stats,
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &summary)?;
        println!("Wrote summary to {}", path);
    }

    Ok(())
}

//! Hydrology simulation module
//!
//! Turns a bare elevation grid into rivers, lakes and eroded valleys:
//! - **Flow field**: steepest-descent direction per cell, from the untouched terrain
//! - **Sources**: stochastic per-tile sampling or rainfall accumulation
//! - **Tracing**: source-to-sea walks that merge into earlier rivers
//! - **Erosion**: monotonic bed clean-up, noisy bed carving, valley shaping
//! - **Lakes**: rivers that cannot reach the sea leave a lake seed

pub mod erosion;
pub mod flow;
pub mod lakes;
pub mod params;
pub mod rivers;
pub mod sources;
pub mod trace;

pub use flow::{Direction, FlowDirectionGrid};
pub use params::{ElevationBand, HydrologyParams, TileSize};
pub use rivers::{River, RiverIndex, Terminus};
pub use sources::SourceStrategy;

use log::{debug, info};
use rand::Rng;
use serde::Serialize;

use crate::error::HydrologyError;
use crate::tilemap::{Coord, Tilemap};

/// Coarse progress points reported during a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Milestone {
    FlowComputed,
    SourcesFound,
    RiversTraced,
    ErosionApplied,
    LakesFinalized,
}

impl Milestone {
    pub const ALL: [Milestone; 5] = [
        Milestone::FlowComputed,
        Milestone::SourcesFound,
        Milestone::RiversTraced,
        Milestone::ErosionApplied,
        Milestone::LakesFinalized,
    ];

    /// 1-based position in the run
    pub fn index(self) -> usize {
        self as usize + 1
    }
}

/// Statistics from a hydrology run
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HydrologyStats {
    pub sources_found: usize,
    /// Rivers recorded (single-cell traces are dropped)
    pub rivers: usize,
    /// Rivers that joined an earlier one
    pub merges: usize,
    pub lakes: usize,
    /// Times local descent stalled and the lower-ground search ran
    pub fallback_searches: usize,
    /// Lower-ground targets found across a wrapped edge
    pub seam_crossings: usize,
    pub step_cap_hits: usize,
    /// Terrain lowered by clean-up and erosion, summed over all cells
    pub total_eroded: f64,
    /// Largest drop at any single cell
    pub max_erosion: f32,
}

impl HydrologyStats {
    pub fn print_summary(&self) {
        println!("\n========== HYDROLOGY ==========");
        println!("Sources found:        {}", self.sources_found);
        println!("Rivers:               {} ({} merged)", self.rivers, self.merges);
        println!("Lakes:                {}", self.lakes);
        println!("Fallback searches:    {}", self.fallback_searches);
        println!("Seam crossings:       {}", self.seam_crossings);
        if self.step_cap_hits > 0 {
            println!("Step cap hits:        {}", self.step_cap_hits);
        }
        println!("Total eroded:         {:.4}", self.total_eroded);
        println!("Max erosion:          {:.4}", self.max_erosion);
        println!("===============================\n");
    }
}

/// Everything a run produces. All grids share the input dimensions.
#[derive(Clone, Debug)]
pub struct HydrologyResult {
    /// Cumulative flow along each river cell, zero elsewhere
    pub river_map: Tilemap<f32>,
    /// Nominal depth at lake seeds, zero elsewhere
    pub lake_map: Tilemap<f32>,
    /// Original minus final elevation
    pub erosion_map: Tilemap<f32>,
    /// Final, eroded terrain
    pub heightmap: Tilemap<f32>,
    /// Flow accumulated while looking for sources (zero for stochastic runs)
    pub water_flow: Tilemap<f32>,
    pub flow_direction: FlowDirectionGrid,
    /// Rivers in tracing order
    pub rivers: Vec<River>,
    pub lakes: Vec<Coord>,
    pub stats: HydrologyStats,
}

/// Mutable state of one run. Created per run and dropped at the end.
pub struct HydrologyContext<'a> {
    pub params: &'a HydrologyParams,
    /// Terrain before any change
    pub original: Tilemap<f32>,
    /// Live terrain, lowered by clean-up and erosion
    pub heightmap: Tilemap<f32>,
    pub flow_direction: FlowDirectionGrid,
    pub water_flow: Tilemap<f32>,
    pub river_map: Tilemap<f32>,
    pub lake_map: Tilemap<f32>,
    pub rivers: Vec<River>,
    pub index: RiverIndex,
    pub lakes: Vec<Coord>,
    pub stats: HydrologyStats,
}

impl<'a> HydrologyContext<'a> {
    /// Validate inputs and set up empty output grids.
    pub fn new(
        heightmap: &Tilemap<f32>,
        params: &'a HydrologyParams,
    ) -> Result<Self, HydrologyError> {
        let (width, height) = heightmap.dimensions();
        if width == 0 || height == 0 {
            return Err(HydrologyError::EmptyGrid { width, height });
        }
        params.validate()?;

        Ok(Self {
            params,
            original: heightmap.clone(),
            heightmap: heightmap.clone(),
            flow_direction: FlowDirectionGrid::new(width, height),
            water_flow: Tilemap::new(width, height),
            river_map: Tilemap::new(width, height),
            lake_map: Tilemap::new(width, height),
            rivers: Vec::new(),
            index: RiverIndex::new(),
            lakes: Vec::new(),
            stats: HydrologyStats::default(),
        })
    }

    /// Flow directions from the untouched terrain. Run once, before anything
    /// lowers the heightmap.
    pub fn compute_flow(&mut self) {
        self.flow_direction = flow::compute_flow_direction(&self.original, self.params.edge_mode);
        let pits = self.flow_direction.iter().filter(|(_, _, dir)| dir.is_none()).count();
        info!("Flow directions computed ({} cells without outflow)", pits);
    }

    pub fn find_sources<R: Rng + ?Sized>(
        &mut self,
        strategy: SourceStrategy<'_>,
        rng: &mut R,
    ) -> Vec<Coord> {
        let sources = sources::find_sources(
            &self.original,
            strategy,
            &self.flow_direction,
            &mut self.water_flow,
            self.params,
            rng,
        );
        self.stats.sources_found = sources.len();
        info!("Found {} river sources", sources.len());
        sources
    }

    /// Trace each source in order, clean up its bed and record it. Rivers
    /// ending above sea level leave a lake seed, as does a source with no
    /// lower ground to flow to.
    pub fn trace_rivers(&mut self, sources: &[Coord]) {
        let sea_level = self.params.sea_level;

        for &source in sources {
            let mut river = trace::trace_river(
                &self.heightmap,
                &self.rivers,
                &self.index,
                source,
                self.params,
                &mut self.stats,
            );

            if river.len() < 2 {
                if river.terminus == Terminus::Lake && self.heightmap[source] > sea_level {
                    debug!("Source {} is a dead end, keeping it as a lake", source);
                    self.record_lake(source);
                } else {
                    debug!("Dropping single-cell river at {}", source);
                }
                continue;
            }

            erosion::clean_up_river(&mut self.heightmap, &river);

            let mouth = river.mouth();
            if self.heightmap[mouth] > sea_level {
                self.record_lake(mouth);
            } else if river.terminus == Terminus::Lake {
                river.terminus = Terminus::Sea;
            }

            let id = self.rivers.len();
            self.index.insert(id, &river);
            self.rivers.push(river);
        }

        self.stats.rivers = self.rivers.len();
        self.stats.lakes = self.lakes.len();
        info!(
            "Traced {} rivers, {} merged, {} lakes",
            self.rivers.len(),
            self.stats.merges,
            self.lakes.len()
        );
    }

    fn record_lake(&mut self, at: Coord) {
        if !self.lakes.contains(&at) {
            self.lakes.push(at);
        }
    }

    /// Carve every recorded river and write its flow into the river map.
    pub fn apply_erosion<R: Rng + ?Sized>(&mut self, rain: Option<&Tilemap<f32>>, rng: &mut R) {
        let default_rainfall = self.params.default_rainfall;
        let rainfall = |c: Coord| rain.map_or(default_rainfall, |r| r[c]);

        for river in &self.rivers {
            erosion::erode_river(&mut self.heightmap, river, self.params, rng);
            rivers::accumulate_river_flow(&mut self.river_map, river, &self.water_flow, rainfall);
        }

        info!("Eroded {} river beds", self.rivers.len());
    }

    pub fn finalize_lakes(&mut self) {
        lakes::mark_lakes(&mut self.lake_map, &self.lakes, self.params.lake_depth);
    }

    /// Diff the terrain and hand back the outputs.
    pub fn into_result(mut self) -> HydrologyResult {
        let erosion_map = self.original.difference(&self.heightmap);
        self.stats.total_eroded = erosion_map.sum();
        self.stats.max_erosion = erosion_map.min_max().1.max(0.0);

        HydrologyResult {
            river_map: self.river_map,
            lake_map: self.lake_map,
            erosion_map,
            heightmap: self.heightmap,
            water_flow: self.water_flow,
            flow_direction: self.flow_direction,
            rivers: self.rivers,
            lakes: self.lakes,
            stats: self.stats,
        }
    }
}

/// Run the whole simulation.
pub fn simulate_hydrology<R: Rng + ?Sized>(
    heightmap: &Tilemap<f32>,
    strategy: SourceStrategy<'_>,
    params: &HydrologyParams,
    rng: &mut R,
) -> Result<HydrologyResult, HydrologyError> {
    simulate_hydrology_with_progress(heightmap, strategy, params, rng, |_| {})
}

/// Run the whole simulation, calling `progress` after each milestone.
pub fn simulate_hydrology_with_progress<R: Rng + ?Sized>(
    heightmap: &Tilemap<f32>,
    strategy: SourceStrategy<'_>,
    params: &HydrologyParams,
    rng: &mut R,
    mut progress: impl FnMut(Milestone),
) -> Result<HydrologyResult, HydrologyError> {
    if let Some(rain) = strategy.rain_map() {
        if !rain.same_dimensions(heightmap) {
            return Err(HydrologyError::DimensionMismatch {
                expected: heightmap.dimensions(),
                found: rain.dimensions(),
            });
        }
    }

    let mut ctx = HydrologyContext::new(heightmap, params)?;

    ctx.compute_flow();
    progress(Milestone::FlowComputed);

    let sources = ctx.find_sources(strategy, rng);
    progress(Milestone::SourcesFound);

    ctx.trace_rivers(&sources);
    progress(Milestone::RiversTraced);

    ctx.apply_erosion(strategy.rain_map(), rng);
    progress(Milestone::ErosionApplied);

    ctx.finalize_lakes();
    progress(Milestone::LakesFinalized);

    Ok(ctx.into_result())
}

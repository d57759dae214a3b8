//! River source discovery.
//!
//! Two strategies: uniform sampling of hill-band cells per tile, or rainfall
//! accumulation along the flow field until a cell carries enough water.

use log::debug;
use rand::Rng;

use crate::hydrology::flow::{downstream, FlowDirectionGrid};
use crate::hydrology::params::HydrologyParams;
use crate::tilemap::{Coord, Tilemap};

/// How sources are chosen for a run.
#[derive(Clone, Copy, Debug)]
pub enum SourceStrategy<'a> {
    /// At most one random hill-band cell per tile
    Stochastic,
    /// Follow the flow field with this rain map until flow crosses the threshold
    Accumulation(&'a Tilemap<f32>),
}

impl<'a> SourceStrategy<'a> {
    pub fn rain_map(&self) -> Option<&'a Tilemap<f32>> {
        match *self {
            SourceStrategy::Stochastic => None,
            SourceStrategy::Accumulation(rain) => Some(rain),
        }
    }
}

/// Pick one random cell inside `params.source_band` from each tile.
///
/// Tiles start at multiples of the tile size; a tile that runs past the grid
/// edge wraps around in wrap mode and is cut short in clamp mode. A tile
/// larger than the grid covers it exactly once along that axis.
pub fn find_stochastic_sources<R: Rng + ?Sized>(
    heightmap: &Tilemap<f32>,
    params: &HydrologyParams,
    rng: &mut R,
) -> Vec<Coord> {
    let tile = params.source_tile.resolve(heightmap.height).max(1);
    let tile_w = tile.min(heightmap.width.max(1));
    let tile_h = tile.min(heightmap.height.max(1));
    let mode = params.edge_mode;
    let mut sources = Vec::new();
    let mut candidates = Vec::with_capacity(tile_w * tile_h);

    for ty in (0..heightmap.height).step_by(tile_h) {
        for tx in (0..heightmap.width).step_by(tile_w) {
            candidates.clear();

            for y in ty..ty + tile_h {
                for x in tx..tx + tile_w {
                    let Some(c) = heightmap.resolve(x as i64, y as i64, mode) else {
                        continue;
                    };
                    if params.source_band.contains(heightmap[c]) {
                        candidates.push(c);
                    }
                }
            }

            if !candidates.is_empty() {
                sources.push(candidates[rng.gen_range(0..candidates.len())]);
            }
        }
    }

    sources
}

/// Route each cell's rainfall down the flow field and seed sources where the
/// accumulated flow first reaches `params.flow_threshold` inside the
/// accumulation band.
///
/// `water_flow` is reset and filled as a side product. A seed within
/// `params.source_exclusion_radius` of an earlier one ends that origin's walk
/// without a source.
pub fn find_accumulation_sources(
    heightmap: &Tilemap<f32>,
    rain: &Tilemap<f32>,
    flow_dir: &FlowDirectionGrid,
    water_flow: &mut Tilemap<f32>,
    params: &HydrologyParams,
) -> Vec<Coord> {
    let mode = params.edge_mode;
    let exclusion_sq = (params.source_exclusion_radius as i64).pow(2);
    let max_steps = params.max_steps_for(heightmap.width, heightmap.height);
    let mut sources: Vec<Coord> = Vec::new();

    water_flow.fill(0.0);

    for origin in heightmap.coords() {
        let rainfall = rain[origin];
        water_flow[origin] = rainfall;

        if flow_dir[origin].is_none() {
            continue;
        }

        let mut current = origin;
        for _ in 0..max_steps {
            if params.accumulation_band.contains(heightmap[current])
                && water_flow[current] >= params.flow_threshold
            {
                let crowded = sources
                    .iter()
                    .any(|&s| heightmap.distance_sq(current, s, mode) <= exclusion_sq);
                if crowded {
                    debug!("Rejected seed at {} next to an existing source", current);
                } else {
                    sources.push(current);
                }
                break;
            }

            let Some(next) = downstream(flow_dir, current, mode) else {
                break;
            };
            water_flow[next] += rainfall;
            current = next;
        }
    }

    sources
}

/// Run the chosen strategy.
pub fn find_sources<R: Rng + ?Sized>(
    heightmap: &Tilemap<f32>,
    strategy: SourceStrategy<'_>,
    flow_dir: &FlowDirectionGrid,
    water_flow: &mut Tilemap<f32>,
    params: &HydrologyParams,
    rng: &mut R,
) -> Vec<Coord> {
    match strategy {
        SourceStrategy::Stochastic => find_stochastic_sources(heightmap, params, rng),
        SourceStrategy::Accumulation(rain) => {
            find_accumulation_sources(heightmap, rain, flow_dir, water_flow, params)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrology::flow::compute_flow_direction;
    use crate::hydrology::params::TileSize;
    use crate::tilemap::EdgeMode;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Falls from 0.8 at x=0 to 0.47 at the last column: all inside the
    /// accumulation band, everything draining east.
    fn gentle_ramp(width: usize, height: usize) -> Tilemap<f32> {
        let mut heightmap = Tilemap::new_with(width, height, 0.0f32);
        for y in 0..height {
            for x in 0..width {
                heightmap.set(x, y, 0.8 - 0.33 * x as f32 / (width - 1) as f32);
            }
        }
        heightmap
    }

    #[test]
    fn test_stochastic_one_source_per_tile() {
        let heightmap = Tilemap::new_with(64, 64, 0.7f32);
        let params = HydrologyParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let sources = find_stochastic_sources(&heightmap, &params, &mut rng);

        assert_eq!(sources.len(), 4);
        let mut tiles: Vec<(usize, usize)> = sources.iter().map(|c| (c.x / 32, c.y / 32)).collect();
        tiles.sort();
        assert_eq!(tiles, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_stochastic_skips_tiles_outside_band() {
        let mut heightmap = Tilemap::new_with(64, 32, 0.2f32);
        heightmap.set(40, 10, 0.7);
        let params = HydrologyParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let sources = find_stochastic_sources(&heightmap, &params, &mut rng);

        assert_eq!(sources, vec![Coord::new(40, 10)]);
    }

    #[test]
    fn test_stochastic_partial_tile_wraps_or_clips() {
        // 40 wide: the second tile covers x 32..64, which wraps onto 0..24
        let mut heightmap = Tilemap::new_with(40, 32, 0.2f32);
        heightmap.set(5, 5, 0.7);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let wrapped = find_stochastic_sources(&heightmap, &HydrologyParams::default(), &mut rng);
        let clipped = find_stochastic_sources(&heightmap, &HydrologyParams::clamped(), &mut rng);

        assert_eq!(wrapped, vec![Coord::new(5, 5), Coord::new(5, 5)]);
        assert_eq!(clipped, vec![Coord::new(5, 5)]);
    }

    #[test]
    fn test_stochastic_oversized_tile_covers_grid_once() {
        let mut heightmap = Tilemap::new_with(16, 12, 0.2f32);
        heightmap.set(3, 7, 0.7);
        heightmap.set(12, 2, 0.7);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for base in [HydrologyParams::default(), HydrologyParams::clamped()] {
            let params = HydrologyParams {
                source_tile: TileSize::Fixed(200_000),
                ..base
            };
            let sources = find_stochastic_sources(&heightmap, &params, &mut rng);

            assert_eq!(sources.len(), 1);
            assert!(sources[0] == Coord::new(3, 7) || sources[0] == Coord::new(12, 2));
        }
    }

    #[test]
    fn test_stochastic_is_seed_reproducible() {
        let heightmap = gentle_ramp(64, 64);
        let params = HydrologyParams {
            source_tile: TileSize::Fixed(16),
            ..Default::default()
        };
        let a = find_stochastic_sources(&heightmap, &params, &mut ChaCha8Rng::seed_from_u64(9));
        let b = find_stochastic_sources(&heightmap, &params, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
        assert!(a.iter().all(|&c| params.source_band.contains(heightmap[c])));
    }

    #[test]
    fn test_accumulation_low_rain_finds_nothing() {
        let heightmap = gentle_ramp(32, 8);
        let params = HydrologyParams::clamped();
        let flow_dir = compute_flow_direction(&heightmap, params.edge_mode);
        let rain = Tilemap::new_with(32, 8, 0.001f32);
        let mut water_flow = Tilemap::new(32, 8);

        let sources =
            find_accumulation_sources(&heightmap, &rain, &flow_dir, &mut water_flow, &params);

        assert!(sources.is_empty());
        assert!(water_flow.iter().all(|(_, _, &v)| v < params.flow_threshold));
    }

    #[test]
    fn test_accumulation_seeds_respect_exclusion_radius() {
        let heightmap = gentle_ramp(64, 40);
        let params = HydrologyParams::clamped();
        let flow_dir = compute_flow_direction(&heightmap, params.edge_mode);
        let rain = Tilemap::new_with(64, 40, 1.0f32);
        let mut water_flow = Tilemap::new(64, 40);

        let sources =
            find_accumulation_sources(&heightmap, &rain, &flow_dir, &mut water_flow, &params);

        assert!(!sources.is_empty());
        let r_sq = (params.source_exclusion_radius as i64).pow(2);
        for (i, &a) in sources.iter().enumerate() {
            assert!(params.accumulation_band.contains(heightmap[a]));
            for &b in &sources[i + 1..] {
                let d_sq = heightmap.distance_sq(a, b, EdgeMode::Clamp);
                assert!(d_sq > r_sq, "{a} and {b} too close");
            }
        }
    }

    #[test]
    fn test_accumulation_first_seed_on_ramp() {
        // Row 0 drains east. Origin k resets its own cell to 1 and lifts every
        // cell past it to k + 1, so origin 9 is the first to push x=10 to 10.
        let heightmap = gentle_ramp(32, 1);
        let params = HydrologyParams::clamped();
        let flow_dir = compute_flow_direction(&heightmap, params.edge_mode);
        let rain = Tilemap::new_with(32, 1, 1.0f32);
        let mut water_flow = Tilemap::new(32, 1);

        let sources =
            find_accumulation_sources(&heightmap, &rain, &flow_dir, &mut water_flow, &params);

        assert_eq!(sources.first(), Some(&Coord::new(10, 0)));
    }

    #[test]
    fn test_strategy_exposes_rain_map() {
        let rain = Tilemap::new_with(2, 2, 1.0f32);
        assert!(SourceStrategy::Stochastic.rain_map().is_none());
        assert_eq!(SourceStrategy::Accumulation(&rain).rain_map().map(|r| r.width), Some(2));
    }
}

//! Source-to-terminus river tracing.
//!
//! Per step: join a neighboring river if one is adjacent, stop at the sea,
//! otherwise take the steepest 4-connected descent. When no neighbor is lower
//! the tracer looks for lower ground in growing circles and walks there with
//! a bounded A* search that penalises climbing. Nothing lower within reach
//! makes the current cell a lake.

use log::{debug, warn};
use pathfinding::prelude::astar;

use crate::hydrology::flow::steepest_descent;
use crate::hydrology::params::HydrologyParams;
use crate::hydrology::rivers::{River, RiverIndex, Terminus};
use crate::hydrology::HydrologyStats;
use crate::tilemap::{in_circle, Coord, EdgeMode, Tilemap};

/// Cost of one step on level or descending ground
const STEP_COST: u32 = 1;

/// Extra cost per unit of elevation climbed
const CLIMB_COST_SCALE: f32 = 10_000.0;

/// A cell lower than the search origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LowerTarget {
    pub coord: Coord,
    /// Search radius at which it was found
    pub radius: usize,
    /// Reached by stepping past a grid edge (wrap mode only)
    pub crosses_seam: bool,
}

/// Trace one river from `source` against the current heightmap.
///
/// `rivers` and `index` describe the rivers recorded so far; the new river is
/// not part of either.
pub fn trace_river(
    heightmap: &Tilemap<f32>,
    rivers: &[River],
    index: &RiverIndex,
    source: Coord,
    params: &HydrologyParams,
    stats: &mut HydrologyStats,
) -> River {
    let mode = params.edge_mode;
    let max_steps = params.max_steps_for(heightmap.width, heightmap.height);
    let mut path = vec![source];
    let mut current = source;

    loop {
        if let Some((river_id, pos)) = merge_target(heightmap, index, current, mode) {
            let at = path.len();
            path.extend_from_slice(&rivers[river_id].path[pos..]);
            stats.merges += 1;
            return River {
                path,
                terminus: Terminus::Merge { river: river_id, at },
            };
        }

        if heightmap[current] <= params.sea_level {
            return River { path, terminus: Terminus::Sea };
        }

        if path.len() >= max_steps {
            warn!("River from {} hit the {} step cap at {}", source, max_steps, current);
            stats.step_cap_hits += 1;
            return River { path, terminus: Terminus::Lake };
        }

        if let Some((_, next)) = steepest_descent(heightmap, current, mode) {
            path.push(next);
            current = next;
            continue;
        }

        let Some(target) =
            find_lower_elevation(heightmap, current, params.lower_search_radius, mode)
        else {
            debug!("River from {} dead-ends at {}", source, current);
            return River { path, terminus: Terminus::Lake };
        };

        stats.fallback_searches += 1;
        if target.crosses_seam {
            stats.seam_crossings += 1;
            debug!("Lower ground for {} found across the map edge at {}", current, target.coord);
        }

        let radius = params.lower_search_radius;
        match find_descent_path(heightmap, current, target.coord, radius, mode) {
            Some(route) => {
                path.extend(route.into_iter().skip(1));
                current = path[path.len() - 1];
            }
            None => {
                debug!("No route from {} to lower ground at {}", current, target.coord);
                return River { path, terminus: Terminus::Lake };
            }
        }
    }
}

/// First 8-connected neighbor of `c` that already belongs to a recorded river.
fn merge_target(
    heightmap: &Tilemap<f32>,
    index: &RiverIndex,
    c: Coord,
    mode: EdgeMode,
) -> Option<(usize, usize)> {
    if index.is_empty() {
        return None;
    }
    heightmap.neighbors_8(c, mode).find_map(|n| index.owner(n))
}

/// Search circles of radius 1..=`max_radius` around `from` for the lowest cell
/// below it. Stops at the first radius that yields anything.
pub fn find_lower_elevation(
    heightmap: &Tilemap<f32>,
    from: Coord,
    max_radius: usize,
    mode: EdgeMode,
) -> Option<LowerTarget> {
    let (x, y) = (from.x as i64, from.y as i64);
    let mut lowest = heightmap[from];
    let mut found = None;

    for radius in 1..=max_radius as i64 {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let (rx, ry) = (x + dx, y + dy);
                if !in_circle(radius, x, y, rx, ry) {
                    continue;
                }
                let Some(c) = heightmap.resolve(rx, ry, mode) else {
                    continue;
                };

                let elevation = heightmap[c];
                if elevation < lowest {
                    lowest = elevation;
                    found = Some(LowerTarget {
                        coord: c,
                        radius: radius as usize,
                        crosses_seam: heightmap.is_out_of_bounds(rx, ry),
                    });
                }
            }
        }

        if found.is_some() {
            break;
        }
    }

    found
}

/// Cheapest 4-connected route from `start` to `goal`, where climbing costs far
/// more than walking. The search never strays more than `bound + 1` cells
/// (Chebyshev, wrap-aware) from `start`. Includes both endpoints.
pub fn find_descent_path(
    heightmap: &Tilemap<f32>,
    start: Coord,
    goal: Coord,
    bound: usize,
    mode: EdgeMode,
) -> Option<Vec<Coord>> {
    let window = bound as i64 + 1;

    let result = astar(
        &start,
        |&c| {
            let here = heightmap[c];
            heightmap
                .neighbors_4(c, mode)
                .filter(|&n| heightmap.chebyshev(start, n, mode) <= window)
                .map(|n| (n, step_cost(here, heightmap[n])))
                .collect::<Vec<_>>()
        },
        |&c| {
            let (dx, dy) = heightmap.wrapped_delta(c, goal, mode);
            (dx.unsigned_abs() + dy.unsigned_abs()) as u32 * STEP_COST
        },
        |&c| c == goal,
    );

    result.map(|(path, _cost)| path)
}

fn step_cost(from: f32, to: f32) -> u32 {
    let climb = (to - from).max(0.0);
    STEP_COST + (climb * CLIMB_COST_SCALE).round() as u32
}

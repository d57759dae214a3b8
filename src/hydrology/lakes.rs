//! Lake marking for rivers that never reach the sea.

use crate::tilemap::{in_circle, Coord, EdgeMode, Tilemap};

/// Mark each lake seed with a nominal depth.
pub fn mark_lakes(lake_map: &mut Tilemap<f32>, lakes: &[Coord], depth: f32) {
    for &lake in lakes {
        lake_map[lake] = depth;
    }
}

/// Flood every 4-connected cell at or below `level`, starting from `seed`,
/// and mark it with 1.0. Uses an explicit stack. Returns the number of cells
/// flooded.
pub fn flood_fill(
    heightmap: &Tilemap<f32>,
    lake_map: &mut Tilemap<f32>,
    seed: Coord,
    level: f32,
    mode: EdgeMode,
) -> usize {
    let mut visited = Tilemap::new_with(heightmap.width, heightmap.height, false);
    let mut stack = vec![seed];
    let mut flooded = 0;

    while let Some(c) = stack.pop() {
        if visited[c] {
            continue;
        }
        visited[c] = true;

        if heightmap[c] > level {
            continue;
        }

        lake_map[c] = 1.0;
        flooded += 1;

        for n in heightmap.neighbors_4(c, mode) {
            if !visited[n] {
                stack.push(n);
            }
        }
    }

    flooded
}

/// Nearest cell below sea level whose whole `(2 * sea_range + 1)²`
/// neighborhood is at or below sea level, searched in growing circles.
pub fn find_closest_sea(
    heightmap: &Tilemap<f32>,
    from: Coord,
    sea_level: f32,
    sea_range: usize,
    max_radius: usize,
    mode: EdgeMode,
) -> Option<Coord> {
    let (x, y) = (from.x as i64, from.y as i64);

    for radius in 1..=max_radius as i64 {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if !in_circle(radius, x, y, x + dx, y + dy) {
                    continue;
                }
                let Some(c) = heightmap.resolve(x + dx, y + dy, mode) else {
                    continue;
                };
                if heightmap[c] < sea_level && is_open_sea(heightmap, c, sea_level, sea_range, mode) {
                    return Some(c);
                }
            }
        }
    }

    None
}

fn is_open_sea(
    heightmap: &Tilemap<f32>,
    c: Coord,
    sea_level: f32,
    sea_range: usize,
    mode: EdgeMode,
) -> bool {
    let r = sea_range as i32;
    (-r..=r).all(|dy| {
        (-r..=r).all(|dx| match heightmap.offset(c, dx, dy, mode) {
            Some(n) => heightmap[n] <= sea_level,
            None => true,
        })
    })
}

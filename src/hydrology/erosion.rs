//! River bed clean-up, bed carving and valley shaping.
//!
//! All three passes only ever lower terrain.

use std::collections::HashSet;

use rand::Rng;

use crate::hydrology::params::HydrologyParams;
use crate::hydrology::rivers::River;
use crate::tilemap::{in_circle, Coord, Tilemap};

/// Force elevation to be non-increasing from source to terminus by lowering
/// every cell to the running minimum. Returns the total lowered.
pub fn clean_up_river(heightmap: &mut Tilemap<f32>, river: &River) -> f32 {
    let mut running_min = f32::MAX;
    let mut lowered = 0.0;

    for &c in &river.path {
        let elevation = heightmap[c];
        if elevation <= running_min {
            running_min = elevation;
        } else {
            lowered += elevation - running_min;
            heightmap[c] = running_min;
        }
    }

    lowered
}

/// Resample each bed cell just below the lowest elevation seen so far.
///
/// The running maximum starts at 1.0 and never rises, so the bed descends
/// with a little noise and a second pass can only tighten it.
pub fn carve_river_bed<R: Rng + ?Sized>(
    heightmap: &mut Tilemap<f32>,
    river: &River,
    floor_ratio: f32,
    rng: &mut R,
) {
    let mut max_elevation = 1.0f32;

    for &c in &river.path {
        max_elevation = max_elevation.min(heightmap[c]);
        let floor = max_elevation * floor_ratio;
        let (low, high) = if floor <= max_elevation { (floor, max_elevation) } else { (max_elevation, floor) };
        let sampled = rng.gen_range(low..=high).min(max_elevation);
        heightmap[c] = sampled;
        max_elevation = sampled;
    }
}

/// Pull terrain around the river partway down toward the bed.
///
/// Only cells inside the inscribed circle of radius `params.valley_radius`
/// that are higher than the bed and not part of the river move. The pull is
/// `valley_near_blend` at Chebyshev distance 1, `valley_far_blend` at 2, and
/// total beyond that. Nothing drops below the bed cell it was pulled toward.
pub fn shape_valley(heightmap: &mut Tilemap<f32>, river: &River, params: &HydrologyParams) {
    let mode = params.edge_mode;
    let radius = params.valley_radius as i64;
    let members: HashSet<Coord> = river.path.iter().copied().collect();

    for &bed in &river.path {
        let bed_elevation = heightmap[bed];
        let (bx, by) = (bed.x as i64, bed.y as i64);

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if !in_circle(radius, bx, by, bx + dx, by + dy) {
                    continue;
                }
                let Some(c) = heightmap.resolve(bx + dx, by + dy, mode) else {
                    continue;
                };
                if members.contains(&c) {
                    continue;
                }

                let elevation = heightmap[c];
                if elevation <= bed_elevation {
                    continue;
                }

                let blend = match dx.abs().max(dy.abs()) {
                    1 => params.valley_near_blend,
                    2 => params.valley_far_blend,
                    _ => 1.0,
                };
                let pulled = elevation - (elevation - bed_elevation) * blend;
                heightmap[c] = pulled.max(bed_elevation);
            }
        }
    }
}

/// Carve the bed, then shape the valley around it.
pub fn erode_river<R: Rng + ?Sized>(
    heightmap: &mut Tilemap<f32>,
    river: &River,
    params: &HydrologyParams,
    rng: &mut R,
) {
    carve_river_bed(heightmap, river, params.bed_floor_ratio, rng);
    shape_valley(heightmap, river, params);
}

/// True if elevation never rises along the river
pub fn is_monotonic(heightmap: &Tilemap<f32>, river: &River) -> bool {
    river.path.windows(2).all(|pair| heightmap[pair[0]] >= heightmap[pair[1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrology::rivers::Terminus;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn row_river(y: usize, xs: std::ops::Range<usize>) -> River {
        River {
            path: xs.map(|x| Coord::new(x, y)).collect(),
            terminus: Terminus::Sea,
        }
    }

    #[test]
    fn test_clean_up_removes_bumps() {
        let mut heightmap = Tilemap::new_with(6, 1, 0.0f32);
        for (x, h) in [0.8, 0.6, 0.7, 0.5, 0.65, 0.3].into_iter().enumerate() {
            heightmap.set(x, 0, h);
        }
        let river = row_river(0, 0..6);

        let lowered = clean_up_river(&mut heightmap, &river);

        let values: Vec<f32> = (0..6).map(|x| *heightmap.get(x, 0)).collect();
        assert_eq!(values, vec![0.8, 0.6, 0.6, 0.5, 0.5, 0.3]);
        assert!((lowered - 0.25).abs() < 1e-6);
        assert!(is_monotonic(&heightmap, &river));
    }

    #[test]
    fn test_bed_carving_descends_within_one_percent() {
        let mut heightmap = Tilemap::new_with(8, 1, 0.0f32);
        for x in 0..8 {
            heightmap.set(x, 0, 0.9 - x as f32 * 0.1);
        }
        let original = heightmap.clone();
        let river = row_river(0, 0..8);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        carve_river_bed(&mut heightmap, &river, 0.99, &mut rng);

        for x in 0..8 {
            let before = *original.get(x, 0);
            let after = *heightmap.get(x, 0);
            assert!(after <= before);
            assert!(after >= before * 0.99 - 1e-6);
        }
        assert!(is_monotonic(&heightmap, &river));
    }

    #[test]
    fn test_second_erosion_pass_never_raises() {
        let mut heightmap = Tilemap::new_with(10, 7, 0.0f32);
        for y in 0..7 {
            for x in 0..10 {
                heightmap.set(x, y, 0.95 - x as f32 * 0.07 + (y as f32 - 3.0).abs() * 0.01);
            }
        }
        let river = row_river(3, 0..10);
        let params = HydrologyParams::clamped();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        clean_up_river(&mut heightmap, &river);
        erode_river(&mut heightmap, &river, &params, &mut rng);
        let first = heightmap.clone();
        erode_river(&mut heightmap, &river, &params, &mut rng);

        for c in heightmap.coords() {
            assert!(heightmap[c] <= first[c], "{c} rose from {} to {}", first[c], heightmap[c]);
        }
    }

    #[test]
    fn test_valley_pull_factors() {
        let mut heightmap = Tilemap::new_with(5, 5, 1.0f32);
        let river = River {
            path: vec![Coord::new(2, 2)],
            terminus: Terminus::Lake,
        };
        heightmap.set(2, 2, 0.5);
        let params = HydrologyParams::clamped();

        shape_valley(&mut heightmap, &river, &params);

        // distance 1: 1.0 - 0.5 * 0.2
        assert!((*heightmap.get(2, 1) - 0.9).abs() < 1e-6);
        assert!((*heightmap.get(1, 1) - 0.9).abs() < 1e-6);
        // distance 2 on the axis: 1.0 - 0.5 * 0.05
        assert!((*heightmap.get(2, 0) - 0.975).abs() < 1e-6);
        // corner (2, 2) away is outside the circle
        assert_eq!(*heightmap.get(0, 0), 1.0);
        assert_eq!(*heightmap.get(1, 0), 1.0);
        assert_eq!(*heightmap.get(2, 2), 0.5);
    }

    #[test]
    fn test_valley_skips_lower_ground_and_river_cells() {
        let mut heightmap = Tilemap::new_with(5, 3, 1.0f32);
        heightmap.set(1, 1, 0.6);
        heightmap.set(2, 1, 0.5);
        heightmap.set(2, 0, 0.3);
        let river = River {
            path: vec![Coord::new(1, 1), Coord::new(2, 1)],
            terminus: Terminus::Lake,
        };
        let params = HydrologyParams::clamped();

        shape_valley(&mut heightmap, &river, &params);

        assert_eq!(*heightmap.get(2, 0), 0.3);
        assert_eq!(*heightmap.get(1, 1), 0.6);
        assert_eq!(*heightmap.get(2, 1), 0.5);
        assert!(heightmap.coords().all(|c| heightmap[c] >= 0.3));
    }
}

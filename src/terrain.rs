use noise::{NoiseFn, Perlin, Seedable};

use crate::tilemap::Tilemap;

// =============================================================================
// TERRAIN PARAMETERS
// =============================================================================

/// Parameters for noise terrain
#[derive(Clone, Debug)]
pub struct TerrainParams {
    /// Noise periods across the map width (higher = smaller features)
    pub feature_scale: f64,
    /// Number of noise octaves
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
    /// Domain warping strength
    pub warp_strength: f64,
    /// Share of ridged noise mixed into the base fBm (0.0-1.0)
    pub ridge_weight: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            feature_scale: 4.0,
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
            warp_strength: 0.15,
            ridge_weight: 0.3,
        }
    }
}

// =============================================================================
// GENERATION
// =============================================================================

/// Normalized [0, 1] heightmap built from warped fBm with a little ridged noise.
pub fn generate_heightmap(width: usize, height: usize, seed: u64, params: &TerrainParams) -> Tilemap<f32> {
    let terrain_noise = Perlin::new(1).set_seed(seed as u32);
    let warp_noise = Perlin::new(1).set_seed((seed as u32).wrapping_add(1111));
    let ridge_noise = Perlin::new(1).set_seed((seed as u32).wrapping_add(2222));

    let scale = params.feature_scale / width.max(1) as f64;
    let mut heightmap = Tilemap::new_with(width, height, 0.0f32);

    for y in 0..height {
        for x in 0..width {
            let nx = x as f64 * scale;
            let ny = y as f64 * scale;
            let (wx, wy) = domain_warp(nx, ny, &warp_noise, params.warp_strength);

            let base = fbm(&terrain_noise, wx, wy, params.octaves, params.persistence, params.lacunarity);
            let ridges = ridged(&ridge_noise, wx, wy, params.octaves.min(4));
            let h = base * (1.0 - params.ridge_weight) + ridges * params.ridge_weight;

            heightmap.set(x, y, h as f32);
        }
    }

    normalize(&mut heightmap);
    heightmap
}

/// Normalized [0, 1] precipitation, scaled by `intensity`.
pub fn generate_rain_map(width: usize, height: usize, seed: u64, intensity: f32) -> Tilemap<f32> {
    let rain_noise = Perlin::new(1).set_seed((seed as u32).wrapping_add(5555));
    let scale = 2.0 / width.max(1) as f64;
    let mut rain = Tilemap::new_with(width, height, 0.0f32);

    for y in 0..height {
        for x in 0..width {
            let r = fbm(&rain_noise, x as f64 * scale, y as f64 * scale, 4, 0.5, 2.0);
            rain.set(x, y, r as f32);
        }
    }

    normalize(&mut rain);
    for (_, _, r) in rain.iter_mut() {
        *r *= intensity;
    }
    rain
}

/// Stretch values to span [0, 1]. A constant map becomes all zero.
fn normalize(map: &mut Tilemap<f32>) {
    let (min_h, max_h) = map.min_max();
    let range = max_h - min_h;
    for (_, _, v) in map.iter_mut() {
        *v = if range > f32::EPSILON { (*v - min_h) / range } else { 0.0 };
    }
}

// =============================================================================
// NOISE FUNCTIONS
// =============================================================================

/// Fractional Brownian Motion - multi-octave noise
fn fbm(noise: &Perlin, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total / max_value
}

/// Ridged multi-octave noise in [0, 1]
fn ridged(noise: &Perlin, x: f64, y: f64, octaves: u32) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        let n = 1.0 - noise.get([x * frequency, y * frequency]).abs();
        total += amplitude * n * n;
        max_value += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    total / max_value
}

/// Domain warping - distort coordinates for organic shapes
fn domain_warp(x: f64, y: f64, noise: &Perlin, strength: f64) -> (f64, f64) {
    let warp_x = noise.get([x, y]);
    let warp_y = noise.get([x + 5.2, y + 1.3]);
    (x + warp_x * strength, y + warp_y * strength)
}

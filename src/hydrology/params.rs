//! Hydrology simulation parameters and configuration

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HydrologyError;
use crate::tilemap::EdgeMode;

// =============================================================================
// ELEVATION CONSTANTS (normalized 0.0-1.0)
// =============================================================================

pub const SEA_LEVEL: f32 = 0.333;
pub const ELEVATION_HILLS_LOW: f32 = 0.466;
pub const ELEVATION_HILLS: f32 = 0.633;
pub const ELEVATION_MOUNTAIN_LOW: f32 = 0.800;

/// Inclusive elevation range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElevationBand {
    pub min: f32,
    pub max: f32,
}

impl ElevationBand {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, elevation: f32) -> bool {
        elevation >= self.min && elevation <= self.max
    }
}

/// Edge length of the square tiles used by stochastic source placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileSize {
    Fixed(usize),
    /// floor(log2(height))², e.g. 81 for a 512-high map
    FromDimensions,
}

impl TileSize {
    pub fn resolve(&self, height: usize) -> usize {
        match *self {
            TileSize::Fixed(size) => size,
            TileSize::FromDimensions => {
                let log = (height.max(2) as f64).log2().floor() as usize;
                (log * log).max(1)
            }
        }
    }
}

impl Default for TileSize {
    fn default() -> Self {
        TileSize::Fixed(32)
    }
}

/// Parameters for a hydrology run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrologyParams {
    // =========================================================================
    // Terrain
    // =========================================================================

    /// Cells at or below this elevation are sea
    pub sea_level: f32,

    /// Toroidal or clamped grid edges
    pub edge_mode: EdgeMode,

    // =========================================================================
    // Source finding
    // =========================================================================

    /// Elevations eligible as sources in the stochastic strategy
    pub source_band: ElevationBand,

    /// Elevations eligible as sources in the accumulation strategy
    pub accumulation_band: ElevationBand,

    /// Tile edge for the stochastic strategy (one source per tile at most)
    pub source_tile: TileSize,

    /// Accumulated flow a cell needs to become a source
    pub flow_threshold: f32,

    /// Sources closer than this to an existing source are rejected
    pub source_exclusion_radius: usize,

    /// Rainfall assumed per cell when no rain map is given
    pub default_rainfall: f32,

    // =========================================================================
    // Tracing
    // =========================================================================

    /// Largest circle searched for lower ground when a river stalls
    pub lower_search_radius: usize,

    /// Step cap per river; `None` uses width * height
    pub max_trace_steps: Option<usize>,

    // =========================================================================
    // Erosion
    // =========================================================================

    /// Bed cells are resampled in [ratio * max, max]
    pub bed_floor_ratio: f32,

    /// Valley shaping radius in cells
    pub valley_radius: usize,

    /// Pull toward the bed for cells one step from the river
    pub valley_near_blend: f32,

    /// Pull toward the bed for cells two steps from the river
    pub valley_far_blend: f32,

    // =========================================================================
    // Lakes
    // =========================================================================

    /// Value written into the lake map at each lake seed
    pub lake_depth: f32,
}

impl Default for HydrologyParams {
    fn default() -> Self {
        Self {
            sea_level: SEA_LEVEL,
            edge_mode: EdgeMode::Wrap,

            source_band: ElevationBand::new(ELEVATION_HILLS, ELEVATION_MOUNTAIN_LOW),
            accumulation_band: ElevationBand::new(ELEVATION_HILLS_LOW, ELEVATION_MOUNTAIN_LOW),
            source_tile: TileSize::Fixed(32),
            flow_threshold: 10.0,
            source_exclusion_radius: 9,
            default_rainfall: 1.0,

            lower_search_radius: 40,
            max_trace_steps: None,

            bed_floor_ratio: 0.99,
            valley_radius: 2,
            valley_near_blend: 0.2,
            valley_far_blend: 0.05,

            lake_depth: 0.1,
        }
    }
}

impl HydrologyParams {
    /// Same as default but with hard map edges
    pub fn clamped() -> Self {
        Self {
            edge_mode: EdgeMode::Clamp,
            ..Default::default()
        }
    }

    /// Smaller tiles, lower flow threshold, tighter spacing
    pub fn dense_sources() -> Self {
        Self {
            source_tile: TileSize::Fixed(16),
            flow_threshold: 5.0,
            source_exclusion_radius: 5,
            ..Default::default()
        }
    }

    /// Load parameters from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, HydrologyError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| HydrologyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let params: Self = serde_json::from_str(&contents)?;
        params.validate()?;
        Ok(params)
    }

    pub fn max_steps_for(&self, width: usize, height: usize) -> usize {
        self.max_trace_steps.unwrap_or(width * height).max(1)
    }

    pub fn validate(&self) -> Result<(), HydrologyError> {
        let invalid = |msg: String| Err(HydrologyError::InvalidParams(msg));

        let finite = [
            ("sea_level", self.sea_level),
            ("flow_threshold", self.flow_threshold),
            ("default_rainfall", self.default_rainfall),
            ("bed_floor_ratio", self.bed_floor_ratio),
            ("valley_near_blend", self.valley_near_blend),
            ("valley_far_blend", self.valley_far_blend),
            ("lake_depth", self.lake_depth),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return invalid(format!("{name} must be finite, got {value}"));
            }
        }

        for (name, band) in [("source_band", self.source_band), ("accumulation_band", self.accumulation_band)] {
            if !band.min.is_finite() || !band.max.is_finite() || band.min > band.max {
                return invalid(format!("{name} is not a valid range: {:?}", band));
            }
        }

        if let TileSize::Fixed(0) = self.source_tile {
            return invalid("source_tile must be positive".into());
        }
        if self.lower_search_radius == 0 {
            return invalid("lower_search_radius must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.bed_floor_ratio) {
            return invalid(format!("bed_floor_ratio must be in [0, 1], got {}", self.bed_floor_ratio));
        }
        for (name, blend) in [("valley_near_blend", self.valley_near_blend), ("valley_far_blend", self.valley_far_blend)] {
            if !(0.0..=1.0).contains(&blend) {
                return invalid(format!("{name} must be in [0, 1], got {blend}"));
            }
        }
        if self.default_rainfall < 0.0 {
            return invalid("default_rainfall must not be negative".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(HydrologyParams::default().validate().is_ok());
        assert!(HydrologyParams::clamped().validate().is_ok());
        assert!(HydrologyParams::dense_sources().validate().is_ok());
    }

    #[test]
    fn test_inverted_band_rejected() {
        let params = HydrologyParams {
            source_band: ElevationBand::new(0.9, 0.5),
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(HydrologyError::InvalidParams(_))));
    }

    #[test]
    fn test_zero_tile_rejected() {
        let params = HydrologyParams {
            source_tile: TileSize::Fixed(0),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_tile_size_from_dimensions() {
        assert_eq!(TileSize::FromDimensions.resolve(512), 81);
        assert_eq!(TileSize::FromDimensions.resolve(256), 64);
        assert_eq!(TileSize::Fixed(32).resolve(1024), 32);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params: HydrologyParams =
            serde_json::from_str(r#"{ "sea_level": 0.2, "edge_mode": "clamp" }"#).unwrap();
        assert_eq!(params.sea_level, 0.2);
        assert_eq!(params.edge_mode, EdgeMode::Clamp);
        assert_eq!(params.flow_threshold, 10.0);
        assert_eq!(params.source_tile, TileSize::Fixed(32));
    }

    #[test]
    fn test_missing_config_file_is_read_error() {
        let result = HydrologyParams::from_json_file("/nonexistent/hydrology.json");
        assert!(matches!(result, Err(HydrologyError::Read { .. })));
    }
}

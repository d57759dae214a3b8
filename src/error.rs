//! Error types for hydrology runs and parameter loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Configuration failures. Degenerate terrain is never an error; those cases
/// end up as missing sources or lake termini.
#[derive(Debug, Error)]
pub enum HydrologyError {
    #[error("grid must have positive dimensions, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    #[error("grid dimensions differ: heightmap is {expected:?}, rain map is {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("grid data has {found} cells, expected {expected}")]
    DataLength { expected: usize, found: usize },

    #[error("invalid hydrology parameters: {0}")]
    InvalidParams(String),

    #[error("failed to parse hydrology config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read hydrology config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

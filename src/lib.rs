//! River and lake generation library
//!
//! Re-exports modules for use by binaries and tools.

pub mod error;
pub mod hydrology;
pub mod terrain;
pub mod tilemap;

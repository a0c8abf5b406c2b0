//! Terrain system for PARADROP.
//!
//! Local metric heightmaps with surface classification, and the
//! ray march used to answer "where does this trajectory meet the ground".

pub use paradrop_core as core;

pub mod grid;
pub mod raycast;

// Re-export key types for convenience.
pub use grid::{GridError, TerrainGrid, TerrainHeader};
pub use raycast::first_impact;

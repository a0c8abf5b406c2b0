//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Surface classification returned by the terrain oracle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceType {
    #[default]
    Land,
    Road,
    Runway,
    ShallowWater,
    Water,
}

impl SurfaceType {
    /// Whether a unit landing here ends up in the water.
    pub fn is_water(self) -> bool {
        matches!(self, SurfaceType::ShallowWater | SurfaceType::Water)
    }
}

/// Lifecycle phase of a unit tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerPhase {
    /// Sampling, no impact prediction yet.
    #[default]
    Tracking,
    /// Sampling with a live impact prediction.
    Predicting,
    /// Outcome decided, deferred report pending.
    Resolving,
    /// Outcome delivered to the burst. Terminal.
    Resolved,
}

impl TrackerPhase {
    /// True once the tracker has decided its outcome.
    pub fn is_terminal(self) -> bool {
        matches!(self, TrackerPhase::Resolving | TrackerPhase::Resolved)
    }
}

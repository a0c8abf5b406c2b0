//! Swappable landing policies.
//!
//! What counts as a usable landing site, and what gets spawned for a unit
//! that made it down, are strategies injected into the registry.

use std::collections::HashMap;

use paradrop_core::config::AirdropConfig;
use paradrop_core::constants::SLOPE_SAMPLE_OFFSET;
use paradrop_core::types::FactionId;
use paradrop_core::DVec2;

use crate::host::TerrainOracle;

/// Decides whether a unit can touch down at a ground-plane point.
pub trait LandingSiteValidator {
    fn is_valid(&self, terrain: &dyn TerrainOracle, point: DVec2) -> bool;
}

/// Accepts any dry ground.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectWater;

impl LandingSiteValidator for RejectWater {
    fn is_valid(&self, terrain: &dyn TerrainOracle, point: DVec2) -> bool {
        !terrain.surface_at(point).is_water()
    }
}

/// Dry ground that is no steeper than `max_slope` (rise over run).
#[derive(Debug, Clone, Copy)]
pub struct SlopeLimit {
    pub max_slope: f64,
    /// Distance either side of the point used for the height samples (meters).
    pub sample_offset: f64,
}

impl SlopeLimit {
    pub fn new(max_slope: f64) -> Self {
        Self {
            max_slope,
            sample_offset: SLOPE_SAMPLE_OFFSET,
        }
    }

    fn slope(&self, terrain: &dyn TerrainOracle, point: DVec2) -> f64 {
        let d = self.sample_offset;
        let dx = DVec2::new(d, 0.0);
        let dy = DVec2::new(0.0, d);
        let gx = (terrain.height_at(point + dx) - terrain.height_at(point - dx)) / (2.0 * d);
        let gy = (terrain.height_at(point + dy) - terrain.height_at(point - dy)) / (2.0 * d);
        (gx * gx + gy * gy).sqrt()
    }
}

impl LandingSiteValidator for SlopeLimit {
    fn is_valid(&self, terrain: &dyn TerrainOracle, point: DVec2) -> bool {
        RejectWater.is_valid(terrain, point) && self.slope(terrain, point) <= self.max_slope
    }
}

/// Build the validator a config asks for.
pub fn validator_for(config: &AirdropConfig) -> Box<dyn LandingSiteValidator> {
    match config.max_landing_slope {
        Some(max_slope) => Box::new(SlopeLimit::new(max_slope)),
        None => Box::new(RejectWater),
    }
}

/// Chooses what to spawn for a landed unit and its stand-in.
pub trait UnitFactory {
    /// Unit type of the formation member.
    fn unit_type(&self, faction: FactionId) -> String;
    /// Static object type shown until the burst completes.
    fn placeholder_type(&self, faction: FactionId) -> String;
}

/// Same types for every faction.
#[derive(Debug, Clone)]
pub struct FixedUnitFactory {
    pub unit_type: String,
    pub placeholder_type: String,
}

impl FixedUnitFactory {
    pub fn from_config(config: &AirdropConfig) -> Self {
        Self {
            unit_type: config.unit_type.clone(),
            placeholder_type: config.placeholder_type.clone(),
        }
    }
}

impl UnitFactory for FixedUnitFactory {
    fn unit_type(&self, _faction: FactionId) -> String {
        self.unit_type.clone()
    }

    fn placeholder_type(&self, _faction: FactionId) -> String {
        self.placeholder_type.clone()
    }
}

/// Per-faction unit types, falling back to a fixed factory.
#[derive(Debug, Clone)]
pub struct FactionUnitFactory {
    pub unit_types: HashMap<FactionId, String>,
    pub fallback: FixedUnitFactory,
}

impl UnitFactory for FactionUnitFactory {
    fn unit_type(&self, faction: FactionId) -> String {
        self.unit_types
            .get(&faction)
            .cloned()
            .unwrap_or_else(|| self.fallback.unit_type(faction))
    }

    fn placeholder_type(&self, faction: FactionId) -> String {
        self.fallback.placeholder_type(faction)
    }
}

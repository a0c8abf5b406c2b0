//! Scenario files and the replay loop.
//!
//! A scenario is a terrain, a config and a list of drops. Each drop releases
//! `count` units from one launcher, `interval` seconds apart, scattered
//! around the release point by up to `spread` meters.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::Path;

use glam::{DVec2, DVec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use paradrop_core::config::{AirdropConfig, ConfigError};
use paradrop_core::events::{AirdropEvent, HostEvent};
use paradrop_core::types::{FactionId, LauncherId, SimSeconds};
use paradrop_sim::sandbox::SandboxHost;
use paradrop_sim::Airdrops;
use paradrop_terrain::{GridError, TerrainGrid, TerrainHeader};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] io::Error),
    #[error("scenario json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("bad terrain: {0}")]
    Terrain(#[from] GridError),
    #[error("step must be positive, got {0}")]
    BadStep(f64),
}

/// Axis-aligned rectangle on the ground plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

/// Flat terrain with optional water patches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainSpec {
    pub origin: DVec2,
    pub cell_size: f64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub water: Vec<Rect>,
}

impl TerrainSpec {
    pub fn build(&self) -> Result<TerrainGrid, GridError> {
        let header = TerrainHeader {
            origin: self.origin,
            cell_size: self.cell_size,
            width: self.width,
            height: self.height,
        };
        let grid = TerrainGrid::flat(header, self.elevation)?;
        Ok(self
            .water
            .iter()
            .fold(grid, |g, r| g.with_water_rect(r.min, r.max)))
    }
}

fn default_count() -> u32 {
    1
}

fn default_interval() -> f64 {
    0.5
}

/// One stick of units leaving a launcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropSpec {
    pub time: SimSeconds,
    pub launcher: LauncherId,
    pub faction: FactionId,
    #[serde(default = "default_count")]
    pub count: u32,
    pub position: DVec3,
    pub velocity: DVec3,
    /// Maximum horizontal scatter around `position` (meters).
    #[serde(default)]
    pub spread: f64,
    /// Seconds between consecutive units.
    #[serde(default = "default_interval")]
    pub interval: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: AirdropConfig,
    pub terrain: TerrainSpec,
    #[serde(default)]
    pub seed: u64,
    pub drops: Vec<DropSpec>,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Every unit release, ordered by time. Scatter is drawn from the seed.
    pub fn releases(&self) -> Vec<Release> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut out = Vec::new();
        for drop in &self.drops {
            for i in 0..drop.count {
                let offset = if drop.spread > 0.0 {
                    DVec3::new(
                        rng.gen_range(-drop.spread..=drop.spread),
                        rng.gen_range(-drop.spread..=drop.spread),
                        0.0,
                    )
                } else {
                    DVec3::ZERO
                };
                out.push(Release {
                    time: drop.time + f64::from(i) * drop.interval,
                    launcher: drop.launcher,
                    faction: drop.faction,
                    position: drop.position + offset,
                    velocity: drop.velocity,
                });
            }
        }
        out.sort_by(|a, b| a.time.total_cmp(&b.time));
        out
    }
}

/// A single unit leaving its launcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub time: SimSeconds,
    pub launcher: LauncherId,
    pub faction: FactionId,
    pub position: DVec3,
    pub velocity: DVec3,
}

/// One line of replay output.
#[derive(Debug, Serialize)]
struct LogLine<'a> {
    time: SimSeconds,
    event: &'a AirdropEvent,
}

/// Totals for a finished replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub released: usize,
    pub landed: usize,
    pub lost: usize,
    pub formations: usize,
}

/// Run `scenario` for at most `duration` seconds, writing each outbound
/// event to `out` as a JSON line.
pub fn run(
    scenario: &Scenario,
    duration: SimSeconds,
    step: f64,
    out: &mut impl Write,
) -> Result<ReplayStats, ScenarioError> {
    if step <= 0.0 || !step.is_finite() {
        return Err(ScenarioError::BadStep(step));
    }

    let mut host = SandboxHost::new(scenario.terrain.build()?);
    let mut registry = Airdrops::new(scenario.config.clone());
    let mut pending: VecDeque<Release> = scenario.releases().into();
    let mut stats = ReplayStats::default();

    info!(
        units = pending.len(),
        drops = scenario.drops.len(),
        seed = scenario.seed,
        "replay started"
    );

    while host.time() < duration {
        while pending.front().is_some_and(|r| r.time <= host.time()) {
            let Some(release) = pending.pop_front() else {
                break;
            };
            let weapon = host.release(release.position, release.velocity);
            let shot = HostEvent::Shot {
                launcher: release.launcher,
                faction: release.faction,
                weapon_type: scenario.config.munition_type.clone(),
                weapon,
            };
            if registry.handle_event(&shot, host.time(), &host) {
                stats.released += 1;
            }
        }

        host.advance(step);
        registry.run_due(host.time(), &mut host);

        for event in registry.drain_events() {
            match &event {
                AirdropEvent::UnitLanded { .. } => stats.landed += 1,
                AirdropEvent::UnitLost { .. } => stats.lost += 1,
                AirdropEvent::FormationCommitted { .. } => stats.formations += 1,
                _ => {}
            }
            let line = LogLine {
                time: host.time(),
                event: &event,
            };
            serde_json::to_writer(&mut *out, &line)?;
            writeln!(out)?;
        }

        if pending.is_empty() && registry.open_burst_count() == 0 {
            debug!(time = host.time(), "all bursts closed");
            break;
        }
    }

    info!(
        time = host.time(),
        released = stats.released,
        landed = stats.landed,
        lost = stats.lost,
        formations = stats.formations,
        open = registry.open_burst_count(),
        "replay finished"
    );
    Ok(stats)
}

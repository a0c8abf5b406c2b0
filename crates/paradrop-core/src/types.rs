//! Identity handles and spawn descriptors.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Simulation time in seconds since mission start.
pub type SimSeconds = f64;

/// Identity of a launch platform (the aircraft a burst leaves from).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LauncherId(pub u64);

/// Coalition / faction a launcher belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionId(pub u8);

/// Non-owning handle to a host entity. The entity may vanish at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

/// Handle to a host formation (group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormationHandle(pub u64);

/// Registry-wide identity of a unit tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackerId(pub u64);

impl fmt::Display for LauncherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A single member of a formation to be spawned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub name: String,
    pub unit_type: String,
    /// Ground-plane position (meters).
    pub position: DVec2,
}

/// Everything the host needs to spawn a formation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationSpec {
    pub name: String,
    pub faction: FactionId,
    pub members: Vec<MemberSpec>,
    /// Inactive formations are invisible and take no part in the simulation.
    pub active: bool,
}

/// A static (non-moving) object standing in for something else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticSpec {
    pub name: String,
    pub object_type: String,
    pub faction: FactionId,
    pub position: DVec2,
}

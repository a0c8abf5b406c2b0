//! Events flowing into and out of the airdrop registry.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::types::{EntityHandle, FactionId, LauncherId, TrackerId};

/// Events delivered by the host simulation's event feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostEvent {
    /// A weapon (or anything the host models as one) left a launcher.
    Shot {
        launcher: LauncherId,
        faction: FactionId,
        weapon_type: String,
        weapon: EntityHandle,
    },
    /// Something was hit.
    Hit { target: EntityHandle },
    /// Something died.
    Dead { entity: EntityHandle },
    /// Any other host event; always ignored.
    Other { name: String },
}

/// Events emitted by the registry for logging and UI feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AirdropEvent {
    /// A new burst started for a launcher.
    BurstOpened { launcher: LauncherId, faction: FactionId },
    /// A released unit is now being tracked.
    UnitReleased { launcher: LauncherId, tracker: TrackerId },
    /// A unit reached valid ground.
    UnitLanded {
        launcher: LauncherId,
        tracker: TrackerId,
        name: String,
        position: DVec2,
    },
    /// A unit resolved without a usable landing.
    UnitLost { launcher: LauncherId, tracker: TrackerId },
    /// A formation name was locked for the burst.
    FormationReserved {
        launcher: LauncherId,
        name: String,
        generation: u32,
    },
    /// The burst closed and its survivors became a formation.
    FormationCommitted {
        launcher: LauncherId,
        name: String,
        members: usize,
    },
    /// The burst closed with no survivors.
    BurstDiscarded { launcher: LauncherId },
}

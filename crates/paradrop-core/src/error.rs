//! Errors reported by host services.
//!
//! None of these reach the event-feed caller; the registry logs them and
//! resolves the affected unit or burst locally.

use crate::types::{EntityHandle, FormationHandle};

/// Host operation failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("Entity {0:?} no longer exists")]
    EntityGone(EntityHandle),

    #[error("Formation {0:?} no longer exists")]
    FormationGone(FormationHandle),

    #[error("Spawn of '{name}' rejected: {reason}")]
    SpawnRejected { name: String, reason: String },
}

//! Services the simulator provides.
//!
//! Everything the airdrop logic knows about the outside world goes through
//! these traits. [`crate::sandbox::SandboxHost`] is an in-memory implementation.

use paradrop_core::enums::SurfaceType;
use paradrop_core::error::HostError;
use paradrop_core::types::{EntityHandle, FormationHandle, FormationSpec, SimSeconds, StaticSpec};
use paradrop_core::{DVec2, DVec3};

/// Live state of previously obtained entity handles.
pub trait EntityQuery {
    /// Whether the entity still exists.
    fn exists(&self, entity: EntityHandle) -> bool;
    /// Current position, None if the entity is gone.
    fn position(&self, entity: EntityHandle) -> Option<DVec3>;
    /// Current velocity, None if the entity is gone.
    fn velocity(&self, entity: EntityHandle) -> Option<DVec3>;
    /// Host type name of the entity, if the host exposes one.
    fn unit_type(&self, _entity: EntityHandle) -> Option<String> {
        None
    }
}

/// Simulation time source.
pub trait Clock {
    fn now(&self) -> SimSeconds;
}

/// Answers "where would this trajectory hit the ground".
pub trait BallisticOracle {
    /// First ground contact along `direction` from `origin` within `max_distance`.
    fn impact_point(&self, origin: DVec3, direction: DVec3, max_distance: f64) -> Option<DVec3>;
}

/// Answers "what is at this point on the ground".
pub trait TerrainOracle {
    fn surface_at(&self, point: DVec2) -> SurfaceType;
    fn height_at(&self, point: DVec2) -> f64;
}

/// Spawning and removal of host objects.
pub trait EntityLifecycle {
    fn spawn_static(&mut self, spec: &StaticSpec) -> Result<EntityHandle, HostError>;
    fn spawn_formation(&mut self, spec: &FormationSpec) -> Result<FormationHandle, HostError>;
    fn destroy_entity(&mut self, entity: EntityHandle) -> Result<(), HostError>;
    fn destroy_formation(&mut self, formation: FormationHandle) -> Result<(), HostError>;
    /// Whether a formation with this name currently exists.
    fn formation_exists(&self, name: &str) -> bool;
}

/// The full set of host services.
pub trait SimHost: EntityQuery + BallisticOracle + TerrainOracle + EntityLifecycle + Clock {}

impl<T> SimHost for T where
    T: EntityQuery + BallisticOracle + TerrainOracle + EntityLifecycle + Clock
{
}

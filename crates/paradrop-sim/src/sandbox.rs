//! In-memory host for tests and offline runs.
//!
//! Falling bodies move in straight lines and are removed when they reach the
//! ground, the way the simulator removes a parachutist on touchdown. Statics
//! live in the same hecs world; formations are kept by name.

use std::collections::HashMap;

use hecs::{Entity, World};

use paradrop_core::constants::DEFAULT_MUNITION_TYPE;
use paradrop_core::enums::SurfaceType;
use paradrop_core::error::HostError;
use paradrop_core::types::{EntityHandle, FormationHandle, FormationSpec, SimSeconds, StaticSpec};
use paradrop_core::vector::{from_ground, to_ground};
use paradrop_core::{DVec2, DVec3};
use paradrop_terrain::{first_impact, TerrainGrid};

use crate::host::{BallisticOracle, Clock, EntityLifecycle, EntityQuery, TerrainOracle};

/// Kinematic state of a host entity.
#[derive(Debug, Clone, Copy)]
struct Body {
    position: DVec3,
    velocity: DVec3,
}

/// Marker: integrates each step and disappears on touchdown.
#[derive(Debug, Clone, Copy)]
struct Falling;

/// Host type name of a released body.
#[derive(Debug, Clone)]
struct TypeName(String);

/// A spawned static object.
#[derive(Debug, Clone)]
struct StaticObject(StaticSpec);

fn handle_of(entity: Entity) -> EntityHandle {
    EntityHandle(entity.to_bits().get())
}

fn entity_of(handle: EntityHandle) -> Option<Entity> {
    Entity::from_bits(handle.0)
}

/// A simulator stand-in backed by a terrain grid.
pub struct SandboxHost {
    world: World,
    terrain: TerrainGrid,
    time: SimSeconds,
    formations: HashMap<FormationHandle, FormationSpec>,
    formation_names: HashMap<String, FormationHandle>,
    next_formation: u64,
    fail_static_spawns: bool,
    fail_formation_spawns: bool,
    despawn_buffer: Vec<Entity>,
    touchdowns: Vec<(EntityHandle, DVec3)>,
}

impl SandboxHost {
    pub fn new(terrain: TerrainGrid) -> Self {
        Self {
            world: World::new(),
            terrain,
            time: 0.0,
            formations: HashMap::new(),
            formation_names: HashMap::new(),
            next_formation: 1,
            fail_static_spawns: false,
            fail_formation_spawns: false,
            despawn_buffer: Vec::new(),
            touchdowns: Vec::new(),
        }
    }

    /// Current simulation time.
    pub fn time(&self) -> SimSeconds {
        self.time
    }

    pub fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    /// Release a falling body.
    pub fn release(&mut self, position: DVec3, velocity: DVec3) -> EntityHandle {
        self.release_typed(position, velocity, DEFAULT_MUNITION_TYPE)
    }

    /// Release a falling body with a host type name.
    pub fn release_typed(
        &mut self,
        position: DVec3,
        velocity: DVec3,
        type_name: &str,
    ) -> EntityHandle {
        let body = Body { position, velocity };
        handle_of(
            self.world
                .spawn((body, Falling, TypeName(type_name.to_owned()))),
        )
    }

    /// Remove an entity without a touchdown, as if the simulator lost it.
    pub fn remove(&mut self, handle: EntityHandle) -> bool {
        entity_of(handle).is_some_and(|e| self.world.despawn(e).is_ok())
    }

    /// Change a falling body's velocity (gusts, canopy opening).
    pub fn set_velocity(&mut self, handle: EntityHandle, velocity: DVec3) -> bool {
        let Some(entity) = entity_of(handle) else {
            return false;
        };
        match self.world.get::<&mut Body>(entity) {
            Ok(mut body) => {
                body.velocity = velocity;
                true
            }
            Err(_) => false,
        }
    }

    /// Advance time by `dt`, moving every falling body. Bodies that reach
    /// the ground are removed and recorded as touchdowns.
    pub fn advance(&mut self, dt: f64) {
        self.despawn_buffer.clear();

        for (entity, (body, _falling)) in self.world.query_mut::<(&mut Body, &Falling)>() {
            body.position += body.velocity * dt;
            let ground = self
                .terrain
                .elevation_at(to_ground(body.position))
                .unwrap_or(0.0);
            if body.position.z <= ground {
                body.position.z = ground;
                self.despawn_buffer.push(entity);
                self.touchdowns.push((handle_of(entity), body.position));
            }
        }

        for entity in self.despawn_buffer.drain(..) {
            let _ = self.world.despawn(entity);
        }
        self.time += dt;
    }

    /// Touchdowns recorded since the last call.
    pub fn drain_touchdowns(&mut self) -> Vec<(EntityHandle, DVec3)> {
        std::mem::take(&mut self.touchdowns)
    }

    /// Make every following static spawn fail.
    pub fn set_fail_static_spawns(&mut self, fail: bool) {
        self.fail_static_spawns = fail;
    }

    /// Make every following formation spawn fail.
    pub fn set_fail_formation_spawns(&mut self, fail: bool) {
        self.fail_formation_spawns = fail;
    }

    pub fn falling_count(&self) -> usize {
        self.world.query::<&Falling>().iter().count()
    }

    pub fn static_count(&self) -> usize {
        self.world.query::<&StaticObject>().iter().count()
    }

    /// Specs of every live static object.
    pub fn statics(&self) -> Vec<StaticSpec> {
        self.world
            .query::<&StaticObject>()
            .iter()
            .map(|(_, s)| s.0.clone())
            .collect()
    }

    pub fn formation(&self, name: &str) -> Option<&FormationSpec> {
        self.formations.get(self.formation_names.get(name)?)
    }

    pub fn formations(&self) -> impl Iterator<Item = &FormationSpec> {
        self.formations.values()
    }

    pub fn formation_count(&self) -> usize {
        self.formations.len()
    }
}

impl EntityQuery for SandboxHost {
    fn exists(&self, entity: EntityHandle) -> bool {
        entity_of(entity).is_some_and(|e| self.world.contains(e))
    }

    fn position(&self, entity: EntityHandle) -> Option<DVec3> {
        let e = entity_of(entity)?;
        self.world.get::<&Body>(e).ok().map(|b| b.position)
    }

    fn velocity(&self, entity: EntityHandle) -> Option<DVec3> {
        let e = entity_of(entity)?;
        self.world.get::<&Body>(e).ok().map(|b| b.velocity)
    }

    fn unit_type(&self, entity: EntityHandle) -> Option<String> {
        let e = entity_of(entity)?;
        if let Ok(name) = self.world.get::<&TypeName>(e) {
            return Some(name.0.clone());
        }
        self.world
            .get::<&StaticObject>(e)
            .ok()
            .map(|s| s.0.object_type.clone())
    }
}

impl Clock for SandboxHost {
    fn now(&self) -> SimSeconds {
        self.time
    }
}

impl BallisticOracle for SandboxHost {
    fn impact_point(&self, origin: DVec3, direction: DVec3, max_distance: f64) -> Option<DVec3> {
        first_impact(&self.terrain, origin, direction, max_distance)
    }
}

impl TerrainOracle for SandboxHost {
    /// Outside the grid is open sea.
    fn surface_at(&self, point: DVec2) -> SurfaceType {
        self.terrain.surface_at(point).unwrap_or(SurfaceType::Water)
    }

    fn height_at(&self, point: DVec2) -> f64 {
        self.terrain.elevation_at(point).unwrap_or(0.0)
    }
}

impl EntityLifecycle for SandboxHost {
    fn spawn_static(&mut self, spec: &StaticSpec) -> Result<EntityHandle, HostError> {
        if self.fail_static_spawns {
            return Err(HostError::SpawnRejected {
                name: spec.name.clone(),
                reason: "static spawns disabled".into(),
            });
        }
        let body = Body {
            position: from_ground(spec.position, self.height_at(spec.position)),
            velocity: DVec3::ZERO,
        };
        Ok(handle_of(self.world.spawn((body, StaticObject(spec.clone())))))
    }

    fn spawn_formation(&mut self, spec: &FormationSpec) -> Result<FormationHandle, HostError> {
        if self.fail_formation_spawns {
            return Err(HostError::SpawnRejected {
                name: spec.name.clone(),
                reason: "formation spawns disabled".into(),
            });
        }
        if self.formation_names.contains_key(&spec.name) {
            return Err(HostError::SpawnRejected {
                name: spec.name.clone(),
                reason: "name in use".into(),
            });
        }
        let handle = FormationHandle(self.next_formation);
        self.next_formation += 1;
        self.formation_names.insert(spec.name.clone(), handle);
        self.formations.insert(handle, spec.clone());
        Ok(handle)
    }

    fn destroy_entity(&mut self, entity: EntityHandle) -> Result<(), HostError> {
        let e = entity_of(entity).ok_or(HostError::EntityGone(entity))?;
        self.world
            .despawn(e)
            .map_err(|_| HostError::EntityGone(entity))
    }

    fn destroy_formation(&mut self, formation: FormationHandle) -> Result<(), HostError> {
        let spec = self
            .formations
            .remove(&formation)
            .ok_or(HostError::FormationGone(formation))?;
        self.formation_names.remove(&spec.name);
        Ok(())
    }

    fn formation_exists(&self, name: &str) -> bool {
        self.formation_names.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paradrop_core::types::{FactionId, MemberSpec};
    use paradrop_terrain::TerrainHeader;

    fn make_host() -> SandboxHost {
        let header = TerrainHeader {
            origin: DVec2::new(-500.0, -500.0),
            cell_size: 10.0,
            width: 101,
            height: 101,
        };
        let terrain = TerrainGrid::flat(header, 0.0)
            .unwrap()
            .with_water_rect(DVec2::new(200.0, -500.0), DVec2::new(500.0, 500.0));
        SandboxHost::new(terrain)
    }

    #[test]
    fn test_falling_body_touches_down_and_vanishes() {
        let mut host = make_host();
        let h = host.release(DVec3::new(0.0, 0.0, 10.0), DVec3::new(1.0, 0.0, -5.0));
        assert!(host.exists(h));
        assert_eq!(host.unit_type(h).as_deref(), Some("parachutist"));
        host.advance(1.0);
        assert_eq!(host.position(h), Some(DVec3::new(1.0, 0.0, 5.0)));
        host.advance(1.0);
        assert!(!host.exists(h));
        assert!(host.position(h).is_none());
        let touchdowns = host.drain_touchdowns();
        assert_eq!(touchdowns, vec![(h, DVec3::new(2.0, 0.0, 0.0))]);
        assert!((host.now() - 2.0).abs() < 1e-12);
        assert!(host.unit_type(h).is_none());
    }

    #[test]
    fn test_surface_and_outside() {
        let host = make_host();
        assert_eq!(host.surface_at(DVec2::new(0.0, 0.0)), SurfaceType::Land);
        assert_eq!(host.surface_at(DVec2::new(300.0, 0.0)), SurfaceType::Water);
        assert_eq!(host.surface_at(DVec2::new(5000.0, 0.0)), SurfaceType::Water);
    }

    #[test]
    fn test_formation_names_are_unique() {
        let mut host = make_host();
        let spec = FormationSpec {
            name: "Airdrop-1-1".into(),
            faction: FactionId(1),
            members: vec![MemberSpec {
                name: "Airdrop-1-1 #1".into(),
                unit_type: "Paratrooper".into(),
                position: DVec2::ZERO,
            }],
            active: true,
        };
        let handle = host.spawn_formation(&spec).unwrap();
        assert!(host.formation_exists("Airdrop-1-1"));
        assert!(host.spawn_formation(&spec).is_err());
        host.destroy_formation(handle).unwrap();
        assert!(!host.formation_exists("Airdrop-1-1"));
        assert_eq!(
            host.destroy_formation(handle),
            Err(HostError::FormationGone(handle))
        );
    }

    #[test]
    fn test_statics_and_fault_injection() {
        let mut host = make_host();
        let spec = StaticSpec {
            name: "stand-in".into(),
            object_type: "Paratrooper".into(),
            faction: FactionId(2),
            position: DVec2::new(10.0, 10.0),
        };
        let h = host.spawn_static(&spec).unwrap();
        assert_eq!(host.static_count(), 1);
        assert_eq!(host.falling_count(), 0);
        assert_eq!(host.statics(), vec![spec.clone()]);
        assert_eq!(host.unit_type(h).as_deref(), Some("Paratrooper"));
        host.destroy_entity(h).unwrap();
        assert_eq!(host.destroy_entity(h), Err(HostError::EntityGone(h)));

        host.set_fail_static_spawns(true);
        assert!(matches!(
            host.spawn_static(&spec),
            Err(HostError::SpawnRejected { .. })
        ));
    }

    #[test]
    fn test_removed_entity_is_gone() {
        let mut host = make_host();
        let h = host.release(DVec3::new(0.0, 0.0, 100.0), DVec3::NEG_Z);
        assert!(host.remove(h));
        assert!(!host.exists(h));
        assert!(!host.remove(h));
        assert!(!host.set_velocity(h, DVec3::ZERO));
    }
}

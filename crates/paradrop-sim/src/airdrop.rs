//! Burst aggregator.
//!
//! An `Airdrop` owns every tracker released by one launcher while its burst
//! is open. It locks a formation name on the first good landing, keeps a
//! static stand-in on the ground for each survivor, and when the last
//! tracker reports it either commits the survivors as one formation or
//! releases the name.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use paradrop_core::config::AirdropConfig;
use paradrop_core::events::AirdropEvent;
use paradrop_core::types::{
    EntityHandle, FactionId, FormationHandle, FormationSpec, LauncherId, MemberSpec, SimSeconds,
    StaticSpec, TrackerId,
};
use paradrop_core::{DVec2, DVec3};

use crate::host::{BallisticOracle, EntityLifecycle, EntityQuery, TerrainOracle};
use crate::landing::{LandingSiteValidator, UnitFactory};
use crate::tracker::{AirborneParatrooper, LandingOutcome, TrackerStep};

/// Formation name for a launcher's `generation`-th burst.
pub fn formation_name(prefix: &str, launcher: LauncherId, generation: u32) -> String {
    format!("{prefix}-{launcher}-{generation}")
}

/// A survivor waiting to join the formation.
#[derive(Debug, Clone, PartialEq)]
pub struct LandedUnit {
    pub name: String,
    pub unit_type: String,
    pub position: DVec2,
}

/// A locked formation name.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub generation: u32,
    pub name: String,
    /// Inactive formation holding the name. None if the host refused it.
    pub placeholder: Option<FormationHandle>,
}

/// Formation identity for the current burst.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReservationState {
    #[default]
    Unreserved,
    Reserved(Reservation),
    /// Name chosen for this burst but not held by a placeholder, because the
    /// landing that locked it was lost. The next landing locks it again.
    Released { generation: u32, name: String },
    /// Handed off to a committed formation. Never reserved again.
    Consumed {
        generation: u32,
        formation: Option<FormationHandle>,
    },
}

/// Per-call collaborators for burst bookkeeping.
pub struct BurstContext<'a> {
    pub config: &'a AirdropConfig,
    pub factory: &'a dyn UnitFactory,
    pub events: &'a mut Vec<AirdropEvent>,
}

/// Result of a landing report.
#[derive(Debug, Clone, PartialEq)]
pub enum BurstStatus {
    /// Units are still in the air.
    Open,
    /// The last unit reported; the registry should retire this burst.
    Complete(BurstSummary),
}

/// How a burst ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurstSummary {
    pub launcher: LauncherId,
    /// Generation reserved during the burst, committed or not.
    pub generation: Option<u32>,
    /// Name of the committed formation.
    pub formation: Option<String>,
    /// Host handle of the committed formation, if the host accepted it.
    pub committed: Option<FormationHandle>,
    pub landed: usize,
    pub lost: usize,
}

/// Aggregates the trackers from one launcher's burst.
#[derive(Debug)]
pub struct Airdrop {
    launcher: LauncherId,
    faction: FactionId,
    airborne: u32,
    trackers: HashMap<TrackerId, AirborneParatrooper>,
    landed: Vec<LandedUnit>,
    placeholders: Vec<EntityHandle>,
    reservation: ReservationState,
    /// First generation tried when picking a name.
    first_generation: u32,
    /// Highest generation this burst has reserved.
    last_generation: Option<u32>,
    lost: usize,
}

impl Airdrop {
    pub fn new(launcher: LauncherId, faction: FactionId, first_generation: u32) -> Self {
        Self {
            launcher,
            faction,
            airborne: 0,
            trackers: HashMap::new(),
            landed: Vec::new(),
            placeholders: Vec::new(),
            reservation: ReservationState::Unreserved,
            first_generation,
            last_generation: None,
            lost: 0,
        }
    }

    pub fn launcher(&self) -> LauncherId {
        self.launcher
    }

    pub fn faction(&self) -> FactionId {
        self.faction
    }

    /// Trackers that have not reported yet.
    pub fn airborne(&self) -> u32 {
        self.airborne
    }

    pub fn landed(&self) -> &[LandedUnit] {
        &self.landed
    }

    pub fn placeholders(&self) -> &[EntityHandle] {
        &self.placeholders
    }

    pub fn reservation(&self) -> &ReservationState {
        &self.reservation
    }

    /// Name locked for this burst, if any.
    pub fn reserved_name(&self) -> Option<&str> {
        match &self.reservation {
            ReservationState::Reserved(r) => Some(&r.name),
            _ => None,
        }
    }

    pub fn last_generation(&self) -> Option<u32> {
        self.last_generation
    }

    pub fn tracker(&self, id: TrackerId) -> Option<&AirborneParatrooper> {
        self.trackers.get(&id)
    }

    /// Start tracking a released unit from its initial sample.
    pub fn add_unit(
        &mut self,
        id: TrackerId,
        entity: EntityHandle,
        position: DVec3,
        velocity: DVec3,
        now: SimSeconds,
        cadence: f64,
    ) {
        let tracker =
            AirborneParatrooper::new(id, self.launcher, entity, position, velocity, now, cadence);
        match self.trackers.entry(id) {
            Entry::Occupied(_) => {
                warn!(launcher = %self.launcher, tracker = %id, "tracker id reused");
                return;
            }
            Entry::Vacant(slot) => {
                slot.insert(tracker);
            }
        }
        self.airborne += 1;
        debug!(launcher = %self.launcher, tracker = %id, airborne = self.airborne, "unit added");
    }

    /// Run one tick of a tracker owned by this burst.
    pub fn tick_tracker<H>(
        &mut self,
        id: TrackerId,
        now: SimSeconds,
        host: &H,
        validator: &dyn LandingSiteValidator,
        config: &AirdropConfig,
    ) -> TrackerStep
    where
        H: EntityQuery + BallisticOracle + TerrainOracle,
    {
        match self.trackers.get_mut(&id) {
            Some(tracker) => tracker.tick(now, host, validator, config),
            None => TrackerStep::Idle,
        }
    }

    /// Take the decided outcome of a tracker, once.
    pub fn take_outcome(&mut self, id: TrackerId) -> Option<LandingOutcome> {
        self.trackers.get_mut(&id)?.take_outcome()
    }

    /// Record one tracker's outcome. A second report for the same tracker,
    /// or one for a tracker this burst does not own, is ignored.
    pub fn report_landing<H>(
        &mut self,
        id: TrackerId,
        outcome: LandingOutcome,
        host: &mut H,
        ctx: &mut BurstContext<'_>,
    ) -> BurstStatus
    where
        H: EntityLifecycle + ?Sized,
    {
        if self.trackers.remove(&id).is_none() {
            warn!(launcher = %self.launcher, tracker = %id, "report for unknown tracker ignored");
            return BurstStatus::Open;
        }

        let landed = match outcome {
            LandingOutcome::Landed(point) => self.record_landing(id, point, host, ctx),
            LandingOutcome::Lost => false,
        };
        if !landed {
            self.lost += 1;
            ctx.events.push(AirdropEvent::UnitLost {
                launcher: self.launcher,
                tracker: id,
            });
        }

        self.airborne = self.airborne.saturating_sub(1);
        if self.airborne > 0 {
            return BurstStatus::Open;
        }
        BurstStatus::Complete(self.complete(host, ctx))
    }

    /// Reserve on first landing, then add the survivor and its stand-in.
    /// Returns false if the stand-in could not be spawned.
    fn record_landing<H>(
        &mut self,
        id: TrackerId,
        point: DVec2,
        host: &mut H,
        ctx: &mut BurstContext<'_>,
    ) -> bool
    where
        H: EntityLifecycle + ?Sized,
    {
        match std::mem::take(&mut self.reservation) {
            ReservationState::Unreserved => self.reserve(point, host, ctx),
            ReservationState::Released { generation, name } => {
                debug!(launcher = %self.launcher, formation = %name, "relocking formation name");
                self.lock(generation, name, point, host, ctx);
            }
            held => self.reservation = held,
        }
        let Some(formation) = self.reserved_name().map(str::to_owned) else {
            warn!(launcher = %self.launcher, "landing after reservation was consumed");
            return false;
        };

        let name = format!("{formation} #{}", self.landed.len() + 1);
        let spec = StaticSpec {
            name: name.clone(),
            object_type: ctx.factory.placeholder_type(self.faction),
            faction: self.faction,
            position: point,
        };
        let placeholder = match host.spawn_static(&spec) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(launcher = %self.launcher, unit = %name, "stand-in spawn failed: {e}");
                if self.landed.is_empty() {
                    self.unlock(host);
                }
                return false;
            }
        };

        self.placeholders.push(placeholder);
        self.landed.push(LandedUnit {
            name: name.clone(),
            unit_type: ctx.factory.unit_type(self.faction),
            position: point,
        });
        debug!(launcher = %self.launcher, unit = %name, x = point.x, y = point.y, "unit landed");
        ctx.events.push(AirdropEvent::UnitLanded {
            launcher: self.launcher,
            tracker: id,
            name,
            position: point,
        });
        true
    }

    /// Pick the first free formation name and lock it.
    fn reserve<H>(&mut self, point: DVec2, host: &mut H, ctx: &mut BurstContext<'_>)
    where
        H: EntityLifecycle + ?Sized,
    {
        let prefix = &ctx.config.formation_prefix;
        let mut generation = self.first_generation;
        let mut name = formation_name(prefix, self.launcher, generation);
        while host.formation_exists(&name) {
            generation += 1;
            name = formation_name(prefix, self.launcher, generation);
        }

        info!(launcher = %self.launcher, formation = %name, generation, "formation reserved");
        ctx.events.push(AirdropEvent::FormationReserved {
            launcher: self.launcher,
            name: name.clone(),
            generation,
        });
        self.last_generation = Some(generation);
        self.lock(generation, name, point, host, ctx);
    }

    /// Hold `name` by spawning an inactive formation under it.
    fn lock<H>(
        &mut self,
        generation: u32,
        name: String,
        point: DVec2,
        host: &mut H,
        ctx: &mut BurstContext<'_>,
    ) where
        H: EntityLifecycle + ?Sized,
    {
        let spec = FormationSpec {
            name: name.clone(),
            faction: self.faction,
            members: vec![MemberSpec {
                name: format!("{name} reservation"),
                unit_type: ctx.factory.unit_type(self.faction),
                position: point,
            }],
            active: false,
        };
        let placeholder = match host.spawn_formation(&spec) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(launcher = %self.launcher, formation = %name, "reservation spawn failed: {e}");
                None
            }
        };

        self.reservation = ReservationState::Reserved(Reservation {
            generation,
            name,
            placeholder,
        });
    }

    /// Give up the placeholder formation but keep the name for this burst.
    fn unlock<H>(&mut self, host: &mut H)
    where
        H: EntityLifecycle + ?Sized,
    {
        if let ReservationState::Reserved(r) = std::mem::take(&mut self.reservation) {
            debug!(launcher = %self.launcher, formation = %r.name, "reservation unlocked");
            if let Some(handle) = r.placeholder {
                if let Err(e) = host.destroy_formation(handle) {
                    warn!(launcher = %self.launcher, "failed to unlock reservation: {e}");
                }
            }
            self.reservation = ReservationState::Released {
                generation: r.generation,
                name: r.name,
            };
        }
    }

    /// Drop a reservation that no landing ended up using.
    fn release_reservation<H>(&mut self, host: &mut H)
    where
        H: EntityLifecycle + ?Sized,
    {
        if let ReservationState::Reserved(r) = std::mem::take(&mut self.reservation) {
            debug!(launcher = %self.launcher, formation = %r.name, "reservation released");
            if let Some(handle) = r.placeholder {
                if let Err(e) = host.destroy_formation(handle) {
                    warn!(launcher = %self.launcher, "failed to release reservation: {e}");
                }
            }
        }
    }

    /// Close the burst: clear stand-ins, then commit or discard.
    fn complete<H>(&mut self, host: &mut H, ctx: &mut BurstContext<'_>) -> BurstSummary
    where
        H: EntityLifecycle + ?Sized,
    {
        for handle in self.placeholders.drain(..) {
            if let Err(e) = host.destroy_entity(handle) {
                debug!(launcher = %self.launcher, "stand-in already gone: {e}");
            }
        }

        let mut summary = BurstSummary {
            launcher: self.launcher,
            generation: self.last_generation,
            formation: None,
            committed: None,
            landed: self.landed.len(),
            lost: self.lost,
        };

        if self.landed.is_empty() {
            self.release_reservation(host);
            info!(launcher = %self.launcher, lost = self.lost, "burst discarded, no survivors");
            ctx.events.push(AirdropEvent::BurstDiscarded {
                launcher: self.launcher,
            });
            return summary;
        }

        let ReservationState::Reserved(reservation) = std::mem::take(&mut self.reservation) else {
            error!(launcher = %self.launcher, "survivors without a reserved formation");
            return summary;
        };

        if let Some(handle) = reservation.placeholder {
            if let Err(e) = host.destroy_formation(handle) {
                warn!(launcher = %self.launcher, "failed to clear reservation: {e}");
            }
        }

        let spec = FormationSpec {
            name: reservation.name.clone(),
            faction: self.faction,
            members: self
                .landed
                .drain(..)
                .map(|u| MemberSpec {
                    name: u.name,
                    unit_type: u.unit_type,
                    position: u.position,
                })
                .collect(),
            active: true,
        };
        let members = spec.members.len();
        let formation = match host.spawn_formation(&spec) {
            Ok(handle) => {
                info!(
                    launcher = %self.launcher,
                    formation = %spec.name,
                    members,
                    "formation committed"
                );
                ctx.events.push(AirdropEvent::FormationCommitted {
                    launcher: self.launcher,
                    name: spec.name.clone(),
                    members,
                });
                Some(handle)
            }
            Err(e) => {
                error!(launcher = %self.launcher, formation = %spec.name, "formation spawn failed: {e}");
                None
            }
        };

        self.reservation = ReservationState::Consumed {
            generation: reservation.generation,
            formation,
        };
        summary.formation = Some(spec.name);
        summary.committed = formation;
        summary
    }
}

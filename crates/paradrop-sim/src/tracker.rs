//! Per-unit ballistic tracker.
//!
//! An `AirborneParatrooper` follows one released unit until it can say where
//! (and whether) the unit touched down. Each tick it samples the entity, asks
//! the ballistic oracle for an impact point and halves its sampling delay
//! toward the predicted moment of impact. Once impact is less than one
//! cadence away, or the entity has vanished, it decides the outcome exactly
//! once.

use tracing::debug;

use paradrop_core::config::AirdropConfig;
use paradrop_core::constants::STATIONARY_SPEED;
use paradrop_core::enums::TrackerPhase;
use paradrop_core::types::{EntityHandle, LauncherId, SimSeconds, TrackerId};
use paradrop_core::vector::{direction, extrapolate, probe_distance, to_ground};
use paradrop_core::{DVec2, DVec3};

use crate::host::{BallisticOracle, EntityQuery, TerrainOracle};
use crate::landing::LandingSiteValidator;

/// Where a unit ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LandingOutcome {
    /// Touched down on a valid site.
    Landed(DVec2),
    /// No usable landing (water, rejected site).
    Lost,
}

impl LandingOutcome {
    pub fn point(&self) -> Option<DVec2> {
        match self {
            LandingOutcome::Landed(p) => Some(*p),
            LandingOutcome::Lost => None,
        }
    }
}

/// What the scheduler should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerStep {
    /// Tick again at the given time.
    Reschedule(SimSeconds),
    /// Outcome decided; deliver it at the given time (the predicted impact).
    ReportAt(SimSeconds),
    /// Outcome decided; deliver it now.
    ReportNow,
    /// Already resolved. Nothing to schedule.
    Idle,
}

/// Kinematic tracker for one falling unit.
#[derive(Debug, Clone)]
pub struct AirborneParatrooper {
    id: TrackerId,
    launcher: LauncherId,
    entity: EntityHandle,
    position: DVec3,
    velocity: DVec3,
    last_update: SimSeconds,
    /// Predicted impact point from the most recent successful probe.
    impact: Option<DVec3>,
    next_delay: f64,
    phase: TrackerPhase,
    outcome: Option<LandingOutcome>,
}

impl AirborneParatrooper {
    /// Start tracking from an initial sample taken at `now`.
    pub fn new(
        id: TrackerId,
        launcher: LauncherId,
        entity: EntityHandle,
        position: DVec3,
        velocity: DVec3,
        now: SimSeconds,
        cadence: f64,
    ) -> Self {
        Self {
            id,
            launcher,
            entity,
            position,
            velocity,
            last_update: now,
            impact: None,
            next_delay: cadence,
            phase: TrackerPhase::Tracking,
            outcome: None,
        }
    }

    pub fn id(&self) -> TrackerId {
        self.id
    }

    pub fn launcher(&self) -> LauncherId {
        self.launcher
    }

    pub fn entity(&self) -> EntityHandle {
        self.entity
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn velocity(&self) -> DVec3 {
        self.velocity
    }

    pub fn last_update(&self) -> SimSeconds {
        self.last_update
    }

    pub fn predicted_impact(&self) -> Option<DVec3> {
        self.impact
    }

    /// Delay the next tick would use if rescheduled now.
    pub fn next_delay(&self) -> f64 {
        self.next_delay
    }

    /// The decided outcome, if any, without consuming it.
    pub fn outcome(&self) -> Option<LandingOutcome> {
        self.outcome
    }

    /// Run one tick at `now`.
    pub fn tick<H>(
        &mut self,
        now: SimSeconds,
        host: &H,
        validator: &dyn LandingSiteValidator,
        config: &AirdropConfig,
    ) -> TrackerStep
    where
        H: EntityQuery + BallisticOracle + TerrainOracle,
    {
        if self.phase.is_terminal() {
            return TrackerStep::Idle;
        }

        let cadence = config.cadence_secs;
        let sample = if host.exists(self.entity) {
            host.position(self.entity).zip(host.velocity(self.entity))
        } else {
            None
        };

        let Some((position, velocity)) = sample else {
            debug!(tracker = %self.id, "entity gone, resolving from last known state");
            return self.resolve(now, None, host, validator);
        };

        self.position = position;
        self.velocity = velocity;
        self.last_update = now;

        let speed = velocity.length();
        let probe = probe_distance(speed, cadence, config.min_probe_speed);
        let eta = match host.impact_point(position, direction(velocity), probe) {
            Some(impact) => {
                self.impact = Some(impact);
                self.phase = TrackerPhase::Predicting;
                let eta = if speed > STATIONARY_SPEED {
                    position.distance(impact) / speed
                } else {
                    0.0
                };
                self.next_delay = eta / 2.0;
                Some(eta)
            }
            None => {
                self.impact = None;
                self.phase = TrackerPhase::Tracking;
                self.next_delay = cadence;
                None
            }
        };

        debug!(
            tracker = %self.id,
            z = position.z,
            speed,
            ?eta,
            "tracker sample"
        );

        match eta {
            Some(eta) if eta <= cadence => self.resolve(now, Some(eta), host, validator),
            _ => TrackerStep::Reschedule(now + self.next_delay),
        }
    }

    /// Decide the outcome. With a known ETA the report waits for the impact.
    fn resolve(
        &mut self,
        now: SimSeconds,
        eta: Option<f64>,
        terrain: &dyn TerrainOracle,
        validator: &dyn LandingSiteValidator,
    ) -> TrackerStep {
        let point = match self.impact {
            Some(impact) => impact,
            None => {
                let elapsed = now - self.last_update;
                debug!(tracker = %self.id, elapsed, "no prediction, dead reckoning");
                extrapolate(self.position, self.velocity, elapsed)
            }
        };

        let ground = to_ground(point);
        let outcome = if validator.is_valid(terrain, ground) {
            LandingOutcome::Landed(ground)
        } else {
            LandingOutcome::Lost
        };
        self.outcome = Some(outcome);
        self.phase = TrackerPhase::Resolving;

        match eta {
            Some(eta) => TrackerStep::ReportAt(now + eta),
            None => TrackerStep::ReportNow,
        }
    }

    /// Hand over the decided outcome. Yields it exactly once.
    pub fn take_outcome(&mut self) -> Option<LandingOutcome> {
        if self.phase != TrackerPhase::Resolving {
            return None;
        }
        self.phase = TrackerPhase::Resolved;
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paradrop_core::enums::SurfaceType;

    use crate::landing::RejectWater;

    /// Host with one entity whose state is set by hand and a fixed oracle answer.
    struct Probe {
        alive: bool,
        position: DVec3,
        velocity: DVec3,
        impact: Option<DVec3>,
        surface: SurfaceType,
        last_probe: std::cell::Cell<Option<(DVec3, f64)>>,
    }

    impl Probe {
        fn falling(z: f64, vz: f64) -> Self {
            Self {
                alive: true,
                position: DVec3::new(0.0, 0.0, z),
                velocity: DVec3::new(0.0, 0.0, vz),
                impact: None,
                surface: SurfaceType::Land,
                last_probe: std::cell::Cell::new(None),
            }
        }
    }

    impl EntityQuery for Probe {
        fn exists(&self, _entity: EntityHandle) -> bool {
            self.alive
        }
        fn position(&self, _entity: EntityHandle) -> Option<DVec3> {
            self.alive.then_some(self.position)
        }
        fn velocity(&self, _entity: EntityHandle) -> Option<DVec3> {
            self.alive.then_some(self.velocity)
        }
    }

    impl BallisticOracle for Probe {
        fn impact_point(&self, _origin: DVec3, direction: DVec3, max: f64) -> Option<DVec3> {
            self.last_probe.set(Some((direction, max)));
            self.impact
        }
    }

    impl TerrainOracle for Probe {
        fn surface_at(&self, _point: DVec2) -> SurfaceType {
            self.surface
        }
        fn height_at(&self, _point: DVec2) -> f64 {
            0.0
        }
    }

    fn tracker(host: &Probe) -> AirborneParatrooper {
        AirborneParatrooper::new(
            TrackerId(1),
            LauncherId(1),
            EntityHandle(1),
            host.position,
            host.velocity,
            0.0,
            1.0,
        )
    }

    #[test]
    fn test_tick_refreshes_last_sample() {
        let mut host = Probe::falling(500.0, -5.0);
        let mut t = tracker(&host);
        assert_eq!(t.launcher(), LauncherId(1));
        assert_eq!(t.entity(), EntityHandle(1));
        assert_eq!(t.last_update(), 0.0);

        host.velocity = DVec3::new(1.5, 0.0, -4.0);
        t.tick(1.0, &host, &RejectWater, &AirdropConfig::default());
        assert_eq!(t.last_update(), 1.0);
        assert_eq!(t.velocity(), DVec3::new(1.5, 0.0, -4.0));

        // A vanished entity leaves the last sample in place.
        host.alive = false;
        t.tick(3.0, &host, &RejectWater, &AirdropConfig::default());
        assert_eq!(t.last_update(), 1.0);
        assert_eq!(t.velocity(), DVec3::new(1.5, 0.0, -4.0));
        // Two seconds of drift from (0, 0) at 1.5 m/s east.
        let point = t.take_outcome().and_then(|o| o.point()).unwrap();
        assert!((point.x - 3.0).abs() < 1e-9);
        assert_eq!(LandingOutcome::Lost.point(), None);
    }

    #[test]
    fn test_no_prediction_polls_at_cadence() {
        let host = Probe::falling(500.0, -5.0);
        let mut t = tracker(&host);
        let step = t.tick(1.0, &host, &RejectWater, &AirdropConfig::default());
        assert_eq!(step, TrackerStep::Reschedule(2.0));
        assert_eq!(t.phase(), TrackerPhase::Tracking);
        // Probe: 2 × cadence × speed along the unit velocity.
        let (dir, max) = host.last_probe.get().unwrap();
        assert_eq!(dir, DVec3::NEG_Z);
        assert!((max - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_slow_unit_probe_is_floored() {
        let host = Probe::falling(500.0, -0.1);
        let mut t = tracker(&host);
        t.tick(1.0, &host, &RejectWater, &AirdropConfig::default());
        let (_, max) = host.last_probe.get().unwrap();
        assert!((max - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_far_impact_halves_delay() {
        let mut host = Probe::falling(30.0, -5.0);
        host.impact = Some(DVec3::new(0.0, 0.0, 0.0));
        let mut t = tracker(&host);
        // ETA = 30 / 5 = 6 s, next tick in 3 s.
        let step = t.tick(1.0, &host, &RejectWater, &AirdropConfig::default());
        assert_eq!(step, TrackerStep::Reschedule(4.0));
        assert_eq!(t.phase(), TrackerPhase::Predicting);
        assert!((t.next_delay() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_imminent_impact_defers_report_to_eta() {
        let mut host = Probe::falling(2.0, -5.0);
        host.impact = Some(DVec3::new(3.0, 4.0, 0.0));
        host.position = DVec3::new(3.0, 4.0, 2.0);
        let mut t = tracker(&host);
        let step = t.tick(10.0, &host, &RejectWater, &AirdropConfig::default());
        match step {
            TrackerStep::ReportAt(at) => assert!((at - 10.4).abs() < 1e-9),
            other => panic!("expected deferred report, got {other:?}"),
        }
        assert_eq!(t.phase(), TrackerPhase::Resolving);
        assert_eq!(t.outcome(), Some(LandingOutcome::Landed(DVec2::new(3.0, 4.0))));
    }

    #[test]
    fn test_water_landing_is_lost() {
        let mut host = Probe::falling(2.0, -5.0);
        host.impact = Some(DVec3::ZERO);
        host.surface = SurfaceType::Water;
        let mut t = tracker(&host);
        t.tick(1.0, &host, &RejectWater, &AirdropConfig::default());
        assert_eq!(t.take_outcome(), Some(LandingOutcome::Lost));
    }

    #[test]
    fn test_vanished_entity_dead_reckons() {
        let mut host = Probe::falling(100.0, -5.0);
        host.velocity = DVec3::new(2.0, 0.0, -5.0);
        let mut t = tracker(&host);
        host.alive = false;
        // 4 s since the initial sample: 8 m east of the release point.
        let step = t.tick(4.0, &host, &RejectWater, &AirdropConfig::default());
        assert_eq!(step, TrackerStep::ReportNow);
        assert_eq!(t.take_outcome(), Some(LandingOutcome::Landed(DVec2::new(8.0, 0.0))));
    }

    #[test]
    fn test_vanished_entity_keeps_last_prediction() {
        let mut host = Probe::falling(30.0, -5.0);
        host.impact = Some(DVec3::new(1.0, 1.0, 0.0));
        let mut t = tracker(&host);
        assert!(matches!(
            t.tick(1.0, &host, &RejectWater, &AirdropConfig::default()),
            TrackerStep::Reschedule(_)
        ));
        host.alive = false;
        assert_eq!(
            t.tick(4.0, &host, &RejectWater, &AirdropConfig::default()),
            TrackerStep::ReportNow
        );
        assert_eq!(t.take_outcome(), Some(LandingOutcome::Landed(DVec2::new(1.0, 1.0))));
    }

    #[test]
    fn test_resolves_only_once() {
        let mut host = Probe::falling(2.0, -5.0);
        host.impact = Some(DVec3::ZERO);
        let mut t = tracker(&host);
        let config = AirdropConfig::default();
        assert!(matches!(
            t.tick(1.0, &host, &RejectWater, &config),
            TrackerStep::ReportAt(_)
        ));
        assert_eq!(t.tick(1.2, &host, &RejectWater, &config), TrackerStep::Idle);
        assert!(t.take_outcome().is_some());
        assert!(t.take_outcome().is_none());
        assert_eq!(t.tick(2.0, &host, &RejectWater, &config), TrackerStep::Idle);
        assert_eq!(t.phase(), TrackerPhase::Resolved);
    }

    #[test]
    fn test_stationary_unit_resolves_immediately() {
        let mut host = Probe::falling(0.0, 0.0);
        host.impact = Some(DVec3::ZERO);
        let mut t = tracker(&host);
        assert_eq!(
            t.tick(3.0, &host, &RejectWater, &AirdropConfig::default()),
            TrackerStep::ReportAt(3.0)
        );
    }
}

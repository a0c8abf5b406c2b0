//! Airdrop registry: the entry point the host's event feed calls into.
//!
//! `Airdrops` routes released units to the open burst of their launcher,
//! owns the deferred-task queue that drives every tracker, and retires a
//! burst the moment its last unit reports.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, info};

use paradrop_core::config::AirdropConfig;
use paradrop_core::constants::FIRST_GENERATION;
use paradrop_core::events::{AirdropEvent, HostEvent};
use paradrop_core::types::{EntityHandle, FactionId, LauncherId, SimSeconds, TrackerId};

use crate::airdrop::{Airdrop, BurstContext, BurstStatus, BurstSummary};
use crate::host::SimHost;
use crate::landing::{validator_for, FixedUnitFactory, LandingSiteValidator, UnitFactory};
use crate::scheduler::{Scheduler, Task};
use crate::tracker::TrackerStep;

/// Process-wide airdrop state.
///
/// Outbound events and burst summaries accumulate until the caller takes
/// them with [`Airdrops::drain_events`] and [`Airdrops::drain_completed`].
/// Long-running hosts must drain both regularly; nothing is dropped on
/// their behalf.
pub struct Airdrops {
    config: AirdropConfig,
    bursts: HashMap<LauncherId, Airdrop>,
    /// Highest generation each launcher has reserved so far.
    generations: HashMap<LauncherId, u32>,
    scheduler: Scheduler,
    validator: Box<dyn LandingSiteValidator>,
    factory: Box<dyn UnitFactory>,
    /// Undrained outbound events.
    events: Vec<AirdropEvent>,
    next_tracker_id: u64,
    /// Undrained summaries of closed bursts.
    completed: Vec<BurstSummary>,
}

impl Airdrops {
    /// Create a registry with the strategies the config asks for.
    pub fn new(config: AirdropConfig) -> Self {
        Self {
            validator: validator_for(&config),
            factory: Box::new(FixedUnitFactory::from_config(&config)),
            config,
            bursts: HashMap::new(),
            generations: HashMap::new(),
            scheduler: Scheduler::new(),
            events: Vec::new(),
            next_tracker_id: 0,
            completed: Vec::new(),
        }
    }

    /// Replace the landing-site policy.
    pub fn with_validator(mut self, validator: impl LandingSiteValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Replace the unit factory.
    pub fn with_factory(mut self, factory: impl UnitFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        self
    }

    pub fn config(&self) -> &AirdropConfig {
        &self.config
    }

    /// Feed one host event. Returns true if it released a tracked unit.
    ///
    /// Only shots of the configured munition are routed. A shot whose weapon
    /// cannot be sampled is ignored without side effects.
    pub fn handle_event<H>(&mut self, event: &HostEvent, now: SimSeconds, host: &H) -> bool
    where
        H: SimHost + ?Sized,
    {
        let HostEvent::Shot {
            launcher,
            faction,
            weapon_type,
            weapon,
        } = event
        else {
            return false;
        };
        if *weapon_type != self.config.munition_type {
            return false;
        }
        self.release_unit(*launcher, *faction, *weapon, now, host)
            .is_some()
    }

    /// The open burst for `launcher`, opened if there is none.
    pub fn route_shot_event(&mut self, launcher: LauncherId, faction: FactionId) -> &mut Airdrop {
        match self.bursts.entry(launcher) {
            Entry::Occupied(slot) => {
                let airdrop = slot.into_mut();
                if airdrop.faction() != faction {
                    debug!(%launcher, %faction, "faction differs from open burst, keeping burst's");
                }
                airdrop
            }
            Entry::Vacant(slot) => {
                let first_generation = self
                    .generations
                    .get(&launcher)
                    .map_or(FIRST_GENERATION, |g| g + 1);
                info!(%launcher, %faction, "burst opened");
                self.events
                    .push(AirdropEvent::BurstOpened { launcher, faction });
                slot.insert(Airdrop::new(launcher, faction, first_generation))
            }
        }
    }

    /// Start tracking `weapon` as part of `launcher`'s burst and schedule
    /// its first tick one cadence from now.
    pub fn release_unit<H>(
        &mut self,
        launcher: LauncherId,
        faction: FactionId,
        weapon: EntityHandle,
        now: SimSeconds,
        host: &H,
    ) -> Option<TrackerId>
    where
        H: SimHost + ?Sized,
    {
        if !host.exists(weapon) {
            debug!(%launcher, ?weapon, "released unit already gone, ignored");
            return None;
        }
        let (position, velocity) = host.position(weapon).zip(host.velocity(weapon))?;

        let id = TrackerId(self.next_tracker_id);
        self.next_tracker_id += 1;
        debug!(%launcher, tracker = %id, unit_type = ?host.unit_type(weapon), "unit released");

        let cadence = self.config.cadence_secs;
        self.route_shot_event(launcher, faction)
            .add_unit(id, weapon, position, velocity, now, cadence);
        self.scheduler
            .schedule(now + cadence, Task::Tick { launcher, tracker: id });
        self.events.push(AirdropEvent::UnitReleased {
            launcher,
            tracker: id,
        });
        Some(id)
    }

    /// Run every task due at or before `now`.
    pub fn run_due<H: SimHost>(&mut self, now: SimSeconds, host: &mut H) {
        while let Some((_, task)) = self.scheduler.pop_due(now) {
            match task {
                Task::Tick { launcher, tracker } => self.run_tick(launcher, tracker, now, host),
                Task::Report { launcher, tracker } => self.deliver(launcher, tracker, host),
            }
        }
    }

    /// Run every task due at the host's current time.
    pub fn poll<H: SimHost>(&mut self, host: &mut H) {
        let now = host.now();
        self.run_due(now, host);
    }

    fn run_tick<H: SimHost>(
        &mut self,
        launcher: LauncherId,
        tracker: TrackerId,
        now: SimSeconds,
        host: &mut H,
    ) {
        let Some(airdrop) = self.bursts.get_mut(&launcher) else {
            return;
        };
        let step =
            airdrop.tick_tracker(tracker, now, &*host, self.validator.as_ref(), &self.config);
        match step {
            TrackerStep::Reschedule(at) => {
                self.scheduler.schedule(at, Task::Tick { launcher, tracker })
            }
            TrackerStep::ReportAt(at) => {
                self.scheduler.schedule(at, Task::Report { launcher, tracker })
            }
            TrackerStep::ReportNow => self.deliver(launcher, tracker, host),
            TrackerStep::Idle => {}
        }
    }

    /// Hand a resolved tracker's outcome to its burst.
    fn deliver<H: SimHost>(&mut self, launcher: LauncherId, tracker: TrackerId, host: &mut H) {
        let Some(airdrop) = self.bursts.get_mut(&launcher) else {
            return;
        };
        let Some(outcome) = airdrop.take_outcome(tracker) else {
            return;
        };
        let mut ctx = BurstContext {
            config: &self.config,
            factory: self.factory.as_ref(),
            events: &mut self.events,
        };
        let status = airdrop.report_landing(tracker, outcome, host, &mut ctx);
        if let BurstStatus::Complete(summary) = status {
            self.on_burst_complete(summary.launcher);
            self.completed.push(summary);
        }
    }

    /// Retire the burst for `launcher` and remember the generation it used.
    pub fn on_burst_complete(&mut self, launcher: LauncherId) -> Option<Airdrop> {
        let airdrop = self.bursts.remove(&launcher)?;
        if let Some(generation) = airdrop.last_generation() {
            let last = self.generations.entry(launcher).or_insert(generation);
            *last = (*last).max(generation);
        }
        debug!(%launcher, open = self.bursts.len(), "burst retired");
        Some(airdrop)
    }

    /// The open burst for `launcher`, if any.
    pub fn burst(&self, launcher: LauncherId) -> Option<&Airdrop> {
        self.bursts.get(&launcher)
    }

    /// Launchers with an open burst.
    pub fn open_bursts(&self) -> impl Iterator<Item = LauncherId> + '_ {
        self.bursts.keys().copied()
    }

    pub fn open_burst_count(&self) -> usize {
        self.bursts.len()
    }

    /// Highest generation `launcher` has reserved.
    pub fn last_generation(&self, launcher: LauncherId) -> Option<u32> {
        self.generations.get(&launcher).copied()
    }

    /// Due time of the next pending task.
    pub fn next_wake(&self) -> Option<SimSeconds> {
        self.scheduler.next_due()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Pending tasks naming `tracker`.
    pub fn pending_for(&self, tracker: TrackerId) -> usize {
        self.scheduler.pending_for(tracker)
    }

    /// Take the accumulated outbound events.
    pub fn drain_events(&mut self) -> Vec<AirdropEvent> {
        std::mem::take(&mut self.events)
    }

    /// Take the summaries of bursts completed since the last call.
    pub fn drain_completed(&mut self) -> Vec<BurstSummary> {
        std::mem::take(&mut self.completed)
    }
}

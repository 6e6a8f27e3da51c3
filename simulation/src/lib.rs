#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick driver wiring the world and the wave systems together.
//!
//! [`Simulation`] is the only owner of mutable state. Each call routes the
//! world's events through the systems in a fixed order and returns every
//! event produced, so hosts observe spawns, deaths, cap signals and wave
//! boundaries without reaching into any component.
//!
//! Within a tick the round controller runs first so a wave that begins this
//! tick resets admission and resumes the scheduler before dues are counted.
//! Each due is resolved to a spawn point, then admitted, then acquired from
//! the pool and registered. A death is unregistered and released by the
//! world, returned to admission, and only then evaluated for the end of the
//! wave. A wave that begins with nothing to admit is evaluated right after
//! admission was reset for it.

use std::time::Duration;

use holdout_core::{
    AdmissionView, Command, Event, SpawnAttempt, SpawnPoint, UnitId, WaveIndex, WaveSource,
};
use holdout_system_admission::Admission;
use holdout_system_rounds::{self as rounds, Rounds};
use holdout_system_spawning::{self as spawning, Spawning};
use holdout_world::{self as world, query, Factory, PoolConfig, Unit, UnitFactory, World};

const DEFAULT_TRANSITION: Duration = Duration::from_secs(5);
const DEFAULT_POOL_CAPACITY: usize = 10;
const DEFAULT_POOL_MAX_CAPACITY: usize = 1_000;

/// Configuration parameters required to construct a [`Simulation`].
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    participants: u32,
    transition: Duration,
    rng_seed: u64,
    spawn_points: Vec<SpawnPoint>,
    pool_capacity: usize,
    pool_max_capacity: usize,
    destroy_excess: bool,
    strict_release: bool,
}

impl SimulationConfig {
    /// Creates a configuration for `participants` players with default tuning.
    #[must_use]
    pub fn new(participants: u32) -> Self {
        Self {
            participants,
            transition: DEFAULT_TRANSITION,
            rng_seed: 0,
            spawn_points: Vec::new(),
            pool_capacity: DEFAULT_POOL_CAPACITY,
            pool_max_capacity: DEFAULT_POOL_MAX_CAPACITY,
            destroy_excess: true,
            strict_release: true,
        }
    }

    /// Sets the delay between a wave ending and the next one beginning.
    #[must_use]
    pub fn with_transition(mut self, transition: Duration) -> Self {
        self.transition = transition;
        self
    }

    /// Sets the seed used for spawn point selection.
    #[must_use]
    pub fn with_seed(mut self, rng_seed: u64) -> Self {
        self.rng_seed = rng_seed;
        self
    }

    /// Sets the spawn points configured on the world at start-up.
    #[must_use]
    pub fn with_spawn_points(mut self, spawn_points: Vec<SpawnPoint>) -> Self {
        self.spawn_points = spawn_points;
        self
    }

    /// Sets the prewarmed and maximum retained pool sizes.
    #[must_use]
    pub fn with_pool_capacity(mut self, default_capacity: usize, max_capacity: usize) -> Self {
        self.pool_capacity = default_capacity;
        self.pool_max_capacity = max_capacity;
        self
    }

    /// Enables or disables destroying released units beyond the maximum.
    #[must_use]
    pub fn with_destroy_excess(mut self, enabled: bool) -> Self {
        self.destroy_excess = enabled;
        self
    }

    /// Enables or disables rejecting double releases.
    #[must_use]
    pub fn with_strict_release(mut self, enabled: bool) -> Self {
        self.strict_release = enabled;
        self
    }

    fn pool_config(&self) -> PoolConfig<Box<dyn Factory<Unit>>> {
        let factory: Box<dyn Factory<Unit>> = Box::new(UnitFactory);
        PoolConfig::new(factory)
            .with_default_capacity(self.pool_capacity)
            .with_max_capacity(self.pool_max_capacity)
            .with_destroy_excess(self.destroy_excess)
            .with_strict_release(self.strict_release)
    }
}

/// Owns the world and systems and advances them in a deterministic order.
#[derive(Debug)]
pub struct Simulation<C> {
    world: World,
    admission: Admission,
    spawning: Spawning,
    rounds: Rounds,
    curve: C,
}

impl<C: WaveSource> Simulation<C> {
    /// Builds the simulation and arms the transition into the first wave.
    #[must_use]
    pub fn new(config: SimulationConfig, curve: C) -> Self {
        let mut world = World::with_pool_config(config.pool_config());
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::ConfigureSpawnPoints {
                points: config.spawn_points,
            },
            &mut events,
        );

        let mut simulation = Self {
            world,
            admission: Admission::new(config.participants.max(1)),
            spawning: Spawning::new(spawning::Config::new(config.rng_seed)),
            rounds: Rounds::new(rounds::Config::new(config.transition)),
            curve,
        };
        let _ = simulation.on_enable();
        simulation
    }

    /// Advances simulated time by `dt` and returns every event produced.
    pub fn advance(&mut self, dt: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        let mut round_events = Vec::new();
        self.rounds
            .handle(&events, self.admission.view(), &mut round_events);
        self.admission.handle(&round_events, &self.curve);
        let mut follow_up = Vec::new();
        self.rounds
            .handle(&round_events, self.admission.view(), &mut follow_up);
        events.extend(round_events);
        events.extend(follow_up);

        let mut attempts = Vec::new();
        let mut spawn_events = Vec::new();
        self.spawning.handle(
            &events,
            &self.curve,
            query::spawn_points(&self.world),
            &mut attempts,
            &mut spawn_events,
        );
        events.extend(spawn_events);

        for attempt in attempts {
            self.admit(attempt, &mut events);
        }
        events
    }

    /// Reports that `unit` died and returns every event produced.
    ///
    /// Deaths of identifiers that are not registered are ignored.
    pub fn report_death(&mut self, unit: UnitId) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::ReportDeath { unit }, &mut events);
        if events.is_empty() {
            return events;
        }

        self.admission.handle(&events, &self.curve);

        let mut round_events = Vec::new();
        self.rounds
            .handle(&events, self.admission.view(), &mut round_events);

        let mut attempts = Vec::new();
        let mut spawn_events = Vec::new();
        self.spawning.handle(
            &round_events,
            &self.curve,
            query::spawn_points(&self.world),
            &mut attempts,
            &mut spawn_events,
        );
        debug_assert!(attempts.is_empty(), "deaths never advance time");

        events.extend(round_events);
        events.extend(spawn_events);
        events
    }

    /// Replaces the world's spawn points.
    pub fn configure_spawn_points(&mut self, points: Vec<SpawnPoint>) {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::ConfigureSpawnPoints { points },
            &mut events,
        );
    }

    /// Resumes a suspended wave, or arms a fresh transition into the current
    /// wave if the rounds are pending, and returns every event produced.
    ///
    /// A resumed wave keeps its admission counters, so units that stayed
    /// alive while disabled still occupy their concurrent slots.
    pub fn on_enable(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        self.rounds.on_enable();
        if !self.rounds.is_active() {
            return events;
        }

        self.spawning.resume();
        self.rounds
            .check_wave_end(self.admission.view(), &mut events);

        let mut attempts = Vec::new();
        self.spawning.handle(
            &events,
            &self.curve,
            query::spawn_points(&self.world),
            &mut attempts,
            &mut Vec::new(),
        );
        debug_assert!(attempts.is_empty(), "enabling never advances time");
        events
    }

    /// Suspends the current wave and spawning, and drops any pending wave begin.
    pub fn on_disable(&mut self) {
        self.rounds.on_disable();
        self.spawning.pause();
    }

    /// Read access to the authoritative world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Wave that is active, or about to begin.
    #[must_use]
    pub const fn wave(&self) -> WaveIndex {
        self.rounds.wave()
    }

    /// Reports whether the current wave admits units.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.rounds.is_active()
    }

    /// Lifecycle phase of the round controller.
    #[must_use]
    pub const fn rounds_phase(&self) -> rounds::Phase {
        self.rounds.phase()
    }

    /// Lifecycle phase of the spawn scheduler.
    #[must_use]
    pub const fn spawning_phase(&self) -> spawning::Phase {
        self.spawning.phase()
    }

    /// Snapshot of the admission counters.
    #[must_use]
    pub const fn admission(&self) -> AdmissionView {
        self.admission.view()
    }

    /// Identifiers of every live unit in ascending order.
    #[must_use]
    pub fn live_units(&self) -> Vec<UnitId> {
        query::registry(&self.world).iter().map(|(id, _)| id).collect()
    }

    /// Wave configuration source driving caps and cadence.
    #[must_use]
    pub const fn curve(&self) -> &C {
        &self.curve
    }

    fn admit(&mut self, attempt: SpawnAttempt, events: &mut Vec<Event>) {
        if !self.rounds.is_active() || query::is_inert(&self.world) {
            return;
        }

        if !self.admission.try_admit(events).is_granted() {
            return;
        }

        let before = events.len();
        world::apply(
            &mut self.world,
            Command::SpawnUnit {
                point: attempt.point,
                wave: self.rounds.wave(),
            },
            events,
        );
        let spawned = events[before..]
            .iter()
            .any(|event| matches!(event, Event::UnitSpawned { .. }));
        if !spawned {
            tracing::warn!("admitted unit was not spawned; revoking its admission");
            self.admission.revoke();
        }
    }
}

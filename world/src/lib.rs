#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Holdout.
//!
//! The world owns the unit pool and the registry that indexes live units.
//! Both are only mutated through [`apply`], which keeps acquisition paired
//! with registration and unregistration paired with release.

pub mod pool;
pub mod registry;

use std::time::Duration;

use holdout_core::{
    Command, ConfigurationError, Event, SpawnPoint, Transform, UnitId, WaveIndex,
};

pub use pool::{Factory, Pool, PoolConfig, PoolError, PoolHandle, PoolStats, Poolable};
pub use registry::Registry;

/// Pool specialised for simulation units.
pub type UnitPool = Pool<Unit, Box<dyn Factory<Unit>>>;

/// A pooled hostile unit.
#[derive(Clone, Debug)]
pub struct Unit {
    id: Option<UnitId>,
    wave: WaveIndex,
    transform: Transform,
    activations: u32,
}

impl Unit {
    fn assign(&mut self, id: UnitId, wave: WaveIndex) {
        self.id = Some(id);
        self.wave = wave;
    }

    /// Identifier of the unit while it is alive.
    #[must_use]
    pub const fn id(&self) -> Option<UnitId> {
        self.id
    }

    /// Wave the unit was admitted for.
    #[must_use]
    pub const fn wave(&self) -> WaveIndex {
        self.wave
    }

    /// Transform applied when the unit was last acquired.
    #[must_use]
    pub const fn transform(&self) -> Transform {
        self.transform
    }

    /// Number of times this instance has been handed out.
    #[must_use]
    pub const fn activations(&self) -> u32 {
        self.activations
    }
}

impl Poolable for Unit {
    fn place(&mut self, transform: Transform) {
        self.transform = transform;
        self.activations = self.activations.saturating_add(1);
    }

    fn deactivate(&mut self) {
        self.id = None;
    }
}

/// Factory producing blank units.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnitFactory;

impl Factory<Unit> for UnitFactory {
    fn create(&mut self) -> Unit {
        Unit {
            id: None,
            wave: WaveIndex::FIRST,
            transform: Transform::IDENTITY,
            activations: 0,
        }
    }
}

/// Represents the authoritative Holdout world state.
#[derive(Debug)]
pub struct World {
    pool: Option<UnitPool>,
    configuration_error: Option<ConfigurationError>,
    registry: Registry<PoolHandle>,
    spawn_points: Vec<SpawnPoint>,
    next_unit: u32,
    tick_index: u64,
    elapsed: Duration,
}

impl World {
    /// Creates a world whose pool uses [`UnitFactory`] and default capacities.
    #[must_use]
    pub fn new() -> Self {
        let factory: Box<dyn Factory<Unit>> = Box::new(UnitFactory);
        Self::with_pool_config(PoolConfig::new(factory))
    }

    /// Creates a world from an explicit pool configuration.
    ///
    /// An invalid configuration is logged once and leaves the world inert:
    /// spawn commands are ignored instead of failing individually.
    #[must_use]
    pub fn with_pool_config(config: PoolConfig<Box<dyn Factory<Unit>>>) -> Self {
        let (pool, configuration_error) = match Pool::from_config(config) {
            Ok(pool) => (Some(pool), None),
            Err(error) => {
                tracing::error!(%error, "unit pool misconfigured; world is inert");
                (None, Some(error))
            }
        };
        Self {
            pool,
            configuration_error,
            registry: Registry::new(),
            spawn_points: Vec::new(),
            next_unit: 0,
            tick_index: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn spawn_unit(&mut self, point: SpawnPoint, wave: WaveIndex, out_events: &mut Vec<Event>) {
        let Some(pool) = self.pool.as_mut() else {
            return;
        };
        let id = UnitId::new(self.next_unit);
        self.next_unit = self.next_unit.wrapping_add(1);

        let handle = pool.acquire(point.transform());
        if !self.registry.register(id, handle) {
            if let Err(error) = pool.release(handle) {
                tracing::warn!(%error, "failed to return unregistered unit to pool");
            }
            return;
        }
        if let Some(unit) = pool.get_mut(handle) {
            unit.assign(id, wave);
        }

        out_events.push(Event::UnitSpawned {
            unit: id,
            wave,
            position: point.position(),
        });
    }

    fn retire_unit(&mut self, unit: UnitId, out_events: &mut Vec<Event>) {
        let handle = self.registry.lookup(unit);
        if !self.registry.unregister(unit) {
            return;
        }

        if let (Some(pool), Some(handle)) = (self.pool.as_mut(), handle) {
            if let Err(error) = pool.release(handle) {
                tracing::warn!(%error, unit = unit.get(), "pool rejected release");
            }
        }

        out_events.push(Event::UnitDied { unit });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::ConfigureSpawnPoints { points } => {
            tracing::debug!(count = points.len(), "spawn points configured");
            world.spawn_points = points;
        }
        Command::SpawnUnit { point, wave } => world.spawn_unit(point, wave, out_events),
        Command::ReportDeath { unit } => world.retire_unit(unit, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{PoolHandle, PoolStats, Registry, World};
    use holdout_core::{ConfigurationError, SpawnPoint, Transform, UnitId, WaveIndex};

    /// Locations units may currently enter from.
    #[must_use]
    pub fn spawn_points(world: &World) -> &[SpawnPoint] {
        &world.spawn_points
    }

    /// Read access to the live-unit registry.
    #[must_use]
    pub fn registry(world: &World) -> &Registry<PoolHandle> {
        &world.registry
    }

    /// Resolves a live unit by identifier.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<UnitSnapshot> {
        let handle = world.registry.lookup(id)?;
        snapshot(world, id, handle)
    }

    /// Captures a read-only view of every live unit.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        let snapshots = world
            .registry
            .iter()
            .filter_map(|(id, handle)| snapshot(world, id, handle))
            .collect();
        UnitView { snapshots }
    }

    /// Number of pooled instances currently in use.
    #[must_use]
    pub fn active_count(world: &World) -> usize {
        world.pool.as_ref().map_or(0, |pool| pool.active_count())
    }

    /// Number of pooled instances waiting for reuse.
    #[must_use]
    pub fn inactive_count(world: &World) -> usize {
        world.pool.as_ref().map_or(0, |pool| pool.inactive_count())
    }

    /// Lifetime pool counters, if the pool was configured successfully.
    #[must_use]
    pub fn pool_stats(world: &World) -> Option<PoolStats> {
        world.pool.as_ref().map(|pool| pool.stats())
    }

    /// Reports whether the world refused its configuration and ignores spawns.
    #[must_use]
    pub fn is_inert(world: &World) -> bool {
        world.pool.is_none()
    }

    /// Configuration problem that made the world inert, if any.
    #[must_use]
    pub fn configuration_error(world: &World) -> Option<&ConfigurationError> {
        world.configuration_error.as_ref()
    }

    /// Total simulated time observed through ticks.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    fn snapshot(world: &World, id: UnitId, handle: PoolHandle) -> Option<UnitSnapshot> {
        let unit = world.pool.as_ref()?.get(handle)?;
        Some(UnitSnapshot {
            id,
            handle,
            wave: unit.wave(),
            transform: unit.transform(),
        })
    }

    /// Read-only snapshot describing all live units.
    #[derive(Clone, Debug, Default)]
    pub struct UnitView {
        snapshots: Vec<UnitSnapshot>,
    }

    impl UnitView {
        /// Iterator over the captured snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
            self.snapshots.iter()
        }

        /// Number of captured units.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether no unit is alive.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<UnitSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single live unit.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct UnitSnapshot {
        /// Identifier assigned to the unit.
        pub id: UnitId,
        /// Pool handle backing the unit.
        pub handle: PoolHandle,
        /// Wave the unit was admitted for.
        pub wave: WaveIndex,
        /// Transform applied when the unit spawned.
        pub transform: Transform,
    }
}

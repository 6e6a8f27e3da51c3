//! Fixed-capacity pool of reusable unit instances.
//!
//! Instances live in an arena of slots addressed by generational
//! [`PoolHandle`] values. A slot is either active (handed out by
//! [`Pool::acquire`]), free (constructed and waiting for reuse) or vacant
//! (its instance was destroyed and the slot awaits a new construction).
//! A slot index is never present in more than one of those sets.

use std::fmt;

use holdout_core::{ConfigurationError, Transform};
use thiserror::Error;

const DEFAULT_CAPACITY: usize = 10;
const DEFAULT_MAX_CAPACITY: usize = 1_000;

/// Hooks a pooled type exposes to the pool.
pub trait Poolable {
    /// Resets the instance's transform before it is handed out.
    fn place(&mut self, transform: Transform);

    /// Called when the instance returns to the free set.
    fn deactivate(&mut self) {}
}

/// Constructs new instances of the pooled type.
pub trait Factory<T> {
    /// Builds a fresh, inactive instance.
    fn create(&mut self) -> T;
}

impl<T, F: Factory<T> + ?Sized> Factory<T> for Box<F> {
    fn create(&mut self) -> T {
        (**self).create()
    }
}

/// Construction parameters for a [`Pool`].
pub struct PoolConfig<F> {
    factory: Option<F>,
    default_capacity: usize,
    max_capacity: usize,
    destroy_excess: bool,
    strict_release: bool,
}

impl<F> PoolConfig<F> {
    /// Creates a configuration backed by `factory` with default capacities.
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory: Some(factory),
            ..Self::without_factory()
        }
    }

    /// Creates a configuration with no factory; building a pool from it fails.
    #[must_use]
    pub fn without_factory() -> Self {
        Self {
            factory: None,
            default_capacity: DEFAULT_CAPACITY,
            max_capacity: DEFAULT_MAX_CAPACITY,
            destroy_excess: true,
            strict_release: true,
        }
    }

    /// Number of instances constructed up front.
    #[must_use]
    pub fn with_default_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = capacity;
        self
    }

    /// Number of free instances retained before released ones are destroyed.
    #[must_use]
    pub fn with_max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Whether released instances above the maximum are destroyed.
    #[must_use]
    pub fn with_destroy_excess(mut self, enabled: bool) -> Self {
        self.destroy_excess = enabled;
        self
    }

    /// Whether releasing an already released handle is rejected.
    #[must_use]
    pub fn with_strict_release(mut self, enabled: bool) -> Self {
        self.strict_release = enabled;
        self
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.factory.is_none() {
            return Err(ConfigurationError::MissingFactory);
        }
        if self.default_capacity == 0 || self.max_capacity == 0 {
            return Err(ConfigurationError::ZeroCapacity {
                default_capacity: self.default_capacity,
                max_capacity: self.max_capacity,
            });
        }
        if self.default_capacity > self.max_capacity {
            return Err(ConfigurationError::DefaultExceedsMaximum {
                default_capacity: self.default_capacity,
                max_capacity: self.max_capacity,
            });
        }
        Ok(())
    }
}

impl<F> fmt::Debug for PoolConfig<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("factory", &self.factory.is_some())
            .field("default_capacity", &self.default_capacity)
            .field("max_capacity", &self.max_capacity)
            .field("destroy_excess", &self.destroy_excess)
            .field("strict_release", &self.strict_release)
            .finish()
    }
}

/// Generational reference to a pooled instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolHandle {
    index: usize,
    generation: u32,
}

impl PoolHandle {
    /// Arena slot the handle points at.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Generation of the slot when the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Errors reported when returning an instance to the pool.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The handle was already released, or its slot has been reissued since.
    #[error("handle {0:?} was already released")]
    DoubleRelease(PoolHandle),
    /// The handle does not address a live slot of this pool.
    #[error("handle {0:?} does not belong to this pool")]
    UnknownHandle(PoolHandle),
}

/// Lifetime counters for a pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances constructed by the factory.
    pub created: u64,
    /// Instances dropped because the free set was full.
    pub destroyed: u64,
    /// Successful acquisitions.
    pub acquired: u64,
    /// Successful releases.
    pub released: u64,
}

struct PoolSlot<T> {
    instance: Option<T>,
    active: bool,
    generation: u32,
}

/// Arena-backed pool that owns every instance it hands out.
pub struct Pool<T, F> {
    factory: F,
    slots: Vec<PoolSlot<T>>,
    free: Vec<usize>,
    vacant: Vec<usize>,
    active: usize,
    max_capacity: usize,
    destroy_excess: bool,
    strict_release: bool,
    stats: PoolStats,
}

impl<T, F> Pool<T, F>
where
    T: Poolable,
    F: Factory<T>,
{
    /// Builds a pool and constructs `default_capacity` inactive instances.
    pub fn from_config(config: PoolConfig<F>) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let PoolConfig {
            factory,
            default_capacity,
            max_capacity,
            destroy_excess,
            strict_release,
        } = config;
        let factory = factory.ok_or(ConfigurationError::MissingFactory)?;

        let mut pool = Self {
            factory,
            slots: Vec::with_capacity(default_capacity),
            free: Vec::with_capacity(default_capacity),
            vacant: Vec::new(),
            active: 0,
            max_capacity,
            destroy_excess,
            strict_release,
            stats: PoolStats::default(),
        };
        for _ in 0..default_capacity {
            let index = pool.construct();
            pool.free.push(index);
        }
        Ok(pool)
    }

    /// Hands out an instance placed at `transform`, constructing one if none is free.
    pub fn acquire(&mut self, transform: Transform) -> PoolHandle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => self.construct(),
        };

        let slot = &mut self.slots[index];
        slot.active = true;
        if let Some(instance) = slot.instance.as_mut() {
            instance.place(transform);
        }
        self.active += 1;
        self.stats.acquired += 1;

        PoolHandle {
            index,
            generation: slot.generation,
        }
    }

    /// Returns an instance to the free set, or destroys it when the free set is full.
    ///
    /// With strict checking disabled a stale handle whose slot was already
    /// reissued releases the new occupant. Callers that cannot guarantee
    /// single release must keep strict checking on.
    pub fn release(&mut self, handle: PoolHandle) -> Result<(), PoolError> {
        let index = handle.index;
        let Some(slot) = self.slots.get_mut(index) else {
            return Err(PoolError::UnknownHandle(handle));
        };

        // Vacant slots are never active, so a handle to a destroyed instance
        // is reported like any other repeated release.
        if self.strict_release {
            if !slot.active || slot.generation != handle.generation {
                return Err(PoolError::DoubleRelease(handle));
            }
        } else if !slot.active {
            tracing::debug!(?handle, "ignoring release of inactive pool slot");
            return Ok(());
        }

        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        if let Some(instance) = slot.instance.as_mut() {
            instance.deactivate();
        }
        self.active -= 1;
        self.stats.released += 1;

        if self.destroy_excess && self.free.len() >= self.max_capacity {
            slot.instance = None;
            self.vacant.push(index);
            self.stats.destroyed += 1;
        } else {
            self.free.push(index);
        }
        Ok(())
    }

    /// Destroys every free instance, keeping active ones untouched.
    pub fn clear_inactive(&mut self) {
        for index in self.free.drain(..) {
            self.slots[index].instance = None;
            self.vacant.push(index);
            self.stats.destroyed += 1;
        }
    }

    /// Resolves a handle to its instance while the handle is current.
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.active && slot.generation == handle.generation)
            .and_then(|slot| slot.instance.as_ref())
    }

    /// Resolves a handle to its instance mutably while the handle is current.
    #[must_use]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.active && slot.generation == handle.generation)
            .and_then(|slot| slot.instance.as_mut())
    }

    /// Number of instances currently handed out.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Number of constructed instances waiting for reuse.
    #[must_use]
    pub fn inactive_count(&self) -> usize {
        self.free.len()
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    fn construct(&mut self) -> usize {
        let instance = self.factory.create();
        self.stats.created += 1;
        if let Some(index) = self.vacant.pop() {
            self.slots[index].instance = Some(instance);
            return index;
        }
        self.slots.push(PoolSlot {
            instance: Some(instance),
            active: false,
            generation: 0,
        });
        self.slots.len() - 1
    }
}

impl<T, F> fmt::Debug for Pool<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("slots", &self.slots.len())
            .field("active", &self.active)
            .field("inactive", &self.free.len())
            .field("max_capacity", &self.max_capacity)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

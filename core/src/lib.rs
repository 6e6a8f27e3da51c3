#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Holdout wave engine.
//!
//! This crate defines the message surface that connects the simulation driver,
//! the authoritative world, and pure systems. Drivers submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond with new events or spawn attempts. No system mutates
//! another system's counters directly.

use std::time::Duration;

use glam::{Quat, Vec3};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Replaces the set of locations units may enter the simulation from.
    ConfigureSpawnPoints {
        /// Spawn points available from now on, in selection order.
        points: Vec<SpawnPoint>,
    },
    /// Requests that an admitted unit be taken from the pool and placed at `point`.
    SpawnUnit {
        /// Location resolved for the unit before admission was granted.
        point: SpawnPoint,
        /// Wave the unit was admitted for.
        wave: WaveIndex,
    },
    /// Reports that a unit's health collaborator declared it dead.
    ReportDeath {
        /// Identifier of the unit that died.
        unit: UnitId,
    },
}

/// Events broadcast by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a unit was taken from the pool and registered.
    UnitSpawned {
        /// Identifier assigned to the newly spawned unit.
        unit: UnitId,
        /// Wave the unit was admitted for.
        wave: WaveIndex,
        /// Position the unit was placed at.
        position: Vec3,
    },
    /// Forwards a death after the unit was unregistered and returned to the pool.
    UnitDied {
        /// Identifier of the unit that died.
        unit: UnitId,
    },
    /// Reports that a due spawn was skipped because no spawn point was available.
    SpawnPointUnavailable,
    /// Edge-triggered signal raised when the concurrent cap starts denying spawns.
    ConcurrentCapReached {
        /// Wave whose concurrent cap was reached.
        wave: WaveIndex,
    },
    /// Edge-triggered signal raised when the wave's total budget is spent.
    TotalCapReached {
        /// Wave whose total cap was reached.
        wave: WaveIndex,
    },
    /// Announces that a wave became active and spawning may resume.
    WaveBegan {
        /// Index of the wave that began.
        wave: WaveIndex,
    },
    /// Announces that a wave ended and the transition timer started.
    WaveEnded {
        /// Index of the wave that ended.
        wave: WaveIndex,
    },
}

/// Unique identifier assigned to a unit when it is admitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-based index of a wave. Values below one are raised to one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaveIndex(u32);

impl WaveIndex {
    /// The wave every simulation starts with.
    pub const FIRST: Self = Self(1);

    /// Creates a wave index, clamping zero to the first wave.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        if value == 0 {
            Self::FIRST
        } else {
            Self(value)
        }
    }

    /// Retrieves the numeric wave number.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the wave following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Position, rotation and scale applied to a pooled unit when it is acquired.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World-space position.
    pub position: Vec3,
    /// World-space orientation.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// Transform at the origin with no rotation and unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Creates a transform with unit scale.
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Returns the transform with the provided scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Location and facing a unit enters the simulation with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPoint {
    position: Vec3,
    rotation: Quat,
}

impl SpawnPoint {
    /// Creates a new spawn point.
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Creates a spawn point facing the default direction.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// World-space position of the spawn point.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Orientation applied to units entering here.
    #[must_use]
    pub const fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Transform a unit receives when spawned at this point.
    #[must_use]
    pub const fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation)
    }
}

/// A due spawn whose location has already been resolved, awaiting admission.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnAttempt {
    /// Location resolved for the attempt.
    pub point: SpawnPoint,
}

/// Outcome of asking the admission controller for one more unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdmissionDecision {
    /// The unit may enter; both counters were decremented.
    Granted,
    /// The unit may not enter right now.
    Denied(DenialReason),
}

impl AdmissionDecision {
    /// Reports whether the decision permits a spawn.
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Cap that caused an admission request to be denied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DenialReason {
    /// Too many units are alive at once.
    ConcurrentCap,
    /// The wave's total budget is spent.
    TotalCap,
}

/// Read-only snapshot of the admission controller's counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AdmissionView {
    /// Wave the caps were computed for.
    pub wave: WaveIndex,
    /// Concurrent cap for the wave.
    pub max_concurrent: u32,
    /// Total cap for the wave.
    pub max_total: u32,
    /// Units that may still be alive simultaneously.
    pub remaining_concurrent: u32,
    /// Units that may still be admitted this wave.
    pub remaining_total: u32,
}

impl AdmissionView {
    /// Number of admitted units that have not been released yet.
    #[must_use]
    pub const fn alive(&self) -> u32 {
        self.max_concurrent.saturating_sub(self.remaining_concurrent)
    }

    /// Number of units admitted so far this wave.
    #[must_use]
    pub const fn admitted(&self) -> u32 {
        self.max_total.saturating_sub(self.remaining_total)
    }

    /// Reports whether the wave's total budget is spent.
    #[must_use]
    pub const fn total_exhausted(&self) -> bool {
        self.remaining_total == 0
    }
}

/// Read-only source of wave-derived caps and cadence.
///
/// Implementations must be pure functions of their arguments so that systems
/// recomputing caps at different times agree with each other.
pub trait WaveSource {
    /// Maximum number of units alive at once during `wave`.
    fn max_concurrent(&self, wave: WaveIndex) -> u32;

    /// Maximum number of units admitted over the whole of `wave`.
    fn max_total(&self, wave: WaveIndex, participants: u32) -> u32;

    /// Time between spawn attempts during `wave`.
    fn interval(&self, wave: WaveIndex) -> Duration;
}

impl<T: WaveSource + ?Sized> WaveSource for &T {
    fn max_concurrent(&self, wave: WaveIndex) -> u32 {
        (**self).max_concurrent(wave)
    }

    fn max_total(&self, wave: WaveIndex, participants: u32) -> u32 {
        (**self).max_total(wave, participants)
    }

    fn interval(&self, wave: WaveIndex) -> Duration {
        (**self).interval(wave)
    }
}

/// Fatal problems detected while initialising a subsystem.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No factory was supplied for the pooled type.
    #[error("pool factory is not set")]
    MissingFactory,
    /// A capacity was configured as zero.
    #[error("pool capacities must be at least one (default {default_capacity}, maximum {max_capacity})")]
    ZeroCapacity {
        /// Configured default capacity.
        default_capacity: usize,
        /// Configured maximum capacity.
        max_capacity: usize,
    },
    /// The default capacity exceeds the maximum capacity.
    #[error("pool default capacity {default_capacity} exceeds maximum {max_capacity}")]
    DefaultExceedsMaximum {
        /// Configured default capacity.
        default_capacity: usize,
        /// Configured maximum capacity.
        max_capacity: usize,
    },
}

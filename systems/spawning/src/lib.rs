#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawn scheduler responsible for emitting spawn attempts.
//!
//! The scheduler accumulates simulated time and raises one "due" for every
//! full interval, carrying the overshoot forward so the long-run cadence
//! matches the interval regardless of how ticks are partitioned. Each due is
//! resolved to a spawn point before it leaves the scheduler; admission is
//! decided downstream.

use std::time::Duration;

use holdout_core::{Event, SpawnAttempt, SpawnPoint, WaveSource};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided spawn point selection seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Lifecycle of the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No wave has started since construction or the last reset.
    Idle,
    /// Time is being accumulated towards the next due.
    Accumulating,
    /// Accumulation is suspended; the carried remainder is preserved.
    Paused,
}

/// Pure system that turns elapsed time into spawn attempts.
#[derive(Debug)]
pub struct Spawning {
    interval: Duration,
    accumulator: Duration,
    phase: Phase,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            interval: Duration::ZERO,
            accumulator: Duration::ZERO,
            phase: Phase::Idle,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Interval used at the next due evaluation.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Time carried towards the next due.
    #[must_use]
    pub const fn accumulator(&self) -> Duration {
        self.accumulator
    }

    /// Replaces the interval. The accumulator is left untouched.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Suspends accumulation without discarding the remainder.
    pub fn pause(&mut self) {
        if self.phase == Phase::Accumulating {
            self.phase = Phase::Paused;
        }
    }

    /// Starts or continues accumulating.
    pub fn resume(&mut self) {
        self.phase = Phase::Accumulating;
    }

    /// Discards the remainder and returns to [`Phase::Idle`].
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.phase = Phase::Idle;
    }

    /// Accumulates `dt` and returns how many dues became ready.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if self.phase != Phase::Accumulating || self.interval.is_zero() {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        self.resolve_due_count()
    }

    /// Consumes events and the current spawn points to emit spawn attempts.
    ///
    /// Events are processed in order: a wave beginning adopts the wave's
    /// interval and resumes accumulation, a wave ending pauses it, and time
    /// advancing may raise dues. A due with no spawn point available is
    /// skipped and reported through `out_events`.
    pub fn handle<C: WaveSource>(
        &mut self,
        events: &[Event],
        curve: &C,
        spawn_points: &[SpawnPoint],
        out: &mut Vec<SpawnAttempt>,
        out_events: &mut Vec<Event>,
    ) {
        for event in events {
            match event {
                Event::WaveBegan { wave } => {
                    self.set_interval(curve.interval(*wave));
                    self.resume();
                }
                Event::WaveEnded { .. } => self.pause(),
                Event::TimeAdvanced { dt } => {
                    for _ in 0..self.advance(*dt) {
                        match self.select_spawn_point(spawn_points) {
                            Some(point) => out.push(SpawnAttempt { point }),
                            None => {
                                tracing::debug!("spawn due skipped: no spawn point available");
                                out_events.push(Event::SpawnPointUnavailable);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn resolve_due_count(&mut self) -> u32 {
        if self.interval.is_zero() {
            return 0;
        }

        let mut dues = 0;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            dues += 1;
        }
        dues
    }

    fn select_spawn_point(&mut self, spawn_points: &[SpawnPoint]) -> Option<SpawnPoint> {
        if spawn_points.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..spawn_points.len());
        spawn_points.get(index).copied()
    }
}

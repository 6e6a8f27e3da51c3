#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round controller that owns the wave index and its timed transitions.
//!
//! A wave ends on the death that leaves the wave's total budget spent and no
//! admitted unit alive. The controller reads the admission counters after
//! that death was released, so the unit whose death triggers the check is
//! no longer counted and no tolerance window is needed. The following wave
//! becomes active once the configured transition time has been observed
//! through [`Event::TimeAdvanced`].
//!
//! Disabling an active wave suspends it rather than abandoning it: the wave
//! index and its admission state are kept, and enabling again resumes the
//! same wave without a second [`Event::WaveBegan`].

use std::time::Duration;

use holdout_core::{AdmissionView, Event, WaveIndex};

/// Configuration parameters required to construct the round controller.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    transition: Duration,
}

impl Config {
    /// Creates a new configuration using the provided transition duration.
    #[must_use]
    pub const fn new(transition: Duration) -> Self {
        Self { transition }
    }
}

/// Lifecycle of the current wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// The controller is disabled; no transition is scheduled.
    Pending,
    /// Waiting for the transition to elapse before the wave begins.
    Transitioning {
        /// Simulated time left before the wave begins.
        remaining: Duration,
    },
    /// The wave is running and admitting units.
    Active,
    /// The wave began but the controller is disabled; nothing is admitted.
    Suspended,
}

/// Pure system sequencing waves.
#[derive(Debug)]
pub struct Rounds {
    transition: Duration,
    wave: WaveIndex,
    phase: Phase,
}

impl Rounds {
    /// Creates a disabled controller waiting to start the first wave.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            transition: config.transition,
            wave: WaveIndex::FIRST,
            phase: Phase::Pending,
        }
    }

    /// Wave that is active, or about to begin when transitioning.
    #[must_use]
    pub const fn wave(&self) -> WaveIndex {
        self.wave
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Reports whether the current wave admits units.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active)
    }

    /// Resumes a suspended wave, or starts a fresh transition towards the
    /// current wave when none is scheduled.
    pub fn on_enable(&mut self) {
        match self.phase {
            Phase::Pending => {
                tracing::debug!(wave = self.wave.get(), "wave transition armed");
                self.phase = Phase::Transitioning {
                    remaining: self.transition,
                };
            }
            Phase::Suspended => {
                tracing::info!(wave = self.wave.get(), "wave resumed");
                self.phase = Phase::Active;
            }
            Phase::Transitioning { .. } | Phase::Active => {}
        }
    }

    /// Suspends an active wave and drops any pending wave begin.
    pub fn on_disable(&mut self) {
        match self.phase {
            Phase::Pending | Phase::Suspended => {}
            Phase::Transitioning { .. } => {
                tracing::info!(wave = self.wave.get(), "pending wave begin dropped");
                self.phase = Phase::Pending;
            }
            Phase::Active => {
                tracing::info!(wave = self.wave.get(), "active wave suspended");
                self.phase = Phase::Suspended;
            }
        }
    }

    /// Consumes events and the post-release admission counters to sequence waves.
    ///
    /// The end condition is checked on every death and again once admission
    /// has been reset for a wave that just began, so a wave with an empty
    /// budget ends without waiting for a death that cannot happen.
    pub fn handle(&mut self, events: &[Event], admission: AdmissionView, out: &mut Vec<Event>) {
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => self.count_down(*dt, out),
                Event::UnitDied { .. } | Event::WaveBegan { .. } => {
                    self.check_wave_end(admission, out);
                }
                _ => {}
            }
        }
    }

    fn count_down(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let Phase::Transitioning { remaining } = self.phase else {
            return;
        };

        let remaining = remaining.saturating_sub(dt);
        if !remaining.is_zero() {
            self.phase = Phase::Transitioning { remaining };
            return;
        }

        self.phase = Phase::Active;
        tracing::info!(wave = self.wave.get(), "wave began");
        out.push(Event::WaveBegan { wave: self.wave });
    }

    /// Ends the active wave when its budget is spent and nothing is alive.
    pub fn check_wave_end(&mut self, admission: AdmissionView, out: &mut Vec<Event>) {
        if !self.is_active() || admission.wave != self.wave {
            return;
        }
        if !admission.total_exhausted() || admission.alive() > 0 {
            return;
        }

        let ended = self.wave;
        self.wave = ended.next();
        self.phase = Phase::Transitioning {
            remaining: self.transition,
        };
        tracing::info!(
            wave = ended.get(),
            admitted = admission.admitted(),
            "wave ended"
        );
        out.push(Event::WaveEnded { wave: ended });
    }
}

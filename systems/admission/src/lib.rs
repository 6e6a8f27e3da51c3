#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Admission controller enforcing the concurrent and total caps of a wave.

use holdout_core::{AdmissionDecision, AdmissionView, DenialReason, Event, WaveIndex, WaveSource};

/// Pure system deciding whether one more unit may enter the current wave.
///
/// Both counters count down from the wave's caps and are clamped into
/// `[0, max]` after every mutation. Cap signals are edge-triggered: the
/// first denial after a cap is reached emits the signal, later denials stay
/// silent until the cap is lifted again.
#[derive(Debug)]
pub struct Admission {
    participants: u32,
    wave: WaveIndex,
    max_concurrent: u32,
    max_total: u32,
    remaining_concurrent: u32,
    remaining_total: u32,
    concurrent_signalled: bool,
    total_signalled: bool,
}

impl Admission {
    /// Creates a controller with zero caps; nothing is admitted until [`Admission::reset`].
    #[must_use]
    pub const fn new(participants: u32) -> Self {
        Self {
            participants,
            wave: WaveIndex::FIRST,
            max_concurrent: 0,
            max_total: 0,
            remaining_concurrent: 0,
            remaining_total: 0,
            concurrent_signalled: false,
            total_signalled: false,
        }
    }

    /// Number of participants the total cap is computed for.
    #[must_use]
    pub const fn participants(&self) -> u32 {
        self.participants
    }

    /// Captures the current counters.
    #[must_use]
    pub const fn view(&self) -> AdmissionView {
        AdmissionView {
            wave: self.wave,
            max_concurrent: self.max_concurrent,
            max_total: self.max_total,
            remaining_concurrent: self.remaining_concurrent,
            remaining_total: self.remaining_total,
        }
    }

    /// Requests one admission, consuming a concurrent and a total slot when granted.
    pub fn try_admit(&mut self, out: &mut Vec<Event>) -> AdmissionDecision {
        if self.remaining_concurrent == 0 {
            if !self.concurrent_signalled {
                self.concurrent_signalled = true;
                tracing::debug!(wave = self.wave.get(), "concurrent cap reached");
                out.push(Event::ConcurrentCapReached { wave: self.wave });
            }
            return AdmissionDecision::Denied(DenialReason::ConcurrentCap);
        }

        if self.remaining_total == 0 {
            if !self.total_signalled {
                self.total_signalled = true;
                tracing::debug!(wave = self.wave.get(), "total cap reached");
                out.push(Event::TotalCapReached { wave: self.wave });
            }
            return AdmissionDecision::Denied(DenialReason::TotalCap);
        }

        self.remaining_concurrent -= 1;
        self.remaining_total -= 1;
        self.clamp();
        AdmissionDecision::Granted
    }

    /// Returns one concurrent slot after a unit was released.
    pub fn on_release(&mut self) {
        self.remaining_concurrent = self.remaining_concurrent.saturating_add(1);
        self.clamp();
        if self.remaining_concurrent > 0 {
            self.concurrent_signalled = false;
        }
    }

    /// Undoes a grant whose unit never materialised, returning both slots.
    pub fn revoke(&mut self) {
        self.remaining_concurrent = self.remaining_concurrent.saturating_add(1);
        self.remaining_total = self.remaining_total.saturating_add(1);
        self.clamp();
        if self.remaining_concurrent > 0 {
            self.concurrent_signalled = false;
        }
        if self.remaining_total > 0 {
            self.total_signalled = false;
        }
    }

    /// Recomputes both caps for `wave` and restores both counters.
    pub fn reset<C: WaveSource>(&mut self, wave: WaveIndex, curve: &C) {
        self.wave = wave;
        self.max_concurrent = curve.max_concurrent(wave);
        self.max_total = curve.max_total(wave, self.participants);
        self.remaining_concurrent = self.max_concurrent;
        self.remaining_total = self.max_total;
        self.concurrent_signalled = false;
        self.total_signalled = false;
        tracing::info!(
            wave = wave.get(),
            max_concurrent = self.max_concurrent,
            max_total = self.max_total,
            "admission caps reset"
        );
    }

    /// Consumes events: deaths return concurrent slots and new waves reset the caps.
    pub fn handle<C: WaveSource>(&mut self, events: &[Event], curve: &C) {
        for event in events {
            match event {
                Event::UnitDied { .. } => self.on_release(),
                Event::WaveBegan { wave } => self.reset(*wave, curve),
                _ => {}
            }
        }
    }

    fn clamp(&mut self) {
        self.remaining_concurrent = self.remaining_concurrent.min(self.max_concurrent);
        self.remaining_total = self.remaining_total.min(self.max_total);
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave-derived caps and spawn cadence.
//!
//! [`WaveCurve`] is the default [`WaveSource`]: totals come from a lookup
//! table for the opening waves and from a cubic polynomial per participant
//! count afterwards, the concurrent cap ramps linearly up to a ceiling, and
//! the spawn interval decays geometrically down to a floor.

use std::time::Duration;

use holdout_core::{WaveIndex, WaveSource};
use serde::Deserialize;
use thiserror::Error;

/// Largest participant count with its own curve; larger groups reuse it.
pub const MAX_TABULATED_PARTICIPANTS: u32 = 4;

/// Errors produced while loading or validating a [`WaveCurve`].
#[derive(Debug, Error)]
pub enum WaveCurveError {
    /// The TOML document could not be parsed.
    #[error("failed to parse wave curve: {0}")]
    Parse(#[from] toml::de::Error),
    /// The early-wave tables are empty or differ in length.
    #[error("early-wave tables must be non-empty and equally long")]
    UnevenTables,
    /// A tuning value lies outside its valid range.
    #[error("invalid wave curve tuning: {0}")]
    InvalidTuning(&'static str),
}

/// Aggregated tuning for every wave-derived quantity.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaveCurve {
    /// Controls the per-wave total budget.
    pub totals: TotalTuning,
    /// Controls how many units may be alive at once.
    pub concurrent: ConcurrentTuning,
    /// Controls the time between spawn attempts.
    pub interval: IntervalTuning,
}

/// Total budget table and polynomial tail, indexed by participant count minus one.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TotalTuning {
    /// Budgets for the opening waves; entry `n` is wave `n + 1`.
    pub early: [Vec<u32>; 4],
    /// Cubic coefficients `[a, b, c, d]` evaluated as `a·w³ + b·w² + c·w + d`.
    pub polynomials: [[f64; 4]; 4],
}

impl Default for TotalTuning {
    fn default() -> Self {
        Self {
            early: [
                vec![6, 8, 13, 18, 24, 27, 28, 28, 29, 33, 34],
                vec![7, 9, 15, 21, 27, 31, 32, 33, 34, 42, 45],
                vec![11, 14, 23, 34, 45, 49, 54, 58, 61, 65, 70],
                vec![14, 18, 30, 42, 54, 61, 69, 76, 81, 88, 93],
            ],
            polynomials: [
                [0.000_058, 0.074_032, 0.718_119, 14.738_699],
                [0.000_054, 0.169_717, 0.541_627, 15.917_041],
                [0.000_169, 0.238_079, 1.307_276, 21.291_046],
                [0.000_225, 0.314_314, 1.835_712, 27.596_132],
            ],
        }
    }
}

/// Linear ramp of the concurrent cap.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConcurrentTuning {
    /// Concurrent cap during the first wave.
    pub start: u32,
    /// Increase applied per subsequent wave.
    pub per_wave: u32,
    /// Hard ceiling regardless of wave.
    pub ceiling: u32,
}

impl Default for ConcurrentTuning {
    fn default() -> Self {
        Self {
            start: 6,
            per_wave: 2,
            ceiling: 24,
        }
    }
}

/// Geometric decay of the spawn interval.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntervalTuning {
    /// Interval during the first wave, in seconds.
    pub start_secs: f64,
    /// Fraction removed from the interval per wave.
    pub reduction: f64,
    /// Lower bound of the interval, in seconds.
    pub floor_secs: f64,
    /// Round the interval to the nearest hundredth of a second.
    pub round_to_hundredth: bool,
}

impl Default for IntervalTuning {
    fn default() -> Self {
        Self {
            start_secs: 2.0,
            reduction: 0.05,
            floor_secs: 0.1,
            round_to_hundredth: true,
        }
    }
}

impl WaveCurve {
    /// Parses and validates a curve from TOML; missing sections keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, WaveCurveError> {
        let curve: Self = toml::from_str(contents)?;
        curve.validate()?;
        Ok(curve)
    }

    /// Checks that every tuning value is usable.
    pub fn validate(&self) -> Result<(), WaveCurveError> {
        let early_len = self.totals.early[0].len();
        if early_len == 0 || self.totals.early.iter().any(|table| table.len() != early_len) {
            return Err(WaveCurveError::UnevenTables);
        }
        if self.totals.early.iter().flatten().any(|total| *total == 0) {
            return Err(WaveCurveError::InvalidTuning("totals.early entries must be positive"));
        }
        if self.concurrent.start == 0 {
            return Err(WaveCurveError::InvalidTuning("concurrent.start must be positive"));
        }
        if self.concurrent.ceiling < self.concurrent.start {
            return Err(WaveCurveError::InvalidTuning(
                "concurrent.ceiling must not be below concurrent.start",
            ));
        }
        let interval = &self.interval;
        if !(0.0..1.0).contains(&interval.reduction) {
            return Err(WaveCurveError::InvalidTuning("interval.reduction must be in [0, 1)"));
        }
        if !(interval.floor_secs > 0.0) || !interval.floor_secs.is_finite() {
            return Err(WaveCurveError::InvalidTuning("interval.floor_secs must be positive"));
        }
        if !(interval.start_secs >= interval.floor_secs) || !interval.start_secs.is_finite() {
            return Err(WaveCurveError::InvalidTuning(
                "interval.start_secs must not be below interval.floor_secs",
            ));
        }
        Ok(())
    }

    /// Number of opening waves served from the lookup table.
    ///
    /// Tables longer than `u32::MAX` entries report `u32::MAX`; later entries
    /// can never be reached by a [`WaveIndex`] anyway.
    #[must_use]
    pub fn tabulated_waves(&self) -> u32 {
        u32::try_from(self.totals.early[0].len()).unwrap_or(u32::MAX)
    }

    /// Evaluates the polynomial tail for `wave` without consulting the table.
    #[must_use]
    pub fn polynomial_total(&self, wave: WaveIndex, participants: u32) -> f64 {
        let [a, b, c, d] = self.totals.polynomials[curve_slot(participants)];
        let w = f64::from(wave.get());
        ((a * w + b) * w + c) * w + d
    }
}

impl WaveSource for WaveCurve {
    fn max_concurrent(&self, wave: WaveIndex) -> u32 {
        let ramp = self
            .concurrent
            .per_wave
            .saturating_mul(wave.get().saturating_sub(1));
        self.concurrent
            .start
            .saturating_add(ramp)
            .min(self.concurrent.ceiling)
    }

    fn max_total(&self, wave: WaveIndex, participants: u32) -> u32 {
        let slot = curve_slot(participants);
        let index = (wave.get() - 1) as usize;
        if let Some(total) = self.totals.early[slot].get(index) {
            return *total;
        }
        let total = self.polynomial_total(wave, participants).round();
        total.clamp(1.0, f64::from(u32::MAX)) as u32
    }

    fn interval(&self, wave: WaveIndex) -> Duration {
        let tuning = &self.interval;
        let exponent = i32::try_from(wave.get() - 1).unwrap_or(i32::MAX);
        let mut seconds = tuning.start_secs * (1.0 - tuning.reduction).powi(exponent);
        if tuning.round_to_hundredth {
            seconds = (seconds * 100.0).round() / 100.0;
        }
        // Unvalidated tuning may produce a negative or non-finite interval.
        let seconds = seconds.max(tuning.floor_secs);
        if seconds.is_nan() || seconds <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}

fn curve_slot(participants: u32) -> usize {
    (participants.clamp(1, MAX_TABULATED_PARTICIPANTS) - 1) as usize
}

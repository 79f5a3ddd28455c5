//! Simulation time and time-bin model.
//!
//! # Design
//!
//! Event timestamps are integer seconds since the start of the simulated day
//! (`SimTime`).  All aggregation is done in fixed-width bins:
//!
//!   bin = time / bin_width_secs
//!
//! Using integer seconds means every event lands in exactly one bin with no
//! floating-point edge cases at bin boundaries.  The day is bounded by the
//! configured horizon; the last bin may be shorter than `bin_width_secs` if
//! the horizon is not a multiple of the width.

use std::fmt;

// ── SimTime ──────────────────────────────────────────────────────────────────

/// Seconds since the start of the simulated day.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// Build from an hour/minute/second wall-clock reading.
    #[inline]
    pub fn hms(h: u64, m: u64, s: u64) -> SimTime {
        SimTime(h * 3_600 + m * 60 + s)
    }

    #[inline]
    pub fn secs(self) -> u64 {
        self.0
    }
}

impl std::ops::Sub for SimTime {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: SimTime) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.0 / 3_600;
        let m = (self.0 % 3_600) / 60;
        let s = self.0 % 60;
        write!(f, "{h:02}:{m:02}:{s:02}")
    }
}

// ── TimeBin ──────────────────────────────────────────────────────────────────

/// Index of a fixed-width time bin.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeBin(pub u32);

impl TimeBin {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TimeBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bin{}", self.0)
    }
}

// ── BinClock ─────────────────────────────────────────────────────────────────

/// Maps timestamps to bins for one simulated day.
///
/// `BinClock` is cheap to copy and holds no heap data.  All components share
/// the one built from the validated config.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BinClock {
    /// Width of one bin in seconds (> 0).
    pub bin_width_secs: u64,
    /// End of the simulated day in seconds (> 0); open intervals are closed here.
    pub horizon_secs: u64,
}

impl BinClock {
    /// Create a clock.  Callers are expected to pass validated values
    /// (see [`TimeConfig::validate`][crate::config::TimeConfig::validate]).
    pub fn new(bin_width_secs: u64, horizon_secs: u64) -> Self {
        debug_assert!(bin_width_secs > 0, "bin width must be > 0");
        debug_assert!(horizon_secs > 0, "horizon must be > 0");
        Self { bin_width_secs, horizon_secs }
    }

    /// The bin containing `time`.
    #[inline]
    pub fn bin_of(&self, time: SimTime) -> TimeBin {
        TimeBin((time.0 / self.bin_width_secs) as u32)
    }

    /// Number of bins covering `[0, horizon)`, rounding the last one up.
    #[inline]
    pub fn bin_count(&self) -> u32 {
        self.horizon_secs.div_ceil(self.bin_width_secs) as u32
    }

    /// Iterator over all bins of the day.
    pub fn bins(&self) -> impl Iterator<Item = TimeBin> + use<> {
        (0..self.bin_count()).map(TimeBin)
    }

    /// `true` if `time` lies before the horizon.
    #[inline]
    pub fn within_horizon(&self, time: SimTime) -> bool {
        time.0 < self.horizon_secs
    }

    /// The horizon as a timestamp.
    #[inline]
    pub fn horizon(&self) -> SimTime {
        SimTime(self.horizon_secs)
    }

    #[inline]
    pub fn bin_start(&self, bin: TimeBin) -> SimTime {
        SimTime(bin.0 as u64 * self.bin_width_secs)
    }

    /// Exclusive end of `bin`, capped at the horizon.
    #[inline]
    pub fn bin_end(&self, bin: TimeBin) -> SimTime {
        SimTime(((bin.0 as u64 + 1) * self.bin_width_secs).min(self.horizon_secs))
    }

    /// Hour of day (0–23) at which `bin` starts.  Days past 24 h wrap.
    #[inline]
    pub fn start_hour_of_day(&self, bin: TimeBin) -> u32 {
        ((self.bin_start(bin).0 / 3_600) % 24) as u32
    }

    /// Seconds of `[from, to)` that fall inside `bin`.
    pub fn overlap_secs(&self, bin: TimeBin, from: SimTime, to: SimTime) -> u64 {
        let start = self.bin_start(bin).max(from);
        let end = self.bin_end(bin).min(to);
        end.0.saturating_sub(start.0)
    }

    /// Bins touched by the half-open interval `[from, to)`.
    pub fn bins_spanning(&self, from: SimTime, to: SimTime) -> impl Iterator<Item = TimeBin> + use<> {
        let first = self.bin_of(from).0;
        let last = if to.0 == 0 { 0 } else { self.bin_of(SimTime(to.0 - 1)).0 + 1 };
        let last = last.min(self.bin_count());
        (first..last).map(TimeBin)
    }
}

impl fmt::Display for BinClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bins × {} s (horizon {})",
            self.bin_count(),
            self.bin_width_secs,
            SimTime(self.horizon_secs)
        )
    }
}

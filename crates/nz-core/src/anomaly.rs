//! Bounded-repetition diagnostics for recoverable data anomalies.
//!
//! A malformed event must never abort an iteration, but logging every one of
//! a few million bad events would drown the log.  `AnomalyLog` warns on the
//! first occurrence of each [`AnomalyKind`] in a run and only counts (at
//! `debug` level) after that.  Counts are reset per iteration; the "already
//! warned" set is not.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Class of a recoverable data anomaly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnomalyKind {
    /// Vehicle event with a negative or non-finite speed.
    InvalidSpeed,
    /// Event timestamp at or beyond the horizon.
    AfterHorizon,
    /// Activity event at a location missing from the registry.
    UnknownLocation,
    /// Activity start while the same person still had an open activity.
    OverlappingActivity,
    /// Activity end whose type differs from the open activity's type.
    MismatchedActivityEnd,
    /// Activity end that precedes its start.
    NegativeDuration,
    /// Vehicle event on a link absent from the network.
    UnknownLink,
}

impl AnomalyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnomalyKind::InvalidSpeed          => "invalid_speed",
            AnomalyKind::AfterHorizon          => "after_horizon",
            AnomalyKind::UnknownLocation       => "unknown_location",
            AnomalyKind::OverlappingActivity   => "overlapping_activity",
            AnomalyKind::MismatchedActivityEnd => "mismatched_activity_end",
            AnomalyKind::NegativeDuration      => "negative_duration",
            AnomalyKind::UnknownLink           => "unknown_link",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-component anomaly counter with first-occurrence warnings.
#[derive(Debug, Default)]
pub struct AnomalyLog {
    /// Name of the owning component, used as a log field.
    component: &'static str,
    counts:    BTreeMap<AnomalyKind, u64>,
    warned:    BTreeSet<AnomalyKind>,
}

impl AnomalyLog {
    pub fn new(component: &'static str) -> Self {
        Self { component, ..Self::default() }
    }

    /// Record one anomaly.  `detail` is only formatted when it is logged.
    pub fn report(&mut self, kind: AnomalyKind, detail: impl fmt::Display) {
        *self.counts.entry(kind).or_insert(0) += 1;
        if self.warned.insert(kind) {
            tracing::warn!(
                component = self.component,
                anomaly = kind.as_str(),
                "{detail} (further occurrences of this anomaly are only counted)"
            );
        } else {
            tracing::debug!(component = self.component, anomaly = kind.as_str(), "{detail}");
        }
    }

    /// Occurrences of `kind` since the last [`reset_counts`](Self::reset_counts).
    pub fn count(&self, kind: AnomalyKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Occurrences of all kinds since the last reset.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Whether `kind` has already produced its one warning this run.
    pub fn has_warned(&self, kind: AnomalyKind) -> bool {
        self.warned.contains(&kind)
    }

    /// Log a one-line summary of this iteration's counts at `info`.
    pub fn log_summary(&self) {
        for (kind, n) in &self.counts {
            tracing::info!(component = self.component, anomaly = kind.as_str(), count = n, "anomalies this iteration");
        }
    }

    /// Clear the per-iteration counts.  Warnings stay suppressed.
    pub fn reset_counts(&mut self) {
        self.counts.clear();
    }
}

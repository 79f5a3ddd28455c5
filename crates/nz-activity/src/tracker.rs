//! The `ActivityTracker` — stay intervals per person and their exposure.
//!
//! # Edge policies
//!
//! The outer simulation does not always deliver matched start/end pairs:
//!
//! | Situation                                  | Result                                             |
//! |--------------------------------------------|----------------------------------------------------|
//! | End without a preceding start              | opens at the person's last end (else 0), `partial` |
//! | Start while an interval is open            | open one closes at the new start, `partial`        |
//! | Start without a later end                  | closed at the horizon, `partial`                   |
//! | End of a different activity type           | open one closes at the end time, `partial`         |
//! | Unknown location, event past horizon       | skipped                                            |
//! | End before the open start or the last end  | skipped                                            |
//!
//! Skipped events and overlaps are reported to the anomaly log; the rest of
//! the iteration is unaffected.

use std::collections::BTreeMap;

use nz_core::{AnomalyKind, AnomalyLog, BinClock, LocationId, PersonId, SimTime};
use nz_events::ActivityEvent;
use nz_spatial::{LocationRegistry, PresenceRecord, ReceiverGrid};

use crate::ActivityWeights;

/// A closed stay of one person at one location.
#[derive(Clone, Debug, PartialEq)]
pub struct StayInterval {
    pub person:        PersonId,
    pub location:      LocationId,
    pub activity_type: String,
    pub start:         SimTime,
    /// Exclusive.
    pub end:           SimTime,
    /// Opened or closed artificially.
    pub partial:       bool,
}

impl StayInterval {
    pub fn duration_secs(&self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }
}

#[derive(Clone, Debug)]
struct OpenStay {
    location:      LocationId,
    activity_type: String,
    start:         SimTime,
    partial:       bool,
}

/// Counts from one [`ActivityTracker::assign_to_receivers`] call.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AssignmentSummary {
    pub presence_records: usize,
    pub affected_units:   f64,
}

/// Builds per-person stay intervals from activity events and writes the
/// resulting presence into the receiver grid.
pub struct ActivityTracker {
    clock:        BinClock,
    scale_factor: f64,
    weights:      ActivityWeights,
    locations:    LocationRegistry,
    open:         BTreeMap<PersonId, OpenStay>,
    closed:       Vec<StayInterval>,
    /// End of each person's most recent closed interval.
    last_end:     BTreeMap<PersonId, SimTime>,
    anomalies:    AnomalyLog,
}

impl ActivityTracker {
    pub fn new(
        clock:        BinClock,
        scale_factor: f64,
        weights:      ActivityWeights,
        locations:    LocationRegistry,
    ) -> Self {
        Self {
            clock,
            scale_factor,
            weights,
            locations,
            open:      BTreeMap::new(),
            closed:    Vec::new(),
            last_end:  BTreeMap::new(),
            anomalies: AnomalyLog::new("activity"),
        }
    }

    pub fn weights(&self) -> &ActivityWeights {
        &self.weights
    }

    pub fn locations(&self) -> &LocationRegistry {
        &self.locations
    }

    // ── Collection ────────────────────────────────────────────────────────

    /// Shared checks for start and end events.  `false` means skip.
    fn accept(&mut self, event: &ActivityEvent) -> bool {
        if !self.weights.is_considered(&event.activity_type) {
            tracing::trace!(activity = %event.activity_type, "activity type not considered");
            return false;
        }
        if !self.clock.within_horizon(event.time) {
            self.anomalies.report(
                AnomalyKind::AfterHorizon,
                format_args!("{} {} at {}", event.person, event.activity_type, event.time),
            );
            return false;
        }
        if self.locations.get(event.location).is_none() {
            self.anomalies.report(
                AnomalyKind::UnknownLocation,
                format_args!("{} {} at {}", event.person, event.activity_type, event.location),
            );
            return false;
        }
        true
    }

    fn close(&mut self, person: PersonId, stay: OpenStay, end: SimTime, partial: bool) {
        self.last_end.insert(person, end);
        self.closed.push(StayInterval {
            person,
            location:      stay.location,
            activity_type: stay.activity_type,
            start:         stay.start,
            end,
            partial:       stay.partial || partial,
        });
    }

    /// Open an interval.  Returns `false` if the event was skipped.
    pub fn record_activity_start(&mut self, event: &ActivityEvent) -> bool {
        if !self.accept(event) {
            return false;
        }
        if let Some(prev) = self.open.remove(&event.person) {
            self.anomalies.report(
                AnomalyKind::OverlappingActivity,
                format_args!(
                    "{} starts {} at {} while {} is open",
                    event.person, event.activity_type, event.time, prev.activity_type
                ),
            );
            self.close(event.person, prev, event.time, true);
        }
        self.open.insert(event.person, OpenStay {
            location:      event.location,
            activity_type: event.activity_type.clone(),
            start:         event.time,
            partial:       false,
        });
        true
    }

    /// Close an interval.  Returns `false` if the event was skipped.
    pub fn record_activity_end(&mut self, event: &ActivityEvent) -> bool {
        if !self.accept(event) {
            return false;
        }
        match self.open.remove(&event.person) {
            None => {
                // Typically the first activity of the day.
                let start = self.last_end.get(&event.person).copied().unwrap_or(SimTime::ZERO);
                if event.time < start {
                    self.anomalies.report(
                        AnomalyKind::NegativeDuration,
                        format_args!("{} ends {} at {} before {}", event.person, event.activity_type, event.time, start),
                    );
                    return false;
                }
                let stay = OpenStay {
                    location:      event.location,
                    activity_type: event.activity_type.clone(),
                    start,
                    partial:       true,
                };
                self.close(event.person, stay, event.time, true);
                true
            }
            Some(stay) if event.time < stay.start => {
                self.anomalies.report(
                    AnomalyKind::NegativeDuration,
                    format_args!("{} ends {} at {} before {}", event.person, event.activity_type, event.time, stay.start),
                );
                self.open.insert(event.person, stay);
                false
            }
            Some(stay) if stay.activity_type != event.activity_type || stay.location != event.location => {
                self.anomalies.report(
                    AnomalyKind::MismatchedActivityEnd,
                    format_args!(
                        "{} ends {} at {} while {} is open",
                        event.person, event.activity_type, event.time, stay.activity_type
                    ),
                );
                self.close(event.person, stay, event.time, true);
                true
            }
            Some(stay) => {
                self.close(event.person, stay, event.time, false);
                true
            }
        }
    }

    // ── Computation ───────────────────────────────────────────────────────

    /// Close every open interval at the horizon and return all intervals.
    pub fn compute_stay_durations(&mut self) -> &[StayInterval] {
        let horizon = self.clock.horizon();
        let open = std::mem::take(&mut self.open);
        for (person, stay) in open {
            self.close(person, stay, horizon, true);
        }
        &self.closed
    }

    /// Map every interval to its nearest receiver and write presence records
    /// and per-bin unit totals.  Previous presence in the grid is replaced.
    ///
    /// `units = weight · seconds_in_bin / bin_width · scale_factor`.
    pub fn assign_to_receivers(&mut self, grid: &mut ReceiverGrid) -> AssignmentSummary {
        self.compute_stay_durations();

        for r in grid.receivers_mut() {
            for (_, bin) in r.state.iter_mut() {
                bin.presence.clear();
                bin.affected_units = 0.0;
            }
        }

        let width = self.clock.bin_width_secs as f64;
        let mut summary = AssignmentSummary::default();

        for stay in &self.closed {
            let Some(weight) = self.weights.weight(&stay.activity_type) else { continue };
            let Some(coord) = self.locations.get(stay.location) else { continue };
            let Some(rid) = grid.nearest_receiver(coord) else { continue };
            let Some(receiver) = grid.get_mut(rid) else { continue };

            for bin in self.clock.bins_spanning(stay.start, stay.end) {
                let secs = self.clock.overlap_secs(bin, stay.start, stay.end);
                if secs == 0 {
                    continue;
                }
                let units = weight * secs as f64 / width * self.scale_factor;
                let slot = receiver.state.bin_mut(bin);
                slot.presence.push(PresenceRecord {
                    person:         stay.person,
                    activity_type:  stay.activity_type.clone(),
                    duration_secs:  secs,
                    affected_units: units,
                    partial:        stay.partial,
                });
                slot.affected_units += units;
                summary.presence_records += 1;
                summary.affected_units += units;
            }
        }

        tracing::debug!(
            intervals = self.closed.len(),
            records = summary.presence_records,
            units = summary.affected_units,
            "activity presence assigned"
        );
        summary
    }

    // ── Access / lifecycle ────────────────────────────────────────────────

    /// Closed intervals so far, in closing order.
    pub fn intervals(&self) -> &[StayInterval] {
        &self.closed
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn anomalies(&self) -> &AnomalyLog {
        &self.anomalies
    }

    /// Drop every interval and the per-iteration anomaly counts.
    pub fn reset(&mut self) {
        self.open.clear();
        self.closed.clear();
        self.last_end.clear();
        self.anomalies.reset_counts();
    }

    pub fn is_reset(&self) -> bool {
        self.open.is_empty() && self.closed.is_empty() && self.last_end.is_empty() && self.anomalies.total() == 0
    }
}

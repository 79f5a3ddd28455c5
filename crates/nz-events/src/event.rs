//! Events consumed from the outer simulation.
//!
//! The outer engine delivers these synchronously, in non-decreasing time
//! order within one simulated day.  Nothing is assumed about the order of
//! same-timestamp events on different links or persons; the registry's
//! sequence number breaks such ties.

use nz_core::{LinkId, LocationId, PersonId, SimTime, VehicleClass, VehicleId};

/// A vehicle entering (passing) a link.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleMoved {
    pub link:      LinkId,
    pub vehicle:   VehicleId,
    pub time:      SimTime,
    /// Observed speed on the link in m/s.
    pub speed_mps: f64,
    pub class:     VehicleClass,
}

/// A person starting or ending an activity.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityEvent {
    pub person:        PersonId,
    pub location:      LocationId,
    pub activity_type: String,
    pub time:          SimTime,
}

/// Every event the pipeline can consume.
#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    VehicleMoved(VehicleMoved),
    ActivityStarted(ActivityEvent),
    ActivityEnded(ActivityEvent),
}

/// Discriminant of [`SimEvent`], used as the registration-table key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    VehicleMoved,
    ActivityStarted,
    ActivityEnded,
}

impl SimEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SimEvent::VehicleMoved(_)    => EventKind::VehicleMoved,
            SimEvent::ActivityStarted(_) => EventKind::ActivityStarted,
            SimEvent::ActivityEnded(_)   => EventKind::ActivityEnded,
        }
    }

    pub fn time(&self) -> SimTime {
        match self {
            SimEvent::VehicleMoved(e) => e.time,
            SimEvent::ActivityStarted(e) | SimEvent::ActivityEnded(e) => e.time,
        }
    }
}

impl From<VehicleMoved> for SimEvent {
    fn from(e: VehicleMoved) -> Self {
        SimEvent::VehicleMoved(e)
    }
}

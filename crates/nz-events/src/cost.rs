//! Synthetic noise cost events and the sink they are handed to.
//!
//! Cost events are emitted, never stored: ownership passes to the
//! [`CostSink`] immediately and the pipeline keeps no reference.

use nz_core::{LinkId, PersonId, ReceiverId, SimTime, VehicleId};

/// Which side of the externality a cost is attributed to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CostFlow {
    /// Attributed to the traffic producing the noise.
    Caused,
    /// Attributed to the people exposed to it.
    Affected,
}

impl CostFlow {
    pub fn as_str(self) -> &'static str {
        match self {
            CostFlow::Caused   => "caused",
            CostFlow::Affected => "affected",
        }
    }
}

impl std::fmt::Display for CostFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payer or affected party of a cost event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Party {
    Vehicle(VehicleId),
    Person(PersonId),
}

/// Where the cost originated.
#[derive(Clone, Debug, PartialEq)]
pub enum CostOrigin {
    /// A vehicle's passage over `link`.
    Link(LinkId),
    /// Exposure at `receiver` while performing `activity_type`.
    Receiver { receiver: ReceiverId, activity_type: String },
}

/// A monetised noise externality, fed back to the outer simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseCostEvent {
    pub flow:   CostFlow,
    pub party:  Party,
    /// Monetary amount (≥ 0).
    pub amount: f64,
    /// Lies inside the time bin the cost was computed for.
    pub time:   SimTime,
    pub origin: CostOrigin,
}

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Receiver of synthetic cost events, usually the outer event stream.
pub trait CostSink {
    fn emit(&mut self, event: NoiseCostEvent);
}

impl CostSink for Vec<NoiseCostEvent> {
    fn emit(&mut self, event: NoiseCostEvent) {
        self.push(event);
    }
}

/// A sink that keeps events plus per-flow totals.
#[derive(Debug, Default)]
pub struct CostCollector {
    pub events:         Vec<NoiseCostEvent>,
    pub caused_total:   f64,
    pub affected_total: f64,
}

impl CostCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events of one flow, in emission order.
    pub fn flow(&self, flow: CostFlow) -> impl Iterator<Item = &NoiseCostEvent> {
        self.events.iter().filter(move |e| e.flow == flow)
    }

    /// Sum of amounts charged to `party`.
    pub fn total_for(&self, party: Party) -> f64 {
        self.events.iter().filter(|e| e.party == party).map(|e| e.amount).sum()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.caused_total = 0.0;
        self.affected_total = 0.0;
    }
}

impl CostSink for CostCollector {
    fn emit(&mut self, event: NoiseCostEvent) {
        match event.flow {
            CostFlow::Caused   => self.caused_total += event.amount,
            CostFlow::Affected => self.affected_total += event.amount,
        }
        self.events.push(event);
    }
}

/// A sink that drops everything.  Use when only statistics are wanted.
pub struct DiscardSink;

impl CostSink for DiscardSink {
    fn emit(&mut self, _event: NoiseCostEvent) {}
}

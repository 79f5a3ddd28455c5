//! `nz-events` — the pipeline's event vocabulary.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`event`]    | `SimEvent`, `VehicleMoved`, `ActivityEvent`, `EventKind`  |
//! | [`cost`]     | `NoiseCostEvent`, `CostFlow`, `Party`, `CostSink` + sinks |
//! | [`registry`] | `EventRegistry<S>` — kind → subscriber routing table      |
//!
//! # Design notes
//!
//! Inputs and outputs are plain data.  Which component consumes which input
//! is decided by an explicit registration table owned by the orchestrator,
//! not by components implementing several handler traits.

pub mod cost;
pub mod event;
pub mod registry;


pub use cost::{CostCollector, CostFlow, CostOrigin, CostSink, DiscardSink, NoiseCostEvent, Party};
pub use event::{ActivityEvent, EventKind, SimEvent, VehicleMoved};
pub use registry::EventRegistry;

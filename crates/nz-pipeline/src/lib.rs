//! `nz-pipeline` — iteration orchestrator for the rust_noise pipeline.
//!
//! # One iteration
//!
//! ```text
//! before_day    — clear receivers, emission aggregator, activity tracker
//! handle_event  — route each event through the registration table:
//!                   VehicleMoved           → emission aggregator
//!                   ActivityStarted/Ended  → activity tracker
//! after_day     — ① emission levels per link and bin
//!                 ② immission per receiver and bin    (parallel with `parallel`)
//!                 ③ stay intervals → receiver presence
//!                 ④ damage, affected + caused events  (parallel with `parallel`)
//! iteration_end — totals, anomaly summary, export
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                      |
//! |------------|-------------------------------------------------------------|
//! | `parallel` | Runs per-receiver stage work on Rayon's thread pool.        |
//! | `fx-hash`  | FxHash for the emission aggregation map.                    |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use nz_events::CostCollector;
//! use nz_pipeline::{NoopObserver, PipelineBuilder};
//!
//! let mut pipeline = PipelineBuilder::new(config, network, locations).build()?;
//! pipeline.startup(&mut NoopObserver)?;
//! let mut sink = CostCollector::new();
//! pipeline.run_iteration(0, &events, &mut sink, &mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod state;


pub use builder::PipelineBuilder;
pub use error::{PipelineError, PipelineResult};
pub use observer::{IterationSummary, NoopObserver, PipelineObserver};
pub use pipeline::{NoisePipeline, Stage};
pub use state::PipelineState;

//! `nz-emission` — traffic aggregation and emission levels.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                      |
//! |----------------|---------------------------------------------------------------|
//! | [`aggregator`] | `EmissionAggregator` — per-(link, bin) counts and passages    |
//! | [`model`]      | `EmissionModel` trait, `Rls90`, `TrafficSample`               |
//! | [`levels`]     | `EmissionLevels`, `LinkBinEmission`, `Passage`                |
//! | [`error`]      | `EmissionError`, `EmissionResult<T>`                          |
//!
//! # Feature flags
//!
//! | Feature   | Effect                                                     |
//! |-----------|------------------------------------------------------------|
//! | `fx-hash` | Uses FxHash for the aggregation map instead of SipHash.    |

pub mod aggregator;
pub mod error;
pub mod levels;
pub mod model;

#[cfg(test)]
mod tests;

pub use aggregator::EmissionAggregator;
pub use error::{EmissionError, EmissionResult};
pub use levels::{EmissionLevels, LinkBinEmission, Passage};
pub use model::{EmissionModel, Rls90, TrafficSample};

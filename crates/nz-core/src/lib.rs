//! `nz-core` — foundational types for the `rust_noise` pipeline.
//!
//! This crate is a dependency of every other `nz-*` crate.  It has no `nz-*`
//! dependencies.
//!
//! # What lives here
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`ids`]       | `LinkId`, `ReceiverId`, `PersonId`, `VehicleId`, `LocationId` |
//! | [`geo`]       | `Coord`, `Bounds`, segment distance and viewing angle     |
//! | [`time`]      | `SimTime`, `TimeBin`, `BinClock`                          |
//! | [`vehicle`]   | `VehicleClass` enum                                       |
//! | [`config`]    | `NoiseConfig` and its sections (TOML, validated)          |
//! | [`anomaly`]   | `AnomalyLog` — bounded-repetition data-anomaly warnings   |
//! | [`rng`]       | `ScenarioRng` for reproducible synthetic scenarios        |
//! | [`error`]     | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, time and geometry.  |

pub mod anomaly;
pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;
pub mod vehicle;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use anomaly::{AnomalyKind, AnomalyLog};
pub use config::NoiseConfig;
pub use error::{CoreError, CoreResult};
pub use geo::{Bounds, Coord};
pub use ids::{LinkId, LocationId, PersonId, ReceiverId, VehicleId};
pub use rng::ScenarioRng;
pub use time::{BinClock, SimTime, TimeBin};
pub use vehicle::VehicleClass;

//! `nz-immission` — from link emissions to receiver immissions.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                    |
//! |-----------------|-------------------------------------------------------------|
//! | [`attenuation`] | `AttenuationModel` trait, `DistanceAttenuation`, validation |
//! | [`propagate`]   | `calculate_noise_immission`, `energetic_sum`                |
//! | [`error`]       | `ImmissionError`, `ImmissionResult<T>`                      |
//!
//! # Feature flags
//!
//! | Feature    | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `parallel` | Evaluates receivers on Rayon's thread pool.                |

pub mod attenuation;
pub mod error;
pub mod propagate;


pub use attenuation::{AttenuationModel, DistanceAttenuation, validate_attenuation};
pub use error::{ImmissionError, ImmissionResult};
pub use propagate::{ImmissionSummary, calculate_noise_immission, energetic_sum};

//! `nz-damage` — monetised noise damage and its attribution.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | [`dose`]      | `DoseResponse` trait, `PeriodDoseResponse`, validation          |
//! | [`valuation`] | `calculate_noise_damage_costs`, `DamageTotals`                  |
//! | [`error`]     | `DamageError`, `DamageResult<T>`                                |
//!
//! # Feature flags
//!
//! | Feature    | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `parallel` | Values receivers on Rayon's thread pool.                   |

pub mod dose;
pub mod error;
pub mod valuation;

#[cfg(test)]
mod tests;

pub use dose::{DoseResponse, PeriodDoseResponse, validate_dose_response};
pub use error::{DamageError, DamageResult};
pub use valuation::{DamageTotals, calculate_noise_damage_costs};

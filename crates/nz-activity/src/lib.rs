//! `nz-activity` — who is exposed, where, and for how long.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                         |
//! |-------------|------------------------------------------------------------------|
//! | [`tracker`] | `ActivityTracker`, `StayInterval` — intervals and assignment     |
//! | [`weights`] | `ActivityWeights`, CSV loader                                    |
//! | [`error`]   | `ActivityError`, `ActivityResult<T>`                             |

pub mod error;
pub mod tracker;
pub mod weights;


pub use error::{ActivityError, ActivityResult};
pub use tracker::{ActivityTracker, AssignmentSummary, StayInterval};
pub use weights::{ActivityWeights, load_weights_csv, load_weights_reader};

//! Spatial-subsystem error type.

use thiserror::Error;

use nz_core::{CoreError, LinkId};

/// Errors produced by `nz-spatial`.  All of them are configuration errors
/// raised at grid construction.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("network has no links")]
    EmptyNetwork,

    #[error("link {0} added twice")]
    DuplicateLink(LinkId),

    #[error("no receiver has any link within the hearing radius of {radius_m} m")]
    NoLinksInRange { radius_m: f64 },
}

pub type SpatialResult<T> = Result<T, SpatialError>;

use nz_activity::ActivityError;
use nz_core::CoreError;
use nz_damage::DamageError;
use nz_emission::EmissionError;
use nz_immission::ImmissionError;
use nz_spatial::SpatialError;
use thiserror::Error;

use crate::PipelineState;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A lifecycle hook was called in a state that does not allow it.
    #[error("{hook} is not allowed in state {state}")]
    InvalidTransition {
        hook:  &'static str,
        state: PipelineState,
    },

    /// A stage found the output of an earlier stage missing.
    #[error("stage {stage} ran out of order: {detail}")]
    StageOrder {
        stage:  &'static str,
        detail: String,
    },

    /// A stage produced a non-finite total.
    #[error("stage {stage} produced a non-finite {what}")]
    NonFinite {
        stage: &'static str,
        what:  &'static str,
    },

    #[error("configuration error: {0}")]
    Core(#[from] CoreError),

    #[error("receiver grid: {0}")]
    Spatial(#[from] SpatialError),

    #[error("emission model: {0}")]
    Emission(#[from] EmissionError),

    #[error("activity weights: {0}")]
    Activity(#[from] ActivityError),

    #[error("attenuation model: {0}")]
    Immission(#[from] ImmissionError),

    #[error("damage valuation: {0}")]
    Damage(#[from] DamageError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

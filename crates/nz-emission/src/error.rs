use nz_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmissionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("emission model misconfigured: {0}")]
    Model(String),
}

pub type EmissionResult<T> = Result<T, EmissionError>;

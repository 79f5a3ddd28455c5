use nz_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImmissionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("attenuation model misconfigured: {0}")]
    Config(String),
}

pub type ImmissionResult<T> = Result<T, ImmissionError>;

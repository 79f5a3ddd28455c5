use nz_core::{CoreError, ReceiverId, TimeBin};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DamageError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("dose-response misconfigured: {0}")]
    Config(String),

    /// Valuation ran before the immission stage filled `receiver`/`bin`.
    #[error("no immission level for {receiver} in {bin}; immission stage has not run")]
    StageOrder { receiver: ReceiverId, bin: TimeBin },

    /// The dose-response returned NaN or infinity.
    #[error("non-finite damage at {receiver} in {bin}")]
    NonFinite { receiver: ReceiverId, bin: TimeBin },

    /// Finite per-bin damages summed to a non-finite total.
    #[error("summed damage is not finite")]
    NonFiniteTotal,
}

pub type DamageResult<T> = Result<T, DamageError>;

//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`, so configuration failures surface unchanged all the
//! way up to the pipeline builder.

use thiserror::Error;

/// The top-level error type for `nz-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid or inconsistent configuration.  Always fatal, always raised
    /// before the first iteration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `nz-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;

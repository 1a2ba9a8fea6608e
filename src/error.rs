//! Unified error handling for the strata crate
//!
//! [`Error`] wraps the domain errors for library entry points that cross
//! module boundaries (collector wiring, export, summary rendering). The
//! collection loop itself matches on [`CollectError`] directly: whether a
//! failure ends an attempt or the run is decided by
//! [`CollectError::is_run_fatal`], and the requester retries every
//! [`TransportError`].

use thiserror::Error;

pub use crate::utils::error::{CollectError, StorageError, TransportError};

/// Unified error type for the strata crate
#[derive(Error, Debug)]
pub enum Error {
    /// Collection loop errors
    #[error("Collection error: {0}")]
    Collect(#[from] CollectError),

    /// Transport construction errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Checkpoint and export storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Summary template errors
    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

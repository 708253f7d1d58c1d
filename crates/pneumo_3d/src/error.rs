//! Error types for pneumo_3d
//!
//! The visualization paths themselves never fail: missing capabilities fall
//! back to passthrough, bad payload fields are ignored and out-of-range
//! numbers are clamped. These errors cover the edges where the crate talks
//! to the outside world.

use crate::render::{ProbeError, ShaderId};
use thiserror::Error;

/// Errors that can occur around the 3D view
#[derive(Error, Debug)]
pub enum ViewError {
    /// Payload text is not valid JSON
    #[error("payload parse failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload has the wrong shape at the root
    #[error("invalid payload: {0}")]
    Payload(String),

    /// Pipeline build asked for a shader that was never registered
    #[error("shader not registered: {0:?}")]
    ShaderMissing(ShaderId),

    /// Capability query failed
    #[error(transparent)]
    Capability(#[from] ProbeError),
}

/// Result type for pneumo_3d operations
pub type Result<T> = std::result::Result<T, ViewError>;

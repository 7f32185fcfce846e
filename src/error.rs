//! Registry-layer error types

use thiserror::Error;

/// Failures inside the registry client. These never cross the
/// [`RegistryClient`](crate::registry::RegistryClient) boundary: they are
/// logged and absorbed into absent results.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

use thiserror::Error;

pub type Result<T, E = RequestError> = core::result::Result<T, E>;

/// Failure reported by the host's device-request entry point.
///
/// Every variant carries the host's message verbatim so a failure can be surfaced to callers
/// exactly as the host produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Security(String),
    #[error("{0}")]
    NotSupported(String),
    #[error("{0}")]
    Aborted(String),
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    Other(String),
}

impl RequestError {
    /// Host-facing error name, e.g. `NotFoundError`.
    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::NotFound(_) => "NotFoundError",
            RequestError::Security(_) => "SecurityError",
            RequestError::NotSupported(_) => "NotSupportedError",
            RequestError::Aborted(_) => "AbortError",
            RequestError::Network(_) => "NetworkError",
            RequestError::Other(_) => "Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RequestError::NotFound(m)
            | RequestError::Security(m)
            | RequestError::NotSupported(m)
            | RequestError::Aborted(m)
            | RequestError::Network(m)
            | RequestError::Other(m) => m,
        }
    }
}

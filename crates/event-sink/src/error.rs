use thiserror::Error;

pub type Result<T, E = SinkError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("subscriber failed: {0}")]
    Subscriber(String),
    #[error("subscriber channel closed")]
    Closed,
}

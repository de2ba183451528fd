use thiserror::Error;

pub type Result<T, E = DecodeError> = core::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed {kind} frame: {len} bytes, need at least {min}")]
    MalformedFrame { kind: String, len: usize, min: usize },
    #[error("invalid opcode table '{table}': {reason}")]
    InvalidTable { table: String, reason: String },
}

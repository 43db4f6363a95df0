//! Error types for archive operations

use thiserror::Error;

/// Error type for archive operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("invalid varint")]
    InvalidVarint,
    #[error("invalid bool")]
    InvalidBool,
    #[error("invalid utf-8 string")]
    InvalidUtf8,
    #[error("length exceeded: {0} > {1}")]
    LengthExceeded(usize, usize), // found, max
    #[error("malformed replication policy header")]
    MalformedHeader,
    #[error("{0} is not allowed in this archive mode")]
    WrongMode(&'static str),
}

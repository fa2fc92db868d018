//! Agent protocol errors.

use std::io;

use thiserror::Error;

use crate::key::KeyError;

/// SSH agent protocol error.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Received string was not UTF-8 encoded.
    #[error("String encoding failed: {0}")]
    StringEncoding(#[from] std::string::FromUtf8Error),

    /// Input/output error.
    #[error("I/O Error: {0}")]
    IO(#[from] io::Error),

    /// Error decoding SSH structures.
    #[error("SSH encoding error: {0}")]
    SshEncoding(#[from] ssh_encoding::Error),

    /// Key blob inside a message could not be decoded.
    #[error("SSH key error: {0}")]
    Key(#[from] KeyError),

    /// Received command was not supported.
    #[error("Command not supported ({command})")]
    UnsupportedCommand {
        /// Command code that was unsupported.
        command: u8,
    },

    /// Received key constraint was not supported.
    #[error("Constraint not supported ({constraint})")]
    UnsupportedConstraint {
        /// Constraint code that was unsupported.
        constraint: u8,
    },

    /// The client expected a different response.
    #[error("Unexpected response received")]
    UnexpectedResponse,
}

/// Protocol result.
pub type ProtoResult<T> = Result<T, ProtoError>;

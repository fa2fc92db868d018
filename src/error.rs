//! Agent client errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::encoding::CursorError;
use crate::key::KeyError;
use crate::proto::ProtoError;

/// Errors raised while talking to an SSH agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Agent protocol error.
    #[error("Agent: Protocol error: {0}")]
    Proto(#[from] ProtoError),

    /// Input/output error.
    #[error("Agent: I/O error: {0}")]
    IO(#[from] io::Error),

    /// The key could not be serialized for the agent.
    #[error("Agent: Key error: {0}")]
    Key(#[from] KeyError),

    /// Neither an override nor `SSH_AUTH_SOCK` names an agent socket.
    #[error("No SSH agent found, SSH_AUTH_SOCK is not set")]
    NoAgent,

    /// Connecting to the agent socket failed.
    #[error("Failed to connect to agent at {}: {source}", path.display())]
    Connect {
        /// Socket path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// The agent did not answer in time.
    #[error("Agent did not respond in time")]
    Timeout,

    /// The agent answered with `SSH_AGENT_FAILURE`.
    #[error("Agent refused the request")]
    Failure,
}

impl From<CursorError> for AgentError {
    fn from(error: CursorError) -> Self {
        match error {
            CursorError::TimedOut(_) => Self::Timeout,
            CursorError::Io(error) => Self::IO(error),
            CursorError::Truncated(_) | CursorError::TooLong(_) => {
                Self::Proto(ProtoError::UnexpectedResponse)
            }
        }
    }
}

//! Blocking SSH agent client API.
//!
//! Blocking API is always enabled since it doesn't use additional
//! dependencies over what is in the `proto` module and Rust standard
//! library.
//!
//! # Examples
//!
//! ```no_run
//! # #[cfg(unix)]
//! # fn main() -> testresult::TestResult {
//! use std::os::unix::net::UnixStream;
//!
//! use ssh_agent_keys::blocking::Client;
//!
//! let mut client = Client::new(UnixStream::connect(std::env::var("SSH_AUTH_SOCK")?)?);
//!
//! eprintln!(
//!     "Identities that this agent knows of: {:#?}",
//!     client.request_identities()?
//! );
//! # Ok(()) }
//! # #[cfg(windows)] fn main() { }
//! ```

use std::io::{Read, Write};

use log::debug;
use ssh_encoding::{Decode, Encode};

use crate::{
    encoding::ByteCursor,
    error::AgentError,
    proto::{
        AddIdentity, AddIdentityConstrained, Identity, ProtoError, RemoveIdentity, Request,
        Response,
    },
};

/// Blocking SSH agent client.
#[derive(Debug)]
pub struct Client<S: Read + Write> {
    cursor: ByteCursor<S>,
}

impl<S: Read + Write> Client<S> {
    /// Construct a new SSH agent client for the given transport stream.
    pub fn new(stream: S) -> Self {
        Self {
            cursor: ByteCursor::new(stream),
        }
    }

    /// Extracts inner stream by consuming this object.
    pub fn into_inner(self) -> S {
        self.cursor.into_inner()
    }

    fn handle(&mut self, request: Request) -> Result<Response, AgentError> {
        debug!("Sending agent request {}", request.message_id());

        // send the request
        let mut bytes = Vec::with_capacity(request.encoded_len().map_err(ProtoError::from)?);
        request.encode(&mut bytes).map_err(ProtoError::from)?;
        self.cursor.write_string(&bytes)?;
        self.cursor.flush()?;

        // read the response
        let bytes = self.cursor.read_string()?;
        Ok(Response::decode(&mut &bytes[..])?)
    }

    fn expect_success(&mut self, request: Request) -> Result<(), AgentError> {
        match self.handle(request)? {
            Response::Success => Ok(()),
            Response::Failure => Err(AgentError::Failure),
            _ => Err(ProtoError::UnexpectedResponse.into()),
        }
    }

    /// Request a list of keys managed by this session.
    pub fn request_identities(&mut self) -> Result<Vec<Identity>, AgentError> {
        match self.handle(Request::RequestIdentities)? {
            Response::IdentitiesAnswer(identities) => Ok(identities),
            Response::Failure => Err(AgentError::Failure),
            _ => Err(ProtoError::UnexpectedResponse.into()),
        }
    }

    /// Add a private key to the agent.
    pub fn add_identity(&mut self, identity: AddIdentity) -> Result<(), AgentError> {
        self.expect_success(Request::AddIdentity(identity))
    }

    /// Add a private key to the agent with a set of constraints.
    pub fn add_identity_constrained(
        &mut self,
        identity: AddIdentityConstrained,
    ) -> Result<(), AgentError> {
        self.expect_success(Request::AddIdConstrained(identity))
    }

    /// Remove private key from an agent.
    pub fn remove_identity(&mut self, identity: RemoveIdentity) -> Result<(), AgentError> {
        self.expect_success(Request::RemoveIdentity(identity))
    }

    /// Remove all keys from an agent.
    pub fn remove_all_identities(&mut self) -> Result<(), AgentError> {
        self.expect_success(Request::RemoveAllIdentities)
    }
}

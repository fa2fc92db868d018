//! Asynchronous SSH agent client.

use std::fmt;
#[cfg(unix)]
use std::path::Path;
use std::time::Duration;

use futures::{SinkExt, TryStreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
#[cfg(unix)]
use tokio::net::UnixStream;
use tokio_util::codec::Framed;

use crate::{
    codec::AgentCodec,
    error::AgentError,
    proto::{
        AddIdentity, AddIdentityConstrained, Identity, ProtoError, RemoveIdentity, Request,
        Response,
    },
};

/// SSH agent client
#[derive(Debug)]
pub struct Client<Stream>
where
    Stream: fmt::Debug + AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    adapter: Framed<Stream, AgentCodec>,
    timeout: Duration,
}

impl<Stream> Client<Stream>
where
    Stream: fmt::Debug + AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// Create a new SSH agent client wrapping a given socket.
    pub fn new(socket: Stream, timeout: Duration) -> Self {
        let adapter = Framed::new(socket, AgentCodec);
        Self { adapter, timeout }
    }

    /// Request a list of keys managed by the agent.
    pub async fn request_identities(&mut self) -> Result<Vec<Identity>, AgentError> {
        match self.handle(Request::RequestIdentities).await? {
            Response::IdentitiesAnswer(identities) => Ok(identities),
            Response::Failure => Err(AgentError::Failure),
            _ => Err(ProtoError::UnexpectedResponse.into()),
        }
    }

    /// Add a private key to the agent.
    pub async fn add_identity(&mut self, identity: AddIdentity) -> Result<(), AgentError> {
        self.expect_success(Request::AddIdentity(identity)).await
    }

    /// Add a private key to the agent with a set of constraints.
    pub async fn add_identity_constrained(
        &mut self,
        identity: AddIdentityConstrained,
    ) -> Result<(), AgentError> {
        self.expect_success(Request::AddIdConstrained(identity))
            .await
    }

    /// Remove a key from the agent.
    pub async fn remove_identity(&mut self, identity: RemoveIdentity) -> Result<(), AgentError> {
        self.expect_success(Request::RemoveIdentity(identity)).await
    }

    /// Remove all keys from the agent.
    pub async fn remove_all_identities(&mut self) -> Result<(), AgentError> {
        self.expect_success(Request::RemoveAllIdentities).await
    }

    async fn expect_success(&mut self, request: Request) -> Result<(), AgentError> {
        match self.handle(request).await? {
            Response::Success => Ok(()),
            Response::Failure => Err(AgentError::Failure),
            _ => Err(ProtoError::UnexpectedResponse.into()),
        }
    }

    async fn handle(&mut self, message: Request) -> Result<Response, AgentError> {
        tokio::time::timeout(self.timeout, self.exchange(message))
            .await
            .map_err(|_| AgentError::Timeout)?
    }

    async fn exchange(&mut self, message: Request) -> Result<Response, AgentError> {
        self.adapter.send(message).await?;
        if let Some(response) = self.adapter.try_next().await? {
            Ok(response)
        } else {
            Err(ProtoError::IO(std::io::Error::other("server disconnected")).into())
        }
    }
}

#[cfg(unix)]
impl Client<UnixStream> {
    /// Connect to the agent socket at `path`, bounded by `timeout`.
    pub async fn connect(path: &Path, timeout: Duration) -> Result<Self, AgentError> {
        let stream = tokio::time::timeout(timeout, UnixStream::connect(path))
            .await
            .map_err(|_| AgentError::Timeout)?
            .map_err(|source| AgentError::Connect {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(stream, timeout))
    }
}

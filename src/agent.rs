//! Loading keys into a running SSH agent.
//!
//! Every operation opens a fresh connection to the agent socket, performs
//! one request/response exchange and closes it again. The socket path is
//! resolved once when the [`AgentClient`] is built.
//!
//! ```no_run
//! # fn main() -> testresult::TestResult {
//! use ssh_agent_keys::agent::{AddOptions, AgentClient, AgentConfig};
//! use ssh_agent_keys::key::Key;
//!
//! let key = Key::parse(&std::fs::read("id_ed25519")?)?;
//! let mut client = AgentClient::new(&AgentConfig::default());
//! client.add_identity(&key, &AddOptions::default())?;
//! assert!(client.check_identity(&key)?);
//! client.remove_identity(&key)?;
//! # Ok(()) }
//! ```

use std::collections::HashMap;
use std::ffi::OsString;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};

use crate::blocking::Client;
use crate::error::AgentError;
use crate::key::{Key, PublicKey};
use crate::proto::{AddIdentity, AddIdentityConstrained, Identity, KeyConstraint, RemoveIdentity};

/// Environment variable naming the agent socket.
pub const SSH_AUTH_SOCK: &str = "SSH_AUTH_SOCK";

/// Bound applied to socket reads and writes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Where to find the agent and how long to wait for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentConfig {
    /// Socket path used instead of `SSH_AUTH_SOCK` when set.
    pub auth_sock_override: Option<PathBuf>,

    /// Read/write timeout for each exchange.
    pub timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            auth_sock_override: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AgentConfig {
    /// Configuration pointing at an explicit socket.
    pub fn with_socket(path: impl Into<PathBuf>) -> Self {
        Self {
            auth_sock_override: Some(path.into()),
            ..Self::default()
        }
    }

    /// Effective socket path: the override, else `SSH_AUTH_SOCK`.
    pub fn socket_path(&self) -> Option<PathBuf> {
        resolve_socket(
            self.auth_sock_override.as_deref(),
            std::env::var_os(SSH_AUTH_SOCK),
        )
    }
}

fn resolve_socket(over: Option<&Path>, env: Option<OsString>) -> Option<PathBuf> {
    match over {
        Some(path) if !path.as_os_str().is_empty() => Some(path.to_path_buf()),
        _ => env.filter(|var| !var.is_empty()).map(PathBuf::from),
    }
}

/// Constraints requested when adding a key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Ask the user before each use of the key.
    pub confirm: bool,

    /// Seconds until the agent drops the key; `0` keeps it indefinitely.
    pub lifetime: u32,

    /// Remove the key again in [`AgentClient::remove_added_identities`].
    pub remove_on_close: bool,
}

impl AddOptions {
    /// Agent constraints matching these options.
    pub fn constraints(&self) -> Vec<KeyConstraint> {
        let mut constraints = vec![];
        if self.lifetime > 0 {
            constraints.push(KeyConstraint::Lifetime(self.lifetime));
        }
        if self.confirm {
            constraints.push(KeyConstraint::Confirm);
        }
        constraints
    }
}

/// Connection-per-call SSH agent client.
#[derive(Debug)]
pub struct AgentClient {
    socket_path: Option<PathBuf>,
    timeout: Duration,
    added: HashMap<PublicKey, bool>,
}

impl AgentClient {
    /// Resolve the socket path from `config` and build a client.
    ///
    /// A zero timeout cannot be set on a socket and falls back to
    /// [`DEFAULT_TIMEOUT`].
    pub fn new(config: &AgentConfig) -> Self {
        let socket_path = config.socket_path();
        debug!("Using agent socket {socket_path:?}");
        let timeout = if config.timeout.is_zero() {
            warn!("Zero agent timeout requested, using {DEFAULT_TIMEOUT:?}");
            DEFAULT_TIMEOUT
        } else {
            config.timeout
        };
        Self {
            socket_path,
            timeout,
            added: HashMap::new(),
        }
    }

    /// Socket this client talks to.
    pub fn socket_path(&self) -> Option<&Path> {
        self.socket_path.as_deref()
    }

    /// Whether a socket path is configured at all.
    pub fn has_agent(&self) -> bool {
        self.socket_path.is_some()
    }

    /// Whether the agent socket accepts connections.
    pub fn is_reachable(&self) -> bool {
        self.connect().is_ok()
    }

    fn connect(&self) -> Result<Client<UnixStream>, AgentError> {
        let path = self.socket_path.as_ref().ok_or(AgentError::NoAgent)?;
        let stream = UnixStream::connect(path).map_err(|source| AgentError::Connect {
            path: path.clone(),
            source,
        })?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        Ok(Client::new(stream))
    }

    /// Send an unlocked key to the agent.
    ///
    /// A constrained add is used only when `options` asks for a lifetime or
    /// confirmation.
    pub fn add_identity(&mut self, key: &Key, options: &AddOptions) -> Result<(), AgentError> {
        let pubkey = key.public_key()?.clone();
        let identity = AddIdentity {
            privkey: key.private_key()?.clone(),
            comment: key.comment().to_string(),
        };
        let constraints = options.constraints();

        let mut client = self.connect()?;
        if constraints.is_empty() {
            client.add_identity(identity)?;
        } else {
            client.add_identity_constrained(AddIdentityConstrained {
                identity,
                constraints,
            })?;
        }
        info!("Added {} key {:?} to agent", key.key_type(), key.comment());

        let remove_on_close = self.added.entry(pubkey).or_default();
        *remove_on_close |= options.remove_on_close;
        Ok(())
    }

    /// Ask the agent to forget a key.
    pub fn remove_identity(&mut self, key: &Key) -> Result<(), AgentError> {
        let pubkey = key.public_key()?;
        self.remove_pubkey(pubkey)?;
        self.added.remove(pubkey);
        Ok(())
    }

    fn remove_pubkey(&self, pubkey: &PublicKey) -> Result<(), AgentError> {
        self.connect()?.remove_identity(RemoveIdentity {
            pubkey: pubkey.clone(),
        })
    }

    /// Keys currently held by the agent.
    pub fn list_identities(&self) -> Result<Vec<Identity>, AgentError> {
        self.connect()?.request_identities()
    }

    /// Whether the agent currently holds `key`.
    pub fn check_identity(&self, key: &Key) -> Result<bool, AgentError> {
        let pubkey = key.public_key()?;
        Ok(self
            .list_identities()?
            .iter()
            .any(|identity| &identity.pubkey == pubkey))
    }

    /// Remove every key added through this client with
    /// [`AddOptions::remove_on_close`] set.
    ///
    /// All keys are attempted; the last failure is returned.
    pub fn remove_added_identities(&mut self) -> Result<(), AgentError> {
        let mut result = Ok(());
        let pending: Vec<PublicKey> = self
            .added
            .iter()
            .filter(|(_, remove_on_close)| **remove_on_close)
            .map(|(pubkey, _)| pubkey.clone())
            .collect();

        for pubkey in pending {
            match self.remove_pubkey(&pubkey) {
                Ok(()) => {
                    self.added.remove(&pubkey);
                }
                Err(error) => {
                    warn!("Failed to remove {} key from agent: {error}", pubkey.key_type());
                    result = Err(error);
                }
            }
        }
        result
    }

    /// Remove all keys from the agent, including ones added elsewhere.
    pub fn remove_all_identities(&mut self) -> Result<(), AgentError> {
        self.connect()?.remove_all_identities()?;
        self.added.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_environment() {
        let env = Some(OsString::from("/tmp/env.sock"));
        assert_eq!(
            resolve_socket(Some(Path::new("/tmp/override.sock")), env.clone()),
            Some(PathBuf::from("/tmp/override.sock"))
        );
        assert_eq!(
            resolve_socket(None, env.clone()),
            Some(PathBuf::from("/tmp/env.sock"))
        );
        assert_eq!(
            resolve_socket(Some(Path::new("")), env),
            Some(PathBuf::from("/tmp/env.sock"))
        );
    }

    #[test]
    fn empty_environment_means_no_agent() {
        assert_eq!(resolve_socket(None, Some(OsString::new())), None);
        assert_eq!(resolve_socket(None, None), None);
    }

    #[test]
    fn operations_short_circuit_without_agent() {
        let client = AgentClient {
            socket_path: None,
            timeout: DEFAULT_TIMEOUT,
            added: HashMap::new(),
        };
        assert!(!client.has_agent());
        assert!(!client.is_reachable());
        assert!(matches!(client.list_identities(), Err(AgentError::NoAgent)));
    }

    #[test]
    fn missing_socket_is_a_connect_error() {
        let client = AgentClient::new(&AgentConfig::with_socket("/nonexistent/agent.sock"));
        assert!(client.has_agent());
        assert!(matches!(
            client.list_identities(),
            Err(AgentError::Connect { .. })
        ));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let client = AgentClient::new(&AgentConfig {
            auth_sock_override: Some(PathBuf::from("/tmp/agent.sock")),
            timeout: Duration::ZERO,
        });
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);

        let client = AgentClient::new(&AgentConfig {
            timeout: Duration::from_secs(3),
            ..AgentConfig::with_socket("/tmp/agent.sock")
        });
        assert_eq!(client.timeout, Duration::from_secs(3));
    }

    #[test]
    fn constraints_follow_options() {
        assert!(AddOptions::default().constraints().is_empty());
        let options = AddOptions {
            confirm: true,
            lifetime: 30,
            remove_on_close: false,
        };
        assert_eq!(
            options.constraints(),
            [KeyConstraint::Lifetime(30), KeyConstraint::Confirm]
        );
    }
}

//! SSH agent protocol request messages.

use ssh_encoding::{CheckedSum, Decode, Encode, Reader, Writer};

use super::{AddIdentity, AddIdentityConstrained, RemoveIdentity};
use crate::proto::{ProtoError, ProtoResult};

/// SSH agent protocol request messages.
///
/// These message types are sent from a client *to* an agent.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Request {
    /// Request a list of all identities (public key & comment)
    /// from an agent
    RequestIdentities,

    /// Add an identity (private key & comment) to an agent
    AddIdentity(AddIdentity),

    /// Remove an identity from an agent
    RemoveIdentity(RemoveIdentity),

    /// Remove all identities from an agent
    RemoveAllIdentities,

    /// Add an identity (private key & comment) to an agent,
    /// with constraints on its usage
    AddIdConstrained(AddIdentityConstrained),
}

/// `SSH_AGENTC_REQUEST_IDENTITIES`
pub const SSH_AGENTC_REQUEST_IDENTITIES: u8 = 11;
/// `SSH_AGENTC_ADD_IDENTITY`
pub const SSH_AGENTC_ADD_IDENTITY: u8 = 17;
/// `SSH_AGENTC_REMOVE_IDENTITY`
pub const SSH_AGENTC_REMOVE_IDENTITY: u8 = 18;
/// `SSH_AGENTC_REMOVE_ALL_IDENTITIES`
pub const SSH_AGENTC_REMOVE_ALL_IDENTITIES: u8 = 19;
/// `SSH_AGENTC_ADD_ID_CONSTRAINED`
pub const SSH_AGENTC_ADD_ID_CONSTRAINED: u8 = 25;

impl Request {
    /// The protocol message identifier for a given [`Request`] message type.
    pub fn message_id(&self) -> u8 {
        match self {
            Self::RequestIdentities => SSH_AGENTC_REQUEST_IDENTITIES,
            Self::AddIdentity(_) => SSH_AGENTC_ADD_IDENTITY,
            Self::RemoveIdentity(_) => SSH_AGENTC_REMOVE_IDENTITY,
            Self::RemoveAllIdentities => SSH_AGENTC_REMOVE_ALL_IDENTITIES,
            Self::AddIdConstrained(_) => SSH_AGENTC_ADD_ID_CONSTRAINED,
        }
    }
}

impl Decode for Request {
    type Error = ProtoError;

    fn decode(reader: &mut impl Reader) -> ProtoResult<Self> {
        match u8::decode(reader)? {
            SSH_AGENTC_REQUEST_IDENTITIES => Ok(Self::RequestIdentities),
            SSH_AGENTC_ADD_IDENTITY => AddIdentity::decode(reader).map(Self::AddIdentity),
            SSH_AGENTC_REMOVE_IDENTITY => RemoveIdentity::decode(reader).map(Self::RemoveIdentity),
            SSH_AGENTC_REMOVE_ALL_IDENTITIES => Ok(Self::RemoveAllIdentities),
            SSH_AGENTC_ADD_ID_CONSTRAINED => {
                AddIdentityConstrained::decode(reader).map(Self::AddIdConstrained)
            }
            command => Err(ProtoError::UnsupportedCommand { command }),
        }
    }
}

impl Encode for Request {
    fn encoded_len(&self) -> ssh_encoding::Result<usize> {
        let payload_len = match self {
            Self::RequestIdentities | Self::RemoveAllIdentities => 0,
            Self::AddIdentity(identity) => identity.encoded_len()?,
            Self::RemoveIdentity(identity) => identity.encoded_len()?,
            Self::AddIdConstrained(identity) => identity.encoded_len()?,
        };
        [1, payload_len].checked_sum()
    }

    fn encode(&self, writer: &mut impl Writer) -> ssh_encoding::Result<()> {
        self.message_id().encode(writer)?;
        match self {
            Self::RequestIdentities | Self::RemoveAllIdentities => Ok(()),
            Self::AddIdentity(identity) => identity.encode(writer),
            Self::RemoveIdentity(identity) => identity.encode(writer),
            Self::AddIdConstrained(identity) => identity.encode(writer),
        }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use testresult::TestResult;

    use super::*;
    use crate::key::{KeyType, PrivateKey, PublicKey};
    use crate::proto::KeyConstraint;

    fn ed25519_private() -> PrivateKey {
        PrivateKey::new(KeyType::Ed25519, vec![vec![0x11; 32], vec![0x22; 64]])
            .expect("valid component count")
    }

    #[test]
    fn request_identities_is_a_single_byte() -> TestResult {
        let mut bytes = vec![];
        Request::RequestIdentities.encode(&mut bytes)?;
        assert_eq!(bytes, [11]);
        assert_eq!(Request::decode(&mut &bytes[..])?, Request::RequestIdentities);
        Ok(())
    }

    #[test]
    fn remove_identity_prefixes_blob() -> TestResult {
        let pubkey = PublicKey::new(KeyType::Ed25519, vec![vec![0xab; 32]])?;
        let request = Request::RemoveIdentity(RemoveIdentity { pubkey });

        let mut bytes = vec![];
        request.encode(&mut bytes)?;
        assert_eq!(bytes.len(), request.encoded_len()?);
        // opcode, blob length, then the blob itself
        assert_eq!(&bytes[..9], &hex!("12 00000033 0000000b")[..]);
        assert_eq!(Request::decode(&mut &bytes[..])?, request);
        Ok(())
    }

    #[test]
    fn constrained_add_appends_constraints() -> TestResult {
        let request = Request::AddIdConstrained(AddIdentityConstrained {
            identity: AddIdentity {
                privkey: ed25519_private(),
                comment: "c".into(),
            },
            constraints: vec![KeyConstraint::Lifetime(600), KeyConstraint::Confirm],
        });

        let mut bytes = vec![];
        request.encode(&mut bytes)?;
        assert_eq!(bytes[0], 25);
        assert_eq!(&bytes[bytes.len() - 6..], &hex!("01 00000258 02")[..]);
        assert_eq!(bytes.len(), request.encoded_len()?);
        assert_eq!(Request::decode(&mut &bytes[..])?, request);
        Ok(())
    }

    #[test]
    fn unknown_constraint() -> TestResult {
        let mut bytes = vec![];
        Request::AddIdentity(AddIdentity {
            privkey: ed25519_private(),
            comment: String::new(),
        })
        .encode(&mut bytes)?;
        bytes[0] = 25;
        bytes.push(0xff);
        assert!(matches!(
            Request::decode(&mut &bytes[..]),
            Err(ProtoError::UnsupportedConstraint { constraint: 0xff })
        ));
        Ok(())
    }

    #[test]
    fn unknown_command() {
        assert!(matches!(
            Request::decode(&mut &[13u8][..]),
            Err(ProtoError::UnsupportedCommand { command: 13 })
        ));
    }
}

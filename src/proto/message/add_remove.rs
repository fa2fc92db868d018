//! Add a key to an agent with or without constraints, or remove it.

mod constrained;

pub use constrained::*;
use ssh_encoding::{self, CheckedSum, Decode, Encode, Reader, Writer};

use crate::key::{PrivateKey, PublicKey};
use crate::proto::{ProtoError, ProtoResult};

/// Add a key to an agent.
///
/// This structure is sent in a [`Request::AddIdentity`](super::Request::AddIdentity)
/// (`SSH_AGENTC_ADD_IDENTITY`) message.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AddIdentity {
    /// Private key in its wire form.
    pub privkey: PrivateKey,

    /// A human-readable comment
    pub comment: String,
}

impl Decode for AddIdentity {
    type Error = ProtoError;

    fn decode(reader: &mut impl Reader) -> ProtoResult<Self> {
        let privkey = PrivateKey::decode(reader)?;
        let comment = String::decode(reader)?;

        Ok(Self { privkey, comment })
    }
}

impl Encode for AddIdentity {
    fn encoded_len(&self) -> ssh_encoding::Result<usize> {
        [self.privkey.encoded_len()?, self.comment.encoded_len()?].checked_sum()
    }

    fn encode(&self, writer: &mut impl Writer) -> ssh_encoding::Result<()> {
        self.privkey.encode(writer)?;
        self.comment.encode(writer)
    }
}

/// Remove a key from an agent.
///
/// This structure is sent in a [`Request::RemoveIdentity`](super::Request::RemoveIdentity)
/// (`SSH_AGENTC_REMOVE_IDENTITY`) message.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RemoveIdentity {
    /// The public key portion of the [`Identity`](super::Identity) to be removed
    pub pubkey: PublicKey,
}

impl Decode for RemoveIdentity {
    type Error = ProtoError;

    fn decode(reader: &mut impl Reader) -> ProtoResult<Self> {
        let pubkey = reader.read_prefixed(PublicKey::decode)?;

        Ok(Self { pubkey })
    }
}

impl Encode for RemoveIdentity {
    fn encoded_len(&self) -> ssh_encoding::Result<usize> {
        self.pubkey.encoded_len_prefixed()
    }

    fn encode(&self, writer: &mut impl Writer) -> ssh_encoding::Result<()> {
        self.pubkey.encode_prefixed(writer)
    }
}

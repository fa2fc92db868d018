//! Data returned to the client when listing keys.

use log::debug;
use ssh_encoding::{self, CheckedSum, Decode, Encode, Reader, Writer};

use crate::key::PublicKey;
use crate::proto::{ProtoError, ProtoResult};

/// Public key and comment as reported by the agent.
///
/// A list of these structures is sent in a
/// [`Response::IdentitiesAnswer`](super::Response::IdentitiesAnswer)
/// (`SSH_AGENT_IDENTITIES_ANSWER`) message body.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Identity {
    /// Public key blob of the identity.
    pub pubkey: PublicKey,

    /// A human-readable comment
    pub comment: String,
}

impl Identity {
    /// Decode a counted list of identities.
    ///
    /// Agents may hold keys of types this crate does not model (certificates,
    /// hardware tokens). Those entries are skipped instead of failing the
    /// whole answer.
    pub(crate) fn decode_vec(reader: &mut impl Reader) -> ProtoResult<Vec<Self>> {
        let len = u32::decode(reader)?;
        let mut identities = vec![];

        for _ in 0..len {
            let blob = Vec::<u8>::decode(reader)?;
            let comment = decode_comment(reader)?;
            match PublicKey::from_blob(&blob) {
                Ok(pubkey) => identities.push(Self { pubkey, comment }),
                Err(error) => debug!("Skipping identity {comment:?}: {error}"),
            }
        }

        Ok(identities)
    }
}

fn decode_comment(reader: &mut impl Reader) -> ProtoResult<String> {
    let comment = Vec::<u8>::decode(reader)?;
    Ok(String::from_utf8_lossy(&comment).into_owned())
}

impl Decode for Identity {
    type Error = ProtoError;

    fn decode(reader: &mut impl Reader) -> ProtoResult<Self> {
        let pubkey = reader.read_prefixed(PublicKey::decode)?;
        let comment = decode_comment(reader)?;

        Ok(Self { pubkey, comment })
    }
}

impl Encode for Identity {
    fn encoded_len(&self) -> ssh_encoding::Result<usize> {
        [
            self.pubkey.encoded_len_prefixed()?,
            self.comment.encoded_len()?,
        ]
        .checked_sum()
    }

    fn encode(&self, writer: &mut impl Writer) -> ssh_encoding::Result<()> {
        self.pubkey.encode_prefixed(writer)?;
        self.comment.encode(writer)?;

        Ok(())
    }
}

//! SSH agent protocol response messages.

use ssh_encoding::{CheckedSum, Decode, Encode, Reader, Writer};

use super::Identity;
use crate::proto::{ProtoError, ProtoResult};

/// SSH agent protocol response messages.
///
/// These message types are sent to a client *from* an agent (in response to a [`Request`](super::Request) message).
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Response {
    /// Indicates generic agent failure
    Failure,

    /// Indicates generic agent success
    Success,

    /// A list of identities, sent in response to
    /// a [`Request::RequestIdentities`](super::Request::RequestIdentities) message.
    IdentitiesAnswer(Vec<Identity>),
}

/// `SSH_AGENT_FAILURE`
pub const SSH_AGENT_FAILURE: u8 = 5;
/// `SSH_AGENT_SUCCESS`
pub const SSH_AGENT_SUCCESS: u8 = 6;
/// `SSH_AGENT_IDENTITIES_ANSWER`
pub const SSH_AGENT_IDENTITIES_ANSWER: u8 = 12;

impl Response {
    /// The protocol message identifier for a given [`Response`] message type.
    pub fn message_id(&self) -> u8 {
        match self {
            Self::Failure => SSH_AGENT_FAILURE,
            Self::Success => SSH_AGENT_SUCCESS,
            Self::IdentitiesAnswer(_) => SSH_AGENT_IDENTITIES_ANSWER,
        }
    }
}

impl Decode for Response {
    type Error = ProtoError;

    fn decode(reader: &mut impl Reader) -> ProtoResult<Self> {
        match u8::decode(reader)? {
            SSH_AGENT_FAILURE => Ok(Self::Failure),
            SSH_AGENT_SUCCESS => Ok(Self::Success),
            SSH_AGENT_IDENTITIES_ANSWER => Identity::decode_vec(reader).map(Self::IdentitiesAnswer),
            command => Err(ProtoError::UnsupportedCommand { command }),
        }
    }
}

impl Encode for Response {
    fn encoded_len(&self) -> ssh_encoding::Result<usize> {
        match self {
            Self::Failure | Self::Success => Ok(1),
            // opcode and count, then each identity
            Self::IdentitiesAnswer(ids) => ids
                .iter()
                .try_fold(5usize, |acc, id| [acc, id.encoded_len()?].checked_sum()),
        }
    }

    fn encode(&self, writer: &mut impl Writer) -> ssh_encoding::Result<()> {
        self.message_id().encode(writer)?;
        if let Self::IdentitiesAnswer(ids) = self {
            let count = u32::try_from(ids.len()).map_err(|_| ssh_encoding::Error::Overflow)?;
            count.encode(writer)?;
            for id in ids {
                id.encode(writer)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use testresult::TestResult;

    use super::*;
    use crate::key::KeyType;

    // count 2: an ed25519 key commented "a", then an unknown "ssh-foo" blob
    const ANSWER: &[u8] = &hex!(
        "0c 00000002
         00000033 0000000b 7373682d 65643235 353139
                  00000020 dd94ee45 da41765b 379dac10 07062f70 0477884b 35d9d08b 88aaba74 13379acc
         00000001 61
         0000000b 00000007 7373682d 666f6f
         00000001 62"
    );

    #[test]
    fn identities_answer_skips_unknown_keys() -> TestResult {
        let Response::IdentitiesAnswer(ids) = Response::decode(&mut &ANSWER[..])? else {
            panic!("expected identities answer");
        };
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].pubkey.key_type(), KeyType::Ed25519);
        assert_eq!(ids[0].comment, "a");
        Ok(())
    }

    #[test]
    fn identities_answer_encodes() -> TestResult {
        let Response::IdentitiesAnswer(ids) = Response::decode(&mut &ANSWER[..])? else {
            panic!("expected identities answer");
        };
        let response = Response::IdentitiesAnswer(ids);
        let mut bytes = vec![];
        response.encode(&mut bytes)?;
        assert_eq!(bytes.len(), response.encoded_len()?);
        assert_eq!(bytes[..5], hex!("0c 00000001"));
        assert_eq!(Response::decode(&mut &bytes[..])?, response);
        Ok(())
    }

    #[test]
    fn status_codes() -> TestResult {
        assert_eq!(Response::decode(&mut &[5u8][..])?, Response::Failure);
        assert_eq!(Response::decode(&mut &[6u8][..])?, Response::Success);
        assert!(matches!(
            Response::decode(&mut &[0u8; 0][..]),
            Err(ProtoError::SshEncoding(ssh_encoding::Error::Length))
        ));
        Ok(())
    }
}

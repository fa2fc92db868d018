use ssh_encoding::{CheckedSum, Decode, Encode, Reader, Writer};

use crate::proto::{AddIdentity, ProtoError, ProtoResult};

/// A key constraint, used to place limitations on how a key can be used.
///
/// Constraints are attached to a key when it is sent in a
/// [`Request::AddIdConstrained`](crate::proto::Request::AddIdConstrained) message.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyConstraint {
    /// Limit the key's lifetime by deleting it after the specified duration (in seconds)
    Lifetime(u32),

    /// Require explicit user confirmation for each private key operation using the key.
    Confirm,
}

/// `SSH_AGENT_CONSTRAIN_LIFETIME`
pub const SSH_AGENT_CONSTRAIN_LIFETIME: u8 = 1;
/// `SSH_AGENT_CONSTRAIN_CONFIRM`
pub const SSH_AGENT_CONSTRAIN_CONFIRM: u8 = 2;

impl KeyConstraint {
    /// `SSH_AGENT_CONSTRAIN_*` code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Lifetime(_) => SSH_AGENT_CONSTRAIN_LIFETIME,
            Self::Confirm => SSH_AGENT_CONSTRAIN_CONFIRM,
        }
    }
}

impl Decode for KeyConstraint {
    type Error = ProtoError;

    fn decode(reader: &mut impl Reader) -> ProtoResult<Self> {
        match u8::decode(reader)? {
            SSH_AGENT_CONSTRAIN_LIFETIME => Ok(Self::Lifetime(u32::decode(reader)?)),
            SSH_AGENT_CONSTRAIN_CONFIRM => Ok(Self::Confirm),
            constraint => Err(ProtoError::UnsupportedConstraint { constraint }),
        }
    }
}

impl Encode for KeyConstraint {
    fn encoded_len(&self) -> ssh_encoding::Result<usize> {
        Ok(match self {
            Self::Lifetime(_) => 5,
            Self::Confirm => 1,
        })
    }

    fn encode(&self, writer: &mut impl Writer) -> ssh_encoding::Result<()> {
        self.code().encode(writer)?;
        match self {
            Self::Lifetime(seconds) => seconds.encode(writer),
            Self::Confirm => Ok(()),
        }
    }
}

/// Add a key to an agent, with constraints on its use.
///
/// This structure is sent in a
/// [`Request::AddIdConstrained`](crate::proto::Request::AddIdConstrained)
/// (`SSH_AGENTC_ADD_ID_CONSTRAINED`) message.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AddIdentityConstrained {
    /// The key to be added to the agent.
    pub identity: AddIdentity,

    /// Constraints to be placed on the `identity`.
    pub constraints: Vec<KeyConstraint>,
}

impl Decode for AddIdentityConstrained {
    type Error = ProtoError;

    fn decode(reader: &mut impl Reader) -> ProtoResult<Self> {
        let identity = AddIdentity::decode(reader)?;
        let mut constraints = vec![];

        while !reader.is_finished() {
            constraints.push(KeyConstraint::decode(reader)?);
        }

        Ok(Self {
            identity,
            constraints,
        })
    }
}

impl Encode for AddIdentityConstrained {
    fn encoded_len(&self) -> ssh_encoding::Result<usize> {
        self.constraints
            .iter()
            .try_fold(self.identity.encoded_len()?, |acc, constraint| {
                [acc, constraint.encoded_len()?].checked_sum()
            })
    }

    fn encode(&self, writer: &mut impl Writer) -> ssh_encoding::Result<()> {
        self.identity.encode(writer)?;
        for constraint in &self.constraints {
            constraint.encode(writer)?;
        }
        Ok(())
    }
}

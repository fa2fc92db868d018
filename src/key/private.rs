use ssh_encoding::{CheckedSum, Decode, Encode, Reader, Writer};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroizing;

use super::{KeyError, KeyResult, KeyType, PublicKey};

/// Decrypted private key material.
///
/// Components are kept exactly as they appear on the wire so the key can
/// be forwarded to an agent without interpretation. Security-key types
/// start with an opaque, already encoded prefix (curve, point,
/// application and a flags byte) that precedes the regular components.
#[derive(Clone)]
pub struct PrivateKey {
    key_type: KeyType,
    prefix: Zeroizing<Vec<u8>>,
    components: Vec<Zeroizing<Vec<u8>>>,
}

impl PrivateKey {
    /// Assemble a private key from its components, checking their count.
    pub fn new(key_type: KeyType, components: Vec<Vec<u8>>) -> KeyResult<Self> {
        if key_type.is_security_key() {
            return Err(KeyError::SecurityKeyComponents(key_type.as_str()));
        }
        if components.len() != key_type.private_parts() {
            return Err(KeyError::InvalidComponentCount {
                key_type: key_type.as_str(),
                expected: key_type.private_parts(),
                found: components.len(),
            });
        }
        Ok(Self {
            key_type,
            prefix: Zeroizing::new(Vec::new()),
            components: components.into_iter().map(Zeroizing::new).collect(),
        })
    }

    /// Key type.
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Private components in type order (excluding any security-key prefix).
    pub fn components(&self) -> impl Iterator<Item = &[u8]> {
        self.components.iter().map(|c| c.as_slice())
    }

    /// Number of private components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Derive the matching public key from the private components.
    pub fn public_key(&self) -> KeyResult<PublicKey> {
        let parts = |range: std::ops::Range<usize>| -> Vec<Vec<u8>> {
            self.components[range].iter().map(|c| c.to_vec()).collect()
        };
        match self.key_type {
            KeyType::Dss => PublicKey::new(self.key_type, parts(0..4)),
            // private order is n, e; public order is e, n
            KeyType::Rsa => PublicKey::new(
                self.key_type,
                vec![self.components[1].to_vec(), self.components[0].to_vec()],
            ),
            KeyType::Ecdsa(_) => PublicKey::new(self.key_type, parts(0..2)),
            KeyType::Ed25519 => PublicKey::new(self.key_type, parts(0..1)),
            KeyType::SkEcdsaP256 => {
                let mut prefix = &self.prefix[..];
                let mut public = Vec::with_capacity(3);
                for _ in 0..3 {
                    public.push(Vec::<u8>::decode(&mut prefix)?);
                }
                PublicKey::new(self.key_type, public)
            }
        }
    }

    /// Parse a serialized private key, rejecting trailing bytes.
    pub fn from_bytes(mut bytes: &[u8]) -> KeyResult<Self> {
        let key = Self::decode(&mut bytes)?;
        if !bytes.is_finished() {
            return Err(ssh_encoding::Error::TrailingData {
                remaining: bytes.remaining_len(),
            }
            .into());
        }
        Ok(key)
    }

    /// Serialized private key (`string type` followed by the components).
    pub fn to_bytes(&self) -> KeyResult<Zeroizing<Vec<u8>>> {
        let mut out = Zeroizing::new(Vec::with_capacity(self.encoded_len()?));
        self.encode(&mut *out)?;
        Ok(out)
    }
}

impl Decode for PrivateKey {
    type Error = KeyError;

    fn decode(reader: &mut impl Reader) -> KeyResult<Self> {
        let name = Zeroizing::new(Vec::<u8>::decode(reader)?);
        let key_type = KeyType::try_from(&name[..])?;

        let mut prefix = Zeroizing::new(Vec::new());
        if key_type.is_security_key() {
            for _ in 0..3 {
                let part = Zeroizing::new(Vec::<u8>::decode(reader)?);
                part.as_slice().encode(&mut *prefix)?;
            }
            let flags = u8::decode(reader)?;
            flags.encode(&mut *prefix)?;
        }

        let mut components = Vec::with_capacity(key_type.private_parts());
        for _ in 0..key_type.private_parts() {
            components.push(Zeroizing::new(Vec::<u8>::decode(reader)?));
        }

        Ok(Self {
            key_type,
            prefix,
            components,
        })
    }
}

impl Encode for PrivateKey {
    fn encoded_len(&self) -> ssh_encoding::Result<usize> {
        self.components.iter().try_fold(
            [self.key_type.as_str().encoded_len()?, self.prefix.len()].checked_sum()?,
            |acc, part| [acc, part.as_slice().encoded_len()?].checked_sum(),
        )
    }

    fn encode(&self, writer: &mut impl Writer) -> ssh_encoding::Result<()> {
        self.key_type.as_str().encode(writer)?;
        writer.write(&self.prefix)?;
        for part in &self.components {
            part.as_slice().encode(writer)?;
        }
        Ok(())
    }
}

impl ConstantTimeEq for PrivateKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        if self.key_type != other.key_type || self.components.len() != other.components.len() {
            return Choice::from(0);
        }
        self.components
            .iter()
            .zip(other.components.iter())
            .fold(self.prefix.ct_eq(&other.prefix), |acc, (a, b)| {
                acc & a.as_slice().ct_eq(b.as_slice())
            })
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for PrivateKey {}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key_type", &self.key_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    // string "sk-ecdsa-sha2-nistp256@openssh.com", string curve, string point,
    // string application, byte flags, string key handle, string reserved
    const SK_PRIVATE: &[u8] = &hex!(
        "00000022 736b2d65 63647361 2d736861 322d6e69 73747032 3536406f 70656e73 73682e63 6f6d
         00000008 6e697374 70323536
         00000003 040102
         00000004 7373683a
         01
         00000002 cafe
         00000000"
    );

    #[test]
    fn security_key_layout_roundtrips() {
        let mut reader = SK_PRIVATE;
        let key = PrivateKey::decode(&mut reader).unwrap();
        assert!(reader.is_empty());
        assert_eq!(key.key_type(), KeyType::SkEcdsaP256);
        assert_eq!(key.component_count(), 2);
        assert_eq!(key.components().next(), Some(&hex!("cafe")[..]));

        assert_eq!(key.encoded_len().unwrap(), SK_PRIVATE.len());
        assert_eq!(&key.to_bytes().unwrap()[..], SK_PRIVATE);

        let public = key.public_key().unwrap();
        assert_eq!(public.components()[0], b"nistp256");
        assert_eq!(public.components()[2], b"ssh:");
    }

    #[test]
    fn rsa_public_order() {
        let key = PrivateKey::new(
            KeyType::Rsa,
            vec![
                vec![0xc5; 4],
                vec![1, 0, 1],
                vec![3],
                vec![4],
                vec![5],
                vec![6],
            ],
        )
        .unwrap();
        let public = key.public_key().unwrap();
        assert_eq!(public.components()[0], [1, 0, 1]);
        assert_eq!(public.components()[1], [0xc5; 4]);
    }

    #[test]
    fn equality_compares_components() {
        let a = PrivateKey::new(KeyType::Ed25519, vec![vec![1; 32], vec![2; 64]]).unwrap();
        let b = PrivateKey::new(KeyType::Ed25519, vec![vec![1; 32], vec![2; 64]]).unwrap();
        let c = PrivateKey::new(KeyType::Ed25519, vec![vec![1; 32], vec![3; 64]]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(PrivateKey::new(KeyType::Ed25519, vec![vec![1; 32]]).is_err());
    }

    #[test]
    fn security_key_needs_container() {
        let err = PrivateKey::new(KeyType::SkEcdsaP256, vec![vec![1], vec![]]).unwrap_err();
        assert!(matches!(err, KeyError::SecurityKeyComponents(_)));
        assert!(err.to_string().contains("cannot be assembled"));
    }
}

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use md5::Md5;
use sha2::{Digest, Sha256, Sha512};
use ssh_encoding::{CheckedSum, Decode, Encode, Reader, Writer};

use super::{asn1, KeyError, KeyResult, KeyType};
use crate::pem::PemContainer;

const RSA_PUBLIC_LABEL: &str = "RSA PUBLIC KEY";

/// Digest used for key fingerprints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HashAlg {
    /// `MD5:aa:bb:...`
    Md5,
    /// `SHA256:<base64>`
    #[default]
    Sha256,
    /// Rendered with the generic `HASH:<hex>` form.
    Sha512,
}

/// Public half of a key: its type and the type-specific wire components.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey {
    key_type: KeyType,
    components: Vec<Vec<u8>>,
}

impl PublicKey {
    /// Assemble a public key, checking the component count.
    pub fn new(key_type: KeyType, components: Vec<Vec<u8>>) -> KeyResult<Self> {
        if components.len() != key_type.public_parts() {
            return Err(KeyError::InvalidComponentCount {
                key_type: key_type.as_str(),
                expected: key_type.public_parts(),
                found: components.len(),
            });
        }
        Ok(Self {
            key_type,
            components,
        })
    }

    /// Parse a complete public key blob (`string type, string...`).
    pub fn from_blob(mut blob: &[u8]) -> KeyResult<Self> {
        let key = Self::decode(&mut blob)?;
        if !blob.is_finished() {
            return Err(ssh_encoding::Error::TrailingData {
                remaining: blob.remaining_len(),
            }
            .into());
        }
        Ok(key)
    }

    /// Read an `RSA PUBLIC KEY` PEM block (PKCS#1 `RSAPublicKey`).
    pub fn from_pem(pem: &PemContainer) -> KeyResult<Self> {
        if pem.label() != RSA_PUBLIC_LABEL {
            return Err(KeyError::UnsupportedContainer(pem.label().to_string()));
        }
        let integers = asn1::read_integers(pem.data(), 2, 2)?;
        // wire order is e, n
        Self::new(KeyType::Rsa, vec![integers[1].to_vec(), integers[0].to_vec()])
    }

    /// Key type.
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Wire components in type order.
    pub fn components(&self) -> &[Vec<u8>] {
        &self.components
    }

    /// Serialized blob, as sent to agents and hashed for fingerprints.
    pub fn to_blob(&self) -> KeyResult<Vec<u8>> {
        let mut blob = Vec::with_capacity(self.encoded_len()?);
        self.encode(&mut blob)?;
        Ok(blob)
    }

    /// Fingerprint over the public blob.
    pub fn fingerprint(&self, alg: HashAlg) -> KeyResult<String> {
        let blob = self.to_blob()?;
        Ok(match alg {
            HashAlg::Md5 => {
                let digest = Md5::digest(&blob);
                let octets: Vec<String> = digest.iter().map(|b| format!("{b:02x}")).collect();
                format!("MD5:{}", octets.join(":"))
            }
            HashAlg::Sha256 => format!("SHA256:{}", STANDARD_NO_PAD.encode(Sha256::digest(&blob))),
            HashAlg::Sha512 => {
                let hex: String = Sha512::digest(&blob)
                    .iter()
                    .map(|b| format!("{b:02x}"))
                    .collect();
                format!("HASH:{hex}")
            }
        })
    }

    /// `authorized_keys` style line, with the comment appended when non-empty.
    pub fn to_openssh_line(&self, comment: &str) -> KeyResult<String> {
        let encoded = STANDARD.encode(self.to_blob()?);
        Ok(if comment.is_empty() {
            format!("{} {}", self.key_type, encoded)
        } else {
            format!("{} {} {}", self.key_type, encoded, comment)
        })
    }

    /// Approximate key size in bits, derived from component lengths.
    ///
    /// Returns `0` for security keys and when the component count does not
    /// match the type.
    pub fn key_length(&self) -> usize {
        if self.components.len() != self.key_type.public_parts() {
            return 0;
        }
        let len = |i: usize| self.components[i].len();
        match self.key_type {
            KeyType::Dss => len(0).saturating_sub(1) * 8,
            KeyType::Rsa => len(1).saturating_sub(1) * 8,
            KeyType::Ecdsa(_) => len(1).saturating_sub(1) * 4,
            KeyType::Ed25519 => len(0) * 8,
            KeyType::SkEcdsaP256 => 0,
        }
    }
}

impl Decode for PublicKey {
    type Error = KeyError;

    fn decode(reader: &mut impl Reader) -> KeyResult<Self> {
        let name = Vec::<u8>::decode(reader)?;
        let key_type = KeyType::try_from(&name[..])?;

        let mut components = Vec::with_capacity(key_type.public_parts());
        for _ in 0..key_type.public_parts() {
            components.push(Vec::decode(reader)?);
        }

        Ok(Self {
            key_type,
            components,
        })
    }
}

impl Encode for PublicKey {
    fn encoded_len(&self) -> ssh_encoding::Result<usize> {
        self.components
            .iter()
            .try_fold(self.key_type.as_str().encoded_len()?, |acc, part| {
                [acc, part.encoded_len()?].checked_sum()
            })
    }

    fn encode(&self, writer: &mut impl Writer) -> ssh_encoding::Result<()> {
        self.key_type.as_str().encode(writer)?;
        for part in &self.components {
            part.encode(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    const ED25519_BLOB: [u8; 51] = hex!(
        "0000000b 7373682d 65643235 353139
         00000020 dd94ee45 da41765b 379dac10 07062f70 0477884b 35d9d08b 88aaba74 13379acc"
    );

    #[test]
    fn decode_encode_blob() {
        let key = PublicKey::from_blob(&ED25519_BLOB).unwrap();
        assert_eq!(key.key_type(), KeyType::Ed25519);
        assert_eq!(key.components().len(), 1);
        assert_eq!(key.key_length(), 256);
        assert_eq!(key.encoded_len().unwrap(), ED25519_BLOB.len());
        assert_eq!(key.to_blob().unwrap(), ED25519_BLOB);
    }

    #[test]
    fn fingerprints() {
        let key = PublicKey::from_blob(&ED25519_BLOB).unwrap();
        assert_eq!(
            key.fingerprint(HashAlg::Sha256).unwrap(),
            "SHA256:D1fVmA15YXzaJ5sdO9dXxo5coHL/pnNaIfCvokHzTA4"
        );
        assert_eq!(
            key.fingerprint(HashAlg::Md5).unwrap(),
            "MD5:2d:e8:04:09:13:b4:2b:73:5e:87:43:cf:4e:6f:62:f1"
        );
        let generic = key.fingerprint(HashAlg::Sha512).unwrap();
        assert!(generic.starts_with("HASH:"));
        assert_eq!(generic.len(), "HASH:".len() + 128);
    }

    #[test]
    fn changing_a_component_changes_the_fingerprint() {
        let key = PublicKey::from_blob(&ED25519_BLOB).unwrap();
        let mut point = key.components()[0].clone();
        point[0] ^= 1;
        let other = PublicKey::new(KeyType::Ed25519, vec![point]).unwrap();
        assert_ne!(
            key.fingerprint(HashAlg::Sha256).unwrap(),
            other.fingerprint(HashAlg::Sha256).unwrap()
        );
    }

    #[test]
    fn openssh_line() {
        let key = PublicKey::from_blob(&ED25519_BLOB).unwrap();
        assert_eq!(
            key.to_openssh_line("opensshkey-test-parse@keepassxc").unwrap(),
            "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIN2U7kXaQXZbN52sEAcGL3AEd4hLNdnQi4iqunQTN5rM opensshkey-test-parse@keepassxc"
        );
        assert!(!key.to_openssh_line("").unwrap().ends_with(' '));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut blob = ED25519_BLOB.to_vec();
        blob.push(0);
        assert!(matches!(
            PublicKey::from_blob(&blob),
            Err(KeyError::Encoding(ssh_encoding::Error::TrailingData { remaining: 1 }))
        ));
    }

    #[test]
    fn truncated_blob() {
        assert!(matches!(
            PublicKey::from_blob(&ED25519_BLOB[..40]),
            Err(KeyError::Truncated)
        ));
    }

    #[test]
    fn unknown_type() {
        let blob = hex!("00000007 7373682d 666f6f");
        assert!(matches!(
            PublicKey::from_blob(&blob),
            Err(KeyError::UnknownKeyType(name)) if name == "ssh-foo"
        ));
    }

    #[test]
    fn key_length_rules() {
        let rsa = PublicKey::new(KeyType::Rsa, vec![vec![1, 0, 1], vec![0; 257]]).unwrap();
        assert_eq!(rsa.key_length(), 2048);
        let ecdsa = PublicKey::new(
            KeyType::Ecdsa(super::super::EcdsaCurve::NistP256),
            vec![b"nistp256".to_vec(), vec![4; 65]],
        )
        .unwrap();
        assert_eq!(ecdsa.key_length(), 256);
        let security_key = PublicKey::new(
            KeyType::SkEcdsaP256,
            vec![b"nistp256".to_vec(), vec![4; 65], b"ssh:".to_vec()],
        )
        .unwrap();
        assert_eq!(security_key.key_length(), 0);
        let malformed = PublicKey {
            key_type: KeyType::Dss,
            components: vec![vec![0; 129]],
        };
        assert_eq!(malformed.key_length(), 0);
    }
}

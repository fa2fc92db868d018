//! SSH private keys: parsing, passphrase unlocking and wire serialization.
//!
//! Supported containers are the modern `openssh-key-v1` format
//! (`OPENSSH PRIVATE KEY`) and legacy PKCS#1 PEM keys
//! (`RSA PRIVATE KEY`, `DSA PRIVATE KEY`), optionally encrypted with
//! `Proc-Type: 4,ENCRYPTED`.
//!
//! ```
//! # fn main() -> testresult::TestResult {
//! use ssh_agent_keys::key::{HashAlg, Key};
//!
//! let key = Key::parse(&std::fs::read("tests/keys/ed25519_plain")?)?;
//! assert_eq!(key.comment(), "ed25519-plain@fixture");
//! assert_eq!(
//!     key.fingerprint(HashAlg::Sha256)?,
//!     "SHA256:5eY7ujFPvc5PIM26rrrWd/66lbUn4lOxxlzY3VNjGV0"
//! );
//! # Ok(()) }
//! ```

mod asn1;
mod error;
mod generate;
mod key_type;
mod legacy;
mod openssh;
mod private;
mod public;

use log::debug;
use secrecy::SecretString;
use ssh_encoding::Encode;
use zeroize::Zeroizing;

pub use self::error::{KeyError, KeyResult};
pub use self::key_type::{EcdsaCurve, KeyType};
pub use self::private::PrivateKey;
pub use self::public::{HashAlg, PublicKey};
use crate::pem::{PemContainer, OPENSSH_LINE_WIDTH};

/// PEM label of `openssh-key-v1` containers.
pub const OPENSSH_PRIVATE_LABEL: &str = "OPENSSH PRIVATE KEY";
/// PEM label of PKCS#1 RSA private keys.
pub const RSA_PRIVATE_LABEL: &str = "RSA PRIVATE KEY";
/// PEM label of legacy DSA private keys.
pub const DSA_PRIVATE_LABEL: &str = "DSA PRIVATE KEY";

const NONE: &str = "none";

/// Serialized form a key was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerFormat {
    /// `openssh-key-v1`
    OpenSsh,
    /// PKCS#1 `RSAPrivateKey`
    LegacyRsa,
    /// OpenSSL `DSAPrivateKey`
    LegacyDsa,
}

impl ContainerFormat {
    fn from_label(label: &str) -> KeyResult<Self> {
        match label {
            OPENSSH_PRIVATE_LABEL => Ok(Self::OpenSsh),
            RSA_PRIVATE_LABEL => Ok(Self::LegacyRsa),
            DSA_PRIVATE_LABEL => Ok(Self::LegacyDsa),
            other => Err(KeyError::UnsupportedContainer(other.to_string())),
        }
    }
}

/// Ciphertext retained until the key is unlocked.
#[derive(Clone, Debug)]
struct EncryptedSection {
    ciphertext: Vec<u8>,
    /// Legacy PEM IV from `DEK-Info`; empty for OpenSSH containers.
    iv: Vec<u8>,
}

#[derive(Clone, Debug)]
enum KeyState {
    Locked(EncryptedSection),
    Unlocked(PrivateKey),
}

/// A parsed SSH key, either still encrypted or unlocked.
///
/// Public data of OpenSSH containers is available right after parsing.
/// Encrypted legacy PEM keys keep their public half inside the ciphertext,
/// so it only becomes available after [`Key::unlock`].
#[derive(Clone, Debug)]
pub struct Key {
    key_type: KeyType,
    format: ContainerFormat,
    public: Option<PublicKey>,
    comment: String,
    cipher_name: String,
    kdf_name: String,
    kdf_options: Vec<u8>,
    state: KeyState,
}

impl Key {
    /// Parse a PEM encoded private key.
    ///
    /// Unencrypted keys are fully decoded; encrypted ones are returned
    /// locked.
    pub fn parse(input: &[u8]) -> KeyResult<Self> {
        Self::from_pem(&PemContainer::parse(input)?)
    }

    /// Decode an already parsed PEM container.
    pub fn from_pem(pem: &PemContainer) -> KeyResult<Self> {
        let key = match ContainerFormat::from_label(pem.label())? {
            ContainerFormat::OpenSsh => openssh::parse(pem.data())?,
            format => legacy::parse(format, pem)?,
        };
        debug!(
            "Parsed {} key from {:?} container (cipher: {}, kdf: {}, locked: {})",
            key.key_type,
            key.format,
            key.cipher_name,
            key.kdf_name,
            key.is_locked()
        );
        Ok(key)
    }

    /// Wrap unlocked private key material, e.g. a freshly generated key.
    pub fn from_private(private: PrivateKey, comment: impl Into<String>) -> KeyResult<Self> {
        let public = private.public_key()?;
        Ok(Self {
            key_type: private.key_type(),
            format: ContainerFormat::OpenSsh,
            public: Some(public),
            comment: comment.into(),
            cipher_name: NONE.into(),
            kdf_name: NONE.into(),
            kdf_options: Vec::new(),
            state: KeyState::Unlocked(private),
        })
    }

    /// Decrypt the private section.
    ///
    /// Does nothing if the key is already unlocked. On failure the key is
    /// left untouched and may be unlocked again with another passphrase.
    pub fn unlock(&mut self, passphrase: &SecretString) -> KeyResult<()> {
        let KeyState::Locked(section) = &self.state else {
            return Ok(());
        };

        let (private, comment) = match self.format {
            ContainerFormat::OpenSsh => {
                let plaintext = openssh::decrypt(
                    &self.cipher_name,
                    &self.kdf_name,
                    &self.kdf_options,
                    &section.ciphertext,
                    passphrase,
                )?;
                openssh::decode_private_section(&plaintext, self.key_type)?
            }
            format => {
                let plaintext = legacy::decrypt(
                    &self.cipher_name,
                    &section.iv,
                    &section.ciphertext,
                    passphrase,
                )?;
                let private = legacy::decode_der(format, &plaintext).map_err(|e| {
                    debug!("Decrypted legacy key does not decode: {e}");
                    KeyError::WrongPassphraseOrCorruptKey
                })?;
                (private, String::new())
            }
        };

        if self.public.is_none() {
            self.public = Some(private.public_key()?);
        }
        if !comment.is_empty() {
            self.comment = comment;
        }
        self.state = KeyState::Unlocked(private);
        debug!("Unlocked {} key", self.key_type);
        Ok(())
    }

    /// Whether the private section is still encrypted.
    pub fn is_locked(&self) -> bool {
        matches!(self.state, KeyState::Locked(_))
    }

    /// Whether the container was encrypted at all.
    pub fn is_encrypted(&self) -> bool {
        self.cipher_name != NONE
    }

    /// Key type.
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Container the key was read from.
    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// Public half, unless hidden inside an encrypted legacy container.
    pub fn public_key(&self) -> KeyResult<&PublicKey> {
        self.public.as_ref().ok_or(KeyError::Locked)
    }

    /// Private half, once unlocked.
    pub fn private_key(&self) -> KeyResult<&PrivateKey> {
        match &self.state {
            KeyState::Unlocked(private) => Ok(private),
            KeyState::Locked(_) => Err(KeyError::Locked),
        }
    }

    /// Key comment. Empty for legacy keys and for locked OpenSSH keys.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Replace the comment.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Cipher name from the container, `none` when unencrypted.
    pub fn cipher_name(&self) -> &str {
        &self.cipher_name
    }

    /// KDF name from the container, `none` when unencrypted.
    pub fn kdf_name(&self) -> &str {
        &self.kdf_name
    }

    /// Raw KDF options from the container.
    pub fn kdf_options(&self) -> &[u8] {
        &self.kdf_options
    }

    /// Fingerprint of the public key.
    pub fn fingerprint(&self, alg: HashAlg) -> KeyResult<String> {
        self.public_key()?.fingerprint(alg)
    }

    /// `authorized_keys` style line: type, Base64 blob and comment.
    pub fn public_key_line(&self) -> KeyResult<String> {
        self.public_key()?.to_openssh_line(&self.comment)
    }

    /// Approximate size in bits; `0` if unknown.
    pub fn key_length(&self) -> usize {
        self.public.as_ref().map_or(0, PublicKey::key_length)
    }

    /// Public key blob.
    pub fn public_blob(&self) -> KeyResult<Vec<u8>> {
        self.public_key()?.to_blob()
    }

    /// Private key followed by the comment, as sent to an agent.
    pub fn private_blob(&self) -> KeyResult<Zeroizing<Vec<u8>>> {
        let mut blob = self.private_key()?.to_bytes()?;
        self.comment.encode(&mut *blob)?;
        Ok(blob)
    }

    /// Write an unencrypted `openssh-key-v1` PEM block.
    pub fn to_openssh_pem(&self) -> KeyResult<Zeroizing<String>> {
        let data = openssh::encode(self.public_key()?, self.private_key()?, &self.comment)?;
        let pem = PemContainer::new(OPENSSH_PRIVATE_LABEL, data.to_vec());
        Ok(pem.encode(OPENSSH_LINE_WIDTH))
    }
}

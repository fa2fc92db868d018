use thiserror::Error;

/// Errors raised while parsing, decrypting or serializing a private key.
#[derive(Debug, Error)]
pub enum KeyError {
    /// PEM framing is missing or the BEGIN/END labels disagree.
    #[error("Malformed PEM container: {0}")]
    MalformedContainer(&'static str),

    /// The PEM body is not valid Base64.
    #[error("Base64 decoding failed: {0}")]
    Base64DecodeFailed(#[from] base64::DecodeError),

    /// The PEM body decoded to zero bytes.
    #[error("PEM container has an empty payload")]
    EmptyPayload,

    /// The container does not start with `openssh-key-v1\0`.
    #[error("Key file magic header id invalid")]
    InvalidMagic,

    /// The container declares zero keys.
    #[error("Found zero keys")]
    NoKeysPresent,

    /// Key type name outside of the supported set.
    #[error("Unknown key type: {0}")]
    UnknownKeyType(String),

    /// Component list does not match the key type's arity.
    #[error("{key_type} expects {expected} components, got {found}")]
    InvalidComponentCount {
        /// Key type name.
        key_type: &'static str,
        /// Arity of the key type.
        expected: usize,
        /// Number of components supplied.
        found: usize,
    },

    /// Security-key private halves carry an opaque prefix and can only be
    /// read from an OpenSSH container.
    #[error("{0} keys cannot be assembled from components")]
    SecurityKeyComponents(&'static str),

    /// PEM label that is not a private key container.
    #[error("Unsupported key container: {0}")]
    UnsupportedContainer(String),

    /// Cipher name outside of the supported set.
    #[error("Unknown cipher: {0}")]
    UnknownCipher(String),

    /// Key derivation function outside of the supported set.
    #[error("Unknown KDF: {0}")]
    UnknownKdf(String),

    /// Legacy DER payload is not a well-formed sequence of integers.
    #[error("ASN.1 decoding failed: {0}")]
    Asn1Decode(&'static str),

    /// Key derivation rejected its parameters.
    #[error("Key derivation failed, key file corrupted?")]
    KdfFailed,

    /// Legacy PEM IV cannot seed the MD5 derivation.
    #[error("Cipher IV is too short for MD5 kdf ({0} bytes)")]
    IvTooShort(usize),

    /// Key or IV length does not fit the cipher.
    #[error("Invalid cipher parameters: key length {key_len}, IV length {iv_len}")]
    InvalidCipherParameters {
        /// Supplied key length.
        key_len: usize,
        /// Supplied IV length.
        iv_len: usize,
    },

    /// Encrypted key was opened with an empty passphrase.
    #[error("Passphrase is required to decrypt this key")]
    PassphraseRequired,

    /// The cipher could not process the ciphertext.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Decrypted data failed the integrity check.
    #[error("Decryption failed, wrong passphrase?")]
    WrongPassphraseOrCorruptKey,

    /// Private material requested from a key that is still encrypted.
    #[error("Key is locked, unlock it with a passphrase first")]
    Locked,

    /// Input ended before a declared field.
    #[error("Unexpected EOF while reading key data")]
    Truncated,

    /// Key generation failed.
    #[error("Key generation failed: {0}")]
    Generation(#[from] rsa::Error),

    /// Wire encoding error other than truncation.
    #[error("Key encoding error: {0}")]
    Encoding(ssh_encoding::Error),
}

impl From<ssh_encoding::Error> for KeyError {
    fn from(error: ssh_encoding::Error) -> Self {
        match error {
            ssh_encoding::Error::Length => Self::Truncated,
            other => Self::Encoding(other),
        }
    }
}

/// Result type for key operations.
pub type KeyResult<T> = Result<T, KeyError>;

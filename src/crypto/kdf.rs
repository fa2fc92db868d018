use md5::{Digest, Md5};
use secrecy::{ExposeSecret, SecretString};
use ssh_encoding::{Decode, Reader};
use zeroize::Zeroizing;

use crate::key::{KeyError, KeyResult};

/// Parameters of the OpenSSH `bcrypt` KDF, stored in the container's
/// `kdfoptions` string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KdfOptions {
    /// Salt.
    pub salt: Vec<u8>,
    /// Number of bcrypt rounds.
    pub rounds: u32,
}

impl KdfOptions {
    /// Parse the raw `kdfoptions` bytes.
    pub fn from_bytes(mut bytes: &[u8]) -> KeyResult<Self> {
        let options = Self::decode(&mut bytes)?;
        if !bytes.is_finished() {
            return Err(ssh_encoding::Error::TrailingData {
                remaining: bytes.remaining_len(),
            }
            .into());
        }
        Ok(options)
    }
}

impl Decode for KdfOptions {
    type Error = KeyError;

    fn decode(reader: &mut impl Reader) -> KeyResult<Self> {
        let salt = Vec::decode(reader)?;
        let rounds = u32::decode(reader)?;
        Ok(Self { salt, rounds })
    }
}

/// Derive `output_len` bytes with bcrypt-pbkdf.
pub fn bcrypt_pbkdf(
    passphrase: &SecretString,
    salt: &[u8],
    rounds: u32,
    output_len: usize,
) -> KeyResult<Zeroizing<Vec<u8>>> {
    let mut output = Zeroizing::new(vec![0; output_len]);
    bcrypt_pbkdf::bcrypt_pbkdf(
        passphrase.expose_secret().as_bytes(),
        salt,
        rounds,
        &mut output,
    )
    .map_err(|_| KeyError::KdfFailed)?;
    Ok(output)
}

/// OpenSSL `EVP_BytesToKey` with MD5 and a single iteration, as used by
/// encrypted PEM keys.
///
/// Each round hashes the previous digest, the passphrase and the first
/// eight IV bytes; digests are concatenated and truncated to `target_len`.
pub fn md5_chain(passphrase: &[u8], iv: &[u8], target_len: usize) -> KeyResult<Zeroizing<Vec<u8>>> {
    let salt = iv.get(..8).ok_or(KeyError::IvTooShort(iv.len()))?;

    let mut output = Zeroizing::new(Vec::with_capacity(target_len + 16));
    let mut digest = Zeroizing::new(Vec::new());
    while output.len() < target_len {
        let mut hasher = Md5::new();
        hasher.update(&digest[..]);
        hasher.update(passphrase);
        hasher.update(salt);
        *digest = hasher.finalize().to_vec();
        output.extend_from_slice(&digest);
    }
    output.truncate(target_len);
    Ok(output)
}

use aes::{Aes128, Aes256};
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, KeyIvInit, StreamCipher};
use zeroize::Zeroizing;

use crate::key::{KeyError, KeyResult};

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

const AES_BLOCK_SIZE: usize = 16;

/// Ciphers accepted for private key sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CipherKind {
    /// AES-128 in CBC mode (legacy PEM keys).
    Aes128Cbc,
    /// AES-256 in CBC mode.
    Aes256Cbc,
    /// AES-256 in CTR mode (the OpenSSH default).
    Aes256Ctr,
}

impl CipherKind {
    /// Resolve a cipher name, ignoring case and hyphens.
    ///
    /// `aes-256-ctr`, `aes256-ctr` and `AES-256-CTR` all name the same cipher.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "aes128cbc" => Some(Self::Aes128Cbc),
            "aes256cbc" => Some(Self::Aes256Cbc),
            "aes256ctr" => Some(Self::Aes256Ctr),
            _ => None,
        }
    }

    /// Key length in bytes.
    pub fn key_size(self) -> usize {
        match self {
            Self::Aes128Cbc => 16,
            Self::Aes256Cbc | Self::Aes256Ctr => 32,
        }
    }

    /// Block (and IV) length in bytes.
    pub fn block_size(self) -> usize {
        AES_BLOCK_SIZE
    }

    /// Prepare a decryption context, validating key and IV lengths.
    pub fn init(self, key: &[u8], iv: &[u8]) -> KeyResult<Decryptor> {
        if key.len() != self.key_size() || iv.len() != self.block_size() {
            return Err(KeyError::InvalidCipherParameters {
                key_len: key.len(),
                iv_len: iv.len(),
            });
        }
        Ok(Decryptor {
            kind: self,
            key: Zeroizing::new(key.to_vec()),
            iv: iv.to_vec(),
        })
    }
}

/// Initialized decrypt-only cipher.
pub struct Decryptor {
    kind: CipherKind,
    key: Zeroizing<Vec<u8>>,
    iv: Vec<u8>,
}

impl std::fmt::Debug for Decryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decryptor")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Decryptor {
    /// The cipher this context was created for.
    pub fn kind(&self) -> CipherKind {
        self.kind
    }

    /// Decrypt `ciphertext`, returning plaintext of the same length.
    ///
    /// Padding is left in place; callers validate the plaintext themselves.
    pub fn process(&self, ciphertext: &[u8]) -> KeyResult<Zeroizing<Vec<u8>>> {
        let mut buf = Zeroizing::new(ciphertext.to_vec());
        match self.kind {
            CipherKind::Aes128Cbc => {
                cbc_decrypt::<Aes128CbcDec>(&self.key, &self.iv, &mut buf)?;
            }
            CipherKind::Aes256Cbc => {
                cbc_decrypt::<Aes256CbcDec>(&self.key, &self.iv, &mut buf)?;
            }
            CipherKind::Aes256Ctr => {
                let mut cipher = Aes256Ctr::new_from_slices(&self.key, &self.iv)
                    .map_err(|_| KeyError::DecryptionFailed)?;
                cipher
                    .try_apply_keystream(&mut buf)
                    .map_err(|_| KeyError::DecryptionFailed)?;
            }
        }
        Ok(buf)
    }
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], buf: &mut [u8]) -> KeyResult<()>
where
    C: KeyIvInit + BlockDecryptMut,
{
    if buf.len() % AES_BLOCK_SIZE != 0 {
        return Err(KeyError::DecryptionFailed);
    }
    C::new_from_slices(key, iv)
        .map_err(|_| KeyError::DecryptionFailed)?
        .decrypt_padded_mut::<NoPadding>(buf)
        .map_err(|_| KeyError::DecryptionFailed)?;
    Ok(())
}

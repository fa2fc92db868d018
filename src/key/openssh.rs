//! `openssh-key-v1` container.
//!
//! ```text
//! byte[15]  "openssh-key-v1\0"
//! string    ciphername
//! string    kdfname
//! string    kdfoptions
//! uint32    number of keys N
//! string    public key 1..N
//! string    private section (possibly encrypted)
//! ```
//!
//! The decrypted private section holds two equal check integers, the
//! private keys with their comments and `1, 2, 3, ...` padding up to the
//! cipher block size.

use log::debug;
use rand::RngCore as _;
use secrecy::{ExposeSecret, SecretString};
use ssh_encoding::{Decode, Encode, Reader};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::{ContainerFormat, EncryptedSection, Key, KeyState, NONE};
use super::{KeyError, KeyResult, KeyType, PrivateKey, PublicKey};
use crate::crypto::{bcrypt_pbkdf, CipherKind, KdfOptions};

const MAGIC: &[u8; 15] = b"openssh-key-v1\0";
const BCRYPT: &str = "bcrypt";
const UNENCRYPTED_BLOCK_SIZE: usize = 8;

pub(super) fn parse(data: &[u8]) -> KeyResult<Key> {
    let mut reader = data;

    let mut magic = [0u8; 15];
    reader.read(&mut magic)?;
    if &magic != MAGIC {
        return Err(KeyError::InvalidMagic);
    }

    let cipher_name = String::decode(&mut reader)?;
    let kdf_name = String::decode(&mut reader)?;
    let kdf_options = Vec::<u8>::decode(&mut reader)?;

    let num_keys = u32::decode(&mut reader)?;
    if num_keys == 0 {
        return Err(KeyError::NoKeysPresent);
    }

    let public = PublicKey::from_blob(&Vec::<u8>::decode(&mut reader)?)?;
    for index in 1..num_keys {
        // only the first key of a multi-key container is used
        let _ = Vec::<u8>::decode(&mut reader)?;
        debug!("Skipping public key {index} of {num_keys}");
    }

    let private_section = Vec::<u8>::decode(&mut reader)?;
    let key_type = public.key_type();

    let (state, comment) = if cipher_name == NONE {
        let (private, comment) = decode_private_section(&private_section, key_type)?;
        (KeyState::Unlocked(private), comment)
    } else {
        let section = EncryptedSection {
            ciphertext: private_section,
            iv: Vec::new(),
        };
        (KeyState::Locked(section), String::new())
    };

    Ok(Key {
        key_type,
        format: ContainerFormat::OpenSsh,
        public: Some(public),
        comment,
        cipher_name,
        kdf_name,
        kdf_options,
        state,
    })
}

/// Derive key material from the passphrase and decrypt the private section.
pub(super) fn decrypt(
    cipher_name: &str,
    kdf_name: &str,
    kdf_options: &[u8],
    ciphertext: &[u8],
    passphrase: &SecretString,
) -> KeyResult<Zeroizing<Vec<u8>>> {
    let cipher = CipherKind::from_name(cipher_name)
        .ok_or_else(|| KeyError::UnknownCipher(cipher_name.to_string()))?;
    if kdf_name != BCRYPT {
        return Err(KeyError::UnknownKdf(kdf_name.to_string()));
    }
    if passphrase.expose_secret().is_empty() {
        return Err(KeyError::PassphraseRequired);
    }

    let options = KdfOptions::from_bytes(kdf_options)?;
    let derived = bcrypt_pbkdf(
        passphrase,
        &options.salt,
        options.rounds,
        cipher.key_size() + cipher.block_size(),
    )?;
    let (key, iv) = derived.split_at(cipher.key_size());
    cipher.init(key, iv)?.process(ciphertext)
}

/// Decode a plaintext private section, returning the key and its comment.
pub(super) fn decode_private_section(
    section: &[u8],
    expected: KeyType,
) -> KeyResult<(PrivateKey, String)> {
    let mut reader = section;
    let check1 = u32::decode(&mut reader)?;
    let check2 = u32::decode(&mut reader)?;
    if !bool::from(check1.ct_eq(&check2)) {
        return Err(KeyError::WrongPassphraseOrCorruptKey);
    }

    let private = PrivateKey::decode(&mut reader)?;
    if private.key_type() != expected {
        debug!(
            "Private key type {} does not match public key type {expected}",
            private.key_type()
        );
        return Err(KeyError::WrongPassphraseOrCorruptKey);
    }

    let comment = Vec::<u8>::decode(&mut reader)?;
    // remaining bytes are padding
    Ok((private, String::from_utf8_lossy(&comment).into_owned()))
}

/// Encode an unencrypted container holding a single key.
pub(super) fn encode(
    public: &PublicKey,
    private: &PrivateKey,
    comment: &str,
) -> KeyResult<Zeroizing<Vec<u8>>> {
    let check = rand::thread_rng().next_u32();

    let mut section = Zeroizing::new(Vec::new());
    check.encode(&mut *section)?;
    check.encode(&mut *section)?;
    private.encode(&mut *section)?;
    comment.encode(&mut *section)?;
    let mut pad = 1u8;
    while section.len() % UNENCRYPTED_BLOCK_SIZE != 0 {
        section.push(pad);
        pad += 1;
    }

    let mut out = Zeroizing::new(Vec::new());
    out.extend_from_slice(MAGIC);
    NONE.encode(&mut *out)?;
    NONE.encode(&mut *out)?;
    [0u8; 0].as_slice().encode(&mut *out)?;
    1u32.encode(&mut *out)?;
    public.encode_prefixed(&mut *out)?;
    section.as_slice().encode(&mut *out)?;
    Ok(out)
}

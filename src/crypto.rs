//! Passphrase key derivation and the symmetric ciphers used by encrypted
//! private keys.
//!
//! Only decryption is implemented; keys written by this crate are never
//! encrypted.

mod cipher;
mod kdf;

pub use self::cipher::{CipherKind, Decryptor};
pub use self::kdf::{bcrypt_pbkdf, md5_chain, KdfOptions};

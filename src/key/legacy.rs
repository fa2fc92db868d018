//! PKCS#1 RSA and OpenSSL DSA keys in traditional PEM framing.
//!
//! Encrypted keys carry `Proc-Type: 4,ENCRYPTED` and
//! `DEK-Info: <cipher>,<hex iv>` headers; the key is derived from the
//! passphrase with a single MD5 iteration salted by the IV.

use log::debug;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use super::asn1::{crt_coefficient, read_integers, to_mpint};
use super::{ContainerFormat, EncryptedSection, Key, KeyState, NONE};
use super::{KeyError, KeyResult, KeyType, PrivateKey};
use crate::crypto::{md5_chain, CipherKind};
use crate::pem::PemContainer;

const PROC_TYPE: &str = "Proc-Type";
const DEK_INFO: &str = "DEK-Info";
const ENCRYPTED: &str = "4,ENCRYPTED";
const MD5: &str = "md5";

pub(super) fn parse(format: ContainerFormat, pem: &PemContainer) -> KeyResult<Key> {
    let key_type = match format {
        ContainerFormat::LegacyRsa => KeyType::Rsa,
        ContainerFormat::LegacyDsa => KeyType::Dss,
        ContainerFormat::OpenSsh => {
            return Err(KeyError::UnsupportedContainer(pem.label().to_string()))
        }
    };

    let encrypted = pem
        .option(PROC_TYPE)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case(ENCRYPTED));

    if !encrypted {
        let private = decode_der(format, pem.data())?;
        return Ok(Key {
            key_type,
            format,
            public: Some(private.public_key()?),
            comment: String::new(),
            cipher_name: NONE.into(),
            kdf_name: NONE.into(),
            kdf_options: Vec::new(),
            state: KeyState::Unlocked(private),
        });
    }

    let dek_info = pem
        .option(DEK_INFO)
        .ok_or(KeyError::MalformedContainer("encrypted key without DEK-Info"))?;
    let (cipher_name, iv_hex) = dek_info
        .split_once(',')
        .ok_or(KeyError::MalformedContainer("DEK-Info without IV"))?;
    let iv = decode_hex(iv_hex.trim())?;
    debug!("Legacy {key_type} key encrypted with {cipher_name}");

    Ok(Key {
        key_type,
        format,
        public: None,
        comment: String::new(),
        cipher_name: cipher_name.trim().to_string(),
        kdf_name: MD5.into(),
        kdf_options: Vec::new(),
        state: KeyState::Locked(EncryptedSection {
            ciphertext: pem.data().to_vec(),
            iv,
        }),
    })
}

/// Decrypt a legacy PEM body with the `DEK-Info` cipher and IV.
pub(super) fn decrypt(
    cipher_name: &str,
    iv: &[u8],
    ciphertext: &[u8],
    passphrase: &SecretString,
) -> KeyResult<Zeroizing<Vec<u8>>> {
    let cipher = CipherKind::from_name(cipher_name)
        .ok_or_else(|| KeyError::UnknownCipher(cipher_name.to_string()))?;
    if passphrase.expose_secret().is_empty() {
        return Err(KeyError::PassphraseRequired);
    }
    let key = md5_chain(passphrase.expose_secret().as_bytes(), iv, cipher.key_size())?;
    cipher.init(&key, iv)?.process(ciphertext)
}

/// Map the DER integers of a legacy key onto OpenSSH private components.
///
/// RSA becomes `n, e, d, iqmp, p, q`; DSA becomes `p, q, g, y, x`.
/// The leading version integer is skipped in both cases.
pub(super) fn decode_der(format: ContainerFormat, der: &[u8]) -> KeyResult<PrivateKey> {
    match format {
        ContainerFormat::LegacyDsa => {
            let ints = read_integers(der, 6, 6)?;
            let components = ints[1..].iter().map(|i| to_mpint(i)).collect();
            PrivateKey::new(KeyType::Dss, components)
        }
        ContainerFormat::LegacyRsa => {
            let ints = read_integers(der, 6, 9)?;
            let (n, e, d, p, q) = (ints[1], ints[2], ints[3], ints[4], ints[5]);
            let iqmp = match ints.get(8) {
                Some(qinv) => to_mpint(qinv),
                None => crt_coefficient(p, q)?,
            };
            PrivateKey::new(
                KeyType::Rsa,
                vec![
                    to_mpint(n),
                    to_mpint(e),
                    to_mpint(d),
                    iqmp,
                    to_mpint(p),
                    to_mpint(q),
                ],
            )
        }
        ContainerFormat::OpenSsh => Err(KeyError::Asn1Decode("not a legacy container")),
    }
}

fn decode_hex(hex: &str) -> KeyResult<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return Err(KeyError::MalformedContainer("invalid IV in DEK-Info"));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| KeyError::MalformedContainer("invalid IV in DEK-Info"))
        })
        .collect()
}

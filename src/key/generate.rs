use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore as _;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::RsaPrivateKey;
use zeroize::Zeroizing;

use super::asn1::{crt_coefficient, to_mpint};
use super::{Key, KeyError, KeyResult, KeyType, PrivateKey};

const MIN_RSA_BITS: usize = 1024;

impl Key {
    /// Generate a fresh RSA key with public exponent 65537.
    pub fn generate_rsa(bits: usize, comment: impl Into<String>) -> KeyResult<Self> {
        if bits < MIN_RSA_BITS {
            return Err(KeyError::Generation(rsa::Error::InvalidModulus));
        }
        let key = RsaPrivateKey::new(&mut OsRng, bits)?;
        let [p, q] = key.primes() else {
            return Err(KeyError::Generation(rsa::Error::NprimesTooSmall));
        };
        let p = p.to_bytes_be();
        let q = q.to_bytes_be();

        let private = PrivateKey::new(
            KeyType::Rsa,
            vec![
                to_mpint(&key.n().to_bytes_be()),
                to_mpint(&key.e().to_bytes_be()),
                to_mpint(&Zeroizing::new(key.d().to_bytes_be())),
                crt_coefficient(&p, &q)?,
                to_mpint(&p),
                to_mpint(&q),
            ],
        )?;
        Self::from_private(private, comment)
    }

    /// Generate a fresh Ed25519 key.
    pub fn generate_ed25519(comment: impl Into<String>) -> KeyResult<Self> {
        let mut seed = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut *seed);
        let signing = SigningKey::from_bytes(&seed);
        let public = signing.verifying_key().to_bytes();

        // OpenSSH stores the 32-byte seed followed by the public point
        let mut secret = Vec::with_capacity(64);
        secret.extend_from_slice(&*seed);
        secret.extend_from_slice(&public);

        let private = PrivateKey::new(KeyType::Ed25519, vec![public.to_vec(), secret])?;
        Self::from_private(private, comment)
    }
}

#[cfg(test)]
mod tests {
    use ssh_encoding::Decode;
    use testresult::TestResult;

    use super::*;
    use crate::key::HashAlg;

    #[test]
    fn ed25519_public_matches_seed() -> TestResult {
        let key = Key::generate_ed25519("gen@test")?;
        let private = key.private_key()?;
        let parts: Vec<&[u8]> = private.components().collect();
        assert_eq!(parts[0].len(), 32);
        assert_eq!(&parts[1][32..], parts[0]);

        let seed: [u8; 32] = parts[1][..32].try_into()?;
        assert_eq!(
            SigningKey::from_bytes(&seed).verifying_key().to_bytes(),
            parts[0]
        );
        assert_eq!(key.key_length(), 256);
        Ok(())
    }

    #[test]
    fn generated_rsa_survives_openssh_container() -> TestResult {
        let key = Key::generate_rsa(1024, "rsa@test")?;
        assert_eq!(key.key_length(), 1024);

        let pem = key.to_openssh_pem()?;
        let parsed = Key::parse(pem.as_bytes())?;
        assert_eq!(parsed.comment(), "rsa@test");
        assert_eq!(parsed.public_blob()?, key.public_blob()?);
        assert_eq!(parsed.private_key()?, key.private_key()?);
        assert_eq!(
            parsed.fingerprint(HashAlg::Sha256)?,
            key.fingerprint(HashAlg::Sha256)?
        );

        let blob = key.private_blob()?;
        let mut reader = &blob[..];
        assert_eq!(&PrivateKey::decode(&mut reader)?, key.private_key()?);
        assert_eq!(String::decode(&mut reader)?, "rsa@test");
        Ok(())
    }

    #[test]
    fn small_rsa_rejected() {
        assert!(matches!(
            Key::generate_rsa(512, ""),
            Err(KeyError::Generation(_))
        ));
    }
}

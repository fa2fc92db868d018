use std::fmt;
use std::str::FromStr;

use super::KeyError;

/// NIST curves used by `ecdsa-sha2-*` keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EcdsaCurve {
    /// NIST P-256
    NistP256,
    /// NIST P-384
    NistP384,
    /// NIST P-521
    NistP521,
}

impl EcdsaCurve {
    /// Curve identifier as used in key type names, e.g. `nistp256`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NistP256 => "nistp256",
            Self::NistP384 => "nistp384",
            Self::NistP521 => "nistp521",
        }
    }
}

/// Supported SSH key types.
///
/// The number and order of wire components is fixed per type; see
/// [`KeyType::public_parts`] and [`KeyType::private_parts`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// `ssh-dss`
    Dss,
    /// `ssh-rsa`
    Rsa,
    /// `ecdsa-sha2-<curve>`
    Ecdsa(EcdsaCurve),
    /// `ssh-ed25519`
    Ed25519,
    /// `sk-ecdsa-sha2-nistp256@openssh.com`
    SkEcdsaP256,
}

impl KeyType {
    /// Wire name of the key type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dss => "ssh-dss",
            Self::Rsa => "ssh-rsa",
            Self::Ecdsa(EcdsaCurve::NistP256) => "ecdsa-sha2-nistp256",
            Self::Ecdsa(EcdsaCurve::NistP384) => "ecdsa-sha2-nistp384",
            Self::Ecdsa(EcdsaCurve::NistP521) => "ecdsa-sha2-nistp521",
            Self::Ed25519 => "ssh-ed25519",
            Self::SkEcdsaP256 => "sk-ecdsa-sha2-nistp256@openssh.com",
        }
    }

    /// Number of strings following the type name in a public key blob.
    ///
    /// DSS: p, q, g, y. RSA: e, n. ECDSA: curve, point. Ed25519: point.
    /// SK-ECDSA: curve, point, application.
    pub fn public_parts(self) -> usize {
        match self {
            Self::Dss => 4,
            Self::Rsa => 2,
            Self::Ecdsa(_) => 2,
            Self::Ed25519 => 1,
            Self::SkEcdsaP256 => 3,
        }
    }

    /// Number of strings following the type name in a private key section.
    ///
    /// DSS: p, q, g, y, x. RSA: n, e, d, iqmp, p, q. ECDSA: curve, point,
    /// scalar. Ed25519: point, seed||point. SK-ECDSA: key handle and
    /// reserved, after an opaque prefix (see [`super::PrivateKey`]).
    pub fn private_parts(self) -> usize {
        match self {
            Self::Dss => 5,
            Self::Rsa => 6,
            Self::Ecdsa(_) => 3,
            Self::Ed25519 => 2,
            Self::SkEcdsaP256 => 2,
        }
    }

    /// Whether this is a FIDO security key type.
    pub fn is_security_key(self) -> bool {
        matches!(self, Self::SkEcdsaP256)
    }
}

impl FromStr for KeyType {
    type Err = KeyError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name {
            "ssh-dss" => Self::Dss,
            "ssh-rsa" => Self::Rsa,
            "ecdsa-sha2-nistp256" => Self::Ecdsa(EcdsaCurve::NistP256),
            "ecdsa-sha2-nistp384" => Self::Ecdsa(EcdsaCurve::NistP384),
            "ecdsa-sha2-nistp521" => Self::Ecdsa(EcdsaCurve::NistP521),
            "ssh-ed25519" => Self::Ed25519,
            "sk-ecdsa-sha2-nistp256@openssh.com" => Self::SkEcdsaP256,
            other => return Err(KeyError::UnknownKeyType(other.to_string())),
        })
    }
}

impl TryFrom<&[u8]> for KeyType {
    type Error = KeyError;

    fn try_from(name: &[u8]) -> Result<Self, Self::Error> {
        std::str::from_utf8(name)
            .map_err(|_| KeyError::UnknownKeyType(String::from_utf8_lossy(name).into_owned()))?
            .parse()
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use std::{convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error,
    jwa::{hmac, rsa},
};

/// A JWS signing algorithm
///
/// The set of algorithms is closed: HMAC with SHA-2 (`HS256`, `HS384`,
/// `HS512`) and RSASSA-PKCS1-v1_5 with SHA-2 (`RS256`, `RS384`, `RS512`).
///
/// ```
/// use signet::jwa::Algorithm;
///
/// let alg: Algorithm = "RS384".parse().unwrap();
/// assert_eq!(alg, Algorithm::RS384);
/// assert_eq!(alg.to_string(), "RS384");
/// assert!("none".parse::<Algorithm>().is_err());
/// ```
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Algorithm {
    /// HMAC symmetric
    Hmac(hmac::SigningAlgorithm),

    /// RSA public/private key pair
    Rsa(rsa::SigningAlgorithm),
}

impl Algorithm {
    /// The HS256 signing algorithm
    pub const HS256: Algorithm = Self::Hmac(hmac::SigningAlgorithm::HS256);
    /// The HS384 signing algorithm
    pub const HS384: Algorithm = Self::Hmac(hmac::SigningAlgorithm::HS384);
    /// The HS512 signing algorithm
    pub const HS512: Algorithm = Self::Hmac(hmac::SigningAlgorithm::HS512);
    /// The RS256 signing algorithm
    pub const RS256: Algorithm = Self::Rsa(rsa::SigningAlgorithm::RS256);
    /// The RS384 signing algorithm
    pub const RS384: Algorithm = Self::Rsa(rsa::SigningAlgorithm::RS384);
    /// The RS512 signing algorithm
    pub const RS512: Algorithm = Self::Rsa(rsa::SigningAlgorithm::RS512);

    /// Every supported algorithm
    pub const ALL: [Algorithm; 6] = [
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
    ];

    /// The registered `alg` identifier
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hmac(a) => a.name(),
            Self::Rsa(a) => a.name(),
        }
    }

    /// Whether the algorithm uses a shared secret
    #[must_use]
    pub const fn is_symmetric(self) -> bool {
        matches!(self, Self::Hmac(_))
    }
}

/// Whether `name` identifies a supported algorithm
///
/// ```
/// assert!(signet::jwa::is_supported("HS512"));
/// assert!(!signet::jwa::is_supported("ES256"));
/// assert!(!signet::jwa::is_supported("hs256"));
/// ```
#[must_use]
pub fn is_supported(name: &str) -> bool {
    Algorithm::try_from(name).is_ok()
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<&'_ str> for Algorithm {
    type Error = error::UnsupportedAlgorithm;

    #[inline]
    fn try_from(value: &'_ str) -> Result<Self, Self::Error> {
        match value {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            "RS256" => Ok(Algorithm::RS256),
            "RS384" => Ok(Algorithm::RS384),
            "RS512" => Ok(Algorithm::RS512),
            _ => Err(error::unsupported_algorithm(value)),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = error::UnsupportedAlgorithm;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = error::UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl From<hmac::SigningAlgorithm> for Algorithm {
    fn from(alg: hmac::SigningAlgorithm) -> Self {
        Self::Hmac(alg)
    }
}

impl From<rsa::SigningAlgorithm> for Algorithm {
    fn from(alg: rsa::SigningAlgorithm) -> Self {
        Self::Rsa(alg)
    }
}

//! Implementations of the JSON Web Algorithms (JWA) standard
//!
//! The specifications for this standard can be found in [RFC7518][].
//!
//! Two families are supported. HMAC algorithms sign and verify with a
//! shared [`Hmac`] secret. RSA algorithms sign with an
//! [`rsa::PrivateKey`] and verify with an [`rsa::Certificate`].
//!
//! [RFC7518]: https://tools.ietf.org/html/rfc7518

use crate::{
    error,
    header::JoseHeader,
    jws::{Signer, Verifier},
};

mod algorithm;
pub mod hmac;
pub mod rsa;

pub use algorithm::{is_supported, Algorithm};
pub use hmac::Hmac;

/// Key material used to produce signatures
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum SigningKey {
    /// A shared secret for the HMAC family
    Secret(Hmac),

    /// A private key for the RSA family
    Rsa(rsa::PrivateKey),
}

impl From<Hmac> for SigningKey {
    fn from(key: Hmac) -> Self {
        Self::Secret(key)
    }
}

impl From<rsa::PrivateKey> for SigningKey {
    fn from(key: rsa::PrivateKey) -> Self {
        Self::Rsa(key)
    }
}

/// An algorithm paired with the key material it needs
///
/// A strategy for the HMAC family always holds a secret. A strategy for
/// the RSA family may lack a private key, in which case it can verify
/// (given a certificate) but not sign.
#[derive(Clone, Copy, Debug)]
pub enum Strategy<'k> {
    /// HMAC with a shared secret
    Hmac {
        /// The digest variant
        alg: hmac::SigningAlgorithm,
        /// The shared secret
        secret: &'k Hmac,
    },

    /// RSASSA-PKCS1-v1_5
    Rsa {
        /// The digest variant
        alg: rsa::SigningAlgorithm,
        /// The private key, required only for signing
        private_key: Option<&'k rsa::PrivateKey>,
    },
}

/// Selects a strategy for the algorithm named in `header`
///
/// # Errors
///
/// See [`Strategy::new()`].
pub fn create_strategy<'k>(
    header: &JoseHeader,
    key: Option<&'k SigningKey>,
) -> Result<Strategy<'k>, error::StrategyError> {
    Strategy::new(header.algorithm(), key)
}

impl<'k> Strategy<'k> {
    /// Pairs `alg` with `key`
    ///
    /// # Errors
    ///
    /// An HMAC algorithm was requested without a secret, or the key belongs
    /// to the other algorithm family.
    pub fn new(alg: Algorithm, key: Option<&'k SigningKey>) -> Result<Self, error::StrategyError> {
        match (alg, key) {
            (Algorithm::Hmac(alg), Some(SigningKey::Secret(secret))) => {
                Ok(Self::Hmac { alg, secret })
            }
            (Algorithm::Rsa(alg), Some(SigningKey::Rsa(private_key))) => Ok(Self::Rsa {
                alg,
                private_key: Some(private_key),
            }),
            (Algorithm::Rsa(alg), None) => Ok(Self::Rsa {
                alg,
                private_key: None,
            }),
            (Algorithm::Hmac(_), None) => Err(error::missing_key(alg).into()),
            (_, Some(_)) => Err(error::incompatible_key(alg).into()),
        }
    }

    /// The algorithm this strategy implements
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match *self {
            Self::Hmac { alg, .. } => alg.into(),
            Self::Rsa { alg, .. } => alg.into(),
        }
    }

    /// Signs `data`
    ///
    /// # Errors
    ///
    /// The RSA private key is missing or the signature could not be
    /// produced.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, error::SigningError> {
        match *self {
            Self::Hmac { alg, secret } => Ok(secret.sign(alg, data)?),
            Self::Rsa {
                alg,
                private_key: Some(key),
            } => Ok(key.sign(alg, data)?),
            Self::Rsa {
                alg,
                private_key: None,
            } => Err(error::missing_key(alg.into()).into()),
        }
    }

    /// Checks `signature` over `data`
    ///
    /// RSA signatures are checked against `certificate`; HMAC signatures
    /// against the strategy's secret in constant time.
    ///
    /// # Errors
    ///
    /// The signature does not match, or the RSA certificate is missing.
    pub fn verify(
        &self,
        data: &[u8],
        signature: &[u8],
        certificate: Option<&rsa::Certificate>,
    ) -> Result<(), error::VerifyError> {
        match *self {
            Self::Hmac { alg, secret } => Ok(secret.verify(alg, data, signature)?),
            Self::Rsa { alg, .. } => {
                let certificate = certificate.ok_or_else(error::missing_certificate)?;
                Ok(certificate.verify(alg, data, signature)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::{error::StrategyError, test};

    #[test]
    fn hmac_requires_a_secret() {
        let err = Strategy::new(Algorithm::HS256, None).unwrap_err();
        assert!(matches!(err, StrategyError::MissingKey(_)));
    }

    #[test]
    fn rsa_without_private_key_can_still_verify() -> Result<()> {
        let key = SigningKey::from(rsa::PrivateKey::from_pem(test::rsa::PRIVATE_KEY)?);
        let signer = Strategy::new(Algorithm::RS256, Some(&key))?;
        let signature = signer.sign(b"data")?;

        let verifier = Strategy::new(Algorithm::RS256, None)?;
        let certificate = rsa::Certificate::from_pem(test::rsa::CERTIFICATE)?;
        verifier.verify(b"data", &signature, Some(&certificate))?;

        assert!(matches!(
            verifier.sign(b"data"),
            Err(error::SigningError::MissingKey(_))
        ));
        Ok(())
    }

    #[test]
    fn rsa_verification_needs_a_certificate() -> Result<()> {
        let verifier = Strategy::new(Algorithm::RS512, None)?;
        assert!(matches!(
            verifier.verify(b"data", b"sig", None),
            Err(error::VerifyError::MissingCertificate(_))
        ));
        Ok(())
    }

    #[test]
    fn keys_are_bound_to_their_family() -> Result<()> {
        let secret = SigningKey::from(Hmac::new(test::hmac::SECRET));
        let err = Strategy::new(Algorithm::RS256, Some(&secret)).unwrap_err();
        assert!(matches!(err, StrategyError::IncompatibleKey(_)));

        let private = SigningKey::from(rsa::PrivateKey::from_pem(test::rsa::PRIVATE_KEY)?);
        let err = Strategy::new(Algorithm::HS512, Some(&private)).unwrap_err();
        assert!(matches!(err, StrategyError::IncompatibleKey(_)));
        Ok(())
    }

    #[test]
    fn header_selects_the_strategy() -> Result<()> {
        let secret = SigningKey::from(Hmac::new(test::hmac::SECRET));
        let header = JoseHeader::new(Algorithm::HS384);
        let strategy = create_strategy(&header, Some(&secret))?;
        assert_eq!(strategy.algorithm(), Algorithm::HS384);

        let signature = strategy.sign(b"data")?;
        assert_eq!(signature.len(), 48);
        strategy.verify(b"data", &signature, None)?;
        assert!(strategy.verify(b"datum", &signature, None).is_err());
        Ok(())
    }
}

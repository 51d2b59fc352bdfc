//! HMAC JSON Web Algorithm implementations

use std::fmt;

use serde::{Deserialize, Serialize};
use signet_base64::Base64Url;

use crate::{error, jws, random::RandomSource};

/// HMAC shared secret
///
/// The secret is used byte-for-byte as the HMAC key. It is never shown
/// by the [`Debug`][fmt::Debug] implementation.
#[derive(Clone, PartialEq, Eq)]
#[must_use]
pub struct Hmac {
    secret: Base64Url,
}

impl fmt::Debug for Hmac {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Hmac { secret }")
    }
}

impl Hmac {
    /// HMAC using the provided secret
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Base64Url::from_raw(secret),
        }
    }

    /// Generates a new HMAC secret sized for `alg`
    ///
    /// # Errors
    ///
    /// Unable to generate a new HMAC secret.
    pub fn generate(alg: SigningAlgorithm) -> Result<Self, error::Unexpected> {
        Self::generate_with_rng(alg, &ring::rand::SystemRandom::new())
    }

    /// Generates a new HMAC secret using the provided source of randomness
    ///
    /// # Errors
    ///
    /// Unable to generate a new HMAC secret from the provided RNG.
    pub fn generate_with_rng(
        alg: SigningAlgorithm,
        rng: &dyn RandomSource,
    ) -> Result<Self, error::Unexpected> {
        let mut secret = Base64Url::from_raw(vec![0; alg.recommended_key_size()]);
        rng.fill(secret.as_mut_slice())?;

        Ok(Self { secret })
    }

    /// The length of the secret in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.secret.len()
    }

    /// Whether the secret is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secret.is_empty()
    }

    fn key(&self, alg: SigningAlgorithm) -> ring::hmac::Key {
        ring::hmac::Key::new(alg.into_ring_algorithm(), self.secret.as_slice())
    }
}

impl From<&'_ str> for Hmac {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl From<String> for Hmac {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

impl From<Vec<u8>> for Hmac {
    fn from(secret: Vec<u8>) -> Self {
        Self::new(secret)
    }
}

/// HMAC signing algorithms
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
pub enum SigningAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl SigningAlgorithm {
    /// Recommended key size in bytes for an HMAC secret
    #[must_use]
    pub const fn recommended_key_size(self) -> usize {
        self.signature_size()
    }

    /// The size in bytes of an HMAC signature
    #[must_use]
    pub const fn signature_size(self) -> usize {
        match self {
            Self::HS256 => 256 / 8,
            Self::HS384 => 384 / 8,
            Self::HS512 => 512 / 8,
        }
    }

    /// The registered `alg` identifier
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }

    fn into_ring_algorithm(self) -> ring::hmac::Algorithm {
        match self {
            SigningAlgorithm::HS256 => ring::hmac::HMAC_SHA256,
            SigningAlgorithm::HS384 => ring::hmac::HMAC_SHA384,
            SigningAlgorithm::HS512 => ring::hmac::HMAC_SHA512,
        }
    }
}

impl jws::Signer for Hmac {
    type Algorithm = SigningAlgorithm;
    type Error = std::convert::Infallible;

    fn can_sign(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let digest = ring::hmac::sign(&self.key(alg), data);
        Ok(digest.as_ref().to_owned())
    }
}

impl jws::Verifier for Hmac {
    type Algorithm = SigningAlgorithm;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        ring::hmac::verify(&self.key(alg), data, signature).map_err(|_| error::signature_mismatch())
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::{
        jws::{Signer, Verifier},
        test,
    };

    const SIGNING_INPUT: &[u8] = b"eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJpc3MiOiJkb21haW4uY29tIn0";

    #[test]
    fn signs_known_input() -> Result<()> {
        let key = Hmac::new(test::hmac::SECRET);
        let signature = key.sign(SigningAlgorithm::HS256, SIGNING_INPUT)?;

        assert_eq!(
            signet_base64::encode(&signature),
            "mVIM32kE0EXRFFj-zV8_90swZRMyL7AQOnCN2WqBeko"
        );

        Ok(())
    }

    #[test]
    fn signature_lengths_follow_the_digest() -> Result<()> {
        let key = Hmac::new(test::hmac::SECRET);
        for alg in [
            SigningAlgorithm::HS256,
            SigningAlgorithm::HS384,
            SigningAlgorithm::HS512,
        ] {
            let signature = key.sign(alg, b"data")?;
            assert_eq!(signature.len(), alg.signature_size());
            key.verify(alg, b"data", &signature)?;
        }

        Ok(())
    }

    #[test]
    fn rejects_signature_from_another_secret() -> Result<()> {
        let signer = Hmac::new("one secret");
        let verifier = Hmac::new("another secret");
        let signature = signer.sign(SigningAlgorithm::HS384, b"data")?;

        assert_eq!(
            verifier.verify(SigningAlgorithm::HS384, b"data", &signature),
            Err(error::signature_mismatch())
        );

        Ok(())
    }

    #[test]
    fn rejects_truncated_signature() -> Result<()> {
        let key = Hmac::new(test::hmac::SECRET);
        let signature = key.sign(SigningAlgorithm::HS512, b"data")?;

        assert!(key
            .verify(SigningAlgorithm::HS512, b"data", &signature[..32])
            .is_err());

        Ok(())
    }

    #[test]
    fn generated_secrets_use_recommended_size() -> Result<()> {
        let key = Hmac::generate_with_rng(SigningAlgorithm::HS384, &test::FixedRandom(7))?;
        assert_eq!(key.len(), 48);
        assert_eq!(key, Hmac::new(vec![7; 48]));

        let random = Hmac::generate(SigningAlgorithm::HS256)?;
        assert_eq!(random.len(), 32);

        Ok(())
    }

    #[test]
    fn debug_does_not_reveal_secret() {
        let key = Hmac::new("super-secret-value");
        let debug = format!("{:?}", key);
        assert!(!debug.contains("super-secret-value"));
        assert!(!debug.contains(&signet_base64::encode("super-secret-value")));
    }
}

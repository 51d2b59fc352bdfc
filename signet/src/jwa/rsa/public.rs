use openssl::{pkey::Public, rsa::Rsa};
use signet_base64::Base64Url;

use super::SigningAlgorithm;
use crate::{error, jws};

/// RSA public key components
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PublicKey {
    /// The public modulus
    modulus: Base64Url,

    /// The public exponent
    exponent: Base64Url,
}

impl PublicKey {
    /// The public key's modulus
    pub fn modulus(&self) -> &Base64Url {
        &self.modulus
    }

    /// The public key's exponent
    pub fn exponent(&self) -> &Base64Url {
        &self.exponent
    }

    /// Imports an RSA public key from a PEM file
    ///
    /// # Errors
    ///
    /// The provided PEM file is not a valid RSA public key.
    pub fn from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        let rsa = Rsa::public_key_from_pem(pem.as_bytes()).map_err(error::key_rejected)?;
        Self::from_openssl_key(&rsa)
    }

    pub(super) fn from_openssl_key<T>(rsa: &Rsa<T>) -> Result<Self, error::KeyRejected>
    where
        T: openssl::pkey::HasPublic,
    {
        Self::from_components(rsa.n().to_vec(), rsa.e().to_vec())
    }

    /// Exports an RSA public key to a PEM file
    ///
    /// # Errors
    ///
    /// The components could not be re-encoded.
    pub fn to_pem(&self) -> Result<String, error::Unexpected> {
        let key = self.to_openssl_key().map_err(error::unexpected)?;
        let pem = key.public_key_to_pem().map_err(error::unexpected)?;
        String::from_utf8(pem).map_err(error::unexpected)
    }

    fn to_openssl_key(&self) -> Result<Rsa<Public>, openssl::error::ErrorStack> {
        use openssl::bn::BigNum;

        let modulus = BigNum::from_slice(self.modulus.as_slice())?;
        let exponent = BigNum::from_slice(self.exponent.as_slice())?;
        Rsa::from_public_components(modulus, exponent)
    }

    /// Constructs a public key from the big-endian modulus and exponent
    ///
    /// # Errors
    ///
    /// The modulus is shorter than 2048 bits or the exponent is empty.
    pub fn from_components(
        modulus: impl Into<Base64Url>,
        exponent: impl Into<Base64Url>,
    ) -> Result<Self, error::KeyRejected> {
        let modulus = modulus.into();
        let exponent = exponent.into();
        if modulus.len() < 256 {
            return Err(error::key_rejected("key modulus must be at least 2048 bits"));
        }

        if exponent.is_empty() {
            return Err(error::key_rejected("key exponent must not be empty"));
        }

        Ok(Self { modulus, exponent })
    }
}

impl jws::Verifier for PublicKey {
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
        let pk = ring::signature::RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };

        pk.verify(alg.into_verification_params(), data, signature)
            .map_err(|_| error::signature_mismatch())
    }
}

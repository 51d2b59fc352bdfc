use std::{fmt, sync::Arc};

use openssl::{
    pkey::{PKey, Private},
    rsa::Rsa,
};
use ring::signature::RsaKeyPair;

use super::{PemSource, PublicKey, SigningAlgorithm};
use crate::{error, jws};

/// RSA private key
///
/// Accepts PKCS#1 (`BEGIN RSA PRIVATE KEY`) and PKCS#8 (`BEGIN PRIVATE KEY`,
/// `BEGIN ENCRYPTED PRIVATE KEY`) PEM text.
#[derive(Clone)]
#[must_use]
pub struct PrivateKey {
    public_key: PublicKey,
    der: Vec<u8>,
    ring_cache: Arc<RsaKeyPair>,
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for PrivateKey {}

impl PrivateKey {
    /// Generates a new 2048-bit RSA key pair
    ///
    /// # Errors
    ///
    /// Unable to generate a private key.
    pub fn generate() -> Result<Self, error::Unexpected> {
        let rsa = Rsa::generate(2048).map_err(error::unexpected)?;
        Self::from_openssl_key(&rsa).map_err(error::unexpected)
    }

    /// Imports an unencrypted RSA private key from PEM text
    ///
    /// # Errors
    ///
    /// The provided PEM text is not a valid RSA private key.
    pub fn from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        let pkey = PKey::private_key_from_pem(pem.as_bytes()).map_err(error::key_rejected)?;
        Self::from_pkey(&pkey)
    }

    /// Imports an RSA private key from PEM text protected by `passphrase`
    ///
    /// # Errors
    ///
    /// The provided PEM text is not a valid RSA private key or the
    /// passphrase is wrong.
    pub fn from_pem_with_passphrase(pem: &str, passphrase: &str) -> Result<Self, error::KeyRejected> {
        let pkey = PKey::private_key_from_pem_passphrase(pem.as_bytes(), passphrase.as_bytes())
            .map_err(error::key_rejected)?;
        Self::from_pkey(&pkey)
    }

    /// Loads an unencrypted RSA private key from inline PEM text or a
    /// `file://` reference
    ///
    /// # Errors
    ///
    /// The source could not be read or does not hold a valid RSA private key.
    pub fn load(source: impl Into<PemSource>) -> Result<Self, error::KeyRejected> {
        Self::from_pem(&source.into().read()?)
    }

    /// Loads a passphrase-protected RSA private key from inline PEM text or
    /// a `file://` reference
    ///
    /// # Errors
    ///
    /// The source could not be read, does not hold a valid RSA private key,
    /// or the passphrase is wrong.
    pub fn load_with_passphrase(
        source: impl Into<PemSource>,
        passphrase: &str,
    ) -> Result<Self, error::KeyRejected> {
        Self::from_pem_with_passphrase(&source.into().read()?, passphrase)
    }

    fn from_pkey(pkey: &PKey<Private>) -> Result<Self, error::KeyRejected> {
        let rsa = pkey.rsa().map_err(error::key_rejected)?;
        Self::from_openssl_key(&rsa)
    }

    fn from_openssl_key(rsa: &Rsa<Private>) -> Result<Self, error::KeyRejected> {
        let der = rsa.private_key_to_der().map_err(error::key_rejected)?;
        let public_key = PublicKey::from_openssl_key(rsa)?;

        let ring_cache =
            Arc::new(RsaKeyPair::from_der(&der).map_err(|e| error::key_rejected(e.to_string()))?);

        Ok(Self {
            public_key,
            der,
            ring_cache,
        })
    }

    /// The RSA key pair in PKCS#1 DER encoding
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Exports the RSA key pair as unencrypted PKCS#1 PEM text
    ///
    /// # Errors
    ///
    /// The key could not be re-encoded.
    pub fn to_pem(&self) -> Result<String, error::Unexpected> {
        let key = Rsa::private_key_from_der(&self.der).map_err(error::unexpected)?;
        let pem = key.private_key_to_pem().map_err(error::unexpected)?;
        String::from_utf8(pem).map_err(error::unexpected)
    }

    /// Provides access to the public key parameters
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Extracts the public key
    pub fn into_public_key(self) -> PublicKey {
        self.public_key
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl jws::Signer for PrivateKey {
    type Algorithm = SigningAlgorithm;
    type Error = error::SigningFailed;

    fn can_sign(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let mut buf = vec![0; self.ring_cache.public().modulus_len()];
        self.ring_cache
            .sign(
                alg.into_signing_params(),
                &ring::rand::SystemRandom::new(),
                data,
                &mut buf,
            )
            .map_err(|e| error::signing_failed(e.to_string()))?;
        Ok(buf)
    }
}

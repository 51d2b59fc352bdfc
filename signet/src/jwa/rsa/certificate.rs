use std::{fmt, str::FromStr};

use openssl::x509::X509;
use signet_base64::{Base64, InvalidBase64Data};

use super::{PemSource, PublicKey, SigningAlgorithm};
use crate::{error, jws};

/// An X.509 certificate carrying an RSA public key
///
/// Used to verify RSA signatures. Only the public key is inspected;
/// validity periods and issuer chains are not checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    public_key: PublicKey,
    der: Vec<u8>,
}

impl Certificate {
    /// Imports a certificate from PEM text
    ///
    /// # Errors
    ///
    /// The text is not an X.509 certificate or the certificate does not
    /// carry an RSA public key.
    pub fn from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        let x509 = X509::from_pem(pem.as_bytes()).map_err(error::key_rejected)?;
        let rsa = x509
            .public_key()
            .and_then(|k| k.rsa())
            .map_err(error::key_rejected)?;

        Ok(Self {
            public_key: PublicKey::from_openssl_key(&rsa)?,
            der: x509.to_der().map_err(error::key_rejected)?,
        })
    }

    /// Loads a certificate from inline PEM text or a `file://` reference
    ///
    /// # Errors
    ///
    /// The source could not be read or does not hold an RSA certificate.
    pub fn load(source: impl Into<PemSource>) -> Result<Self, error::KeyRejected> {
        Self::from_pem(&source.into().read()?)
    }

    /// The certificate's public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The certificate in DER encoding
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The lowercase hex digest of the DER-encoded certificate
    #[must_use]
    pub fn fingerprint(&self, alg: FingerprintAlgorithm) -> String {
        alg.hex_digest(&self.der)
    }
}

impl jws::Verifier for Certificate {
    type Algorithm = SigningAlgorithm;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        jws::Verifier::can_verify(&self.public_key, alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        jws::Verifier::verify(&self.public_key, alg, data, signature)
    }
}

/// Digest used to fingerprint a certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FingerprintAlgorithm {
    /// SHA-1
    ///
    /// Retained for compatibility with `x5t` thumbprints.
    Sha1,

    /// SHA-256
    #[default]
    Sha256,
}

impl FingerprintAlgorithm {
    fn hex_digest(self, data: &[u8]) -> String {
        let alg = match self {
            Self::Sha1 => &ring::digest::SHA1_FOR_LEGACY_USE_ONLY,
            Self::Sha256 => &ring::digest::SHA256,
        };

        hex::encode(ring::digest::digest(alg, data))
    }
}

impl fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        })
    }
}

impl FromStr for FingerprintAlgorithm {
    type Err = error::UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            _ => Err(error::unsupported_algorithm(s)),
        }
    }
}

/// Computes the fingerprint of PEM-armored data
///
/// The armor lines (`-----BEGIN ...-----` and `-----END ...-----`) and all
/// whitespace are removed, the remaining text is decoded as standard
/// base64, and the digest of the decoded bytes is returned as lowercase
/// hex.
///
/// # Errors
///
/// The body between the armor lines is not valid base64.
pub fn fingerprint(pem: &str, alg: FingerprintAlgorithm) -> Result<String, InvalidBase64Data> {
    let body: String = pem
        .lines()
        .filter(|line| !line.trim_start().starts_with("-----"))
        .flat_map(str::chars)
        .filter(|c| !c.is_whitespace())
        .collect();

    let der = Base64::from_encoded(body)?;
    Ok(alg.hex_digest(der.as_slice()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use color_eyre::Result;

    use super::*;
    use crate::{
        jwa::rsa::PrivateKey,
        jws::{Signer, Verifier},
        test,
    };

    #[test]
    fn fingerprints_pem_text() -> Result<()> {
        assert_eq!(
            fingerprint(test::rsa::CERTIFICATE, FingerprintAlgorithm::Sha1)?,
            test::rsa::CERTIFICATE_SHA1
        );
        assert_eq!(
            fingerprint(test::rsa::CERTIFICATE, FingerprintAlgorithm::Sha256)?,
            test::rsa::CERTIFICATE_SHA256
        );
        Ok(())
    }

    #[test]
    fn fingerprints_parsed_certificate() -> Result<()> {
        let cert = Certificate::from_pem(test::rsa::CERTIFICATE)?;
        assert_eq!(
            cert.fingerprint(FingerprintAlgorithm::Sha1),
            test::rsa::CERTIFICATE_SHA1
        );
        assert_eq!(
            cert.fingerprint(FingerprintAlgorithm::default()),
            test::rsa::CERTIFICATE_SHA256
        );
        Ok(())
    }

    #[test]
    fn fingerprint_rejects_corrupt_body() {
        let pem = "-----BEGIN CERTIFICATE-----\n@@@@\n-----END CERTIFICATE-----\n";
        assert!(fingerprint(pem, FingerprintAlgorithm::Sha256).is_err());
    }

    #[test]
    fn fingerprint_algorithm_names() -> Result<()> {
        assert_eq!("sha1".parse::<FingerprintAlgorithm>()?, FingerprintAlgorithm::Sha1);
        assert_eq!(FingerprintAlgorithm::Sha256.to_string(), "sha256");
        assert!("md5".parse::<FingerprintAlgorithm>().is_err());
        Ok(())
    }

    #[test]
    fn certificate_matches_private_key() -> Result<()> {
        let cert = Certificate::from_pem(test::rsa::CERTIFICATE)?;
        let key = PrivateKey::from_pem(test::rsa::PRIVATE_KEY)?;
        assert_eq!(cert.public_key(), key.public_key());

        let signature = key.sign(SigningAlgorithm::RS384, b"payload")?;
        cert.verify(SigningAlgorithm::RS384, b"payload", &signature)?;
        assert!(cert
            .verify(SigningAlgorithm::RS256, b"payload", &signature)
            .is_err());
        Ok(())
    }

    #[test]
    fn loads_from_file_reference() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(test::rsa::CERTIFICATE.as_bytes())?;

        let cert = Certificate::load(format!("file://{}", file.path().display()))?;
        assert_eq!(cert, Certificate::from_pem(test::rsa::CERTIFICATE)?);
        Ok(())
    }

    #[test]
    fn rejects_non_certificates() {
        assert!(Certificate::from_pem(test::rsa::PUBLIC_KEY).is_err());
        assert!(Certificate::from_pem("").is_err());
        assert!(Certificate::load("file:///no/such/certificate.pem").is_err());
    }
}

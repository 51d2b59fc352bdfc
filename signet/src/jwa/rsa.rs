//! RSA JSON Web Algorithm implementations

use std::{
    borrow::Cow,
    fmt, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error;

mod certificate;
mod private;
mod public;

pub use certificate::{fingerprint, Certificate, FingerprintAlgorithm};
pub use private::PrivateKey;
pub use public::PublicKey;

/// RSA public/private key signing algorithms
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
pub enum SigningAlgorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    RS512,
}

impl SigningAlgorithm {
    /// The registered `alg` identifier
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
        }
    }

    fn into_verification_params(self) -> &'static ring::signature::RsaParameters {
        match self {
            SigningAlgorithm::RS256 => &ring::signature::RSA_PKCS1_2048_8192_SHA256,
            SigningAlgorithm::RS384 => &ring::signature::RSA_PKCS1_2048_8192_SHA384,
            SigningAlgorithm::RS512 => &ring::signature::RSA_PKCS1_2048_8192_SHA512,
        }
    }

    fn into_signing_params(self) -> &'static dyn ring::signature::RsaEncoding {
        match self {
            SigningAlgorithm::RS256 => &ring::signature::RSA_PKCS1_SHA256,
            SigningAlgorithm::RS384 => &ring::signature::RSA_PKCS1_SHA384,
            SigningAlgorithm::RS512 => &ring::signature::RSA_PKCS1_SHA512,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where PEM-encoded key material comes from
///
/// Text beginning with `file://` refers to a file on disk; anything else
/// is the PEM text itself.
///
/// ```
/// use std::path::PathBuf;
/// use signet::jwa::rsa::PemSource;
///
/// assert_eq!(
///     PemSource::from("file:///etc/keys/signing.pem"),
///     PemSource::File(PathBuf::from("/etc/keys/signing.pem")),
/// );
/// assert!(matches!(
///     PemSource::from("-----BEGIN CERTIFICATE-----"),
///     PemSource::Inline(_),
/// ));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PemSource {
    /// PEM text held in memory
    Inline(String),

    /// A file containing PEM text
    File(PathBuf),
}

const FILE_SCHEME: &str = "file://";

impl PemSource {
    /// Reads the PEM text
    ///
    /// # Errors
    ///
    /// The referenced file could not be read.
    pub fn read(&self) -> Result<Cow<'_, str>, error::KeyRejected> {
        match self {
            Self::Inline(pem) => Ok(Cow::Borrowed(pem)),
            Self::File(path) => fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(error::key_rejected),
        }
    }
}

impl From<&'_ str> for PemSource {
    fn from(value: &str) -> Self {
        match value.strip_prefix(FILE_SCHEME) {
            Some(path) => Self::File(PathBuf::from(path)),
            None => Self::Inline(value.to_owned()),
        }
    }
}

impl From<String> for PemSource {
    fn from(value: String) -> Self {
        match value.strip_prefix(FILE_SCHEME) {
            Some(path) => Self::File(PathBuf::from(path)),
            None => Self::Inline(value),
        }
    }
}

impl From<&'_ Path> for PemSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_owned())
    }
}

impl From<PathBuf> for PemSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use color_eyre::Result;

    use super::*;
    use crate::test;

    #[test]
    fn file_prefix_selects_a_path() {
        assert_eq!(
            PemSource::from(String::from("file://relative/key.pem")),
            PemSource::File(PathBuf::from("relative/key.pem"))
        );
        assert_eq!(
            PemSource::from(test::rsa::CERTIFICATE),
            PemSource::Inline(test::rsa::CERTIFICATE.to_owned())
        );
    }

    #[test]
    fn reads_pem_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(test::rsa::CERTIFICATE.as_bytes())?;

        let source = PemSource::from(format!("file://{}", file.path().display()));
        assert_eq!(source.read()?, test::rsa::CERTIFICATE);

        Ok(())
    }

    #[test]
    fn missing_file_is_rejected() {
        let source = PemSource::from("file:///this/path/does/not/exist.pem");
        assert!(source.read().is_err());
    }
}

//! Common errors

#![allow(missing_copy_implementations)]

use std::error::Error as StdError;

use thiserror::Error;

use crate::jwa;

/// The provided name could not be matched with supported algorithms
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{alg}' does not match supported algorithms")]
pub struct UnsupportedAlgorithm {
    alg: String,
}

impl UnsupportedAlgorithm {
    /// The algorithm name that was rejected
    #[must_use]
    pub fn name(&self) -> &str {
        &self.alg
    }
}

#[inline]
pub(crate) fn unsupported_algorithm(alg: impl Into<String>) -> UnsupportedAlgorithm {
    UnsupportedAlgorithm { alg: alg.into() }
}

/// The token is not three non-empty segments separated by `.`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("malformed JWS: expected three non-empty segments separated by '.'")]
pub struct MalformedToken {
    _p: (),
}

pub(crate) const fn malformed_token() -> MalformedToken {
    MalformedToken { _p: () }
}

/// The header segment is not BASE64URL-encoded JSON object text
#[derive(Debug, Error)]
#[error("JOSE header encoding is invalid")]
pub struct InvalidHeaderEncoding {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn invalid_header_encoding(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> InvalidHeaderEncoding {
    InvalidHeaderEncoding {
        source: source.into(),
    }
}

/// The payload segment is not BASE64URL-encoded JSON object text
#[derive(Debug, Error)]
#[error("JWT claim set encoding is invalid")]
pub struct InvalidPayloadEncoding {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn invalid_payload_encoding(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> InvalidPayloadEncoding {
    InvalidPayloadEncoding {
        source: source.into(),
    }
}

/// The signature did not match
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("signature mismatch")]
pub struct SignatureMismatch {
    _p: (),
}

pub(crate) const fn signature_mismatch() -> SignatureMismatch {
    SignatureMismatch { _p: () }
}

/// The key material was rejected
///
/// Raised when PEM text cannot be parsed, a passphrase is wrong, a
/// `file://` reference cannot be read, or the key is not an RSA key.
#[derive(Debug, Error)]
#[error("key rejected")]
pub struct KeyRejected {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn key_rejected(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> KeyRejected {
    KeyRejected {
        source: source.into(),
    }
}

/// No key material was supplied for an operation that requires it
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("no key supplied for algorithm '{alg}'")]
pub struct MissingKey {
    alg: jwa::Algorithm,
}

pub(crate) const fn missing_key(alg: jwa::Algorithm) -> MissingKey {
    MissingKey { alg }
}

/// No certificate was supplied to verify an RSA signature
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("cannot verify an RSA signature without a certificate")]
pub struct MissingCertificate {
    _p: (),
}

pub(crate) const fn missing_certificate() -> MissingCertificate {
    MissingCertificate { _p: () }
}

/// The supplied key cannot be used with the requested algorithm
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("key incompatible with algorithm '{alg}'")]
pub struct IncompatibleKey {
    alg: jwa::Algorithm,
}

pub(crate) const fn incompatible_key(alg: jwa::Algorithm) -> IncompatibleKey {
    IncompatibleKey { alg }
}

/// The underlying cryptographic operation failed to produce a signature
#[derive(Debug, Error)]
#[error("unable to generate a digital signature")]
pub struct SigningFailed {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn signing_failed(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> SigningFailed {
    SigningFailed {
        source: source.into(),
    }
}

/// Unexpected error (possibly a bug)
#[derive(Debug, Error)]
#[error("unexpected error")]
pub struct Unexpected {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn unexpected(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> Unexpected {
    Unexpected {
        source: source.into(),
    }
}

/// A `jti` claim is present, but no replay guard was supplied
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("token carries a jti claim, but no replay guard was supplied")]
pub struct MissingReplayHooks {
    _p: (),
}

pub(crate) const fn missing_replay_hooks() -> MissingReplayHooks {
    MissingReplayHooks { _p: () }
}

/// The requested custom claim is not present in the claim set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("the {name} claim is not defined")]
pub struct UndefinedClaim {
    name: String,
}

impl UndefinedClaim {
    /// The name of the missing claim
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

pub(crate) fn undefined_claim(name: impl Into<String>) -> UndefinedClaim {
    UndefinedClaim { name: name.into() }
}

/// An error occurring while validating a JOSE header
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// The required `alg` parameter is absent
    #[error("missing required parameter \"alg\"")]
    MissingAlgorithm,

    /// The `alg` parameter names an algorithm outside of the supported set
    #[error(transparent)]
    UnsupportedAlgorithm(#[from] UnsupportedAlgorithm),

    /// The `crit` parameter is not a list of names
    #[error("parameter \"crit\" must be an array of names")]
    InvalidCritType,

    /// The `crit` list names a registered header parameter
    #[error("registered header parameter \"{0}\" must not be used in the \"crit\" list")]
    CriticalNameCollision(String),

    /// The `crit` list names a parameter that the header does not carry
    #[error("critical header parameter \"{0}\" does not exist")]
    MissingCriticalParameter(String),

    /// A URL parameter is not a syntactically valid absolute URL
    #[error("the value of the \"{param}\" header parameter is not a valid URL")]
    InvalidUrl {
        /// The offending parameter name
        param: &'static str,
    },

    /// A URL parameter does not use the `https` scheme
    #[error("the \"{param}\" header parameter must be an HTTPS URL")]
    InsecureUrl {
        /// The offending parameter name
        param: &'static str,
    },

    /// The `jwk` parameter is a scalar rather than a structure
    #[error("parameter \"jwk\" must be a JSON object or array")]
    InvalidJwkType,

    /// A registered parameter carries a JSON value of the wrong type
    #[error("parameter \"{param}\" has an invalid type")]
    InvalidParameterType {
        /// The offending parameter name
        param: &'static str,
    },
}

/// An error occurring while reading a JWT claim set
#[derive(Debug, Error)]
pub enum ClaimsError {
    /// A registered claim carries a JSON value that cannot be coerced
    #[error("claim \"{claim}\" has an invalid type")]
    InvalidClaimType {
        /// The offending claim name
        claim: &'static str,
    },

    /// A registered claim name was used as a custom claim
    #[error("\"{0}\" is a registered claim name and cannot be used as a custom claim")]
    RegisteredClaimName(String),

    /// An unexpected error, such as a failing random number generator
    #[error(transparent)]
    Unexpected(#[from] Unexpected),
}

/// An error occurring while building a JWS from header and claim mappings
#[derive(Debug, Error)]
pub enum ConstructError {
    /// The header was rejected
    #[error(transparent)]
    Header(#[from] HeaderError),

    /// The claim set was rejected
    #[error(transparent)]
    Claims(#[from] ClaimsError),
}

/// An error occurring while parsing a compact JWS
#[derive(Debug, Error)]
pub enum ParseError {
    /// The token is not three non-empty segments
    #[error(transparent)]
    MalformedToken(#[from] MalformedToken),

    /// The header segment is not valid BASE64URL JSON
    #[error(transparent)]
    InvalidHeaderEncoding(#[from] InvalidHeaderEncoding),

    /// The payload segment is not valid BASE64URL JSON
    #[error(transparent)]
    InvalidPayloadEncoding(#[from] InvalidPayloadEncoding),

    /// The decoded header or claims were rejected
    #[error(transparent)]
    Construct(#[from] ConstructError),
}

impl ParseError {
    /// Whether the error is due to the token shape
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedToken(_))
    }

    /// The header validation failure, if that is the cause
    #[must_use]
    pub fn header_error(&self) -> Option<&HeaderError> {
        match self {
            Self::Construct(ConstructError::Header(e)) => Some(e),
            _ => None,
        }
    }
}

/// An error occurring while pairing an algorithm with key material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StrategyError {
    /// The algorithm requires key material that was not supplied
    #[error(transparent)]
    MissingKey(#[from] MissingKey),

    /// The key material belongs to another algorithm family
    #[error(transparent)]
    IncompatibleKey(#[from] IncompatibleKey),
}

/// An error occurring while creating a signature
#[derive(Debug, Error)]
pub enum SigningError {
    /// The algorithm requires key material that was not supplied
    #[error(transparent)]
    MissingKey(#[from] MissingKey),

    /// The key material belongs to another algorithm family
    #[error(transparent)]
    IncompatibleKey(#[from] IncompatibleKey),

    /// The cryptographic library failed to produce a signature
    #[error(transparent)]
    SigningFailed(#[from] SigningFailed),
}

impl From<StrategyError> for SigningError {
    fn from(err: StrategyError) -> Self {
        match err {
            StrategyError::MissingKey(e) => Self::MissingKey(e),
            StrategyError::IncompatibleKey(e) => Self::IncompatibleKey(e),
        }
    }
}

impl From<std::convert::Infallible> for SigningError {
    fn from(_: std::convert::Infallible) -> Self {
        unreachable!("infallible result")
    }
}

/// A reason why a signature could not be verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// The envelope has no encoded segments to verify
    #[error("JWS has not been signed or parsed")]
    NotEncoded,

    /// The algorithm requires a shared secret that was not supplied
    #[error(transparent)]
    MissingKey(#[from] MissingKey),

    /// The algorithm requires a certificate that was not supplied
    #[error(transparent)]
    MissingCertificate(#[from] MissingCertificate),

    /// The key material belongs to another algorithm family
    #[error(transparent)]
    IncompatibleKey(#[from] IncompatibleKey),

    /// The signature segment is not valid BASE64URL
    #[error("malformed JWS signature")]
    MalformedSignature,

    /// The signature does not match the signing input
    #[error(transparent)]
    SignatureMismatch(#[from] SignatureMismatch),
}

impl From<StrategyError> for VerifyError {
    fn from(err: StrategyError) -> Self {
        match err {
            StrategyError::MissingKey(e) => Self::MissingKey(e),
            StrategyError::IncompatibleKey(e) => Self::IncompatibleKey(e),
        }
    }
}

impl VerifyError {
    /// Whether the failure is a genuine signature mismatch rather than a
    /// missing or unusable piece of key material
    #[must_use]
    pub fn is_signature_mismatch(&self) -> bool {
        matches!(self, Self::SignatureMismatch(_) | Self::MalformedSignature)
    }
}

/// The claim set was rejected during verification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsRejected {
    /// The claims are not currently acceptable
    #[error(transparent)]
    Invalid(#[from] crate::jwt::Invalid),

    /// Verification could not be carried out as configured
    #[error(transparent)]
    MissingReplayHooks(#[from] MissingReplayHooks),
}

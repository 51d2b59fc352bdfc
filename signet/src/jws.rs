//! Implementations of the JSON Web Signature (JWS) standard
//!
//! The specifications for this standard can be found in [RFC7515][].
//!
//! A [`Jws`] pairs a [`JoseHeader`] with a [`Jwt`] claim set. It is created
//! either from a header and claims, in which case it can be signed, or by
//! parsing a compact token, in which case its signature can be checked.
//!
//! ```
//! use serde_json::json;
//! use signet::{jwa::rsa, Jws};
//!
//! # let private_key_pem = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/rsa/private-key.pem"));
//! # let certificate_pem = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/rsa/certificate.pem"));
//! let header = json!({ "alg": "RS256", "typ": "JWT" });
//! let claims = json!({ "iss": "domain.com" });
//!
//! let mut jws = Jws::new(header.as_object().unwrap(), claims.as_object().unwrap())?
//!     .with_private_key(rsa::PrivateKey::from_pem(private_key_pem)?);
//! let token = jws.sign()?;
//!
//! let received = Jws::parse(token.as_str())?
//!     .with_certificate(rsa::Certificate::from_pem(certificate_pem)?);
//! assert!(received.verify());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515

use std::{error::Error as StdError, fmt};

use aliri_braid::braid;
use serde_json::{Map, Value};
use signet_base64::Base64Url;
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

use crate::{
    error,
    header::JoseHeader,
    jwa::{self, rsa, Hmac, SigningKey},
    jwt::Jwt,
};

/// A JWS signer
pub trait Signer {
    /// The usable signature algorithms
    type Algorithm;

    /// The error returned on failure to sign
    type Error: fmt::Debug + fmt::Display + Sync + Send + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this signer
    fn can_sign(&self, alg: Self::Algorithm) -> bool;

    /// Attempts to sign the data provided using the specified algorithm
    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error>;
}

/// A JWS verifier
pub trait Verifier {
    /// The verifiable signature algorithms
    type Algorithm;

    /// The error returned on a failure to verify
    type Error: StdError + Send + Sync + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this verifier
    fn can_verify(&self, alg: Self::Algorithm) -> bool;

    /// Attempts to verify the data against the signature using the
    /// specified algorithm
    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error>;
}

/// A JWS in compact serialization
///
/// This type provides custom implementations of [`Display`][CompactRef#impl-Display] and
/// [`Debug`][CompactRef#impl-Debug] to prevent unintentional disclosures of tokens in logs.
#[braid(
    serde,
    debug = "owned",
    display = "owned",
    ord = "omit",
    ref_doc = "\
    A borrowed reference to a compact JWS ([`Compact`])\n\
    \n\
    This type provides custom implementations of [`Display`][Self#impl-Display] and \
    [`Debug`][Self#impl-Debug] to prevent unintentional disclosures of tokens in logs.
    "
)]
#[must_use]
pub struct Compact;

impl CompactRef {
    /// Splits the token into its header, payload, and signature segments
    ///
    /// # Errors
    ///
    /// The token does not have exactly three non-empty segments.
    pub fn segments(&self) -> Result<(&str, &str, &str), error::MalformedToken> {
        let mut parts = self.as_str().split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() && !s.is_empty() => {
                Ok((h, p, s))
            }
            _ => Err(error::malformed_token()),
        }
    }
}

/// Hides the token unless the alternate form is requested
///
/// In the alternate form (`{:#?}`), the header and payload are shown but
/// the signature is elided.
///
/// ```
/// use signet::jws::CompactRef;
///
/// let token = CompactRef::from_str("eyJhbGciOiJIUzI1NiJ9.e30.c2lnbmF0dXJl");
/// assert_eq!(format!("{:?}", token), "***JWS***");
/// assert_eq!(format!("{:#?}", token), "\"eyJhbGciOiJIUzI1NiJ9.e30.…\"");
/// ```
impl fmt::Debug for CompactRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            match self.as_str().rfind('.') {
                Some(last_period) => write!(f, "\"{}…\"", &self.as_str()[..=last_period]),
                None => f.write_str("\"…\""),
            }
        } else {
            f.write_str("***JWS***")
        }
    }
}

/// Hides the token unless the alternate form is requested
///
/// The alternate form (`{:#}`) prints the entire token.
///
/// ```
/// use signet::jws::CompactRef;
///
/// let token = CompactRef::from_str("eyJhbGciOiJIUzI1NiJ9.e30.c2lnbmF0dXJl");
/// assert_eq!(format!("{}", token), "***JWS***");
/// assert_eq!(format!("{:#}", token), "eyJhbGciOiJIUzI1NiJ9.e30.c2lnbmF0dXJl");
/// ```
impl fmt::Display for CompactRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            f.write_str(self.as_str())
        } else {
            f.write_str("***JWS***")
        }
    }
}

/// The lifecycle stage of a [`Jws`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Built from a header and claims; not yet signed
    Constructed,

    /// Signed; the encoded segments are available
    Signed,

    /// Parsed from a compact token; the signature has not necessarily been
    /// checked
    Parsed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segments {
    header: String,
    payload: String,
    signature: String,
}

impl Segments {
    fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }

    fn compact(&self) -> Compact {
        Compact::new(format!(
            "{}.{}.{}",
            self.header, self.payload, self.signature
        ))
    }
}

/// A JSON Web Signature over a JWT claim set
#[derive(Debug, Clone)]
#[must_use]
pub struct Jws {
    header: JoseHeader,
    claims: Jwt,
    segments: Option<Segments>,
    state: State,
    private_key: Option<SigningKey>,
    certificate: Option<rsa::Certificate>,
}

impl Jws {
    /// Builds an unsigned JWS from header and claim objects
    ///
    /// # Errors
    ///
    /// The header or the claims were rejected. See
    /// [`JoseHeader::from_map()`] and [`Jwt::from_map()`].
    pub fn new(
        header: &Map<String, Value>,
        claims: &Map<String, Value>,
    ) -> Result<Self, error::ConstructError> {
        let header = JoseHeader::from_map(header)?;
        let claims = Jwt::from_map(claims)?;
        Ok(Self::from_parts(header, claims))
    }

    /// Builds an unsigned JWS from an already validated header and claims
    pub fn from_parts(header: JoseHeader, claims: Jwt) -> Self {
        Self {
            header,
            claims,
            segments: None,
            state: State::Constructed,
            private_key: None,
            certificate: None,
        }
    }

    /// Parses a JWS from its compact serialization
    ///
    /// The header and claims are validated exactly as in [`new()`][Self::new()].
    /// The signature is not checked; call [`verify()`][Self::verify()] once
    /// key material has been attached.
    ///
    /// # Errors
    ///
    /// The token is not three non-empty segments, a segment is not
    /// BASE64URL-encoded JSON object text, or the decoded header or claims
    /// were rejected.
    pub fn parse(token: &str) -> Result<Self, error::ParseError> {
        let (header, payload, signature) = CompactRef::from_str(token).segments()?;

        let raw_header = decode_object(header).map_err(error::invalid_header_encoding)?;
        let raw_claims = decode_object(payload).map_err(error::invalid_payload_encoding)?;

        let mut jws = Self::new(&raw_header, &raw_claims)?;
        jws.segments = Some(Segments {
            header: header.to_owned(),
            payload: payload.to_owned(),
            signature: signature.to_owned(),
        });
        jws.state = State::Parsed;

        #[cfg(feature = "tracing")]
        debug!(alg = %jws.header.algorithm(), "parsed JWS");

        Ok(jws)
    }

    /// Signs the header and claims, returning the compact serialization
    ///
    /// The header and claims are rendered with [`JoseHeader::to_json()`]
    /// and [`Jwt::to_json()`]. On success the envelope moves to
    /// [`State::Signed`]; on failure it is left unchanged.
    ///
    /// # Errors
    ///
    /// No suitable key has been attached, or the signature could not be
    /// produced.
    pub fn sign(&mut self) -> Result<Compact, error::SigningError> {
        let alg = self.header.algorithm();
        let strategy = jwa::Strategy::new(alg, self.private_key.as_ref()).map_err(|err| {
            #[cfg(feature = "tracing")]
            warn!(%err, %alg, "unable to sign JWS");
            err
        })?;

        let header = signet_base64::encode(self.header.to_json());
        let payload = signet_base64::encode(self.claims.to_json());
        let signature = strategy.sign(format!("{}.{}", header, payload).as_bytes())?;

        let segments = Segments {
            header,
            payload,
            signature: signet_base64::encode(signature),
        };
        let compact = segments.compact();

        self.segments = Some(segments);
        self.state = State::Signed;

        #[cfg(feature = "tracing")]
        debug!(%alg, "signed JWS");

        Ok(compact)
    }

    /// Checks the signature, returning `false` on any failure
    ///
    /// HMAC signatures are checked against the attached secret. RSA
    /// signatures are checked against the attached certificate; without
    /// one, verification fails.
    #[must_use]
    pub fn verify(&self) -> bool {
        match self.try_verify() {
            Ok(()) => true,
            Err(err) => {
                #[cfg(feature = "tracing")]
                if err.is_signature_mismatch() {
                    debug!(%err, alg = %self.header.algorithm(), "JWS signature rejected");
                } else {
                    warn!(%err, alg = %self.header.algorithm(), "unable to check JWS signature");
                }
                #[cfg(not(feature = "tracing"))]
                let _ = err;

                false
            }
        }
    }

    /// Checks the signature, reporting why it could not be accepted
    ///
    /// # Errors
    ///
    /// The envelope has not been signed or parsed, the required key
    /// material is missing, or the signature does not match.
    pub fn try_verify(&self) -> Result<(), error::VerifyError> {
        let segments = self
            .segments
            .as_ref()
            .ok_or(error::VerifyError::NotEncoded)?;

        let strategy = jwa::create_strategy(&self.header, self.private_key.as_ref())?;
        let signature = Base64Url::from_encoded(&segments.signature)
            .map_err(|_| error::VerifyError::MalformedSignature)?;

        strategy.verify(
            segments.signing_input().as_bytes(),
            signature.as_slice(),
            self.certificate.as_ref(),
        )
    }

    /// Attaches an HMAC shared secret
    pub fn with_secret(self, secret: impl Into<Vec<u8>>) -> Self {
        self.with_private_key(Hmac::new(secret))
    }

    /// Attaches signing key material
    pub fn with_private_key(mut self, key: impl Into<SigningKey>) -> Self {
        self.set_private_key(key);
        self
    }

    /// Attaches a certificate for verifying RSA signatures
    pub fn with_certificate(mut self, certificate: rsa::Certificate) -> Self {
        self.set_certificate(certificate);
        self
    }

    /// Replaces the signing key material
    pub fn set_private_key(&mut self, key: impl Into<SigningKey>) {
        self.private_key = Some(key.into());
    }

    /// Replaces the certificate for verifying RSA signatures
    pub fn set_certificate(&mut self, certificate: rsa::Certificate) {
        self.certificate = Some(certificate);
    }

    /// The JOSE header
    pub fn header(&self) -> &JoseHeader {
        &self.header
    }

    /// The claim set
    pub fn claims(&self) -> &Jwt {
        &self.claims
    }

    /// Mutable access to the claim set, available only before signing
    pub fn claims_mut(&mut self) -> Option<&mut Jwt> {
        match self.state {
            State::Constructed => Some(&mut self.claims),
            State::Signed | State::Parsed => None,
        }
    }

    /// The lifecycle stage
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// The attached signing key material
    #[must_use]
    pub fn private_key(&self) -> Option<&SigningKey> {
        self.private_key.as_ref()
    }

    /// The attached certificate
    #[must_use]
    pub fn certificate(&self) -> Option<&rsa::Certificate> {
        self.certificate.as_ref()
    }

    /// The encoded header segment, once signed or parsed
    #[must_use]
    pub fn encoded_header(&self) -> Option<&str> {
        self.segments.as_ref().map(|s| s.header.as_str())
    }

    /// The encoded payload segment, once signed or parsed
    #[must_use]
    pub fn encoded_payload(&self) -> Option<&str> {
        self.segments.as_ref().map(|s| s.payload.as_str())
    }

    /// The encoded signature segment, once signed or parsed
    #[must_use]
    pub fn encoded_signature(&self) -> Option<&str> {
        self.segments.as_ref().map(|s| s.signature.as_str())
    }

    /// The compact serialization, once signed or parsed
    #[must_use]
    pub fn compact(&self) -> Option<Compact> {
        self.segments.as_ref().map(Segments::compact)
    }
}

fn decode_object(segment: &str) -> Result<Map<String, Value>, Box<dyn StdError + Send + Sync>> {
    let raw = Base64Url::from_encoded(segment)?;
    match serde_json::from_slice::<Value>(raw.as_slice())? {
        Value::Object(map) => Ok(map),
        _ => Err("segment is not a JSON object".into()),
    }
}

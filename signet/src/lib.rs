//! This crate implements the compact serialization of JSON Web Signatures
//! and the claim model of JSON Web Tokens:
//!
//! * JSON Web Signature (JWS): [RFC7515][]
//! * JSON Web Algorithms (JWA): [RFC7518][]
//! * JSON Web Token (JWT): [RFC7519][]
//!
//! Supported algorithms are HMAC with SHA-2 (`HS256`, `HS384`, `HS512`) and
//! RSASSA-PKCS1-v1_5 with SHA-2 (`RS256`, `RS384`, `RS512`). Tokens are
//! always signed, and `none` is never accepted.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use signet::{jwt::InMemoryReplayGuard, Jws};
//!
//! let header = json!({ "alg": "HS256", "typ": "JWT" });
//! let claims = json!({ "iss": "domain.com", "jti": "abc-123" });
//!
//! let mut jws = Jws::new(header.as_object().unwrap(), claims.as_object().unwrap())?
//!     .with_secret("s3cr3t");
//! let token = jws.sign()?;
//!
//! // tokens are hidden from logs unless asked for explicitly
//! assert_eq!(token.to_string(), "***JWS***");
//!
//! let received = Jws::parse(token.as_str())?.with_secret("s3cr3t");
//! assert!(received.verify());
//!
//! let guard = InMemoryReplayGuard::new();
//! assert!(received.claims().verify(Some(&guard)).is_valid());
//!
//! // the same token cannot be used twice
//! assert!(!received.claims().verify(Some(&guard)).is_valid());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod error;
pub mod header;
pub mod jwa;
pub mod jws;
pub mod jwt;
pub mod random;


#[doc(inline)]
pub use header::JoseHeader;
#[doc(inline)]
pub use jws::{Compact, CompactRef, Jws};
#[doc(inline)]
pub use jwt::{Jwt, Validity};

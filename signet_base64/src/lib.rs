//! Byte buffers that render as base64
//!
//! The [`signet_base64`][] crate holds the base64 plumbing used by the
//! [`signet`][] family of crates. Every segment of a JWS compact
//! serialization is BASE64URL text: the standard base64 alphabet with `+`
//! and `/` replaced by `-` and `_`, and with the trailing `=` padding
//! stripped.
//!
//! Data is kept in its raw form. The cost of encoding is paid only when a
//! buffer is displayed, formatted for debugging, or serialized.
//!
//!   [`signet`]: https://docs.rs/signet
//!   [`signet_base64`]: https://docs.rs/signet_base64
//!
//! # Decoding
//!
//! Decoding is tolerant of padding: the encoded text may carry the
//! trailing `=` characters or omit them. Text whose length cannot be
//! completed to a multiple of four (a lone trailing symbol) and text
//! containing symbols outside of the alphabet are rejected.
//!
//! # Example
//!
//! ```
//! use signet_base64::Base64Url;
//!
//! let data = Base64Url::from_raw("{\"alg\":\"HS256\"}");
//! assert_eq!(data.to_string(), "eyJhbGciOiJIUzI1NiJ9");
//!
//! let decoded = Base64Url::from_encoded("eyJhbGciOiJIUzI1NiJ9").unwrap();
//! assert_eq!(decoded.as_slice(), b"{\"alg\":\"HS256\"}");
//! ```
//!
//! The free functions [`encode`] and [`decode`] are shorthands for the
//! BASE64URL encoding when an owned buffer is not needed.
//!
//! ```
//! assert_eq!(signet_base64::encode([0xfb, 0xff]), "-_8");
//! assert_eq!(signet_base64::decode("-_8").unwrap(), vec![0xfb, 0xff]);
//! assert_eq!(signet_base64::decode("-_8=").unwrap(), vec![0xfb, 0xff]);
//! ```

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
    unused_must_use
)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::{error::Error, fmt};

use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig},
        DecodePaddingMode,
    },
};

const URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// An error while decoding a value which is not properly formatted
/// base64 data
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidBase64Data {
    source: ::base64::DecodeError,
}

impl From<::base64::DecodeError> for InvalidBase64Data {
    fn from(err: ::base64::DecodeError) -> Self {
        Self { source: err }
    }
}

impl fmt::Display for InvalidBase64Data {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid base64 data")
    }
}

impl Error for InvalidBase64Data {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Encodes the bytes as BASE64URL text without padding
#[must_use]
pub fn encode<T: AsRef<[u8]>>(raw: T) -> String {
    ::base64::Engine::encode(&URL_SAFE, raw)
}

/// Decodes BASE64URL text, with or without trailing padding
///
/// # Errors
///
/// Returns an error if the text contains symbols outside of the URL-safe
/// alphabet or has a length that cannot be padded to a multiple of four.
pub fn decode<T: AsRef<[u8]>>(enc: T) -> Result<Vec<u8>, InvalidBase64Data> {
    Ok(::base64::Engine::decode(&URL_SAFE, enc)?)
}

macro_rules! b64_buffer {
    {
        $(#[$meta:meta])*
        $v:vis struct $ty:ident ($config:expr, $is_padded:expr);
    } => {
        #[derive(Clone, Default, Eq, PartialEq, Hash)]
        $(#[$meta])*
        ///
        /// Data is held in memory in its raw form. Implementations of the
        /// [`From`] trait assume that the value given is raw, not encoded.
        #[must_use]
        $v struct $ty(Vec<u8>);

        impl $ty {
            /// Creates an empty buffer
            #[inline]
            pub const fn new() -> Self {
                Self(Vec::new())
            }

            /// Wraps raw bytes
            ///
            /// To decode an encoded value, use [`from_encoded()`][Self::from_encoded()].
            #[inline]
            pub fn from_raw<T: Into<Vec<u8>>>(raw: T) -> Self {
                Self(raw.into())
            }

            /// Decodes base64 text into a new buffer
            ///
            /// # Errors
            ///
            /// Returns an error if the input is not valid base64 text.
            pub fn from_encoded<T: AsRef<[u8]>>(enc: T) -> Result<Self, InvalidBase64Data> {
                let data = ::base64::Engine::decode(&$config, enc)?;
                Ok(Self(data))
            }

            /// Unwraps the underlying buffer
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> Vec<u8> {
                self.0
            }

            /// Provides access to the underlying bytes
            #[inline]
            #[must_use]
            pub fn as_slice(&self) -> &[u8] {
                &self.0
            }

            /// Provides mutable access to the underlying bytes
            #[inline]
            #[must_use]
            pub fn as_mut_slice(&mut self) -> &mut [u8] {
                &mut self.0
            }

            /// The number of raw bytes held
            #[inline]
            #[must_use]
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Whether the buffer is empty
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// The length of the encoded form of this buffer
            #[inline]
            #[must_use]
            pub const fn encoded_len(&self) -> usize {
                Self::calc_encoded_len(self.0.len())
            }

            /// Calculates the length of the encoding of a buffer of size `len`
            #[inline]
            #[must_use]
            pub const fn calc_encoded_len(len: usize) -> usize {
                if $is_padded {
                    (len + 2) / 3 * 4
                } else {
                    let d = len / 3 * 4;
                    match len % 3 {
                        0 => d,
                        m => d + m + 1,
                    }
                }
            }
        }

        impl From<Vec<u8>> for $ty {
            #[inline]
            fn from(buf: Vec<u8>) -> Self {
                Self(buf)
            }
        }

        impl From<&'_ [u8]> for $ty {
            #[inline]
            fn from(slice: &[u8]) -> Self {
                Self(slice.to_vec())
            }
        }

        impl From<$ty> for Vec<u8> {
            #[inline]
            fn from(val: $ty) -> Self {
                val.0
            }
        }

        impl AsRef<[u8]> for $ty {
            #[inline]
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(&::base64::Engine::encode(&$config, &self.0))
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "`{}`", ::base64::Engine::encode(&$config, &self.0))
            }
        }

        /// Serialize the underlying bytes as a base64 string
        #[cfg(feature = "serde")]
        #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
        impl ::serde::Serialize for $ty {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let encoded = ::base64::Engine::encode(&$config, &self.0);
                serializer.serialize_str(&encoded)
            }
        }

        /// Deserialize a base64 string and decode it into raw bytes
        #[cfg(feature = "serde")]
        #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let encoded = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                Self::from_encoded(encoded).map_err(::serde::de::Error::custom)
            }
        }
    }
}

b64_buffer! {
    /// Bytes rendered as standard base64
    ///
    /// Encoding alphabet: `A`–`Z`, `a`–`z`, `0`–`9`, `+`, `/`
    ///
    /// Padding character: `=` (optional when decoding)
    pub struct Base64(STANDARD, true);
}

b64_buffer! {
    /// Bytes rendered as URL-safe base64 without padding (BASE64URL)
    ///
    /// Encoding alphabet: `A`–`Z`, `a`–`z`, `0`–`9`, `-`, `_`
    pub struct Base64Url(URL_SAFE, false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_alphabet_replaces_plus_and_slash() {
        let raw = [0xfb, 0xff];
        assert_eq!(Base64::from_raw(raw.to_vec()).to_string(), "+/8=");
        assert_eq!(Base64Url::from_raw(raw.to_vec()).to_string(), "-_8");
    }

    #[test]
    fn url_encoding_strips_padding() {
        assert_eq!(encode("hello"), "aGVsbG8");
        assert_eq!(encode("hell"), "aGVsbA");
        assert_eq!(encode("hel"), "aGVs");
        assert_eq!(encode(""), "");
    }

    #[test]
    fn url_decoding_accepts_missing_or_present_padding() {
        assert_eq!(decode("aGVsbG8").unwrap(), b"hello");
        assert_eq!(decode("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode("aGVsbA").unwrap(), b"hell");
        assert_eq!(decode("aGVsbA==").unwrap(), b"hell");
    }

    #[test]
    fn url_decoding_rejects_malformed_text() {
        assert!(decode("a").is_err());
        assert!(decode("aGVsb*8").is_err());
        assert!(decode("{}").is_err());
    }

    #[test]
    fn standard_decoding_rejects_url_alphabet() {
        assert!(Base64::from_encoded("-_8=").is_err());
        assert_eq!(Base64::from_encoded("+/8=").unwrap().as_slice(), [0xfb, 0xff]);
    }

    #[test]
    fn encoded_len_matches_output() {
        for len in 0..16 {
            let url = Base64Url::from_raw(vec![0xa5; len]);
            assert_eq!(url.encoded_len(), url.to_string().len());

            let std = Base64::from_raw(vec![0xa5; len]);
            assert_eq!(std.encoded_len(), std.to_string().len());
        }
    }

    #[test]
    fn debug_is_fenced() {
        let data = Base64Url::from_raw("hello");
        assert_eq!(format!("{:?}", data), "`aGVsbG8`");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trips_as_text() {
        #[derive(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        struct Holder {
            data: Base64Url,
        }

        let holder = Holder {
            data: Base64Url::from_raw(vec![0xfb, 0xff]),
        };

        let json = serde_json::to_string(&holder).unwrap();
        assert_eq!(json, r#"{"data":"-_8"}"#);

        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, holder);
    }
}

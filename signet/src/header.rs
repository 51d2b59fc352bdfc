//! The JOSE header of a JWS
//!
//! The header names the signing algorithm and may carry hints about the
//! key used (`jku`, `jwk`, `kid`, `x5u`, `x5c`, `x5t`, `x5t#S256`), the
//! media types of the token (`typ`, `cty`), and a list of extension
//! parameters that a recipient must understand (`crit`).
//!
//! Headers are validated when they are built from a JSON object. A JSON
//! `null` is treated as though the parameter were absent.

use aliri_braid::braid;
use serde_json::{Map, Value};
use url::Url;

use crate::{error::HeaderError, jwa};

/// The identifier of the key used to secure a JWS
#[braid(serde, ref_doc = "A borrowed reference to a key identifier ([`KeyId`])")]
pub struct KeyId;

const REGISTERED_PARAMETER_NAMES: [&str; 11] = [
    "alg", "jku", "jwk", "kid", "x5u", "x5c", "x5t", "x5t#S256", "typ", "cty", "crit",
];

/// The header parameter names registered by RFC 7515
///
/// None of these may appear in a `crit` list.
#[must_use]
pub fn registered_parameter_names() -> &'static [&'static str] {
    &REGISTERED_PARAMETER_NAMES
}

fn is_registered(name: &str) -> bool {
    REGISTERED_PARAMETER_NAMES.contains(&name)
}

/// Looks up `name`, treating a JSON `null` as absent
pub(crate) fn present<'a>(raw: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    raw.get(name).filter(|v| !v.is_null())
}

/// A validated JOSE header
///
/// ```
/// use serde_json::json;
/// use signet::{header::JoseHeader, jwa::Algorithm};
///
/// let raw = json!({ "alg": "RS256", "typ": "JWT", "kid": "2014-11" });
/// let header = JoseHeader::from_map(raw.as_object().unwrap()).unwrap();
///
/// assert_eq!(header.algorithm(), Algorithm::RS256);
/// assert_eq!(header.key_id().map(|k| k.as_str()), Some("2014-11"));
/// assert_eq!(header.to_json(), r#"{"alg":"RS256","kid":"2014-11","typ":"JWT"}"#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct JoseHeader {
    algorithm: jwa::Algorithm,
    jwk_set_url: Option<String>,
    json_web_key: Option<Value>,
    key_id: Option<KeyId>,
    x509_url: Option<String>,
    x509_certificate_chain: Option<Value>,
    x509_sha1_thumbprint: Option<String>,
    x509_sha256_thumbprint: Option<String>,
    token_type: Option<String>,
    content_type: Option<String>,
    critical: Option<Map<String, Value>>,
}

impl JoseHeader {
    /// A header carrying only the algorithm
    pub fn new(algorithm: jwa::Algorithm) -> Self {
        Self {
            algorithm,
            jwk_set_url: None,
            json_web_key: None,
            key_id: None,
            x509_url: None,
            x509_certificate_chain: None,
            x509_sha1_thumbprint: None,
            x509_sha256_thumbprint: None,
            token_type: None,
            content_type: None,
            critical: None,
        }
    }

    /// A header carrying only the algorithm named `alg`
    ///
    /// # Errors
    ///
    /// The algorithm is not supported.
    pub fn try_new(alg: &str) -> Result<Self, HeaderError> {
        Ok(Self::new(alg.parse()?))
    }

    /// Builds a header from a JSON object
    ///
    /// Checks happen in this order: `alg` is required and must name a
    /// supported algorithm; `crit`, if present, must be a list of names
    /// that are not registered parameters, each of which must be present
    /// in the object (an empty list is treated as absent); `jku` and `x5u` must be absolute `https`
    /// URLs; `jwk` must be an object or array. Parameters named by `crit`
    /// are collected into [`critical()`][Self::critical()]; other
    /// unregistered parameters are dropped.
    ///
    /// # Errors
    ///
    /// Any of the checks above fails, or a registered text parameter
    /// carries a non-text value.
    pub fn from_map(raw: &Map<String, Value>) -> Result<Self, HeaderError> {
        let mut header = match present(raw, "alg") {
            Some(Value::String(name)) => Self::try_new(name)?,
            Some(other) => return Err(crate::error::unsupported_algorithm(other.to_string()).into()),
            None => return Err(HeaderError::MissingAlgorithm),
        };

        header.critical = critical_parameters(raw)?;
        header.jwk_set_url = https_url(raw, "jku")?;
        header.x509_url = https_url(raw, "x5u")?;

        header.json_web_key = match present(raw, "jwk") {
            Some(v @ (Value::Object(_) | Value::Array(_))) => Some(v.clone()),
            Some(_) => return Err(HeaderError::InvalidJwkType),
            None => None,
        };

        header.x509_certificate_chain = match present(raw, "x5c") {
            Some(v @ (Value::String(_) | Value::Array(_))) => Some(v.clone()),
            Some(_) => return Err(HeaderError::InvalidParameterType { param: "x5c" }),
            None => None,
        };

        header.key_id = text_parameter(raw, "kid")?.map(KeyId::new);
        header.x509_sha1_thumbprint = text_parameter(raw, "x5t")?;
        header.x509_sha256_thumbprint = text_parameter(raw, "x5t#S256")?;
        header.token_type = text_parameter(raw, "typ")?;
        header.content_type = text_parameter(raw, "cty")?;

        Ok(header)
    }

    /// The signing algorithm (`alg`)
    #[must_use]
    pub fn algorithm(&self) -> jwa::Algorithm {
        self.algorithm
    }

    /// The JWK Set URL (`jku`)
    #[must_use]
    pub fn jwk_set_url(&self) -> Option<&str> {
        self.jwk_set_url.as_deref()
    }

    /// The embedded JSON Web Key (`jwk`)
    #[must_use]
    pub fn json_web_key(&self) -> Option<&Value> {
        self.json_web_key.as_ref()
    }

    /// The key identifier (`kid`)
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.key_id.as_deref()
    }

    /// The X.509 URL (`x5u`)
    #[must_use]
    pub fn x509_url(&self) -> Option<&str> {
        self.x509_url.as_deref()
    }

    /// The X.509 certificate chain (`x5c`)
    #[must_use]
    pub fn x509_certificate_chain(&self) -> Option<&Value> {
        self.x509_certificate_chain.as_ref()
    }

    /// The X.509 certificate SHA-1 thumbprint (`x5t`)
    #[must_use]
    pub fn x509_sha1_thumbprint(&self) -> Option<&str> {
        self.x509_sha1_thumbprint.as_deref()
    }

    /// The X.509 certificate SHA-256 thumbprint (`x5t#S256`)
    #[must_use]
    pub fn x509_sha256_thumbprint(&self) -> Option<&str> {
        self.x509_sha256_thumbprint.as_deref()
    }

    /// The media type of the complete JWS (`typ`)
    #[must_use]
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    /// The media type of the payload (`cty`)
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Critical extension parameters and their values, in `crit` order
    #[must_use]
    pub fn critical(&self) -> Option<&Map<String, Value>> {
        self.critical.as_ref()
    }

    /// Sets the key identifier
    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.key_id = Some(KeyId::new(kid.into()));
        self
    }

    /// Sets the media type of the complete JWS
    pub fn with_type(mut self, typ: impl Into<String>) -> Self {
        self.token_type = Some(typ.into());
        self
    }

    /// Sets the media type of the payload
    pub fn with_content_type(mut self, cty: impl Into<String>) -> Self {
        self.content_type = Some(cty.into());
        self
    }

    /// Adds a critical extension parameter
    ///
    /// # Errors
    ///
    /// `name` is a registered header parameter.
    pub fn with_critical(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, HeaderError> {
        let name = name.into();
        if is_registered(&name) {
            return Err(HeaderError::CriticalNameCollision(name));
        }

        self.critical
            .get_or_insert_with(Map::new)
            .insert(name, value.into());
        Ok(self)
    }

    /// Renders the header as a JSON object
    ///
    /// Members appear in a fixed order: `alg`, `jku`, `jwk`, `kid`, `x5u`,
    /// `typ`, `cty`, `crit`, `x5c`, `x5t`, `x5t#S256`, followed by the
    /// critical parameters themselves. Absent members are omitted.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("alg".into(), self.algorithm.name().into());

        if let Some(jku) = &self.jwk_set_url {
            map.insert("jku".into(), jku.as_str().into());
        }
        if let Some(jwk) = &self.json_web_key {
            map.insert("jwk".into(), jwk.clone());
        }
        if let Some(kid) = &self.key_id {
            map.insert("kid".into(), kid.as_str().into());
        }
        if let Some(x5u) = &self.x509_url {
            map.insert("x5u".into(), x5u.as_str().into());
        }
        if let Some(typ) = &self.token_type {
            map.insert("typ".into(), typ.as_str().into());
        }
        if let Some(cty) = &self.content_type {
            map.insert("cty".into(), cty.as_str().into());
        }
        if let Some(critical) = &self.critical {
            let names = critical.keys().cloned().map(Value::String).collect();
            map.insert("crit".into(), Value::Array(names));
        }
        if let Some(x5c) = &self.x509_certificate_chain {
            map.insert("x5c".into(), x5c.clone());
        }
        if let Some(x5t) = &self.x509_sha1_thumbprint {
            map.insert("x5t".into(), x5t.as_str().into());
        }
        if let Some(x5t) = &self.x509_sha256_thumbprint {
            map.insert("x5t#S256".into(), x5t.as_str().into());
        }
        if let Some(critical) = &self.critical {
            for (name, value) in critical {
                map.insert(name.clone(), value.clone());
            }
        }

        map
    }

    /// Renders the header as compact JSON text
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.to_map()).to_string()
    }
}

impl From<jwa::Algorithm> for JoseHeader {
    fn from(alg: jwa::Algorithm) -> Self {
        Self::new(alg)
    }
}

fn critical_parameters(raw: &Map<String, Value>) -> Result<Option<Map<String, Value>>, HeaderError> {
    let names = match present(raw, "crit") {
        Some(Value::Array(items)) if items.is_empty() => return Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(Value::as_str)
            .collect::<Option<Vec<_>>>()
            .ok_or(HeaderError::InvalidCritType)?,
        Some(_) => return Err(HeaderError::InvalidCritType),
        None => return Ok(None),
    };

    if let Some(name) = names.iter().copied().find(|n| is_registered(n)) {
        return Err(HeaderError::CriticalNameCollision(name.to_owned()));
    }

    // each listed parameter is consumed, so a repeated name finds nothing
    let mut remaining = raw.clone();
    let mut critical = Map::new();
    for name in names {
        match remaining.remove(name) {
            Some(value) if !value.is_null() => {
                critical.insert(name.to_owned(), value);
            }
            _ => return Err(HeaderError::MissingCriticalParameter(name.to_owned())),
        }
    }

    Ok(Some(critical))
}

fn https_url(raw: &Map<String, Value>, param: &'static str) -> Result<Option<String>, HeaderError> {
    let text = match present(raw, param) {
        Some(Value::String(text)) => text,
        Some(_) => return Err(HeaderError::InvalidUrl { param }),
        None => return Ok(None),
    };

    let url = Url::parse(text).map_err(|_| HeaderError::InvalidUrl { param })?;
    if !url.has_host() {
        return Err(HeaderError::InvalidUrl { param });
    }

    if url.scheme() != "https" {
        return Err(HeaderError::InsecureUrl { param });
    }

    Ok(Some(text.clone()))
}

fn text_parameter(raw: &Map<String, Value>, param: &'static str) -> Result<Option<String>, HeaderError> {
    match present(raw, param) {
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(HeaderError::InvalidParameterType { param }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use serde_json::json;

    use super::*;
    use crate::test::object;

    fn parse(value: Value) -> Result<JoseHeader, HeaderError> {
        JoseHeader::from_map(&object(value))
    }

    #[test]
    fn minimal_header() -> Result<()> {
        let header = parse(json!({ "alg": "HS256" }))?;
        assert_eq!(header.algorithm(), jwa::Algorithm::HS256);
        assert_eq!(header.to_json(), r#"{"alg":"HS256"}"#);
        Ok(())
    }

    #[test]
    fn alg_is_required() {
        assert_eq!(parse(json!({})), Err(HeaderError::MissingAlgorithm));
        assert_eq!(
            parse(json!({ "alg": null, "typ": "JWT" })),
            Err(HeaderError::MissingAlgorithm)
        );
    }

    #[test]
    fn unsupported_algorithms_are_rejected() {
        for alg in [json!("none"), json!("ES256"), json!(256), json!(["HS256"])] {
            let err = parse(json!({ "alg": alg })).unwrap_err();
            assert!(matches!(err, HeaderError::UnsupportedAlgorithm(_)), "{err}");
        }
    }

    #[test]
    fn crit_must_be_a_list_of_names() {
        for crit in [json!("exp"), json!([1, 2]), json!({ "exp": true })] {
            assert_eq!(
                parse(json!({ "alg": "HS256", "crit": crit, "exp": 1 })),
                Err(HeaderError::InvalidCritType)
            );
        }
    }

    #[test]
    fn empty_crit_list_is_absent() -> Result<()> {
        let header = parse(json!({ "alg": "HS256", "crit": [], "exp": 1 }))?;
        assert_eq!(header.critical(), None);
        assert_eq!(header.to_json(), r#"{"alg":"HS256"}"#);
        Ok(())
    }

    #[test]
    fn crit_cannot_name_registered_parameters() {
        assert_eq!(
            parse(json!({ "alg": "HS256", "crit": ["kid"], "kid": "x" })),
            Err(HeaderError::CriticalNameCollision("kid".into()))
        );
    }

    #[test]
    fn crit_names_must_be_present() {
        assert_eq!(
            parse(json!({ "alg": "HS256", "crit": ["exp"] })),
            Err(HeaderError::MissingCriticalParameter("exp".into()))
        );
        assert_eq!(
            parse(json!({ "alg": "HS256", "crit": ["exp"], "exp": null })),
            Err(HeaderError::MissingCriticalParameter("exp".into()))
        );
    }

    #[test]
    fn repeated_crit_name_is_missing_the_second_time() {
        assert_eq!(
            parse(json!({ "alg": "HS256", "crit": ["exp", "exp"], "exp": 1 })),
            Err(HeaderError::MissingCriticalParameter("exp".into()))
        );
    }

    #[test]
    fn critical_parameters_are_kept_and_rendered() -> Result<()> {
        let header = parse(json!({
            "alg": "HS256",
            "crit": ["exp", "b64"],
            "b64": false,
            "exp": 1363284000,
            "ignored": "dropped",
        }))?;

        let critical = header.critical().unwrap();
        assert_eq!(critical.len(), 2);
        assert_eq!(critical["exp"], json!(1363284000));
        assert_eq!(critical["b64"], json!(false));

        assert_eq!(
            header.to_json(),
            r#"{"alg":"HS256","crit":["exp","b64"],"exp":1363284000,"b64":false}"#
        );
        Ok(())
    }

    #[test]
    fn crit_is_checked_before_urls() {
        assert_eq!(
            parse(json!({ "alg": "HS256", "crit": ["x"], "jku": "http://example.com" })),
            Err(HeaderError::MissingCriticalParameter("x".into()))
        );
    }

    #[test]
    fn key_urls_must_use_https() {
        assert_eq!(
            parse(json!({ "alg": "HS256", "jku": "http://example.com/keys.json" })),
            Err(HeaderError::InsecureUrl { param: "jku" })
        );
        assert_eq!(
            parse(json!({ "alg": "HS256", "x5u": "ftp://example.com/cert.pem" })),
            Err(HeaderError::InsecureUrl { param: "x5u" })
        );
    }

    #[test]
    fn key_urls_must_be_valid() {
        for url in [json!("not a url"), json!("/relative/path"), json!("mailto:someone@example.com"), json!(42)] {
            assert_eq!(
                parse(json!({ "alg": "HS256", "jku": url })),
                Err(HeaderError::InvalidUrl { param: "jku" })
            );
        }
    }

    #[test]
    fn jku_is_checked_before_x5u() {
        assert_eq!(
            parse(json!({
                "alg": "HS256",
                "jku": "http://example.com/keys.json",
                "x5u": "not a url",
            })),
            Err(HeaderError::InsecureUrl { param: "jku" })
        );
    }

    #[test]
    fn https_urls_are_kept_verbatim() -> Result<()> {
        let header = parse(json!({ "alg": "HS256", "jku": "https://example.com/keys.json" }))?;
        assert_eq!(header.jwk_set_url(), Some("https://example.com/keys.json"));
        assert_eq!(
            header.to_json(),
            r#"{"alg":"HS256","jku":"https://example.com/keys.json"}"#
        );
        Ok(())
    }

    #[test]
    fn jwk_must_be_structured() -> Result<()> {
        assert_eq!(
            parse(json!({ "alg": "HS256", "jwk": "key" })),
            Err(HeaderError::InvalidJwkType)
        );

        let jwk = json!({ "kty": "RSA", "e": "AQAB" });
        let header = parse(json!({ "alg": "RS256", "jwk": jwk }))?;
        assert_eq!(header.json_web_key(), Some(&jwk));
        Ok(())
    }

    #[test]
    fn text_parameters_must_be_text() {
        assert_eq!(
            parse(json!({ "alg": "HS256", "typ": 7 })),
            Err(HeaderError::InvalidParameterType { param: "typ" })
        );
        assert_eq!(
            parse(json!({ "alg": "HS256", "x5c": 7 })),
            Err(HeaderError::InvalidParameterType { param: "x5c" })
        );
    }

    #[test]
    fn null_parameters_are_absent() -> Result<()> {
        let header = parse(json!({ "alg": "HS256", "kid": null, "jku": null, "crit": null }))?;
        assert_eq!(header, JoseHeader::new(jwa::Algorithm::HS256));
        Ok(())
    }

    #[test]
    fn members_render_in_fixed_order() -> Result<()> {
        let header = parse(json!({
            "x5t#S256": "s256",
            "x5t": "s1",
            "x5c": ["MIIC"],
            "cty": "JWT",
            "typ": "JWT",
            "x5u": "https://example.com/cert.pem",
            "kid": "k1",
            "jwk": { "kty": "oct" },
            "jku": "https://example.com/keys.json",
            "alg": "RS512",
        }))?;

        let names: Vec<_> = header.to_map().keys().cloned().collect();
        assert_eq!(
            names,
            ["alg", "jku", "jwk", "kid", "x5u", "typ", "cty", "x5c", "x5t", "x5t#S256"]
        );
        Ok(())
    }

    #[test]
    fn builders_produce_valid_headers() -> Result<()> {
        let header = JoseHeader::try_new("HS512")?
            .with_type("JWT")
            .with_key_id("primary")
            .with_critical("exp", 1)?;

        let again = JoseHeader::from_map(&header.to_map())?;
        assert_eq!(header, again);

        assert!(JoseHeader::new(jwa::Algorithm::HS256)
            .with_critical("alg", "RS256")
            .is_err());
        assert!(JoseHeader::try_new("none").is_err());
        Ok(())
    }

    #[test]
    fn registered_names_are_published() {
        assert_eq!(registered_parameter_names().len(), 11);
        assert!(registered_parameter_names().contains(&"x5t#S256"));
    }
}

//! JSON Web Token (JWT) claim sets
//!
//! A claim set carries the seven registered claims defined by [RFC7519][]
//! (`iss`, `iat`, `nbf`, `exp`, `sub`, `aud`, `jti`) along with any
//! number of custom claims.
//!
//! Claims are checked against the current time with [`Jwt::verify()`].
//! Tokens carrying a `jti` claim are additionally checked for replay
//! using a caller-supplied [`ReplayGuard`].
//!
//! ```
//! use serde_json::json;
//! use signet::jwt::{InMemoryReplayGuard, Jwt};
//! use signet_clock::{TestClock, UnixTime};
//!
//! let raw = json!({ "iss": "domain.com", "exp": 1_700_000_060, "jti": "a1" });
//! let claims = Jwt::from_map(raw.as_object().unwrap())?;
//!
//! let guard = InMemoryReplayGuard::new();
//! let clock = TestClock::new(UnixTime(1_700_000_000));
//!
//! assert!(claims.verify_with_clock(Some(&guard), &clock).is_valid());
//! assert!(!claims.verify_with_clock(Some(&guard), &clock).is_valid());
//! # Ok::<(), signet::error::ClaimsError>(())
//! ```
//!
//! [RFC7519]: https://tools.ietf.org/html/rfc7519

use std::fmt;

use aliri_braid::braid;
use serde_json::{Map, Value};
use signet_clock::{Clock, System, UnixTime};
use thiserror::Error;
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

use crate::{
    error::{self, ClaimsError},
    header::present,
    random::RandomSource,
};

pub mod replay;

pub use replay::{InMemoryReplayGuard, ReplayGuard};

/// The issuer of a token (`iss`)
#[braid(serde, ref_doc = "A borrowed reference to a token issuer ([`Issuer`])")]
pub struct Issuer;

/// The principal that is the subject of a token (`sub`)
#[braid(serde, ref_doc = "A borrowed reference to a token subject ([`Subject`])")]
pub struct Subject;

/// The recipient a token is intended for (`aud`)
#[braid(serde, ref_doc = "A borrowed reference to a token audience ([`Audience`])")]
pub struct Audience;

/// A unique identifier for a token (`jti`)
#[braid(serde, ref_doc = "A borrowed reference to a JWT ID ([`JwtId`])")]
pub struct JwtId;

const REGISTERED_CLAIM_NAMES: [&str; 7] = ["iss", "iat", "nbf", "exp", "sub", "aud", "jti"];

/// The claim names registered by RFC 7519
#[must_use]
pub fn registered_claim_names() -> &'static [&'static str] {
    &REGISTERED_CLAIM_NAMES
}

fn is_registered(name: &str) -> bool {
    REGISTERED_CLAIM_NAMES.contains(&name)
}

/// A JWT claim set
///
/// Registered claims are held as typed values. Every other member of the
/// source object is kept as a custom claim, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct Jwt {
    issuer: Option<Issuer>,
    issued_at: Option<UnixTime>,
    not_before: Option<UnixTime>,
    expires: Option<UnixTime>,
    subject: Option<Subject>,
    audience: Option<Audience>,
    jwt_id: Option<JwtId>,
    custom_claims: Map<String, Value>,
}

impl Jwt {
    /// An empty claim set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a claim set from a JSON object
    ///
    /// Text claims (`iss`, `sub`, `aud`, `jti`) accept strings and
    /// numbers; numbers are kept in their textual form. Time claims
    /// (`iat`, `nbf`, `exp`) accept integers, floats (truncated toward
    /// zero), and strings holding either. A JSON `null` is treated as
    /// though the claim were absent.
    ///
    /// A `jti` of `true` requests a freshly generated identifier (see
    /// [`create_jwt_id()`][Self::create_jwt_id()]); `false` leaves the
    /// claim absent.
    ///
    /// # Errors
    ///
    /// A registered claim carries a value that cannot be coerced, or the
    /// system random number generator failed.
    pub fn from_map(raw: &Map<String, Value>) -> Result<Self, ClaimsError> {
        Self::from_map_with_rng(raw, &ring::rand::SystemRandom::new())
    }

    /// Builds a claim set from a JSON object, drawing any generated `jti`
    /// from `rng`
    ///
    /// # Errors
    ///
    /// See [`from_map()`][Self::from_map()].
    pub fn from_map_with_rng(
        raw: &Map<String, Value>,
        rng: &dyn RandomSource,
    ) -> Result<Self, ClaimsError> {
        let mut claims = Self {
            issuer: text_claim(raw, "iss")?.map(Issuer::new),
            issued_at: time_claim(raw, "iat")?,
            not_before: time_claim(raw, "nbf")?,
            expires: time_claim(raw, "exp")?,
            subject: text_claim(raw, "sub")?.map(Subject::new),
            audience: text_claim(raw, "aud")?.map(Audience::new),
            jwt_id: None,
            custom_claims: raw
                .iter()
                .filter(|(name, _)| !is_registered(name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        };

        claims.jwt_id = match present(raw, "jti") {
            Some(Value::Bool(true)) => Some(claims.create_jwt_id_with_rng(rng)?),
            Some(Value::Bool(false)) => None,
            _ => text_claim(raw, "jti")?.map(JwtId::new),
        };

        Ok(claims)
    }

    /// The issuer (`iss`)
    #[must_use]
    pub fn issuer(&self) -> Option<&IssuerRef> {
        self.issuer.as_deref()
    }

    /// The time the token was issued (`iat`)
    #[must_use]
    pub fn issued_at(&self) -> Option<UnixTime> {
        self.issued_at
    }

    /// The time before which the token must not be accepted (`nbf`)
    #[must_use]
    pub fn not_before(&self) -> Option<UnixTime> {
        self.not_before
    }

    /// The time at which the token expires (`exp`)
    #[must_use]
    pub fn expires(&self) -> Option<UnixTime> {
        self.expires
    }

    /// The subject (`sub`)
    #[must_use]
    pub fn subject(&self) -> Option<&SubjectRef> {
        self.subject.as_deref()
    }

    /// The audience (`aud`)
    #[must_use]
    pub fn audience(&self) -> Option<&AudienceRef> {
        self.audience.as_deref()
    }

    /// The JWT ID (`jti`)
    #[must_use]
    pub fn jwt_id(&self) -> Option<&JwtIdRef> {
        self.jwt_id.as_deref()
    }

    /// Every claim that is not a registered claim
    #[must_use]
    pub fn custom_claims(&self) -> &Map<String, Value> {
        &self.custom_claims
    }

    /// The value of a custom claim
    ///
    /// # Errors
    ///
    /// No custom claim named `name` is present, or its value is `null`.
    pub fn custom_claim(&self, name: &str) -> Result<&Value, error::UndefinedClaim> {
        present(&self.custom_claims, name).ok_or_else(|| error::undefined_claim(name))
    }

    /// Sets a custom claim, returning its previous value
    ///
    /// # Errors
    ///
    /// `name` is a registered claim name.
    pub fn set_custom_claim(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, ClaimsError> {
        let name = name.into();
        if is_registered(&name) {
            return Err(ClaimsError::RegisteredClaimName(name));
        }

        Ok(self.custom_claims.insert(name, value.into()))
    }

    /// Adds a custom claim
    ///
    /// # Errors
    ///
    /// `name` is a registered claim name.
    pub fn with_custom_claim(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ClaimsError> {
        self.set_custom_claim(name, value)?;
        Ok(self)
    }

    /// Sets the issuer
    pub fn with_issuer(mut self, iss: impl Into<String>) -> Self {
        self.issuer = Some(Issuer::new(iss.into()));
        self
    }

    /// Sets the subject
    pub fn with_subject(mut self, sub: impl Into<String>) -> Self {
        self.subject = Some(Subject::new(sub.into()));
        self
    }

    /// Sets the audience
    pub fn with_audience(mut self, aud: impl Into<String>) -> Self {
        self.audience = Some(Audience::new(aud.into()));
        self
    }

    /// Sets the JWT ID
    pub fn with_jwt_id(mut self, jti: impl Into<String>) -> Self {
        self.jwt_id = Some(JwtId::new(jti.into()));
        self
    }

    /// Sets the JWT ID to a freshly generated identifier
    ///
    /// # Errors
    ///
    /// The system random number generator failed.
    pub fn with_generated_jwt_id(mut self) -> Result<Self, error::Unexpected> {
        self.jwt_id = Some(self.create_jwt_id()?);
        Ok(self)
    }

    /// Sets the issue time
    pub fn with_issued_at(mut self, iat: UnixTime) -> Self {
        self.issued_at = Some(iat);
        self
    }

    /// Sets the time before which the token is not valid
    pub fn with_not_before(mut self, nbf: UnixTime) -> Self {
        self.not_before = Some(nbf);
        self
    }

    /// Sets the expiration time
    pub fn with_expiration(mut self, exp: UnixTime) -> Self {
        self.expires = Some(exp);
        self
    }

    /// Sets the expiration time to `secs` seconds after now
    pub fn with_future_expiration(self, secs: i64) -> Self {
        self.with_future_expiration_from_clock(secs, &System)
    }

    /// Sets the expiration time to `secs` seconds after the time reported
    /// by `clock`
    pub fn with_future_expiration_from_clock<C: Clock + ?Sized>(self, secs: i64, clock: &C) -> Self {
        let exp = clock.now().saturating_add_secs(secs);
        self.with_expiration(exp)
    }

    /// Generates a unique token identifier
    ///
    /// The identifier is the lowercase hex SHA-256 digest of the current
    /// JSON rendering of this claim set followed by 32 random bytes.
    ///
    /// # Errors
    ///
    /// The system random number generator failed.
    pub fn create_jwt_id(&self) -> Result<JwtId, error::Unexpected> {
        self.create_jwt_id_with_rng(&ring::rand::SystemRandom::new())
    }

    /// Generates a unique token identifier using `rng` for the salt
    ///
    /// # Errors
    ///
    /// `rng` failed to produce random bytes.
    pub fn create_jwt_id_with_rng(&self, rng: &dyn RandomSource) -> Result<JwtId, error::Unexpected> {
        let mut salt = [0_u8; 32];
        rng.fill(&mut salt)?;

        let mut ctx = ring::digest::Context::new(&ring::digest::SHA256);
        ctx.update(self.to_json().as_bytes());
        ctx.update(&salt);

        Ok(JwtId::new(hex::encode(ctx.finish())))
    }

    /// Renders the claim set as a JSON object
    ///
    /// Registered claims come first in the order `iss`, `iat`, `nbf`,
    /// `exp`, `sub`, `aud`, `jti`, followed by custom claims. Absent
    /// claims are omitted.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();

        if let Some(iss) = &self.issuer {
            map.insert("iss".into(), iss.as_str().into());
        }
        if let Some(iat) = self.issued_at {
            map.insert("iat".into(), iat.0.into());
        }
        if let Some(nbf) = self.not_before {
            map.insert("nbf".into(), nbf.0.into());
        }
        if let Some(exp) = self.expires {
            map.insert("exp".into(), exp.0.into());
        }
        if let Some(sub) = &self.subject {
            map.insert("sub".into(), sub.as_str().into());
        }
        if let Some(aud) = &self.audience {
            map.insert("aud".into(), aud.as_str().into());
        }
        if let Some(jti) = &self.jwt_id {
            map.insert("jti".into(), jti.as_str().into());
        }

        for (name, value) in &self.custom_claims {
            map.insert(name.clone(), value.clone());
        }

        map
    }

    /// Renders the claim set as compact JSON text
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.to_map()).to_string()
    }

    /// Checks the claims against the system clock
    ///
    /// See [`verify_with_clock()`][Self::verify_with_clock()].
    pub fn verify(&self, guard: Option<&dyn ReplayGuard>) -> Validity {
        self.verify_with_clock(guard, &System)
    }

    /// Checks the claims against the time reported by `clock`
    ///
    /// Checks run in order, and the first failure decides the outcome:
    ///
    /// 1. If a `jti` is present, a replay guard is required. An identifier
    ///    that was already used is rejected; otherwise it is recorded.
    /// 2. `nbf` later than now is rejected.
    /// 3. `iat` later than now is rejected.
    /// 4. `exp` at or before now is rejected.
    ///
    /// A token without time claims is valid at any time.
    pub fn verify_with_clock<C: Clock + ?Sized>(
        &self,
        guard: Option<&dyn ReplayGuard>,
        clock: &C,
    ) -> Validity {
        let validity = self.check(guard, clock.now());

        #[cfg(feature = "tracing")]
        match &validity {
            Validity::Valid => {}
            Validity::Invalid(reason @ Invalid::TokenReplayed { .. }) => {
                warn!(%reason, "rejected replayed token")
            }
            Validity::Invalid(reason) => debug!(%reason, "token claims rejected"),
            Validity::ConfigurationError(err) => warn!(%err, "unable to verify token claims"),
        }

        validity
    }

    fn check(&self, guard: Option<&dyn ReplayGuard>, now: UnixTime) -> Validity {
        if let Some(jti) = &self.jwt_id {
            let guard = match guard {
                Some(guard) => guard,
                None => return Validity::ConfigurationError(error::missing_replay_hooks()),
            };

            if !guard.try_claim(jti) {
                return Invalid::TokenReplayed { jti: jti.clone() }.into();
            }
        }

        if let Some(nbf) = self.not_before {
            if nbf > now {
                return Invalid::NotYetValid {
                    claim: TimeClaim::NotBefore,
                    at: nbf,
                }
                .into();
            }
        }

        if let Some(iat) = self.issued_at {
            if iat > now {
                return Invalid::NotYetValid {
                    claim: TimeClaim::IssuedAt,
                    at: iat,
                }
                .into();
            }
        }

        if let Some(exp) = self.expires {
            if exp <= now {
                return Invalid::Expired { at: exp }.into();
            }
        }

        Validity::Valid
    }
}

fn text_claim(raw: &Map<String, Value>, claim: &'static str) -> Result<Option<String>, ClaimsError> {
    match present(raw, claim) {
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(ClaimsError::InvalidClaimType { claim }),
        None => Ok(None),
    }
}

fn time_claim(raw: &Map<String, Value>, claim: &'static str) -> Result<Option<UnixTime>, ClaimsError> {
    let secs = match present(raw, claim) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(truncate))
        }
        Some(_) => None,
        None => return Ok(None),
    };

    secs.map(|s| Some(UnixTime(s)))
        .ok_or(ClaimsError::InvalidClaimType { claim })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate(secs: f64) -> Option<i64> {
    if secs.is_finite() && secs >= i64::MIN as f64 && secs < i64::MAX as f64 {
        Some(secs.trunc() as i64)
    } else {
        None
    }
}

/// A time-based claim checked during verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeClaim {
    /// `nbf`
    NotBefore,
    /// `iat`
    IssuedAt,
}

impl TimeClaim {
    /// The registered claim name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotBefore => "nbf",
            Self::IssuedAt => "iat",
        }
    }
}

impl fmt::Display for TimeClaim {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The reason a claim set was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Invalid {
    /// The token's `jti` has already been used
    #[error("token {jti} has already been used")]
    TokenReplayed {
        /// The replayed identifier
        jti: JwtId,
    },

    /// The token cannot be accepted yet
    #[error("token cannot be accepted for processing prior to {at} ({claim})")]
    NotYetValid {
        /// The claim that failed
        claim: TimeClaim,
        /// The time at which the claim will be satisfied
        at: UnixTime,
    },

    /// The token has expired
    #[error("token expired at {at}")]
    Expired {
        /// The time the token expired
        at: UnixTime,
    },
}

/// The outcome of checking a claim set
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Validity {
    /// The claims are acceptable
    Valid,

    /// The claims were rejected
    Invalid(Invalid),

    /// The claims could not be checked as configured
    ConfigurationError(error::MissingReplayHooks),
}

impl Validity {
    /// Whether the claims are acceptable
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The reason the claims were rejected, if they were
    #[must_use]
    pub fn reason(&self) -> Option<&Invalid> {
        match self {
            Self::Invalid(reason) => Some(reason),
            _ => None,
        }
    }

    /// Converts the outcome into a `Result`
    ///
    /// # Errors
    ///
    /// The claims were rejected or could not be checked.
    pub fn into_result(self) -> Result<(), error::ClaimsRejected> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(reason) => Err(reason.into()),
            Self::ConfigurationError(err) => Err(err.into()),
        }
    }
}

impl From<Invalid> for Validity {
    fn from(reason: Invalid) -> Self {
        Self::Invalid(reason)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use color_eyre::Result;
    use serde_json::json;
    use signet_clock::TestClock;

    use super::*;
    use crate::test::{object, FixedRandom};

    const NOW: UnixTime = UnixTime(1_416_757_357);

    fn claims(value: Value) -> Result<Jwt, ClaimsError> {
        Jwt::from_map(&object(value))
    }

    fn at_now(claims: &Jwt, guard: Option<&dyn ReplayGuard>) -> Validity {
        claims.verify_with_clock(guard, &TestClock::new(NOW))
    }

    #[test]
    fn registered_claims_are_typed() -> Result<()> {
        let jwt = claims(json!({
            "iss": "domain.com",
            "iat": 1416757357,
            "nbf": 1416757300,
            "exp": 1416760957,
            "sub": "user",
            "aud": "api",
            "jti": "id-1",
        }))?;

        assert_eq!(jwt.issuer().map(|i| i.as_str()), Some("domain.com"));
        assert_eq!(jwt.issued_at(), Some(UnixTime(1416757357)));
        assert_eq!(jwt.not_before(), Some(UnixTime(1416757300)));
        assert_eq!(jwt.expires(), Some(UnixTime(1416760957)));
        assert_eq!(jwt.subject().map(|s| s.as_str()), Some("user"));
        assert_eq!(jwt.audience().map(|a| a.as_str()), Some("api"));
        assert_eq!(jwt.jwt_id().map(|j| j.as_str()), Some("id-1"));
        assert!(jwt.custom_claims().is_empty());
        Ok(())
    }

    #[test]
    fn unregistered_members_become_custom_claims() -> Result<()> {
        let jwt = claims(json!({ "iss": "a", "role": "admin", "n": [1, 2] }))?;
        assert_eq!(jwt.custom_claims().len(), 2);
        assert_eq!(jwt.custom_claim("role")?, &json!("admin"));
        assert_eq!(jwt.custom_claim("n")?, &json!([1, 2]));

        let err = jwt.custom_claim("missing").unwrap_err();
        assert_eq!(err.name(), "missing");
        assert!(jwt.custom_claim("iss").is_err());
        Ok(())
    }

    #[test]
    fn null_custom_claim_is_undefined() -> Result<()> {
        let jwt = claims(json!({ "role": null }))?;
        assert_eq!(jwt.custom_claims().get("role"), Some(&Value::Null));

        let err = jwt.custom_claim("role").unwrap_err();
        assert_eq!(err.name(), "role");
        Ok(())
    }

    #[test]
    fn numeric_text_claims_become_text() -> Result<()> {
        let jwt = claims(json!({ "iss": 42, "sub": 1.5, "jti": 7 }))?;
        assert_eq!(jwt.issuer().map(|i| i.as_str()), Some("42"));
        assert_eq!(jwt.subject().map(|s| s.as_str()), Some("1.5"));
        assert_eq!(jwt.jwt_id().map(|j| j.as_str()), Some("7"));
        Ok(())
    }

    #[test]
    fn structured_text_claims_are_rejected() {
        for (name, value) in [("iss", json!({})), ("aud", json!(["a", "b"])), ("sub", json!(true))] {
            let err = claims(json!({ name: value })).unwrap_err();
            assert!(
                matches!(err, ClaimsError::InvalidClaimType { claim } if claim == name),
                "{err}"
            );
        }
    }

    #[test]
    fn time_claims_are_coerced() -> Result<()> {
        let jwt = claims(json!({ "iat": "1416757357", "nbf": 1416757300.9, "exp": " 1416760957.5 " }))?;
        assert_eq!(jwt.issued_at(), Some(UnixTime(1416757357)));
        assert_eq!(jwt.not_before(), Some(UnixTime(1416757300)));
        assert_eq!(jwt.expires(), Some(UnixTime(1416760957)));
        Ok(())
    }

    #[test]
    fn invalid_time_claims_are_rejected() {
        for value in [json!("soon"), json!(true), json!([1]), json!(1e300)] {
            let err = claims(json!({ "exp": value })).unwrap_err();
            assert!(matches!(err, ClaimsError::InvalidClaimType { claim: "exp" }), "{err}");
        }
    }

    #[test]
    fn null_claims_are_absent() -> Result<()> {
        let jwt = claims(json!({ "iss": null, "exp": null, "jti": null }))?;
        assert_eq!(jwt, Jwt::new());
        Ok(())
    }

    #[test]
    fn jti_true_generates_an_identifier() -> Result<()> {
        let rng = FixedRandom(0);
        let jwt = Jwt::from_map_with_rng(&object(json!({ "iss": "domain.com", "jti": true })), &rng)?;

        let mut ctx = ring::digest::Context::new(&ring::digest::SHA256);
        ctx.update(br#"{"iss":"domain.com"}"#);
        ctx.update(&[0; 32]);
        let expected = hex::encode(ctx.finish());

        assert_eq!(jwt.jwt_id().map(|j| j.as_str()), Some(expected.as_str()));
        assert_eq!(expected.len(), 64);
        Ok(())
    }

    #[test]
    fn generated_identifiers_differ() -> Result<()> {
        let jwt = Jwt::new().with_issuer("domain.com");
        assert_ne!(jwt.create_jwt_id()?, jwt.create_jwt_id()?);
        Ok(())
    }

    #[test]
    fn jti_false_is_absent() -> Result<()> {
        let jwt = claims(json!({ "jti": false }))?;
        assert_eq!(jwt.jwt_id(), None);
        Ok(())
    }

    #[test]
    fn renders_in_registered_order() -> Result<()> {
        let jwt = claims(json!({
            "custom": 1,
            "jti": "j",
            "aud": "a",
            "sub": "s",
            "exp": 3,
            "nbf": 2,
            "iat": 1,
            "iss": "i",
        }))?;

        assert_eq!(
            jwt.to_json(),
            r#"{"iss":"i","iat":1,"nbf":2,"exp":3,"sub":"s","aud":"a","jti":"j","custom":1}"#
        );
        Ok(())
    }

    #[test]
    fn registered_names_cannot_be_custom() -> Result<()> {
        let mut jwt = Jwt::new();
        assert!(matches!(
            jwt.set_custom_claim("exp", 1),
            Err(ClaimsError::RegisteredClaimName(_))
        ));
        assert_eq!(jwt.set_custom_claim("scope", "read")?, None);
        assert_eq!(jwt.set_custom_claim("scope", "write")?, Some(json!("read")));
        Ok(())
    }

    #[test]
    fn claims_without_times_are_always_valid() {
        assert_eq!(at_now(&Jwt::new(), None), Validity::Valid);
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let expired = Jwt::new().with_expiration(NOW);
        assert_eq!(
            at_now(&expired, None),
            Validity::Invalid(Invalid::Expired { at: NOW })
        );

        let live = Jwt::new().with_expiration(NOW.saturating_add_secs(1));
        assert!(at_now(&live, None).is_valid());
    }

    #[test]
    fn not_before_boundary_is_inclusive() {
        assert!(at_now(&Jwt::new().with_not_before(NOW), None).is_valid());

        let later = NOW.saturating_add_secs(1);
        assert_eq!(
            at_now(&Jwt::new().with_not_before(later), None).reason(),
            Some(&Invalid::NotYetValid {
                claim: TimeClaim::NotBefore,
                at: later
            })
        );
    }

    #[test]
    fn future_issue_time_is_rejected() {
        let later = NOW.saturating_add_secs(60);
        assert_eq!(
            at_now(&Jwt::new().with_issued_at(later), None),
            Validity::Invalid(Invalid::NotYetValid {
                claim: TimeClaim::IssuedAt,
                at: later
            })
        );
    }

    #[test]
    fn claims_inside_their_window_are_valid() {
        let jwt = Jwt::new()
            .with_issued_at(NOW.saturating_sub_secs(60))
            .with_not_before(NOW.saturating_sub_secs(30))
            .with_expiration(NOW.saturating_add_secs(3600));
        assert_eq!(at_now(&jwt, None), Validity::Valid);
    }

    #[test]
    fn not_before_is_checked_before_expiry() {
        let jwt = Jwt::new()
            .with_not_before(NOW.saturating_add_secs(10))
            .with_expiration(NOW.saturating_sub_secs(10));
        assert!(matches!(
            at_now(&jwt, None).reason(),
            Some(Invalid::NotYetValid { .. })
        ));
    }

    #[test]
    fn jti_requires_a_guard() {
        let jwt = Jwt::new().with_jwt_id("abc");
        assert_eq!(
            at_now(&jwt, None),
            Validity::ConfigurationError(error::missing_replay_hooks())
        );
    }

    #[test]
    fn replayed_tokens_are_rejected() {
        let guard = InMemoryReplayGuard::new();
        let jwt = Jwt::new().with_jwt_id("abc");

        assert!(at_now(&jwt, Some(&guard)).is_valid());
        assert_eq!(
            at_now(&jwt, Some(&guard)),
            Validity::Invalid(Invalid::TokenReplayed {
                jti: JwtId::from_static("abc")
            })
        );
    }

    #[test]
    fn used_id_is_rejected_without_being_marked() {
        let marks = Cell::new(0);
        let guard = replay::from_fns(|_| marks.set(marks.get() + 1), |_| true);
        let jwt = Jwt::new().with_jwt_id("seen");

        assert_eq!(
            at_now(&jwt, Some(&guard)),
            Validity::Invalid(Invalid::TokenReplayed {
                jti: JwtId::from_static("seen")
            })
        );
        assert_eq!(marks.get(), 0);
    }

    #[test]
    fn fresh_id_is_marked_before_time_checks() {
        let marks = Cell::new(0);
        let guard = replay::from_fns(|_| marks.set(marks.get() + 1), |_| false);

        let live = Jwt::new()
            .with_jwt_id("fresh")
            .with_issued_at(NOW.saturating_sub_secs(60))
            .with_not_before(NOW.saturating_sub_secs(60))
            .with_expiration(NOW.saturating_add_secs(60));
        assert_eq!(at_now(&live, Some(&guard)), Validity::Valid);
        assert_eq!(marks.get(), 1);

        let expired = live.with_expiration(NOW);
        assert_eq!(
            at_now(&expired, Some(&guard)),
            Validity::Invalid(Invalid::Expired { at: NOW })
        );
        assert_eq!(marks.get(), 2);
    }

    #[test]
    fn replay_is_checked_before_times() {
        let guard = InMemoryReplayGuard::new();
        let jwt = Jwt::new()
            .with_jwt_id("abc")
            .with_expiration(NOW.saturating_sub_secs(1));

        assert!(matches!(
            at_now(&jwt, Some(&guard)).reason(),
            Some(Invalid::Expired { .. })
        ));
        assert!(matches!(
            at_now(&jwt, Some(&guard)).reason(),
            Some(Invalid::TokenReplayed { .. })
        ));
    }

    #[test]
    fn future_expiration_follows_the_clock() {
        let clock = TestClock::new(NOW);
        let jwt = Jwt::new().with_future_expiration_from_clock(300, &clock);
        assert_eq!(jwt.expires(), Some(UnixTime(NOW.0 + 300)));
    }

    #[test]
    fn outcomes_convert_to_results() {
        assert!(Validity::Valid.into_result().is_ok());
        assert_eq!(
            Validity::Invalid(Invalid::Expired { at: NOW }).into_result(),
            Err(error::ClaimsRejected::Invalid(Invalid::Expired { at: NOW }))
        );
        assert!(matches!(
            Validity::ConfigurationError(error::missing_replay_hooks()).into_result(),
            Err(error::ClaimsRejected::MissingReplayHooks(_))
        ));
    }

    #[cfg(feature = "tracing")]
    #[test]
    #[tracing_test::traced_test]
    fn replay_is_logged() {
        let guard = InMemoryReplayGuard::new();
        let jwt = Jwt::new().with_jwt_id("logged");
        let _ = at_now(&jwt, Some(&guard));
        let _ = at_now(&jwt, Some(&guard));

        assert!(logs_contain("rejected replayed token"));
    }
}

//! Clocks for evaluating time-based claims
//!
//! Token validity depends on the current time. Rather than reading the
//! system clock directly, the `signet` crates accept any [`Clock`], which
//! allows tests to pin the time with a [`TestClock`].

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

use std::{fmt, time::SystemTime};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Unix time
///
/// The number of seconds elapsed since the beginning of the Unix epoch on
/// 1970/01/01 at 00:00:00 UTC. Times before the epoch are negative.
///
/// The [`Display`][fmt::Display] form is an RFC 3339 timestamp in UTC.
///
/// ```
/// use signet_clock::UnixTime;
///
/// assert_eq!(UnixTime(0).to_string(), "1970-01-01T00:00:00Z");
/// assert_eq!(UnixTime(1_416_757_357).to_string(), "2014-11-23T15:42:37Z");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct UnixTime(pub i64);

impl UnixTime {
    /// The time `secs` seconds after this one, saturating at the bounds
    #[inline]
    #[must_use]
    pub const fn saturating_add_secs(self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// The time `secs` seconds before this one, saturating at the bounds
    #[inline]
    #[must_use]
    pub const fn saturating_sub_secs(self, secs: i64) -> Self {
        Self(self.0.saturating_sub(secs))
    }
}

impl From<SystemTime> for UnixTime {
    fn from(t: SystemTime) -> Self {
        let secs = match t.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
            Err(before) => i64::try_from(before.duration().as_secs())
                .map(|s| -s)
                .unwrap_or(i64::MIN),
        };

        UnixTime(secs)
    }
}

impl From<i64> for UnixTime {
    #[inline]
    fn from(secs: i64) -> Self {
        Self(secs)
    }
}

impl fmt::Display for UnixTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let formatted = OffsetDateTime::from_unix_timestamp(self.0)
            .ok()
            .and_then(|dt| dt.format(&Rfc3339).ok());

        match formatted {
            Some(s) => f.write_str(&s),
            // outside of the representable calendar range
            None => write!(f, "@{}", self.0),
        }
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl Serialize for UnixTime {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<'de> Deserialize<'de> for UnixTime {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = i64::deserialize(deserializer)?;
        Ok(Self(s))
    }
}

/// Represents a clock, which can tell the current time
pub trait Clock {
    /// Gets the current time according to this clock
    fn now(&self) -> UnixTime;
}

impl<C> Clock for &'_ C
where
    C: Clock + ?Sized,
{
    #[inline]
    fn now(&self) -> UnixTime {
        (**self).now()
    }
}

/// The system clock as provided by `std::time::SystemTime`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

impl Clock for System {
    #[inline]
    fn now(&self) -> UnixTime {
        UnixTime::from(SystemTime::now())
    }
}

/// A test clock which maintains the current time as internal state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestClock(UnixTime);

impl Clock for TestClock {
    #[inline]
    fn now(&self) -> UnixTime {
        self.0
    }
}

impl TestClock {
    /// Creates a new test clock with the specified time
    #[inline]
    pub const fn new(time: UnixTime) -> Self {
        Self(time)
    }

    /// Updates the clock's current time to `val`
    pub fn set(&mut self, val: UnixTime) {
        self.0 = val;
    }

    /// Moves the clock forward by `inc` seconds
    pub fn inc(&mut self, inc: i64) {
        self.0 = self.0.saturating_add_secs(inc);
    }

    /// Moves the clock backward by `dec` seconds
    pub fn dec(&mut self, dec: i64) {
        self.0 = self.0.saturating_sub_secs(dec);
    }
}

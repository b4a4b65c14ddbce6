//! JSON-friendly duration type
//!
//! Accepts either an integer number of nanoseconds or a duration string
//! such as `"1h30m"`, `"5m"`, `"10s"`, `"250ms"` or `"2d"`.
//! The zero value means "unset" everywhere in the configuration.

use crate::error::Error;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A configuration duration; zero means "use the default"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(std::time::Duration);

impl Duration {
    /// The zero (unset) duration
    pub const ZERO: Duration = Duration(std::time::Duration::ZERO);

    pub const fn from_secs(secs: u64) -> Self {
        Self(std::time::Duration::from_secs(secs))
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(std::time::Duration::from_millis(millis))
    }

    pub const fn from_std(d: std::time::Duration) -> Self {
        Self(d)
    }

    pub const fn as_std(&self) -> std::time::Duration {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<std::time::Duration> for Duration {
    fn from(d: std::time::Duration) -> Self {
        Self(d)
    }
}

impl From<Duration> for std::time::Duration {
    fn from(d: Duration) -> Self {
        d.0
    }
}

impl FromStr for Duration {
    type Err = Error;

    /// Parse a `humantime` span such as `"1h30m"`; `"0"` is the zero value
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if s.starts_with('-') {
            return Err(Error::invalid_input(format!(
                "negative duration not allowed: {input}"
            )));
        }
        if s == "0" {
            return Ok(Self::ZERO);
        }

        humantime::parse_duration(s)
            .map(Self)
            .map_err(|e| Error::invalid_input(format!("invalid duration {input:?}: {e}")))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(self.0.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }
}

struct DurationVisitor;

impl Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration string like \"10s\" or an integer number of nanoseconds")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
        Ok(Duration(std::time::Duration::from_nanos(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
        u64::try_from(v)
            .map(|n| Duration(std::time::Duration::from_nanos(n)))
            .map_err(|_| E::custom(format!("negative duration not allowed: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DurationVisitor)
    }
}

//! Version tuples for checker and interpreter gating.
//!
//! Versions are compared as ordered integer tuples, the same way the
//! checker's own release numbers sort. The empty tuple is the "unknown"
//! sentinel and orders before every parsed version, so an unparsable or
//! missing version is treated as the oldest one.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// An ordered tuple of version components.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionTuple(Vec<u64>);

impl VersionTuple {
    /// Build a tuple from explicit components.
    pub fn new(parts: &[u64]) -> Self {
        Self(parts.to_vec())
    }

    /// The "unknown version" sentinel.
    pub fn unknown() -> Self {
        Self(Vec::new())
    }

    /// Returns true for the sentinel produced by unparsable input.
    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }

    /// Version components.
    pub fn parts(&self) -> &[u64] {
        &self.0
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("unknown");
        }
        let dotted: Vec<String> = self.0.iter().map(u64::to_string).collect();
        f.write_str(&dotted.join("."))
    }
}

impl FromStr for VersionTuple {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_version(s))
    }
}

/// Parse a dotted version string into a tuple.
///
/// Everything from the first `+` on is a local/dev suffix and is ignored.
/// Components contribute their leading digits; parsing stops at the first
/// component with no leading digit and right after a component that carries
/// trailing decoration (`1.0.0rc1` parses as `1.0.0`).
pub fn parse_version(raw: &str) -> VersionTuple {
    let public = raw.trim().split('+').next().unwrap_or("");

    let mut parts = Vec::new();
    for component in public.split('.') {
        let digits: String = component.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            break;
        }
        match digits.parse::<u64>() {
            Ok(n) => parts.push(n),
            Err(_) => break,
        }
        if digits.len() != component.len() {
            break;
        }
    }

    VersionTuple(parts)
}

/// Parse the version out of a tool banner such as `mypy 1.4.1 (compiled: yes)`
/// or `Python 3.11.4`.
///
/// The first whitespace-separated token that starts with a digit is parsed.
/// A banner without such a token yields the unknown sentinel.
pub fn parse_tool_version(banner: &str) -> VersionTuple {
    banner
        .split_whitespace()
        .find(|token| token.starts_with(|c: char| c.is_ascii_digit()))
        .map(parse_version)
        .unwrap_or_default()
}

impl Serialize for VersionTuple {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionTuple {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VersionVisitor;

        impl<'de> Visitor<'de> for VersionVisitor {
            type Value = VersionTuple;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a dotted version string or an integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<VersionTuple, E> {
                Ok(parse_version(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<VersionTuple, E> {
                Ok(VersionTuple(vec![v]))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<VersionTuple, E> {
                u64::try_from(v)
                    .map(|v| VersionTuple(vec![v]))
                    .map_err(|_| E::custom(format!("negative version: {v}")))
            }
        }

        deserializer.deserialize_any(VersionVisitor)
    }
}

/*============================================================
  Synavera Project: Distro-Check
  Module: distro_check::version
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Strict `major.minor.patch` version value parsed from the
    leading numeric triple of a version string, with a total
    component-wise ordering.

  Security / Safety Notes:
    Pure value type; no I/O performed in this module.

  Dependencies:
    regex for prefix extraction.

  Operational Scope:
    Used by package records for every provenance channel.

  Revision History:
    2026-10-19 COD  Introduced VersionValue.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Construction either succeeds fully or fails loudly
    - No placeholder values
============================================================*/

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::VersionParseError;

fn triple_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9]+)\.([0-9]+)\.([0-9]+)").expect("version pattern is valid")
    })
}

/// Numeric version triple. Field order drives the derived ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionValue {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionValue {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse the leading `major.minor.patch` of `input`; anything after the
    /// triple (e.g. a `-1` release suffix) is ignored.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let captures = triple_pattern()
            .captures(input)
            .ok_or_else(|| VersionParseError::new(input))?;
        let component = |idx: usize| -> Result<u64, VersionParseError> {
            captures[idx]
                .parse::<u64>()
                .map_err(|_| VersionParseError::new(input))
        };
        Ok(Self::new(component(1)?, component(2)?, component(3)?))
    }
}

impl FromStr for VersionValue {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

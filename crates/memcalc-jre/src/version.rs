use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Java runtime version as reported by the runtime distribution.
///
/// Both the legacy `1.<feature>.x_u` scheme and the modern `<feature>.x.y` scheme are accepted;
/// only the feature release matters for sizing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JreVersion {
    raw: String,
    feature: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid Java runtime version `{raw}`")]
pub struct VersionError {
    pub raw: String,
}

/// Region holding class metadata, which changed name and flags in Java 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataArea {
    Permgen,
    Metaspace,
}

impl JreVersion {
    pub const DEFAULT: &'static str = "1.8.0";

    /// Feature release, e.g. `7` for `1.7.0_80` and `17` for `17.0.2`.
    pub fn feature(&self) -> u16 {
        self.feature
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn metadata_area(&self) -> MetadataArea {
        if self.feature < 8 {
            MetadataArea::Permgen
        } else {
            MetadataArea::Metaspace
        }
    }
}

impl Default for JreVersion {
    fn default() -> Self {
        Self {
            raw: Self::DEFAULT.to_string(),
            feature: 8,
        }
    }
}

impl FromStr for JreVersion {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let raw = input.trim();
        let invalid = || VersionError {
            raw: input.to_string(),
        };

        let (first, rest) = leading_number(raw).ok_or_else(invalid)?;
        let feature = match (first, rest.strip_prefix('.')) {
            (1, Some(rest)) => leading_number(rest).ok_or_else(invalid)?.0,
            (first, _) => first,
        };
        if feature == 0 {
            return Err(invalid());
        }

        Ok(Self {
            raw: raw.to_string(),
            feature,
        })
    }
}

impl fmt::Display for JreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn leading_number(text: &str) -> Option<(u16, &str)> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let value = text[..end].parse().ok()?;
    Some((value, &text[end..]))
}

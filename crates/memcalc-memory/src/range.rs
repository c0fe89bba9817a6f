use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MalformedSizeError;
use crate::size::{align_down, align_up, format_byte_size, parse_byte_size};

/// Absolute size bounds for a region, either bound optional.
///
/// Textual forms:
/// - `64m..` lower bound only
/// - `..128m` upper bound only
/// - `128m..256m` both bounds
/// - `128m` exact size (lower == upper)
/// - `..` no bounds at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl SizeRange {
    pub const UNBOUNDED: SizeRange = SizeRange {
        min: None,
        max: None,
    };

    pub fn new(min: Option<u64>, max: Option<u64>) -> Result<Self, MalformedSizeError> {
        let range = Self { min, max };
        range.check_order(|| range.to_string())?;
        Ok(range)
    }

    pub fn at_least(min: u64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: u64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn exactly(size: u64) -> Self {
        Self {
            min: Some(size),
            max: Some(size),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Lower bound rounded up and upper bound rounded down to `unit`, so that a size floored to
    /// `unit` can still satisfy both bounds.
    pub fn aligned(&self, unit: u64) -> Result<SizeRange, MalformedSizeError> {
        let aligned = SizeRange {
            min: self.min.map(|min| align_up(min, unit)),
            max: self.max.map(|max| align_down(max, unit)),
        };
        aligned.check_order(|| self.to_string())?;
        Ok(aligned)
    }

    pub fn clamp(&self, size: u64) -> u64 {
        let size = self.min.map_or(size, |min| size.max(min));
        self.max.map_or(size, |max| size.min(max))
    }

    fn check_order(&self, input: impl FnOnce() -> String) -> Result<(), MalformedSizeError> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => Err(MalformedSizeError::InvertedRange {
                input: input(),
                min,
                max,
            }),
            _ => Ok(()),
        }
    }
}

impl FromStr for SizeRange {
    type Err = MalformedSizeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let bound = |raw: &str| -> Result<Option<u64>, MalformedSizeError> {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(None);
            }
            parse_byte_size(raw).map(Some)
        };

        let range = match trimmed.split_once("..") {
            Some((lower, upper)) => SizeRange {
                min: bound(lower)?,
                max: bound(upper)?,
            },
            None => SizeRange::exactly(parse_byte_size(trimmed)?),
        };
        range.check_order(|| input.to_string())?;
        Ok(range)
    }
}

impl fmt::Display for SizeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => f.write_str(&format_byte_size(min)),
            (min, max) => {
                if let Some(min) = min {
                    f.write_str(&format_byte_size(min))?;
                }
                f.write_str("..")?;
                if let Some(max) = max {
                    f.write_str(&format_byte_size(max))?;
                }
                Ok(())
            }
        }
    }
}

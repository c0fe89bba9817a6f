use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::size::format_byte_size;

/// A region declaration that cannot be turned into a sizing rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedSizeError {
    #[error("invalid memory size `{input}`: {reason}")]
    InvalidLiteral { input: String, reason: String },

    #[error("invalid memory range `{input}`: minimum {min} is greater than maximum {max}")]
    InvertedRange { input: String, min: u64, max: u64 },

    #[error("region `{region}` has negative weight {weight}")]
    NegativeWeight { region: String, weight: i64 },

    #[error("region `{region}` has neither a weight nor a size constraint")]
    Unsized { region: String },

    #[error("region `{region}` is declared more than once")]
    DuplicateRegion { region: String },
}

/// A region that could not get its minimum out of the budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffendingRegion {
    pub name: String,
    /// Bytes the region cannot go below.
    pub minimum: u64,
    /// Budget left for this region once every other region has been sized.
    pub available: u64,
}

/// The budget cannot hold every region's minimum requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetExceededError {
    pub budget: u64,
    pub required: u64,
    /// Always `required - budget`.
    pub shortfall: u64,
    pub offending: Vec<OffendingRegion>,
}

impl BudgetExceededError {
    /// Human-readable list of the regions that forced the overrun, e.g. `permgen (64M)`.
    pub fn offending_summary(&self) -> String {
        self.offending
            .iter()
            .map(|region| format!("{} ({})", region.name, format_byte_size(region.minimum)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for BudgetExceededError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total memory {} exceeded by configured memory {} (shortfall {})",
            format_byte_size(self.budget),
            format_byte_size(self.required),
            format_byte_size(self.shortfall)
        )?;
        if !self.offending.is_empty() {
            write!(f, "; minimum sizes of {}", self.offending_summary())?;
        }
        Ok(())
    }
}

impl std::error::Error for BudgetExceededError {}

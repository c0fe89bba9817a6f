use serde::{Deserialize, Serialize};

use crate::size::format_byte_size;

/// How a region ended up with its resolved size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeSource {
    /// Proportional share of the budget, within any constraint.
    Proportional,
    /// Constraint-only region sized from its bounds.
    Fixed,
    /// Proportional share was below the region's minimum.
    RaisedToMinimum,
    /// Proportional share was above the region's maximum.
    LoweredToMaximum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRegion {
    pub name: String,
    pub bytes: u64,
    pub source: SizeSource,
}

/// Fully resolved sizes for every region, in declaration order.
///
/// The sum of all region sizes never exceeds `total_bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryPlan {
    pub total_bytes: u64,
    pub regions: Vec<ResolvedRegion>,
}

impl MemoryPlan {
    pub fn get(&self, name: &str) -> Option<u64> {
        self.regions
            .iter()
            .find(|region| region.name == name)
            .map(|region| region.bytes)
    }

    pub fn committed_bytes(&self) -> u64 {
        self.regions.iter().map(|region| region.bytes).sum()
    }

    /// Budget left unassigned (flooring remainders plus weights summing below 100).
    pub fn headroom_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.committed_bytes())
    }

    /// One `name: size` line per region, for diagnostics output.
    pub fn summary_lines(&self) -> Vec<String> {
        self.regions
            .iter()
            .map(|region| format!("{}: {}", region.name, format_byte_size(region.bytes)))
            .collect()
    }
}

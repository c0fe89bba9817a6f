use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::MalformedSizeError;
use crate::range::SizeRange;
use crate::size::REPORTING_UNIT;

/// A named consumer of the total memory budget.
///
/// A region has a weight (percentage of the budget), a size constraint, or both. Regions are
/// validated on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRegion")]
pub struct Region {
    name: String,
    weight: Option<u32>,
    constraint: Option<SizeRange>,
}

impl Region {
    /// Build a region from raw configuration values.
    ///
    /// An unbounded constraint (`..`) counts as no constraint.
    pub fn new(
        name: impl Into<String>,
        weight: Option<i64>,
        constraint: Option<SizeRange>,
    ) -> Result<Self, MalformedSizeError> {
        let name = name.into();

        let weight = match weight {
            Some(weight) if weight < 0 => {
                return Err(MalformedSizeError::NegativeWeight {
                    region: name,
                    weight,
                })
            }
            Some(weight) => Some(u32::try_from(weight).map_err(|_| {
                MalformedSizeError::InvalidLiteral {
                    input: weight.to_string(),
                    reason: format!("weight of region `{name}` is too large"),
                }
            })?),
            None => None,
        };

        let constraint = constraint.filter(|range| !range.is_unbounded());
        if let Some(range) = &constraint {
            range.aligned(REPORTING_UNIT)?;
        }

        if weight.is_none() && constraint.is_none() {
            return Err(MalformedSizeError::Unsized { region: name });
        }

        Ok(Self {
            name,
            weight,
            constraint,
        })
    }

    pub fn proportional(name: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            weight: Some(weight),
            constraint: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> Option<u32> {
        self.weight
    }

    pub fn constraint(&self) -> Option<SizeRange> {
        self.constraint
    }

    /// A region with a constraint but no weight does not take part in proportional division.
    pub fn is_fixed(&self) -> bool {
        self.weight.is_none()
    }

    /// Same region with `weight` replacing the current one.
    pub fn with_weight(&self, weight: Option<i64>) -> Result<Self, MalformedSizeError> {
        Self::new(self.name.clone(), weight, self.constraint)
    }

    /// Same region with `constraint` replacing the current one.
    pub fn with_constraint(&self, constraint: Option<SizeRange>) -> Result<Self, MalformedSizeError> {
        Self::new(self.name.clone(), self.weight.map(i64::from), constraint)
    }
}

/// Unvalidated wire form of a [`Region`].
#[derive(Deserialize)]
struct RawRegion {
    name: String,
    #[serde(default)]
    weight: Option<i64>,
    #[serde(default)]
    constraint: Option<SizeRange>,
}

impl TryFrom<RawRegion> for Region {
    type Error = MalformedSizeError;

    fn try_from(raw: RawRegion) -> Result<Self, Self::Error> {
        Region::new(raw.name, raw.weight, raw.constraint)
    }
}

/// Reject region lists that name the same region twice.
pub fn ensure_unique_names(regions: &[Region]) -> Result<(), MalformedSizeError> {
    let mut seen = HashSet::new();
    for region in regions {
        if !seen.insert(region.name()) {
            return Err(MalformedSizeError::DuplicateRegion {
                region: region.name().to_string(),
            });
        }
    }
    Ok(())
}

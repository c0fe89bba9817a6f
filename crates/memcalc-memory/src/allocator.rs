use crate::error::{BudgetExceededError, OffendingRegion};
use crate::plan::{MemoryPlan, ResolvedRegion, SizeSource};
use crate::range::SizeRange;
use crate::region::Region;
use crate::size::{align_down, REPORTING_UNIT};

/// Weights are percentages; sums below this leave the remainder as headroom.
const PERCENT: u64 = 100;

/// Partition `total_bytes` across `regions`.
///
/// 1. Constraint-only regions take their lower bound (upper bound if that is all they have) off
///    the top of the budget.
/// 2. The remainder is divided by weight: `floor(remaining * weight / max(100, sum_of_weights))`.
/// 3. Each share is clamped into its region's constraint.
/// 4. If the clamped total exceeds the budget the whole plan is rejected.
///
/// Every size is a multiple of [`REPORTING_UNIT`]. This is a pure function of its inputs.
pub fn allocate(total_bytes: u64, regions: &[Region]) -> Result<MemoryPlan, BudgetExceededError> {
    let bounds: Vec<Option<SizeRange>> = regions
        .iter()
        .map(|region| {
            region
                .constraint()
                .map(|range| range.aligned(REPORTING_UNIT).unwrap_or(range))
        })
        .collect();

    let fixed_bytes = regions
        .iter()
        .zip(&bounds)
        .filter(|(region, _)| region.is_fixed())
        .fold(0u64, |acc, (_, range)| {
            acc.saturating_add(range.map_or(0, fixed_size))
        });
    let proportional_bytes = total_bytes.saturating_sub(fixed_bytes);

    let weight_sum: u64 = regions
        .iter()
        .filter_map(|region| region.weight())
        .map(u64::from)
        .sum();
    let denominator = weight_sum.max(PERCENT);

    let resolved: Vec<ResolvedRegion> = regions
        .iter()
        .zip(&bounds)
        .map(|(region, range)| {
            let (bytes, source) = match region.weight() {
                None => (range.map_or(0, fixed_size), SizeSource::Fixed),
                Some(weight) => {
                    let share = proportional_share(proportional_bytes, weight, denominator);
                    clamp_share(share, *range)
                }
            };
            tracing::trace!(
                target = "memcalc.memory",
                region = region.name(),
                bytes,
                source = ?source,
                "resolved region size"
            );
            ResolvedRegion {
                name: region.name().to_string(),
                bytes,
                source,
            }
        })
        .collect();

    let committed = resolved
        .iter()
        .fold(0u64, |acc, region| acc.saturating_add(region.bytes));

    if committed > total_bytes {
        let offending = resolved
            .iter()
            .filter(|region| {
                matches!(
                    region.source,
                    SizeSource::RaisedToMinimum | SizeSource::Fixed
                )
            })
            .map(|region| OffendingRegion {
                name: region.name.clone(),
                minimum: region.bytes,
                available: total_bytes.saturating_sub(committed - region.bytes),
            })
            .collect();

        return Err(BudgetExceededError {
            budget: total_bytes,
            required: committed,
            shortfall: committed - total_bytes,
            offending,
        });
    }

    tracing::debug!(
        target = "memcalc.memory",
        total_bytes,
        committed,
        fixed_bytes,
        weight_sum,
        "memory plan resolved"
    );

    Ok(MemoryPlan {
        total_bytes,
        regions: resolved,
    })
}

fn fixed_size(range: SizeRange) -> u64 {
    range.min.or(range.max).unwrap_or(0)
}

fn proportional_share(bytes: u64, weight: u32, denominator: u64) -> u64 {
    // `weight <= denominator`, so the quotient always fits back into a u64.
    let share = u128::from(bytes) * u128::from(weight) / u128::from(denominator);
    align_down(share as u64, REPORTING_UNIT)
}

fn clamp_share(share: u64, range: Option<SizeRange>) -> (u64, SizeSource) {
    let Some(range) = range else {
        return (share, SizeSource::Proportional);
    };

    match (range.min, range.max) {
        (Some(min), _) if share < min => (min, SizeSource::RaisedToMinimum),
        (_, Some(max)) if share > max => (max, SizeSource::LoweredToMaximum),
        _ => (share, SizeSource::Proportional),
    }
}

use memcalc_memory::{allocate, Region, SizeRange, KB, MB};
use proptest::prelude::*;

const PROPTEST_CASES: u32 = 256;

/// Budgets that are multiples of 100 KiB divide evenly into whole-KiB percentage shares, so the
/// floor in the allocator never kicks in and properties can be checked exactly.
const EVEN_STEP: u64 = 100 * KB;

#[derive(Clone, Debug)]
struct RegionSpec {
    weight: Option<u32>,
    constraint: Option<SizeRange>,
}

fn arb_constraint() -> impl Strategy<Value = Option<SizeRange>> {
    (
        proptest::option::of(0u64..=2_048),
        proptest::option::of(0u64..=2_048),
    )
        .prop_map(|(min_mb, span_mb)| {
            let min = min_mb.map(|mb| mb * MB);
            let max = span_mb.map(|span| min.unwrap_or(0) + span * MB);
            match (min, max) {
                (None, None) => None,
                (min, max) => Some(SizeRange { min, max }),
            }
        })
}

fn arb_spec() -> impl Strategy<Value = RegionSpec> {
    (proptest::option::of(0u32..=100), arb_constraint())
        .prop_filter("region needs a weight or a constraint", |(weight, constraint)| {
            weight.is_some() || constraint.is_some()
        })
        .prop_map(|(weight, constraint)| RegionSpec { weight, constraint })
}

fn arb_weighted_spec() -> impl Strategy<Value = RegionSpec> {
    (0u32..=40, arb_constraint()).prop_map(|(weight, constraint)| RegionSpec {
        weight: Some(weight),
        constraint,
    })
}

fn build(specs: &[RegionSpec]) -> Vec<Region> {
    specs
        .iter()
        .enumerate()
        .map(|(idx, spec)| {
            Region::new(format!("r{idx}"), spec.weight.map(i64::from), spec.constraint)
                .expect("generated regions are well formed")
        })
        .collect()
}

fn weights_capped_at_100(specs: &[RegionSpec]) -> bool {
    specs.iter().filter_map(|spec| spec.weight).sum::<u32>() <= 100
}

proptest! {
    #![proptest_config(ProptestConfig { cases: PROPTEST_CASES, .. ProptestConfig::default() })]

    #[test]
    fn unconstrained_shares_never_exceed_their_percentage(
        budget in 0u64..=64 * 1024 * MB,
        weights in prop::collection::vec(0u32..=25, 1..=4),
    ) {
        let regions: Vec<Region> = weights
            .iter()
            .enumerate()
            .map(|(idx, weight)| Region::proportional(format!("r{idx}"), *weight))
            .collect();
        let plan = allocate(budget, &regions).expect("unconstrained plans are always feasible");

        let weight_sum: u64 = weights.iter().copied().map(u64::from).sum();
        for (region, weight) in plan.regions.iter().zip(&weights) {
            let nominal = (u128::from(budget) * u128::from(*weight) / 100) as u64;
            prop_assert!(region.bytes <= nominal);
            prop_assert!(nominal - region.bytes < KB);
        }

        let committed = plan.committed_bytes();
        let nominal_total = (u128::from(budget) * u128::from(weight_sum) / 100) as u64;
        prop_assert!(committed <= budget);
        prop_assert!(nominal_total - committed <= weights.len() as u64 * KB);
    }

    #[test]
    fn feasible_plans_honour_every_constraint(
        budget in 0u64..=16 * 1024 * MB,
        specs in prop::collection::vec(arb_spec(), 1..=6),
    ) {
        let regions = build(&specs);
        if let Ok(plan) = allocate(budget, &regions) {
            prop_assert!(plan.committed_bytes() <= budget);
            prop_assert_eq!(plan.regions.len(), regions.len());
            for (resolved, region) in plan.regions.iter().zip(&regions) {
                prop_assert_eq!(&resolved.name, region.name());
                prop_assert_eq!(resolved.bytes % KB, 0);
                if let Some(range) = region.constraint() {
                    if let Some(min) = range.min {
                        prop_assert!(resolved.bytes >= min);
                    }
                    if let Some(max) = range.max {
                        prop_assert!(resolved.bytes <= max);
                    }
                }
            }
        }
    }

    #[test]
    fn infeasible_plans_report_the_exact_shortfall(
        budget in 0u64..=4 * 1024 * MB,
        specs in prop::collection::vec(arb_spec(), 1..=6),
    ) {
        let regions = build(&specs);
        if let Err(err) = allocate(budget, &regions) {
            prop_assert_eq!(err.budget, budget);
            prop_assert!(err.required > budget);
            prop_assert_eq!(err.shortfall, err.required - budget);
            prop_assert!(!err.offending.is_empty());
        }
    }

    #[test]
    fn allocation_is_deterministic(
        budget in 0u64..=16 * 1024 * MB,
        specs in prop::collection::vec(arb_spec(), 1..=6),
    ) {
        let regions = build(&specs);
        prop_assert_eq!(allocate(budget, &regions), allocate(budget, &regions));
    }

    #[test]
    fn growing_the_budget_never_shrinks_a_region_or_breaks_feasibility(
        steps in 0u64..=200_000,
        extra_steps in 0u64..=200_000,
        specs in prop::collection::vec(arb_weighted_spec(), 1..=5)
            .prop_filter("weights sum to at most 100", |specs| weights_capped_at_100(specs)),
    ) {
        let regions = build(&specs);
        let smaller = steps * EVEN_STEP;
        let larger = smaller + extra_steps * EVEN_STEP;

        if let Ok(small_plan) = allocate(smaller, &regions) {
            let large_plan = allocate(larger, &regions);
            prop_assert!(large_plan.is_ok(), "feasible at {} but not at {}", smaller, larger);
            let large_plan = large_plan.unwrap();
            for (small, large) in small_plan.regions.iter().zip(&large_plan.regions) {
                prop_assert!(large.bytes >= small.bytes);
            }
        }
    }
}

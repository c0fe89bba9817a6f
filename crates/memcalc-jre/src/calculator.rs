use memcalc_memory::{
    allocate, format_byte_size, BudgetExceededError, MalformedSizeError, MemoryPlan, Region, MB,
};
use serde::Serialize;
use thiserror::Error;

use crate::flags::{format_flags, JvmOptions};
use crate::regions::{renamed_regions, resolve_regions, RegionOverrides, STACK};
use crate::version::{JreVersion, VersionError};

/// HotSpot's default per-thread stack size on 64-bit Linux.
pub const DEFAULT_THREAD_STACK_SIZE: u64 = MB;

/// Everything the calculator needs besides the total budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorSettings {
    /// Runtime version token, e.g. `1.7.0` or `17.0.2`.
    pub jre_version: String,
    pub overrides: RegionOverrides,
    /// Value for `-Xss`. Independent from the `stack` region, which only reserves headroom.
    pub thread_stack_size: u64,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            jre_version: JreVersion::DEFAULT.to_string(),
            overrides: RegionOverrides::default(),
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
        }
    }
}

/// A successful calculation: the resolved plan and the flags that enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Calculation {
    pub jre_version: JreVersion,
    pub plan: MemoryPlan,
    pub options: JvmOptions,
}

#[derive(Debug, Error)]
pub enum CalculationError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Malformed(#[from] MalformedSizeError),

    #[error("thread stack size must be at least 1K, got {bytes} bytes")]
    ThreadStackSize { bytes: u64 },

    #[error(transparent)]
    BudgetExceeded(#[from] BudgetExceededError),
}

impl CalculationError {
    /// The configuration parsed but the budget is too small for it.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, CalculationError::BudgetExceeded(_))
    }
}

/// Resolve the regions for the configured runtime and fit them into `total_bytes`.
pub fn calculate(
    total_bytes: u64,
    settings: &CalculatorSettings,
) -> Result<Calculation, CalculationError> {
    let jre_version: JreVersion = settings.jre_version.parse()?;
    if settings.thread_stack_size < memcalc_memory::KB {
        return Err(CalculationError::ThreadStackSize {
            bytes: settings.thread_stack_size,
        });
    }

    for (configured, applied) in renamed_regions(&jre_version, &settings.overrides) {
        tracing::warn!(
            target: "memcalc.jre",
            configured,
            applied,
            version = %jre_version,
            "region does not exist for this Java version; applying the setting to {applied}"
        );
    }

    let regions = resolve_regions(&jre_version, &settings.overrides)?;
    let plan = plan_regions(total_bytes, &regions)?;

    if let Some(stack) = plan.get(STACK) {
        if stack < settings.thread_stack_size {
            tracing::warn!(
                target: "memcalc.jre",
                stack_region = %format_byte_size(stack),
                thread_stack_size = %format_byte_size(settings.thread_stack_size),
                "stack region is smaller than a single thread stack"
            );
        }
    }

    let options = format_flags(&plan, settings.thread_stack_size);
    Ok(Calculation {
        jre_version,
        plan,
        options,
    })
}

fn plan_regions(total_bytes: u64, regions: &[Region]) -> Result<MemoryPlan, BudgetExceededError> {
    tracing::debug!(
        target: "memcalc.jre",
        total = %format_byte_size(total_bytes),
        regions = regions.len(),
        "allocating memory regions"
    );
    allocate(total_bytes, regions)
}

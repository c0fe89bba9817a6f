//! Java runtime knowledge for memcalc: which memory regions a given JRE has, which HotSpot flags
//! enforce them, and the [`calculate`] entry point that ties region resolution, allocation and
//! flag formatting together.

mod calculator;
mod flags;
mod regions;
mod version;

pub use calculator::{
    calculate, Calculation, CalculationError, CalculatorSettings, DEFAULT_THREAD_STACK_SIZE,
};
pub use flags::{format_flag_size, format_flags, JvmOptions};
pub use regions::{
    canonical_region_name, default_weights, renamed_regions, resolve_regions, RegionOverrides,
    HEAP, METADATA, METASPACE, NATIVE, PERMGEN, STACK,
};
pub use version::{JreVersion, MetadataArea, VersionError};

//! Memory budgeting primitives for memcalc.
//!
//! This crate knows nothing about JVM flags or versions. It provides:
//! - byte-size literals and [`SizeRange`] constraints,
//! - [`Region`] declarations and the pure [`allocate`] function that turns a budget plus regions
//!   into a [`MemoryPlan`] (or a [`BudgetExceededError`]),
//! - best-effort discovery of the total budget ([`detect_memory_limit`]).

mod allocator;
mod cgroup;
mod error;
mod limit;
mod plan;
mod range;
mod region;
mod size;

pub use allocator::allocate;
pub use cgroup::{
    cgroup_memory_limit_bytes, parse_cgroup_memory_limit, parse_proc_self_cgroup, CgroupPaths,
};
pub use error::{BudgetExceededError, MalformedSizeError, OffendingRegion};
pub use limit::{
    detect_memory_limit, MemoryLimit, MemoryLimitCandidates, MemoryLimitError, MemoryLimitSource,
    MEMORY_LIMIT_ENV_VAR,
};
pub use plan::{MemoryPlan, ResolvedRegion, SizeSource};
pub use range::SizeRange;
pub use region::{ensure_unique_names, Region};
pub use size::{
    align_down, align_up, format_byte_size, parse_byte_size, GB, KB, MB, REPORTING_UNIT, TB,
};

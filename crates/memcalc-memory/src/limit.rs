use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cgroup;
use crate::error::MalformedSizeError;
use crate::size::parse_byte_size;

/// Environment variable the hosting platform uses to publish the container memory limit.
pub const MEMORY_LIMIT_ENV_VAR: &str = "MEMORY_LIMIT";

/// Where the total memory budget came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryLimitSource {
    /// Passed in by the caller (command line or config file).
    Explicit,
    /// `$MEMORY_LIMIT`.
    Environment,
    /// Memory limit of the enclosing cgroup.
    Cgroup,
    /// Total physical memory of the host.
    System,
}

/// The hard ceiling for a memory plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLimit {
    pub bytes: u64,
    pub source: MemoryLimitSource,
}

#[derive(Debug, Error)]
pub enum MemoryLimitError {
    #[error("invalid ${var}")]
    InvalidEnvironment {
        var: &'static str,
        #[source]
        source: MalformedSizeError,
    },

    #[error("unable to determine the total memory budget; pass --total-memory or set $MEMORY_LIMIT")]
    Unknown,
}

/// Candidate budgets, highest priority first. Kept separate from probing so the precedence rules
/// can be tested without touching the environment.
#[derive(Debug, Clone, Default)]
pub struct MemoryLimitCandidates {
    pub explicit: Option<u64>,
    pub environment: Option<String>,
    pub cgroup: Option<u64>,
    pub system: Option<u64>,
}

impl MemoryLimitCandidates {
    /// Gather candidates from `$MEMORY_LIMIT`, the cgroup hierarchy and the host.
    ///
    /// Host probes are skipped when an earlier source already has a value.
    pub fn probe(explicit: Option<u64>) -> Self {
        let environment = std::env::var(MEMORY_LIMIT_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty());

        let mut candidates = Self {
            explicit,
            environment,
            ..Self::default()
        };
        if candidates.explicit.is_some() || candidates.environment.is_some() {
            return candidates;
        }

        candidates.cgroup = cgroup::cgroup_memory_limit_bytes();
        if candidates.cgroup.is_none() {
            candidates.system = system_memory_bytes();
        }
        candidates
    }

    pub fn resolve(self) -> Result<MemoryLimit, MemoryLimitError> {
        if let Some(bytes) = self.explicit {
            return Ok(MemoryLimit {
                bytes,
                source: MemoryLimitSource::Explicit,
            });
        }

        if let Some(raw) = self.environment {
            let bytes =
                parse_byte_size(&raw).map_err(|source| MemoryLimitError::InvalidEnvironment {
                    var: MEMORY_LIMIT_ENV_VAR,
                    source,
                })?;
            return Ok(MemoryLimit {
                bytes,
                source: MemoryLimitSource::Environment,
            });
        }

        if let Some(bytes) = self.cgroup {
            return Ok(MemoryLimit {
                bytes,
                source: MemoryLimitSource::Cgroup,
            });
        }

        match self.system {
            Some(bytes) => Ok(MemoryLimit {
                bytes,
                source: MemoryLimitSource::System,
            }),
            None => Err(MemoryLimitError::Unknown),
        }
    }
}

/// Resolve the total budget, probing the environment only when `explicit` is absent.
pub fn detect_memory_limit(explicit: Option<u64>) -> Result<MemoryLimit, MemoryLimitError> {
    let limit = MemoryLimitCandidates::probe(explicit).resolve()?;
    tracing::debug!(
        target = "memcalc.memory",
        bytes = limit.bytes,
        source = ?limit.source,
        "total memory budget"
    );
    Ok(limit)
}

fn system_memory_bytes() -> Option<u64> {
    let mut system = sysinfo::System::new();
    system.refresh_memory();
    Some(system.total_memory()).filter(|bytes| *bytes > 0)
}

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Memory-controller paths extracted from `/proc/self/cgroup`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CgroupPaths {
    /// Unified hierarchy entry (`0::/path`).
    pub unified: Option<String>,
    /// Legacy memory controller entry (`N:memory:/path`).
    pub legacy_memory: Option<String>,
}

/// Parse `/proc/self/cgroup` contents. Pure; does not touch the filesystem.
pub fn parse_proc_self_cgroup(contents: &str) -> CgroupPaths {
    let mut paths = CgroupPaths::default();

    for line in contents.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let mut fields = line.splitn(3, ':');
        let (Some(id), Some(controllers), Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let path = path.trim();

        if paths.unified.is_none() && id == "0" && controllers.is_empty() && !path.is_empty() {
            paths.unified = Some(path.to_string());
        }

        if paths.legacy_memory.is_none()
            && controllers.split(',').any(|name| name.trim() == "memory")
        {
            paths.legacy_memory = Some(path.to_string());
        }
    }

    paths
}

/// Anything at or above 1 EiB is how cgroup v1 spells "no limit".
const UNLIMITED_THRESHOLD_BYTES: u64 = 1 << 60;

/// Parse a `memory.max` / `memory.limit_in_bytes` value. `None` means unlimited or unreadable.
pub fn parse_cgroup_memory_limit(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "max" {
        return None;
    }

    match raw.parse::<u64>() {
        Ok(value) if value >= UNLIMITED_THRESHOLD_BYTES => None,
        Ok(value) => Some(value),
        Err(err) => {
            static REPORTED: OnceLock<()> = OnceLock::new();
            if REPORTED.set(()).is_ok() {
                tracing::debug!(
                    target = "memcalc.memory",
                    raw,
                    error = %err,
                    "ignoring unparseable cgroup memory limit"
                );
            }
            None
        }
    }
}

/// Tightest limit among `cgroup_path` and its ancestors under `mount`.
fn tightest_limit(mount: &Path, cgroup_path: &str, limit_file: &str) -> Option<u64> {
    let mut rel = PathBuf::from(cgroup_path.trim_start_matches('/'));
    let mut tightest: Option<u64> = None;

    loop {
        let candidate = mount.join(&rel).join(limit_file);
        let limit = read_limit_file(&candidate).and_then(|raw| parse_cgroup_memory_limit(&raw));
        if let Some(limit) = limit {
            tightest = Some(tightest.map_or(limit, |current| current.min(limit)));
        }

        if !rel.pop() {
            break;
        }
    }

    tightest
}

fn read_limit_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            tracing::debug!(
                target = "memcalc.memory",
                path = %path.display(),
                error = %err,
                "failed to read cgroup memory limit"
            );
            None
        }
    }
}

/// Memory limit of the current process's cgroup, if one is set.
///
/// Prefers the unified (v2) hierarchy and falls back to the v1 memory controller.
pub fn cgroup_memory_limit_bytes() -> Option<u64> {
    if !cfg!(target_os = "linux") {
        return None;
    }

    let contents = match std::fs::read_to_string("/proc/self/cgroup") {
        Ok(contents) => contents,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(
                    target = "memcalc.memory",
                    error = %err,
                    "failed to read /proc/self/cgroup"
                );
            }
            return None;
        }
    };
    let paths = parse_proc_self_cgroup(&contents);

    paths
        .unified
        .as_deref()
        .and_then(|path| tightest_limit(Path::new("/sys/fs/cgroup"), path, "memory.max"))
        .or_else(|| {
            paths.legacy_memory.as_deref().and_then(|path| {
                tightest_limit(
                    Path::new("/sys/fs/cgroup/memory"),
                    path,
                    "memory.limit_in_bytes",
                )
            })
        })
}

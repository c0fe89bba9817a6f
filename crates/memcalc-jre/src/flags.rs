use std::fmt;

use memcalc_memory::{MemoryPlan, KB, MB};
use serde::Serialize;

use crate::regions::{HEAP, METASPACE, PERMGEN, STACK};

/// Ordered JVM startup options derived from a [`MemoryPlan`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct JvmOptions(Vec<String>);

impl JvmOptions {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JvmOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl<'a> IntoIterator for &'a JvmOptions {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Size in the form HotSpot flags expect: whole megabytes when exact, otherwise kilobytes
/// (floored).
pub fn format_flag_size(bytes: u64) -> String {
    if bytes % MB == 0 {
        format!("{}M", bytes / MB)
    } else {
        format!("{}K", bytes / KB)
    }
}

/// Map each region in `plan` to its flags, preserving plan order.
///
/// The stack region's size in the plan is aggregate headroom for all threads; `-Xss` is set from
/// `thread_stack_size` instead. Regions without a HotSpot flag (`native`, custom regions) emit
/// nothing.
pub fn format_flags(plan: &MemoryPlan, thread_stack_size: u64) -> JvmOptions {
    let mut options = Vec::new();

    for region in &plan.regions {
        let size = format_flag_size(region.bytes);
        match region.name.as_str() {
            HEAP => {
                options.push(format!("-Xmx{size}"));
                options.push(format!("-Xms{size}"));
            }
            PERMGEN => {
                options.push(format!("-XX:MaxPermSize={size}"));
                options.push(format!("-XX:PermSize={size}"));
            }
            METASPACE => {
                options.push(format!("-XX:MaxMetaspaceSize={size}"));
                options.push(format!("-XX:MetaspaceSize={size}"));
            }
            STACK => options.push(format!("-Xss{}", format_flag_size(thread_stack_size))),
            _ => {}
        }
    }

    JvmOptions(options)
}

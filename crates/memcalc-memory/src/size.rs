use crate::error::MalformedSizeError;

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * KB;
pub const GB: u64 = 1024 * MB;
pub const TB: u64 = 1024 * GB;

/// Granularity of every resolved region size.
///
/// Runtime flags are expressed in whole kilobytes at best, so sizes are always floored to this
/// unit before they are reported.
pub const REPORTING_UNIT: u64 = KB;

/// Parse a human-friendly byte size such as `64m`, `1G`, `512 KiB` or `1048576`.
///
/// Units are binary and case-insensitive (`1K == 1024`). A bare number is a byte count.
pub fn parse_byte_size(input: &str) -> Result<u64, MalformedSizeError> {
    let trimmed = input.trim();
    let invalid = |reason: &str| MalformedSizeError::InvalidLiteral {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("empty size"));
    }

    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(digits_end);
    if digits.is_empty() {
        return Err(invalid("expected a non-negative integer"));
    }

    let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => KB,
        "m" | "mb" | "mib" => MB,
        "g" | "gb" | "gib" => GB,
        "t" | "tb" | "tib" => TB,
        _ => return Err(invalid("unknown unit (expected one of B, K, M, G, T)")),
    };

    let value: u64 = digits.parse().map_err(|_| invalid("number is too large"))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| invalid("size overflows 64 bits"))
}

/// Render a byte count using the largest binary unit that divides it exactly.
///
/// Used for log lines and error messages; runtime flags go through the flag formatter instead.
pub fn format_byte_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0".to_string();
    }

    for (unit, suffix) in [(TB, "T"), (GB, "G"), (MB, "M"), (KB, "K")] {
        if bytes % unit == 0 {
            return format!("{}{suffix}", bytes / unit);
        }
    }

    format!("{bytes}B")
}

pub fn align_down(bytes: u64, unit: u64) -> u64 {
    bytes - bytes % unit
}

pub fn align_up(bytes: u64, unit: u64) -> u64 {
    match bytes % unit {
        0 => bytes,
        rem => bytes.saturating_add(unit - rem),
    }
}

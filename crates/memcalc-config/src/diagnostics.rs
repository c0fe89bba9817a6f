use std::fmt;

use serde::de::DeserializeOwned;

/// Combined diagnostics produced while loading and validating a memcalc config.
///
/// Loading is "best effort": callers always get a `MemcalcConfig` when deserialization succeeds,
/// plus the issues that would change or prevent a calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Keys present in the input TOML that the schema does not know, with full paths (for
    /// example `logging.levle`).
    pub unknown_keys: Vec<String>,
    /// Non-fatal issues. The calculation still runs.
    pub warnings: Vec<ConfigWarning>,
    /// Values the calculator would reject.
    pub errors: Vec<ConfigValidationError>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty() && self.errors.is_empty()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn extend_validation(&mut self, validation: ValidationDiagnostics) {
        self.warnings.extend(validation.warnings);
        self.errors.extend(validation.errors);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationDiagnostics {
    pub warnings: Vec<ConfigWarning>,
    pub errors: Vec<ConfigValidationError>,
}

impl ValidationDiagnostics {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Weights add up to more than 100; shares are scaled down to fit the budget.
    WeightsExceedHundred { total: u64 },
    /// A size constraint on a region that no JVM flag enforces (`native` or a custom region).
    SizeWithoutFlag { region: String },
    LoggingLevelInvalid { value: String, normalized: String },
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    InvalidValue { toml_path: String, message: String },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::WeightsExceedHundred { total } => write!(
                f,
                "weights add up to {total}; every region is scaled down to fit the total memory"
            ),
            ConfigWarning::SizeWithoutFlag { region } => write!(
                f,
                "sizes.{region}: no JVM flag enforces this region; the size is only reserved"
            ),
            ConfigWarning::LoggingLevelInvalid { value, normalized } => write!(
                f,
                "logging.level: `{value}` (normalized to `{normalized}`) is not a valid filter; using `info`"
            ),
        }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValidationError::InvalidValue { toml_path, message } => {
                write!(f, "{toml_path}: {message}")
            }
        }
    }
}

pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(normalize_serde_ignored_path(path));
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}

fn normalize_serde_ignored_path(path: serde_ignored::Path) -> String {
    // Root paths render with a leading `.`.
    path.to_string().trim_start_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn unknown_key_paths_are_dotted() {
        #[derive(Debug, Deserialize)]
        struct Root {
            #[allow(dead_code)]
            logging: Logging,
        }

        #[derive(Debug, Deserialize)]
        struct Logging {
            #[allow(dead_code)]
            level: String,
        }

        let text = r#"
heap = 75

[logging]
level = "info"
levle = "debug"
"#;

        let (_value, unknown) = deserialize_toml_with_unknown_keys::<Root>(text).expect("parse");
        assert_eq!(unknown, vec!["heap", "logging.levle"]);
    }

    #[test]
    fn diagnostics_render_with_their_toml_path() {
        let error = ConfigValidationError::InvalidValue {
            toml_path: "weights.heap".to_string(),
            message: "must not be negative".to_string(),
        };
        assert_eq!(error.to_string(), "weights.heap: must not be negative");

        let warning = ConfigWarning::SizeWithoutFlag {
            region: "native".to_string(),
        };
        assert!(warning.to_string().starts_with("sizes.native:"));
    }
}

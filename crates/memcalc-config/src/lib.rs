use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use memcalc_jre::{CalculatorSettings, JreVersion, RegionOverrides, DEFAULT_THREAD_STACK_SIZE};
use thiserror::Error;

mod diagnostics;
mod logging;
mod schema;
mod validation;

pub use diagnostics::{
    ConfigDiagnostics, ConfigValidationError, ConfigWarning, ValidationDiagnostics,
};
pub use logging::{init_tracing, LoggingConfig, DIAGNOSTICS_TARGET};
pub use schema::json_schema;

/// A byte size which supports both raw byte counts and human-friendly suffixes (`512m`, `1G`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteSize(pub u64);

impl Serialize for ByteSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ByteSizeVisitor;

        impl serde::de::Visitor<'_> for ByteSizeVisitor {
            type Value = ByteSize;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a byte count or a size such as `512m` or `1G`")
            }

            fn visit_u64<E: serde::de::Error>(self, bytes: u64) -> Result<ByteSize, E> {
                Ok(ByteSize(bytes))
            }

            fn visit_i64<E: serde::de::Error>(self, bytes: i64) -> Result<ByteSize, E> {
                u64::try_from(bytes).map(ByteSize).map_err(|_| {
                    E::custom(format!("memory size must not be negative, got {bytes}"))
                })
            }

            fn visit_str<E: serde::de::Error>(self, literal: &str) -> Result<ByteSize, E> {
                memcalc_memory::parse_byte_size(literal)
                    .map(ByteSize)
                    .map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ByteSizeVisitor)
    }
}

impl JsonSchema for ByteSize {
    fn schema_name() -> String {
        "ByteSize".to_owned()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        schema::byte_size_schema(generator)
    }
}

/// Contents of `memcalc.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct MemcalcConfig {
    /// Total memory available to the JVM. When unset, the budget is taken from `$MEMORY_LIMIT`,
    /// the cgroup limit or the host, in that order.
    #[serde(default)]
    pub total_memory: Option<ByteSize>,

    /// Java runtime version, e.g. `1.7.0_80` or `17.0.2`. Defaults to `1.8.0`.
    #[serde(default)]
    pub jre_version: Option<String>,

    /// Per-thread stack size passed to `-Xss`.
    #[serde(default = "MemcalcConfig::default_thread_stack_size")]
    pub thread_stack_size: ByteSize,

    /// Region name to weight (percentage of the total memory).
    #[serde(default)]
    pub weights: IndexMap<String, i64>,

    /// Region name to size range: `64m..`, `..1g`, `128m..256m` or `256m`.
    #[serde(default)]
    pub sizes: IndexMap<String, String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MemcalcConfig {
    fn default_thread_stack_size() -> ByteSize {
        ByteSize(DEFAULT_THREAD_STACK_SIZE)
    }

    pub fn jre_version(&self) -> &str {
        self.jre_version.as_deref().unwrap_or(JreVersion::DEFAULT)
    }

    pub fn region_overrides(&self) -> RegionOverrides {
        RegionOverrides {
            weights: self.weights.clone(),
            sizes: self.sizes.clone(),
        }
    }

    /// Settings for [`memcalc_jre::calculate`].
    pub fn calculator_settings(&self) -> CalculatorSettings {
        CalculatorSettings {
            jre_version: self.jre_version().to_owned(),
            overrides: self.region_overrides(),
            thread_stack_size: self.thread_stack_size.0,
        }
    }
}

impl Default for MemcalcConfig {
    fn default() -> Self {
        Self {
            total_memory: None,
            jre_version: None,
            thread_stack_size: Self::default_thread_stack_size(),
            weights: IndexMap::new(),
            sizes: IndexMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` includes a multi-line source snippet; keep the message only.
        ConfigError::Toml(err.message().to_owned())
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

impl MemcalcConfig {
    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = read_config(path.as_ref())?;
        Ok(toml::from_str(&text)?)
    }

    /// Load a config file from TOML and return diagnostics (unknown keys and semantic validation
    /// failures).
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let text = read_config(path.as_ref())?;
        Self::load_from_str_with_diagnostics(&text)
    }

    /// Load a config from a TOML string and return diagnostics.
    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<MemcalcConfig>(text)?;

        let mut diagnostics = ConfigDiagnostics {
            unknown_keys,
            ..ConfigDiagnostics::default()
        };
        diagnostics.extend_validation(config.validate());

        Ok((config, diagnostics))
    }
}

pub const MEMCALC_CONFIG_ENV_VAR: &str = "MEMCALC_CONFIG_PATH";

/// Discover the memcalc configuration file for an application directory.
///
/// Search order:
/// 1) `MEMCALC_CONFIG_PATH` (absolute or relative to `app_dir`)
/// 2) `memcalc.toml` in `app_dir`
/// 3) `.memcalc.toml` in `app_dir`
pub fn discover_config_path(app_dir: &Path) -> Option<PathBuf> {
    if let Some(value) = std::env::var_os(MEMCALC_CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            app_dir.join(candidate)
        };
        return Some(path.canonicalize().unwrap_or(path));
    }

    ["memcalc.toml", ".memcalc.toml"]
        .into_iter()
        .map(|name| app_dir.join(name))
        .find(|path| path.is_file())
        .map(|path| path.canonicalize().unwrap_or(path))
}

/// Load the memcalc configuration for an application directory.
///
/// If no config is present, returns [`MemcalcConfig::default`] and `None`.
pub fn load_for_app_dir(app_dir: &Path) -> Result<(MemcalcConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(app_dir) else {
        return Ok((MemcalcConfig::default(), None));
    };

    let config = MemcalcConfig::load_from_path(&path)?;
    Ok((config, Some(path)))
}

/// Load the memcalc configuration for an application directory with diagnostics.
///
/// If no config is present, returns [`MemcalcConfig::default`], `None`, and empty diagnostics.
pub fn load_for_app_dir_with_diagnostics(
    app_dir: &Path,
) -> Result<(MemcalcConfig, Option<PathBuf>, ConfigDiagnostics), ConfigError> {
    let Some(path) = discover_config_path(app_dir) else {
        return Ok((MemcalcConfig::default(), None, ConfigDiagnostics::default()));
    };

    let (config, diagnostics) = MemcalcConfig::load_from_path_with_diagnostics(&path)?;
    Ok((config, Some(path), diagnostics))
}

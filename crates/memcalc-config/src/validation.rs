use indexmap::IndexMap;
use memcalc_jre::{
    canonical_region_name, default_weights, resolve_regions, JreVersion, HEAP, METASPACE, PERMGEN,
};
use memcalc_memory::{MalformedSizeError, SizeRange, KB, REPORTING_UNIT};

use crate::diagnostics::{ConfigValidationError, ConfigWarning, ValidationDiagnostics};
use crate::MemcalcConfig;

const PERCENT: u64 = 100;

impl MemcalcConfig {
    /// Validate semantic invariants for a configuration.
    ///
    /// Validation is best-effort: it attempts to report as many problems as possible in one pass.
    #[must_use]
    pub fn validate(&self) -> ValidationDiagnostics {
        let mut out = ValidationDiagnostics::default();

        let version = validate_version(self, &mut out);
        validate_weights(self, &mut out);
        validate_sizes(self, version.as_ref(), &mut out);
        validate_thread_stack_size(self, &mut out);
        validate_logging(self, &mut out);

        if let (Some(version), true) = (version, out.is_ok()) {
            validate_regions(self, &version, &mut out);
        }

        out
    }
}

fn validate_version(config: &MemcalcConfig, out: &mut ValidationDiagnostics) -> Option<JreVersion> {
    match config.jre_version().parse::<JreVersion>() {
        Ok(version) => Some(version),
        Err(err) => {
            out.errors.push(ConfigValidationError::InvalidValue {
                toml_path: "jre_version".to_string(),
                message: err.to_string(),
            });
            None
        }
    }
}

fn validate_weights(config: &MemcalcConfig, out: &mut ValidationDiagnostics) {
    for (name, weight) in &config.weights {
        if *weight < 0 {
            out.errors.push(ConfigValidationError::InvalidValue {
                toml_path: format!("weights.{name}"),
                message: format!("weight must not be negative, got {weight}"),
            });
        }
    }
}

fn validate_sizes(
    config: &MemcalcConfig,
    version: Option<&JreVersion>,
    out: &mut ValidationDiagnostics,
) {
    for (name, raw) in &config.sizes {
        let parsed = raw
            .parse::<SizeRange>()
            .and_then(|range| range.aligned(REPORTING_UNIT));
        if let Err(err) = parsed {
            out.errors.push(ConfigValidationError::InvalidValue {
                toml_path: format!("sizes.{name}"),
                message: err.to_string(),
            });
            continue;
        }

        let Some(version) = version else {
            continue;
        };
        let applied = canonical_region_name(version, name.trim());
        if !matches!(applied, HEAP | PERMGEN | METASPACE) {
            out.warnings.push(ConfigWarning::SizeWithoutFlag {
                region: name.clone(),
            });
        }
    }
}

fn validate_thread_stack_size(config: &MemcalcConfig, out: &mut ValidationDiagnostics) {
    if config.thread_stack_size.0 < KB {
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path: "thread_stack_size".to_string(),
            message: format!(
                "must be at least 1K, got {} bytes",
                config.thread_stack_size.0
            ),
        });
    }
}

fn validate_logging(config: &MemcalcConfig, out: &mut ValidationDiagnostics) {
    let normalized = config.logging.level_directives();
    if !config.logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.warnings.push(ConfigWarning::LoggingLevelInvalid {
            value: config.logging.level.clone(),
            normalized,
        });
    }
}

/// Checks that need the full region set: every region must be sizeable and the weights should
/// not oversubscribe the budget.
fn validate_regions(config: &MemcalcConfig, version: &JreVersion, out: &mut ValidationDiagnostics) {
    if let Err(err) = resolve_regions(version, &config.region_overrides()) {
        let toml_path = match &err {
            MalformedSizeError::Unsized { region } => format!("sizes.{region}"),
            MalformedSizeError::DuplicateRegion { region } => region.clone(),
            _ => "sizes".to_string(),
        };
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path,
            message: err.to_string(),
        });
        return;
    }

    let mut weights: IndexMap<&str, i64> = default_weights(version)
        .into_iter()
        .map(|(name, weight)| (name, i64::from(weight)))
        .collect();
    for (name, weight) in &config.weights {
        weights.insert(canonical_region_name(version, name.trim()), *weight);
    }

    let total = weights
        .values()
        .map(|weight| u64::try_from(*weight).unwrap_or(0))
        .sum::<u64>();
    if total > PERCENT {
        out.warnings.push(ConfigWarning::WeightsExceedHundred { total });
    }
}

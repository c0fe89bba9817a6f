use memcalc_config::{ConfigValidationError, ConfigWarning, MemcalcConfig};
use tempfile::NamedTempFile;

#[test]
fn reports_unknown_keys_with_full_paths() {
    let text = r#"
memory_limit = "1G"

[weights]
heap = 75

[logging]
levle = "debug"
"#;

    let (_config, diagnostics) =
        MemcalcConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(diagnostics.unknown_keys, vec!["logging.levle", "memory_limit"]);
    assert!(diagnostics.is_ok());
}

#[test]
fn custom_regions_are_not_unknown_keys() {
    let text = r#"
[weights]
code_cache = 5

[sizes]
code_cache = "..48m"
"#;

    let (config, diagnostics) =
        MemcalcConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert!(diagnostics.unknown_keys.is_empty());
    assert_eq!(config.weights["code_cache"], 5);
    assert_eq!(
        diagnostics.warnings,
        vec![
            ConfigWarning::SizeWithoutFlag {
                region: "code_cache".to_string()
            },
            ConfigWarning::WeightsExceedHundred { total: 105 },
        ]
    );
}

#[test]
fn semantic_errors_do_not_prevent_loading() {
    let text = r#"
jre_version = "1.7.0"

[sizes]
permgen = "64q.."
"#;

    let (config, diagnostics) =
        MemcalcConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(config.jre_version(), "1.7.0");
    assert!(!diagnostics.is_ok());
    assert!(matches!(
        diagnostics.errors.as_slice(),
        [ConfigValidationError::InvalidValue { toml_path, .. }] if toml_path == "sizes.permgen"
    ));
}

#[test]
fn type_errors_fail_to_load() {
    let err = MemcalcConfig::load_from_str_with_diagnostics("[weights]\nheap = \"lots\"\n")
        .expect_err("weights must be integers");
    assert!(err.to_string().starts_with("failed to parse toml config"), "{err}");
}

#[test]
fn loads_diagnostics_from_a_file() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "[weights]\nheap = -1\n").unwrap();

    let (_config, diagnostics) =
        MemcalcConfig::load_from_path_with_diagnostics(file.path()).expect("config should parse");
    assert_eq!(
        diagnostics.errors,
        vec![ConfigValidationError::InvalidValue {
            toml_path: "weights.heap".to_string(),
            message: "weight must not be negative, got -1".to_string(),
        }]
    );
}

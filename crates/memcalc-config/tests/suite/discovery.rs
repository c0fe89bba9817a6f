use std::ffi::OsString;
use std::sync::Mutex;

use memcalc_config::{
    discover_config_path, load_for_app_dir, load_for_app_dir_with_diagnostics, ConfigError,
    MemcalcConfig, MEMCALC_CONFIG_ENV_VAR,
};
use tempfile::tempdir;

static ENV_LOCK: Mutex<()> = Mutex::new(());

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &std::path::Path) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn discovers_memcalc_toml_in_app_dir() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(MEMCALC_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("memcalc.toml");
    std::fs::write(&config_path, "jre_version = \"1.7.0\"\n").unwrap();

    let discovered = discover_config_path(dir.path())
        .expect("memcalc.toml should be discovered when present in the app dir");
    assert_eq!(
        discovered,
        config_path.canonicalize().unwrap_or(config_path)
    );
}

#[test]
fn falls_back_to_hidden_config() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(MEMCALC_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(".memcalc.toml"), "total_memory = \"2G\"\n").unwrap();

    let (config, path) = load_for_app_dir(dir.path()).unwrap();
    assert!(path.is_some());
    assert_eq!(
        config.total_memory.map(|size| size.0),
        Some(2 * memcalc_memory::GB)
    );
}

#[test]
fn env_override_wins_over_app_dir_file() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");

    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("memcalc.toml"), "jre_version = \"1.7.0\"\n").unwrap();

    let override_path = dir.path().join("override.toml");
    std::fs::write(&override_path, "jre_version = \"17\"\n").unwrap();
    let _env = EnvVarGuard::set(MEMCALC_CONFIG_ENV_VAR, &override_path);

    let (config, path, diagnostics) = load_for_app_dir_with_diagnostics(dir.path()).unwrap();
    assert_eq!(config.jre_version(), "17");
    assert_eq!(
        path,
        Some(override_path.canonicalize().unwrap_or(override_path))
    );
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn relative_env_override_resolves_against_app_dir() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");

    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("config")).unwrap();
    let config_path = dir.path().join("config").join("jvm.toml");
    std::fs::write(&config_path, "[weights]\nheap = 60\n").unwrap();
    let _env = EnvVarGuard::set(MEMCALC_CONFIG_ENV_VAR, std::path::Path::new("config/jvm.toml"));

    let (config, _) = load_for_app_dir(dir.path()).unwrap();
    assert_eq!(config.weights["heap"], 60);
}

#[test]
fn missing_env_override_is_an_io_error() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");

    let dir = tempdir().unwrap();
    let _env = EnvVarGuard::set(MEMCALC_CONFIG_ENV_VAR, &dir.path().join("missing.toml"));

    let err = load_for_app_dir(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "{err:?}");
    // The io error is carried as the source, not repeated in the message.
    assert!(err.to_string().ends_with("missing.toml"), "{err}");
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn missing_config_means_defaults() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(MEMCALC_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    let (config, path, diagnostics) = load_for_app_dir_with_diagnostics(dir.path()).unwrap();
    assert_eq!(config, MemcalcConfig::default());
    assert!(path.is_none());
    assert!(diagnostics.is_empty());
}

use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Once};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::{filter_fn, EnvFilter};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, TestWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::Layer;

/// Tracing target for the calculation report. Events on this target are written to the
/// diagnostics log file regardless of the configured stderr level.
pub const DIAGNOSTICS_TARGET: &str = "memcalc.diagnostics";

const DEFAULT_LEVEL: &str = "info";

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level for stderr logging: a simple level (`info`, `debug`, ...) or `EnvFilter`
    /// directives. `RUST_LOG` is merged in when set.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append the calculation report to the given file.
    ///
    /// If the file cannot be opened, a warning is logged and the calculation proceeds.
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        DEFAULT_LEVEL.to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    /// The configured level as `EnvFilter` directives.
    ///
    /// Simple levels are accepted in any case, plus `warning`; anything else is passed through as
    /// a directive string.
    pub(crate) fn level_directives(&self) -> String {
        let level = self.level.trim();
        if level.is_empty() {
            return Self::default_level();
        }
        if level.eq_ignore_ascii_case("warning") {
            return "warn".to_owned();
        }
        match level.parse::<tracing::Level>() {
            Ok(level) => level.as_str().to_ascii_lowercase(),
            Err(_) => level.to_owned(),
        }
    }

    /// Filter for the stderr layer: the configured directives followed by `RUST_LOG`.
    ///
    /// Unparseable input degrades to `RUST_LOG` alone, then to the configured level, then to
    /// `info`.
    pub fn stderr_filter(&self) -> EnvFilter {
        let configured = self.level_directives();
        let from_env = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let candidates = [
            from_env.as_ref().map(|env| format!("{configured},{env}")),
            from_env,
            Some(configured),
        ];
        candidates
            .into_iter()
            .flatten()
            .find_map(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
    }

    fn stderr_layer(&self) -> BoxedLayer {
        if !self.stderr {
            return tracing_subscriber::layer::Identity::new().boxed();
        }

        // `cargo test` only captures output written through the stdlib's print macros.
        let writer = if cfg!(debug_assertions) {
            BoxMakeWriter::new(TestWriter::with_stderr)
        } else {
            BoxMakeWriter::new(std::io::stderr)
        };
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        if self.json {
            layer.json().with_filter(self.stderr_filter()).boxed()
        } else {
            layer.with_filter(self.stderr_filter()).boxed()
        }
    }

    /// Layer that appends [`DIAGNOSTICS_TARGET`] events at `info` and above to `file`.
    ///
    /// The file is shared through an `Arc`; each event is written with a single append.
    fn diagnostics_layer(&self, file: Arc<File>) -> BoxedLayer {
        let only_diagnostics = filter_fn(|meta| {
            meta.target() == DIAGNOSTICS_TARGET && *meta.level() <= tracing::Level::INFO
        });
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false);
        if self.json {
            layer.json().with_filter(only_diagnostics).boxed()
        } else {
            layer.with_filter(only_diagnostics).boxed()
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Initializes structured `tracing` logging.
///
/// Installs a stderr layer filtered by [`LoggingConfig::stderr_filter`] and, when
/// [`LoggingConfig::file`] is set, the diagnostics file layer. Only the first call installs a
/// global subscriber.
pub fn init_tracing(logging: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let opened = logging.file.as_ref().map(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| (path, err))
        });

        let (file_layer, open_error) = match opened {
            Some(Ok(file)) => (Some(logging.diagnostics_layer(Arc::new(file))), None),
            Some(Err(failure)) => (None, Some(failure)),
            None => (None, None),
        };

        let layers: Vec<BoxedLayer> = std::iter::once(logging.stderr_layer())
            .chain(file_layer)
            .collect();
        let subscriber = tracing_subscriber::registry().with(layers);
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            return;
        }
        if let Some((path, error)) = open_error {
            tracing::warn!(
                target: "memcalc.config",
                path = %path.display(),
                error = %error,
                "failed to open diagnostics log file; the report will only go to stderr"
            );
        }
    });
}

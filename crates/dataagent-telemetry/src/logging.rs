//! Logging setup: level/format/target configuration over `tracing-subscriber`.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{TelemetryError, TelemetryResult};

/// Output formatting for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human-readable (development default).
    #[default]
    Pretty,
    /// Single-line key=value (production-friendly, greppable).
    Compact,
    /// Structured JSON, one object per line.
    Json,
}

/// Where log output is written.
#[derive(Debug, Clone)]
pub enum LogTarget {
    /// Process stdout.
    Stdout,
    /// A file, rotated daily via `tracing-appender`.
    File {
        /// Directory the rotated files are written into.
        directory: PathBuf,
        /// File name prefix.
        prefix: String,
    },
}

impl Default for LogTarget {
    fn default() -> Self {
        Self::Stdout
    }
}

/// Logging configuration, built fluently and passed to [`setup_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    level: String,
    format: LogFormat,
    target: LogTarget,
    directives: Vec<String>,
}

impl LogConfig {
    /// Start a config at the given base level (e.g. `"info"`, `"debug"`).
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            directives: Vec::new(),
        }
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Write to a rotated file instead of stdout.
    #[must_use]
    pub fn with_file_target(mut self, directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        self.target = LogTarget::File {
            directory: directory.into(),
            prefix: prefix.into(),
        };
        self
    }

    /// Add a per-module directive (e.g. `"dataagent_mcp=trace"`) on top of
    /// the base level.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut filter = EnvFilter::try_new(&self.level)
            .map_err(|e| TelemetryError::ConfigError(e.to_string()))?;
        for directive in &self.directives {
            filter = filter.add_directive(
                directive
                    .parse()
                    .map_err(|e: tracing_subscriber::filter::ParseError| {
                        TelemetryError::ConfigError(e.to_string())
                    })?,
            );
        }
        Ok(filter)
    }
}

/// Install a global `tracing` subscriber built from `config`.
///
/// # Errors
/// Returns [`TelemetryError::InitError`] if a global subscriber is already
/// set, or [`TelemetryError::ConfigError`] if `config`'s level/directives
/// don't parse.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.env_filter()?;

    match &config.target {
        LogTarget::Stdout => {
            let registry = tracing_subscriber::registry().with(filter);
            match config.format {
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
            }
        },
        LogTarget::File { directory, prefix } => {
            let appender = tracing_appender::rolling::daily(directory, prefix);
            let registry = tracing_subscriber::registry().with(filter);
            match config.format {
                LogFormat::Pretty => registry.with(fmt::layer().pretty().with_writer(appender)).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact().with_writer(appender)).try_init(),
                LogFormat::Json => registry.with(fmt::layer().json().with_writer(appender)).try_init(),
            }
        },
    }
    .map_err(|e| TelemetryError::InitError(e.to_string()))
}

/// Convenience wrapper: `info`-level, pretty, stdout.
///
/// # Errors
/// See [`setup_logging`].
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::new("info"))
}

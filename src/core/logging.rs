//! Diagnostic logging.
//!
//! Logs go to stderr (or `KEYPROBE_LOG_FILE`) so stdout stays reserved for
//! command output. Credential values only ever reach a log line through
//! [`Redacted`]; batch work runs inside a [`batch_span`] so every task event
//! carries the batch generation.

use std::fmt;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_LEVEL_ENV: &str = "KEYPROBE_LOG";
pub const LOG_FORMAT_ENV: &str = "KEYPROBE_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "KEYPROBE_LOG_FILE";

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event, with batch span open/close records.
    Json,
    Compact,
}

impl LogFormat {
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "pretty" => Some(Self::Human),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Parse a level name. `verbose` and `critical` are accepted as aliases.
#[must_use]
pub fn parse_level(s: &str) -> Option<LevelFilter> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" | "verbose" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "error" | "critical" => Some(LevelFilter::ERROR),
        "off" | "none" => Some(LevelFilter::OFF),
        _ => None,
    }
}

/// Where and how much to log, resolved before any command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::ERROR,
            format: LogFormat::Human,
            file: None,
        }
    }
}

impl LogSettings {
    /// Resolve with `--log-level` > `KEYPROBE_LOG` > config file > `error`.
    ///
    /// `--verbose` raises the level to at least `debug`; `--json` forces
    /// JSON log lines so stderr stays machine-readable too.
    #[must_use]
    pub fn resolve(
        cli_level: Option<&str>,
        config_level: Option<&str>,
        verbose: bool,
        json_output: bool,
    ) -> Self {
        Self::resolve_with(cli_level, config_level, verbose, json_output, |key| {
            std::env::var(key).ok()
        })
    }

    fn resolve_with(
        cli_level: Option<&str>,
        config_level: Option<&str>,
        verbose: bool,
        json_output: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let env_level = env(LOG_LEVEL_ENV);
        let mut level = [cli_level, env_level.as_deref(), config_level]
            .into_iter()
            .flatten()
            .find_map(parse_level)
            .unwrap_or(LevelFilter::ERROR);
        if verbose {
            level = level.max(LevelFilter::DEBUG);
        }

        let format = if json_output {
            LogFormat::Json
        } else {
            env(LOG_FORMAT_ENV)
                .as_deref()
                .and_then(LogFormat::from_arg)
                .unwrap_or_default()
        };

        let file = env(LOG_FILE_ENV)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Self {
            level,
            format,
            file,
        }
    }

    /// `RUST_LOG` wins when set; otherwise only this crate's events pass.
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("keyprobe={}", self.level)))
    }

    /// The file writer, falling back to stderr when the file cannot be opened.
    fn writer(&self) -> BoxMakeWriter {
        let Some(path) = &self.file else {
            return BoxMakeWriter::new(std::io::stderr);
        };
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => BoxMakeWriter::new(Arc::new(file)),
            Err(err) => {
                eprintln!("keyprobe: cannot open log file {}: {err}", path.display());
                BoxMakeWriter::new(std::io::stderr)
            }
        }
    }

    /// Install the global subscriber. A second call is a no-op.
    pub fn init(&self) {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(self.writer())
            .with_target(false);
        let _ = match self.format {
            LogFormat::Human => builder.try_init(),
            LogFormat::Compact => builder.compact().without_time().try_init(),
            LogFormat::Json => builder
                .json()
                .with_current_span(true)
                .with_span_events(FmtSpan::CLOSE)
                .try_init(),
        };
    }
}

/// Log-safe view of a credential: its first four characters and length.
///
/// Values of eight characters or fewer show only the length.
#[derive(Clone, Copy)]
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.0.chars().count();
        if len <= 8 {
            return write!(f, "[redacted len={len}]");
        }
        let head: String = self.0.chars().take(4).collect();
        write!(f, "{head}[redacted len={len}]")
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Span wrapping one batch run.
#[must_use]
pub fn batch_span(generation: u64, total: usize, concurrency: usize) -> tracing::Span {
    tracing::info_span!("batch", generation, total, concurrency)
}

//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux: `~/.config/keyprobe/config.toml`
//! - macOS: `~/Library/Application Support/keyprobe/config.toml`
//! - Windows: `%APPDATA%/keyprobe/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `KEYPROBE_CONFIG`: Override config file path
//! - `KEYPROBE_CONCURRENCY`: Simultaneous checks in a batch
//! - `KEYPROBE_TIMEOUT`: Request timeout in seconds
//! - `KEYPROBE_FORMAT`: Output format (human, json, md)
//! - `KEYPROBE_NO_COLOR` or `NO_COLOR`: Disable colors
//! - `KEYPROBE_PRETTY`: Pretty-print JSON output (1, true, yes)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::cli::args::{Cli, OutputFormat};
use crate::core::classifier::Classifier;
use crate::core::http::DEFAULT_TIMEOUT;
use crate::core::provider::Provider;
use crate::core::scheduler::{DEFAULT_CONCURRENCY, normalize_concurrency};
use crate::core::verifier::VerifyContext;
use crate::error::{KeyprobeError, Result};
use crate::util::env::is_env_truthy;

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable for output format.
pub const ENV_FORMAT: &str = "KEYPROBE_FORMAT";
/// Environment variable for timeout in seconds.
pub const ENV_TIMEOUT: &str = "KEYPROBE_TIMEOUT";
/// Environment variable for batch concurrency.
pub const ENV_CONCURRENCY: &str = "KEYPROBE_CONCURRENCY";
/// Environment variable to disable colors.
pub const ENV_NO_COLOR: &str = "KEYPROBE_NO_COLOR";
/// Standard environment variable to disable colors.
pub const ENV_NO_COLOR_STD: &str = "NO_COLOR";
/// Environment variable for pretty JSON output.
pub const ENV_PRETTY: &str = "KEYPROBE_PRETTY";
/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "KEYPROBE_CONFIG";

/// Upper bound for the request timeout.
pub const MAX_TIMEOUT_SECONDS: u64 = 300;

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Output format.
    pub format: OutputFormat,
    /// Request timeout.
    pub timeout: Duration,
    /// Simultaneous checks in a batch.
    pub concurrency: usize,
    /// Whether to disable colored output.
    pub no_color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
    /// Provider for generic `sk-` keys.
    pub fallback_provider: Provider,
    /// The loaded file config, for per-provider settings.
    pub file: Config,
    /// Source of each setting for debugging.
    pub sources: ConfigSources,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub format: ConfigSource,
    pub timeout: ConfigSource,
    pub concurrency: ConfigSource,
    pub no_color: ConfigSource,
    pub pretty: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl ResolvedConfig {
    /// Resolve final configuration from CLI args, environment variables, and
    /// the config file.
    ///
    /// `concurrency` is the raw `--concurrency` value of commands that have one.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid, or if any
    /// resolved value is invalid.
    pub fn resolve(cli: &Cli, concurrency: Option<&str>) -> Result<Self> {
        let config = Config::load_effective()?;
        Self::resolve_with(cli, concurrency, config)
    }

    /// Resolve against an already loaded config.
    ///
    /// # Errors
    ///
    /// See [`ResolvedConfig::resolve`].
    pub fn resolve_with(cli: &Cli, concurrency: Option<&str>, config: Config) -> Result<Self> {
        config.validate()?;

        let mut sources = ConfigSources::default();
        let format = Self::resolve_format(cli, &config, &mut sources.format)?;
        let timeout = Self::resolve_timeout(cli, &config, &mut sources.timeout)?;
        let concurrency = Self::resolve_concurrency(concurrency, &config, &mut sources.concurrency);
        let no_color = Self::resolve_no_color(cli, &config, &mut sources.no_color);
        let pretty = Self::resolve_pretty(cli, &config, &mut sources.pretty);
        let fallback_provider = Provider::from_cli_name(&config.classifier.fallback_provider)?;

        tracing::debug!(
            format = ?format,
            timeout_secs = timeout.as_secs(),
            concurrency,
            "Resolved configuration"
        );

        Ok(Self {
            format,
            timeout,
            concurrency,
            no_color,
            pretty,
            fallback_provider,
            file: config,
            sources,
        })
    }

    fn resolve_format(cli: &Cli, config: &Config, source: &mut ConfigSource) -> Result<OutputFormat> {
        // --json is unambiguous
        if cli.json {
            *source = ConfigSource::Cli;
            return Ok(OutputFormat::Json);
        }

        if let Some(format) = cli.format {
            *source = ConfigSource::Cli;
            return Ok(format);
        }

        if let Ok(format_env) = std::env::var(ENV_FORMAT) {
            *source = ConfigSource::Env;
            return OutputFormat::from_arg(&format_env);
        }

        if let Some(ref format_str) = config.output.format {
            *source = ConfigSource::ConfigFile;
            return OutputFormat::from_arg(format_str);
        }

        *source = ConfigSource::Default;
        Ok(OutputFormat::Human)
    }

    fn resolve_timeout(cli: &Cli, config: &Config, source: &mut ConfigSource) -> Result<Duration> {
        let check = |secs: u64, origin: &str| -> Result<Duration> {
            if secs == 0 || secs > MAX_TIMEOUT_SECONDS {
                return Err(KeyprobeError::ConfigInvalid {
                    key: "timeout".to_string(),
                    value: secs.to_string(),
                    message: format!(
                        "{origin} timeout must be between 1 and {MAX_TIMEOUT_SECONDS} seconds"
                    ),
                });
            }
            Ok(Duration::from_secs(secs))
        };

        if let Some(timeout) = cli.timeout {
            *source = ConfigSource::Cli;
            return check(timeout, "--timeout");
        }

        if let Ok(timeout_env) = std::env::var(ENV_TIMEOUT) {
            if let Ok(timeout) = timeout_env.trim().parse::<u64>() {
                *source = ConfigSource::Env;
                return check(timeout, ENV_TIMEOUT);
            }
            tracing::warn!(value = %timeout_env, "Ignoring non-numeric {ENV_TIMEOUT}");
        }

        if let Some(timeout) = config.general.timeout_seconds {
            *source = ConfigSource::ConfigFile;
            return check(timeout, "general.timeout_seconds");
        }

        *source = ConfigSource::Default;
        Ok(DEFAULT_TIMEOUT)
    }

    fn resolve_concurrency(cli: Option<&str>, config: &Config, source: &mut ConfigSource) -> usize {
        if let Some(raw) = cli {
            *source = ConfigSource::Cli;
            return normalize_concurrency(raw);
        }

        if let Ok(raw) = std::env::var(ENV_CONCURRENCY) {
            *source = ConfigSource::Env;
            return normalize_concurrency(&raw);
        }

        if let Some(n) = config.general.concurrency {
            *source = ConfigSource::ConfigFile;
            #[allow(clippy::cast_precision_loss)]
            return crate::core::scheduler::normalize_concurrency_value(n as f64);
        }

        *source = ConfigSource::Default;
        DEFAULT_CONCURRENCY
    }

    fn resolve_no_color(cli: &Cli, config: &Config, source: &mut ConfigSource) -> bool {
        if cli.no_color {
            *source = ConfigSource::Cli;
            return true;
        }

        if is_env_truthy(ENV_NO_COLOR) || std::env::var_os(ENV_NO_COLOR_STD).is_some() {
            *source = ConfigSource::Env;
            return true;
        }

        // config stores the positive form
        if !config.output.color {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    fn resolve_pretty(cli: &Cli, config: &Config, source: &mut ConfigSource) -> bool {
        if cli.pretty {
            *source = ConfigSource::Cli;
            return true;
        }

        if is_env_truthy(ENV_PRETTY) {
            *source = ConfigSource::Env;
            return true;
        }

        if config.output.pretty {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    /// Classifier using the configured fallback provider.
    #[must_use]
    pub const fn classifier(&self) -> Classifier {
        Classifier::new(self.fallback_provider)
    }

    /// Build the verifier context for a run.
    ///
    /// CLI `endpoint` and `model` override the `[custom]` section; neither
    /// touches the other providers.
    #[must_use]
    pub fn verify_context(
        &self,
        client: Client,
        endpoint: Option<String>,
        model: Option<String>,
    ) -> VerifyContext {
        let mut ctx = VerifyContext::new(client)
            .with_timeout(self.timeout)
            .with_endpoint(endpoint.or_else(|| self.file.custom.endpoint.clone()))
            .with_model(model);

        for (name, settings) in &self.file.providers {
            let Ok(provider) = Provider::from_cli_name(name) else {
                continue;
            };
            if let Some(base) = &settings.api_base {
                ctx.api_bases.insert(provider, base.clone());
            }
            if let Some(model) = &settings.model {
                ctx.models.insert(provider, model.clone());
            }
            if provider == Provider::Gemini {
                if let Some(paid) = &settings.paid_probe_model {
                    ctx.gemini_paid_model.clone_from(paid);
                }
            }
        }
        if let Some(model) = &self.file.custom.model {
            ctx.models.insert(Provider::Custom, model.clone());
        }
        ctx
    }
}

// =============================================================================
// File Configuration
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub classifier: ClassifierConfig,
    /// Per-provider settings keyed by provider id.
    pub providers: BTreeMap<String, ProviderSettings>,
    pub custom: CustomConfig,
    pub output: OutputConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Timeout for network requests in seconds; 30 when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    /// Default batch concurrency.
    pub concurrency: Option<i64>,
    /// Default log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            concurrency: None,
            log_level: None,
        }
    }
}

/// Classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Provider assigned to generic `sk-` keys.
    pub fallback_provider: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            fallback_provider: Provider::OpenAI.cli_name().to_string(),
        }
    }
}

/// Settings for a specific provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Custom API base URL (if different from default).
    pub api_base: Option<String>,
    /// Probe model.
    pub model: Option<String>,
    /// Paid-only model for the second Gemini probe.
    pub paid_probe_model: Option<String>,
}

/// Custom endpoint defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (human, json, md).
    pub format: Option<String>,
    /// Whether to use colors in output.
    pub color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            pretty: false,
        }
    }
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}

impl Config {
    /// Load configuration from the default config file path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load the config file, respecting the `KEYPROBE_CONFIG` override.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load_effective() -> Result<Self> {
        match std::env::var(ENV_CONFIG) {
            Ok(path) if !path.trim().is_empty() => Self::load_from(Path::new(path.trim())),
            _ => Self::load(),
        }
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| KeyprobeError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the write fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| KeyprobeError::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(path, content)?;
        tracing::debug!(?path, "Config file saved");
        Ok(())
    }

    /// Get the config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Validate configuration values.
    ///
    /// Checks provider ids, base URL schemes, the output format and the
    /// timeout bounds.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, value: &str, message: String| KeyprobeError::ConfigInvalid {
            key: key.to_string(),
            value: value.to_string(),
            message,
        };

        for (name, settings) in &self.providers {
            Provider::from_cli_name(name).map_err(|_| {
                invalid(
                    &format!("providers.{name}"),
                    name,
                    format!("unknown provider \"{name}\""),
                )
            })?;
            if let Some(base) = &settings.api_base {
                if !is_http_url(base) {
                    return Err(invalid(
                        &format!("providers.{name}.api_base"),
                        base,
                        "must start with http:// or https://".to_string(),
                    ));
                }
            }
        }

        if let Some(endpoint) = &self.custom.endpoint {
            if !is_http_url(endpoint) {
                return Err(invalid(
                    "custom.endpoint",
                    endpoint,
                    "must start with http:// or https://".to_string(),
                ));
            }
        }

        let fallback = &self.classifier.fallback_provider;
        Provider::from_cli_name(fallback).map_err(|_| {
            invalid(
                "classifier.fallback_provider",
                fallback,
                format!("unknown provider \"{fallback}\""),
            )
        })?;

        if let Some(format) = &self.output.format {
            OutputFormat::from_arg(format)
                .map_err(|_| invalid("output.format", format, "expected human, json or md".to_string()))?;
        }

        if let Some(timeout) = self.general.timeout_seconds {
            if timeout == 0 || timeout > MAX_TIMEOUT_SECONDS {
                return Err(invalid(
                    "general.timeout_seconds",
                    &timeout.to_string(),
                    format!("must be between 1 and {MAX_TIMEOUT_SECONDS} seconds"),
                ));
            }
        }

        Ok(())
    }
}

//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::aggregator::{SortColumn, SortDirection};
use crate::core::export::ExportMode;
use crate::core::provider::{Provider, ProviderFilter};
use crate::error::{KeyprobeError, Result};

/// keyprobe - Validate AI provider API keys in bulk.
#[derive(Parser, Debug)]
#[command(name = "keyprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Output format [default: human]
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format.unwrap_or_default()
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a single credential
    Check(CheckArgs),

    /// Check many credentials with bounded concurrency
    Batch(BatchArgs),

    /// Extract and dedupe credentials from pasted text
    Tidy(TidyArgs),

    /// List or test the models of an OpenAI-compatible endpoint
    Models(ModelsArgs),

    /// Look up the balance behind a credential
    Balance(BalanceArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options shared by commands that probe providers.
#[derive(Parser, Debug, Clone, Default)]
pub struct ProbeArgs {
    /// Provider (auto or a provider id)
    #[arg(long, short = 'p', value_name = "PROVIDER", default_value = "auto")]
    pub provider: String,

    /// Endpoint for the custom provider
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Model used for the probe request
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,
}

impl ProbeArgs {
    /// Parse the provider selector.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProvider` for unknown names.
    pub fn filter(&self) -> Result<ProviderFilter> {
        ProviderFilter::from_arg(&self.provider)
    }
}

/// Arguments for the `check` command.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Credential to check
    #[arg(value_name = "KEY")]
    pub key: String,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

/// Arguments for the `batch` command.
#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// Read credentials from a file (default: stdin)
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub probe: ProbeArgs,

    /// Maximum simultaneous checks
    #[arg(long, short = 'c', value_name = "N")]
    pub concurrency: Option<String>,

    /// Extract credentials from free text before checking
    #[arg(long)]
    pub tidy: bool,

    /// Sort the result table: index, balance, charge or gift, with optional :asc or :desc
    #[arg(long, value_name = "COLUMN[:DIR]")]
    pub sort: Option<String>,

    /// Print an export block after the table
    #[arg(long, value_enum, value_name = "MODE")]
    pub export: Option<ExportArg>,

    /// Write the export block to a file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH", requires = "export")]
    pub output: Option<PathBuf>,

    /// Do not print live progress to stderr
    #[arg(long)]
    pub no_progress: bool,
}

impl BatchArgs {
    /// Parse `--sort`.
    ///
    /// A bare column uses the column's first-click direction (descending).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for unknown columns or directions.
    pub fn sort_key(&self) -> Result<Option<(SortColumn, SortDirection)>> {
        let Some(raw) = self.sort.as_deref() else {
            return Ok(None);
        };
        let (column, direction) = match raw.split_once(':') {
            Some((column, direction)) => (column, SortDirection::from_arg(direction)?),
            None => (raw, SortDirection::Descending),
        };
        Ok(Some((SortColumn::from_arg(column)?, direction)))
    }
}

/// Export modes as CLI values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportArg {
    /// Valid keys grouped into Paid and Free
    ValidGrouped,
    /// Valid keys only
    ValidKeysOnly,
    /// Invalid keys with their message
    InvalidOnly,
    /// Every key with its message
    All,
}

impl From<ExportArg> for ExportMode {
    fn from(arg: ExportArg) -> Self {
        match arg {
            ExportArg::ValidGrouped => Self::ValidGrouped,
            ExportArg::ValidKeysOnly => Self::ValidKeysOnly,
            ExportArg::InvalidOnly => Self::InvalidOnly,
            ExportArg::All => Self::All,
        }
    }
}

/// Arguments for the `tidy` command.
#[derive(Parser, Debug)]
pub struct TidyArgs {
    /// Read text from a file (default: stdin)
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Provider pattern to extract (auto or a provider id)
    #[arg(long, short = 'p', value_name = "PROVIDER", default_value = "auto")]
    pub provider: String,

    /// Extract endpoint URLs instead of credentials
    #[arg(long)]
    pub urls: bool,
}

/// Arguments for the `models` command.
#[derive(Parser, Debug)]
pub struct ModelsArgs {
    /// OpenAI-compatible endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: String,

    /// API key for the endpoint
    #[arg(long, value_name = "KEY")]
    pub key: String,

    /// Models to test; may be repeated. Without it, models are only listed.
    #[arg(long = "test", value_name = "MODEL")]
    pub test: Vec<String>,

    /// Test every listed model
    #[arg(long, conflicts_with = "test")]
    pub test_all: bool,

    /// Maximum simultaneous model tests
    #[arg(long, short = 'c', value_name = "N")]
    pub concurrency: Option<String>,
}

/// Arguments for the `balance` command.
#[derive(Parser, Debug)]
pub struct BalanceArgs {
    /// Credential to look up
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Provider (deepseek, siliconflow or custom); detected when omitted
    #[arg(long, short = 'p', value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Endpoint for the custom provider
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
}

impl BalanceArgs {
    /// Parse `--provider`, if given.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProvider` for unknown names.
    pub fn provider(&self) -> Result<Option<Provider>> {
        self.provider
            .as_deref()
            .map(Provider::from_cli_name)
            .transpose()
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    #[default]
    Human,
    /// JSON output
    Json,
    /// Markdown output
    Md,
}

impl OutputFormat {
    /// Parse a format name (human, json, md/markdown).
    ///
    /// # Errors
    ///
    /// Returns `Config` for unknown names.
    pub fn from_arg(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "md" | "markdown" => Ok(Self::Md),
            _ => Err(KeyprobeError::Config(format!(
                "Invalid format '{s}'. Valid formats: human, json, md"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn batch_flags_parse() {
        let cli = Cli::try_parse_from([
            "keyprobe",
            "batch",
            "--file",
            "keys.txt",
            "--provider",
            "deepseek",
            "-c",
            "8",
            "--sort",
            "balance:asc",
            "--export",
            "valid-grouped",
        ])
        .unwrap();
        let Some(Commands::Batch(args)) = cli.command else {
            panic!("expected batch");
        };
        assert_eq!(args.concurrency.as_deref(), Some("8"));
        assert_eq!(args.export, Some(ExportArg::ValidGrouped));
        assert_eq!(
            args.sort_key().unwrap(),
            Some((SortColumn::Balance, SortDirection::Ascending))
        );
        assert_eq!(
            args.probe.filter().unwrap(),
            ProviderFilter::Single(Provider::Deepseek)
        );
    }

    #[test]
    fn bare_sort_column_is_descending() {
        let cli = Cli::try_parse_from(["keyprobe", "batch", "--sort", "gift"]).unwrap();
        let Some(Commands::Batch(args)) = cli.command else {
            panic!("expected batch");
        };
        assert_eq!(
            args.sort_key().unwrap(),
            Some((SortColumn::Gift, SortDirection::Descending))
        );
    }

    #[test]
    fn output_requires_export() {
        assert!(Cli::try_parse_from(["keyprobe", "batch", "--output", "x.txt"]).is_err());
    }

    #[test]
    fn json_flag_wins() {
        let cli = Cli::try_parse_from(["keyprobe", "--json", "tidy"]).unwrap();
        assert_eq!(cli.effective_format(), OutputFormat::Json);
    }

    #[test]
    fn format_names() {
        assert_eq!(OutputFormat::from_arg("Markdown").unwrap(), OutputFormat::Md);
        assert!(OutputFormat::from_arg("yaml").is_err());
    }
}

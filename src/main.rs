//! keyprobe - AI provider API key checker
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::{CommandFactory, Parser};
use std::process::ExitCode;

use keyprobe::cli::{Cli, Commands};
use keyprobe::core::logging;
use keyprobe::storage::{Config, ResolvedConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_level = config_log_level();
    logging::LogSettings::resolve(
        cli.log_level.as_deref(),
        config_level.as_deref(),
        cli.verbose,
        cli.json_output,
    )
    .init();

    let format = cli.effective_format();
    let no_color = cli.no_color || !keyprobe::util::env::should_use_color(cli.no_color);
    let pretty = cli.pretty;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            let error_output =
                keyprobe::render::error::render_error_full(&e, format, no_color, pretty);
            eprintln!("{error_output}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// Log level from the config file; a broken file is reported later by
/// config resolution.
fn config_log_level() -> Option<String> {
    Config::load_effective().ok()?.general.log_level
}

async fn run(cli: Cli) -> keyprobe::Result<()> {
    let concurrency = match &cli.command {
        Some(Commands::Batch(args)) => args.concurrency.as_deref(),
        _ => None,
    };

    match &cli.command {
        None => {
            print_quickstart();
            Ok(())
        }

        Some(Commands::Completions { shell }) => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "keyprobe", &mut std::io::stdout());
            Ok(())
        }

        Some(command) => {
            let mut config = ResolvedConfig::resolve(&cli, concurrency)?;
            // terminal detection applies on top of the resolved setting
            config.no_color = config.no_color || !keyprobe::util::env::should_use_color(false);

            match command {
                Commands::Check(args) => keyprobe::cli::check::execute(args, &config).await,
                Commands::Batch(args) => keyprobe::cli::batch::execute(args, &config).await,
                Commands::Tidy(args) => keyprobe::cli::tidy::execute(args, &config),
                Commands::Models(args) => keyprobe::cli::models::execute(args, &config).await,
                Commands::Balance(args) => keyprobe::cli::balance::execute(args, &config).await,
                Commands::Completions { .. } => Ok(()),
            }
        }
    }
}

/// Print quickstart help when no command is given.
fn print_quickstart() {
    println!(
        r"keyprobe - Validate AI provider API keys in bulk

USAGE:
    keyprobe [OPTIONS] <COMMAND>

COMMANDS:
    check       Check a single credential
    batch       Check many credentials with bounded concurrency
    tidy        Extract and dedupe credentials from pasted text
    models      List or test the models of an OpenAI-compatible endpoint
    balance     Look up the balance behind a credential

QUICK START:
    keyprobe check sk-...                          # Detect provider and check one key
    keyprobe batch -f keys.txt -c 8                # Check a file of keys, 8 at a time
    pbpaste | keyprobe batch --tidy                # Pull keys out of pasted text
    keyprobe batch -f keys.txt --export valid-grouped -o valid.txt
    keyprobe balance sk-... --provider deepseek    # Show remaining balance

ROBOT MODE:
    keyprobe batch -f keys.txt --json              # JSON output
    keyprobe batch -f keys.txt --format md         # Markdown output

For more help: keyprobe --help
"
    );
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
}

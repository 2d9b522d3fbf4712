//! Batch command implementation.

use std::sync::PoisonError;

use tokio::sync::mpsc;

use crate::cli::args::BatchArgs;
use crate::cli::input::read_input;
use crate::core::batch::{BatchEvent, BatchOptions, BatchRunner, split_input};
use crate::core::export::{self, ExportMode};
use crate::core::http;
use crate::error::{KeyprobeError, Result};
use crate::providers::default_registry;
use crate::render::{self, BatchReport, human};
use crate::storage::ResolvedConfig;

/// Execute the batch command.
///
/// Progress lines go to stderr while tasks finish; the final table goes to
/// stdout. Invalid credentials do not make the command fail.
///
/// # Errors
///
/// Returns an error if the input is missing or empty, an argument is
/// invalid, or the export file cannot be written.
pub async fn execute(args: &BatchArgs, config: &ResolvedConfig) -> Result<()> {
    let filter = args.probe.filter()?;
    let sort = args.sort_key()?;

    let text = read_input(args.file.as_deref())?;
    let options = BatchOptions {
        filter,
        concurrency: config.concurrency,
        tidy: args.tidy,
    };
    let values = split_input(&text, &options);
    if values.is_empty() {
        return Err(KeyprobeError::EmptyInput);
    }

    let client = http::build_client(config.timeout)?;
    let ctx = config.verify_context(client, args.probe.endpoint.clone(), args.probe.model.clone());
    let runner = BatchRunner::new(default_registry(), ctx, config.classifier());

    tracing::info!(
        count = values.len(),
        concurrency = options.concurrency,
        "Starting batch"
    );

    let show_progress = !args.no_progress;
    let no_color = config.no_color;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let progress = async move {
        while let Some(event) = rx.recv().await {
            if let BatchEvent::Completed { task, tally, .. } = event {
                if show_progress {
                    eprintln!("{}", human::render_progress(&task, &tally, no_color));
                }
            }
        }
    };
    let (outcome, ()) = tokio::join!(runner.run(values, options, Some(tx)), progress);
    let outcome = outcome?;

    let state = runner.state();
    let mut report = {
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((column, direction)) = sort {
            state.sort_by(column, direction);
        }
        let index_order = state.tasks_in_index_order().to_vec();
        let export = args
            .export
            .map(|mode| export::format(&index_order, ExportMode::from(mode)));
        BatchReport {
            tally: outcome.tally,
            sort: state.sort_state(),
            tasks: state.tasks_in_display_order().cloned().collect(),
            export,
        }
    };

    if let (Some(path), Some(export)) = (&args.output, report.export.take()) {
        std::fs::write(path, &export)?;
        tracing::info!(?path, "Export written");
    }

    let output = render::render_batch(&report, config.format, config.pretty, config.no_color)?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

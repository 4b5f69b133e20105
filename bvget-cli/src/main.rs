mod cli;
mod error;
mod filename;
mod input;
mod ledger;
mod orchestrator;
mod output;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{Level, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use transfer_engine::ProgressReporter;

use crate::cli::Args;
use crate::error::{AppError, Result};
use crate::ledger::Ledger;
use crate::orchestrator::{RunContext, TaskOutcome};

const LEDGER_FILE: &str = "downloaded.txt";

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    // Everything that would doom the whole batch is checked up front:
    // external tools, a usable URL list, and the signing key.
    transfer_engine::ensure_tools().await?;

    let urls = input::read_url_list(&args.input)?;
    if urls.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "no URLs found in {}",
            args.input.display()
        )));
    }
    info!(count = urls.len(), input = %args.input.display(), "loaded URL list");

    tokio::fs::create_dir_all(&args.dir).await?;

    let api_client = bili_api::default_client();
    let keys = bili_api::WbiKeys::fetch(&api_client).await?;
    info!("obtained wbi keys");

    let mut ledger = Ledger::load(args.dir.join(LEDGER_FILE))?;
    if !ledger.is_empty() {
        info!(known = ledger.len(), "loaded download ledger");
    }

    let (tx, rx) = mpsc::channel(64);
    let renderer = output::spawn_renderer(rx);

    let ctx = RunContext {
        api_client,
        dl_client: transfer_engine::download_client(),
        keys,
        dir: args.dir,
        mode: args.mode,
        to_mp3: args.mp3,
        date_suffix: args.date_suffix,
        dedup: args.dedup,
        on_duplicate: args.on_duplicate,
        progress: ProgressReporter::new(tx),
    };

    let mut completed = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    for url in &urls {
        match orchestrator::run_url(&ctx, &mut ledger, url).await {
            Ok(TaskOutcome::Completed) => completed += 1,
            Ok(TaskOutcome::SkippedDuplicate) => skipped += 1,
            Err(e) => {
                failed += 1;
                error!(%url, "task failed: {e}");
            }
        }
    }

    // Dropping the context drops the last progress sender; the renderer
    // drains and exits.
    drop(ctx);
    let _ = renderer.await;

    info!(
        total = urls.len(),
        completed, skipped, failed, "batch finished"
    );
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
}

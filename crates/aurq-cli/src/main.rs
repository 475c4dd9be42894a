use std::env;

use aurq_config::config::{self, generate_default_config, get_config, set_config_path};
use aurq_registry::{CancelToken, Query, QueryClient, QueryOutcome, RegistryError, SearchBy};
use aurq_utils::path::resolve_path;
use clap::Parser;
use cli::{Args, Commands};
use client::QueryContext;
use display::{print_json, print_package_info, print_search_results, report_failures};
use error::{CliError, CliResult};
use logging::setup_logging;
use tracing::{debug, info};
use utils::set_color;

mod cli;
mod client;
mod display;
mod error;
mod logging;
mod utils;

/// Runs `work` on a blocking thread until it finishes or Ctrl-C arrives.
///
/// On Ctrl-C the token is fired and the thread is abandoned, so a request
/// stuck on the network does not hold up the exit.
async fn run_blocking<T, F>(cancel: &CancelToken, work: F) -> CliResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> aurq_registry::Result<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);
    tokio::select! {
        joined = task => Ok(joined??),
        _ = tokio::signal::ctrl_c() => {
            debug!("Interrupted, cancelling outstanding work");
            cancel.cancel();
            Err(RegistryError::Cancelled.into())
        }
    }
}

async fn run_query(ctx: &QueryContext, query: Query) -> CliResult<QueryOutcome> {
    let mut client = ctx.client()?;
    debug!(
        backend = %ctx.backend,
        needles = query.needles.len(),
        by = %query.by,
        contains = query.contains,
        "running query"
    );
    run_blocking(&ctx.cancel, move || client.get(&query)).await
}

fn finish(outcome: QueryOutcome, json: bool, detailed: bool) -> CliResult<()> {
    if json {
        print_json(&outcome.packages)?;
    } else if detailed {
        print_package_info(&outcome.packages);
    } else {
        print_search_results(&outcome.packages);
    }

    if outcome.failures.is_empty() {
        return Ok(());
    }
    report_failures(&outcome.failures);
    Err(CliError::Incomplete {
        failed: outcome.failures.len(),
    })
}

async fn handle_cli() -> CliResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        set_color(false);
    }

    if let Some(ref c) = args.config {
        set_config_path(resolve_path(c)?);
    }

    if !matches!(args.command, Commands::DefConfig) {
        config::init()?;
    }

    let ctx = QueryContext::new(&args, get_config(), CancelToken::new())?;

    match args.command {
        Commands::Search { needles, by } => {
            let by = match by {
                Some(by) => by.parse()?,
                None => ctx.config.get_default_search_by(),
            };
            let outcome = run_query(&ctx, Query::new(needles, by, true)).await?;
            finish(outcome, args.json, false)?;
        }
        Commands::Info { names, by } => {
            let by = match by {
                Some(by) => by.parse()?,
                None => SearchBy::Name,
            };
            let outcome = run_query(&ctx, Query::new(names, by, false)).await?;
            finish(outcome, args.json, true)?;
        }
        Commands::Sync { force } => {
            let mut client = ctx.snapshot_client()?;
            let count = run_blocking(&ctx.cancel, move || {
                if force {
                    client.refresh()
                } else {
                    client.load().map(|packages| packages.len())
                }
            })
            .await?;
            info!("Snapshot ready with {count} packages");
        }
        Commands::Config => {
            let doc = ctx.config.to_annotated_document()?;
            info!("{doc}");
        }
        Commands::DefConfig => {
            generate_default_config()?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if env::var_os("NO_COLOR").is_some() {
        set_color(false);
    }

    if let Err(err) = handle_cli().await {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}

//! CLI entry point - the composition root.
//!
//! Parses arguments, wires infrastructure via [`bootstrap`] and dispatches
//! to a handler. Polling loops are stopped on exit; the persisted queue is
//! left as is so the next invocation picks it up.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fsb_cli::{Cli, CliConfig, CliError, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::from_cli(&cli)?;
    let ctx = bootstrap(config).await?;

    let result = handlers::dispatch(&ctx, cli.command).await;
    ctx.tasks().shutdown().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

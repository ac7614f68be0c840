//! `dockercp` - copy files and directories out of a container.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.debug);

    match cli.command {
        Commands::Cp(args) => commands::cp::execute(args, &cli.global).await,
        Commands::Ps(args) => commands::ps::execute(args, &cli.global).await,
    }
}

/// Log to stderr, filtered by `RUST_LOG`; `--debug` raises the default level.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    if let Err(e) = tracing_subscriber::fmt()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init()
    {
        eprintln!("Failed to initialize tracing: {}", e);
    }
}

// rolekeeper - assume-role session broker for AWS profiles

mod assume;
mod cli;
mod config;
mod environment;
mod error;
mod models;
mod session;
mod status;
mod store;
mod sts;

use clap::Parser;
use error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first to get verbose flag
    let args = cli::Cli::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::execute(args).await
}

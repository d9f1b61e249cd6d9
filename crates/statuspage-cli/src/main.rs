//! Status page CLI: the `statuspage` command.

mod cli;
mod commands;
mod lock;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "statuspage=info,statuspage_core=info";

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            document,
            out,
            dev,
            feed_url,
            json,
        } => commands::generate::run(commands::generate::Args {
            document,
            out,
            dev,
            feed_url,
            json,
        }),

        Commands::AddIds {
            document,
            dry_run,
            json,
        } => commands::add_ids::run(document, dry_run, json),

        Commands::Status { document, json } => commands::status::run(document, json),

        Commands::Event { command } => commands::event::run(command),

        Commands::Init { path, json } => commands::init::run(path, json),
    }
}

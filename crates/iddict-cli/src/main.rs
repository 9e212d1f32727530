mod cli;
mod commands;
mod config;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use iddict_sqlite::DatabaseContext;

use cli::{Cli, Commands};
use output::{print_error, print_warning};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(url) = &cli.database {
        config.database.url.clone_from(url);
    }
    observability::init_tracing(&config.logging.level);
    debug!(url = %config.database.url, "Configuration loaded");

    let stores = commands::open_stores(&config)?;
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                print_warning("Interrupted, cancelling");
                cancel.cancel();
            }
        })
    };

    let result = match &cli.command {
        Commands::Stats => commands::stats::stats(&stores, &cancel).await,
        Commands::List(args) => commands::list::list(&stores, args, &cancel).await,
        Commands::Prune(args) => commands::prune::prune(&stores, args, &cancel).await,
    };

    interrupt.abort();
    if let Some(database) = stores.context().opened() {
        database.close().await;
    }
    result
}

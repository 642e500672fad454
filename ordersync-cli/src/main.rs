//! ordersync keeps a local order database in line with an external
//! spreadsheet, converting prices with a live exchange-rate feed.

mod api;
mod cli;
mod config;
mod error;
mod services;
mod store;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { interval } => cli::commands::sync::handle_run(&config, interval).await,
        Commands::Sync => cli::commands::sync::handle_sync(&config).await,
        Commands::Init => cli::commands::sync::handle_init(&config).await,
        Commands::List => cli::commands::orders::handle_list(&config).await,
        Commands::Complete { order_num, undo } => {
            cli::commands::orders::handle_complete(&config, order_num, undo).await
        }
    }
}

//! Command-line interface definitions.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ordersync", about = "Reconciles spreadsheet orders into a local database")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the reconciliation loop forever
    Run {
        /// Seconds between passes (overrides the configured interval)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Run a single reconciliation pass and exit
    Sync,
    /// Create the database schema and exit
    Init,
    /// Print the stored orders
    List,
    /// Mark an order's delivery as completed
    Complete {
        /// Business key of the order
        order_num: i64,
        /// Mark as not completed instead
        #[arg(long)]
        undo: bool,
    },
}

//! Command-line interface module.
//!
//! This module provides the CLI functionality for:
//! - Running the listener (`serve`)
//! - Checking the effective configuration (`config`)

pub mod commands;
pub mod handlers;

use clap::Parser;

pub use commands::Commands;
pub use handlers::{handle_config, handle_serve};

#[derive(Parser)]
#[command(
    name = "pipeline-inspector",
    author,
    version,
    about = "Renders function pipeline step events to stdout"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

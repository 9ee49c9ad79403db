pub mod config;
pub mod serve;

pub use config::{ConfigCommand, LoggingConfig};
pub use serve::ServeCommand;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Pipeline Inspector listener
    Serve(ServeCommand),
    /// Print the effective configuration
    Config(ConfigCommand),
}

impl Commands {
    pub fn logging(&self) -> &LoggingConfig {
        match self {
            Commands::Serve(cmd) => &cmd.logging,
            Commands::Config(cmd) => &cmd.logging,
        }
    }

    pub fn config_path(&self) -> Option<&std::path::Path> {
        match self {
            Commands::Serve(cmd) => cmd.config.as_deref(),
            Commands::Config(cmd) => cmd.config.as_deref(),
        }
    }
}

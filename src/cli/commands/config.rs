use clap::Args;
use std::path::PathBuf;

/// Logging options shared by every subcommand
#[derive(Debug, Clone, Default, Args)]
pub struct LoggingConfig {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", env = "PIPELINE_INSPECTOR_DEBUG")]
    pub debug: bool,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log filter directives, e.g. `pipeline_inspector_core=trace,tonic=info`
    #[arg(long = "log-filter", env = "PIPELINE_INSPECTOR_LOG_FILTER")]
    pub log_filter: Option<String>,
}

impl LoggingConfig {
    /// Level implied by the flags, given the `debug` setting from the
    /// configuration files.
    pub fn get_effective_level(&self, debug_setting: bool) -> &'static str {
        match (self.verbose, self.debug || debug_setting) {
            (v, _) if v >= 2 => "trace",
            (1, _) | (_, true) => "debug",
            _ => "info",
        }
    }
}

/// Arguments of the `config` subcommand
#[derive(Debug, Args)]
pub struct ConfigCommand {
    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingConfig,
}

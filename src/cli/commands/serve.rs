use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use super::LoggingConfig;
use crate::config::{parse_duration, Settings};
use crate::render::RenderMode;

/// Arguments of the `serve` subcommand. Every flag overrides the matching
/// configuration setting when given.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Unix socket path, `unix:///path` or `tcp://host:port` to listen on
    #[arg(long, value_name = "PATH", env = "PIPELINE_INSPECTOR_SOCKET")]
    pub socket_path: Option<String>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<RenderMode>,

    /// Maximum inbound message size in bytes [default: 4194304]
    #[arg(long, value_name = "BYTES", env = "MAX_RECV_MSG_SIZE")]
    pub max_recv_msg_size: Option<usize>,

    /// Time allowed for in-flight calls on shutdown, e.g. 500ms, 5s, 1m [default: 5s]
    #[arg(long, value_name = "DURATION", env = "SHUTDOWN_TIMEOUT", value_parser = parse_duration)]
    pub shutdown_timeout: Option<Duration>,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl ServeCommand {
    /// Overlay the flags on `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(address) = &self.socket_path {
            settings.server.address = address.clone();
        }
        if let Some(format) = self.format {
            settings.output.format = format;
        }
        if let Some(size) = self.max_recv_msg_size {
            settings.server.max_recv_msg_size = size;
        }
        if let Some(timeout) = self.shutdown_timeout {
            settings.server.shutdown_timeout = timeout;
        }
        if self.logging.debug {
            settings.debug = true;
        }
    }
}

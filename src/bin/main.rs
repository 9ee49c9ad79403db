//! Pipeline Inspector binary.
//!
//! Listens for pipeline step events and renders them to stdout. Diagnostics
//! are logged to stderr so they never mix with the event stream.

use clap::Parser;
use pipeline_inspector_core::{
    cli::{handle_config, handle_serve, Cli, Commands},
    config::Settings,
};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.command.config_path())?;
    if let Commands::Serve(cmd) = &cli.command {
        cmd.apply_to(&mut settings);
    }

    // Initialize logging
    let logging = cli.command.logging();
    let level = logging.get_effective_level(settings.debug);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.parse().unwrap_or(Level::INFO).into())
                .parse_lossy(logging.log_filter.as_deref().unwrap_or("")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    match cli.command {
        Commands::Serve(_) => {
            info!(version = env!("CARGO_PKG_VERSION"), "Pipeline Inspector starting up");
            handle_serve(settings).await?;
        }
        Commands::Config(_) => handle_config(settings)?,
    }

    Ok(())
}

use anyhow::{Context, Result};
use std::future::Future;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    listener::{ListenAddress, Listener, StopReason},
    service::Inspector,
    signals::shutdown_signal,
};

/// Run the listener until SIGTERM or SIGINT.
pub async fn handle_serve(settings: Settings) -> Result<()> {
    run_server(settings, shutdown_signal()).await.map(|_| ())
}

/// Run the listener until `shutdown` resolves.
pub async fn run_server<F>(settings: Settings, shutdown: F) -> Result<StopReason>
where
    F: Future<Output = ()>,
{
    let config = settings
        .listener_config()
        .context("Invalid server configuration")?;

    if let ListenAddress::Unix(path) = &config.address {
        prepare_socket_path(path)
            .await
            .with_context(|| format!("Failed to prepare socket path {}", path.display()))?;
    }

    let address = config.address.clone();
    let bound = Listener::new(config)
        .bind()
        .await
        .context("Failed to start listener")?;

    let format = settings.output.format;
    info!(address = %address, format = %format, "Pipeline Inspector listening");

    let result = bound.serve(Inspector::new(format), shutdown).await;

    if let ListenAddress::Unix(path) = &address {
        if let Err(e) = remove_socket_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove socket file");
        }
    }

    let reason = result.context("Server error")?;
    info!(reason = ?reason, "Pipeline Inspector stopped");
    Ok(reason)
}

/// Print the effective configuration as YAML.
pub fn handle_config(settings: Settings) -> Result<()> {
    settings
        .listener_config()
        .context("Invalid server configuration")?;
    let rendered = serde_yaml::to_string(&settings).context("Failed to serialize settings")?;
    print!("{}", rendered);
    Ok(())
}

/// Create the socket's parent directory and clear a stale socket left by a
/// previous run.
async fn prepare_socket_path(path: &Path) -> crate::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o750);
        builder.create(parent).await?;
    }
    if remove_socket_file(path).await? {
        debug!(path = %path.display(), "Removed stale socket file");
    }
    Ok(())
}

/// Returns whether a file was removed.
async fn remove_socket_file(path: &Path) -> std::io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

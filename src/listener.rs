//! Socket listener serving the [`Inspector`].
//!
//! [`Listener::bind`] acquires the socket, [`BoundListener::serve`] runs the
//! gRPC server until the shutdown future resolves and then drains. Draining is
//! a race between the server finishing its in-flight calls and the shutdown
//! timeout; when the timeout wins the server is aborted.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tokio::net::{TcpListener, UnixListener};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{TcpListenerStream, UnixListenerStream};
use tonic::transport::Server;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::lifecycle::{Lifecycle, ListenerState};
use crate::service::Inspector;

/// Default maximum inbound gRPC message size (4 MiB).
pub const DEFAULT_MAX_RECV_MSG_SIZE: usize = 4 * 1024 * 1024;

/// Default time allowed for in-flight calls to finish on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the listener accepts connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenAddress {
    /// Unix domain socket path
    Unix(PathBuf),
    /// TCP socket address
    Tcp(SocketAddr),
}

impl FromStr for ListenAddress {
    type Err = Error;

    /// Accepts `unix:///path`, `unix:path`, a bare filesystem path,
    /// `tcp://host:port` or `host:port`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".to_string()));
        }
        if let Some(path) = s.strip_prefix("unix://").or_else(|| s.strip_prefix("unix:")) {
            if path.is_empty() {
                return Err(Error::InvalidAddress(format!("{}: missing socket path", s)));
            }
            return Ok(ListenAddress::Unix(PathBuf::from(path)));
        }
        if let Some(addr) = s.strip_prefix("tcp://") {
            return addr
                .parse()
                .map(ListenAddress::Tcp)
                .map_err(|e| Error::InvalidAddress(format!("{}: {}", s, e)));
        }
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(ListenAddress::Tcp(addr));
        }
        if s.starts_with('/') || s.starts_with('.') {
            return Ok(ListenAddress::Unix(PathBuf::from(s)));
        }
        Err(Error::InvalidAddress(format!(
            "{}: expected a socket path or host:port",
            s
        )))
    }
}

impl fmt::Display for ListenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenAddress::Unix(path) => write!(f, "unix://{}", path.display()),
            ListenAddress::Tcp(addr) => write!(f, "tcp://{}", addr),
        }
    }
}

/// Listener settings.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub address: ListenAddress,
    /// Maximum inbound message size in bytes
    pub max_recv_msg_size: usize,
    /// Upper bound on graceful draining
    pub shutdown_timeout: Duration,
}

impl ListenerConfig {
    pub fn new(address: ListenAddress) -> Self {
        Self {
            address,
            max_recv_msg_size: DEFAULT_MAX_RECV_MSG_SIZE,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

/// How the listener reached [`ListenerState::Stopped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every in-flight call finished within the shutdown timeout.
    Drained,
    /// The shutdown timeout elapsed and the server was aborted.
    Forced,
}

/// A listener that has not bound its socket yet.
#[derive(Debug)]
pub struct Listener {
    config: ListenerConfig,
    lifecycle: Lifecycle,
}

impl Listener {
    pub fn new(config: ListenerConfig) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Handle for observing the listener's state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Bind the configured address. Failure here is fatal for the process.
    pub async fn bind(self) -> Result<BoundListener> {
        let bind_error = |source| Error::Bind {
            address: self.config.address.to_string(),
            source,
        };
        let incoming = match &self.config.address {
            ListenAddress::Unix(path) => {
                Incoming::Unix(UnixListener::bind(path).map_err(bind_error)?)
            }
            ListenAddress::Tcp(addr) => {
                Incoming::Tcp(TcpListener::bind(addr).await.map_err(bind_error)?)
            }
        };

        self.lifecycle.transition(ListenerState::Bound);
        Ok(BoundListener {
            config: self.config,
            lifecycle: self.lifecycle,
            incoming,
        })
    }
}

#[derive(Debug)]
enum Incoming {
    Tcp(TcpListener),
    Unix(UnixListener),
}

/// A listener holding its socket, ready to serve.
#[derive(Debug)]
pub struct BoundListener {
    config: ListenerConfig,
    lifecycle: Lifecycle,
    incoming: Incoming,
}

impl BoundListener {
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Actual TCP address, useful when binding port 0. `None` for Unix
    /// sockets.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.incoming {
            Incoming::Tcp(listener) => listener.local_addr().ok(),
            Incoming::Unix(_) => None,
        }
    }

    /// Serve `inspector` until `shutdown` resolves, then drain.
    ///
    /// Returns how the listener stopped, or the transport error if the
    /// server failed before shutdown was requested.
    pub async fn serve<F>(self, inspector: Inspector, shutdown: F) -> Result<StopReason>
    where
        F: Future<Output = ()>,
    {
        let BoundListener {
            config,
            lifecycle,
            incoming,
        } = self;

        let service = inspector
            .with_lifecycle(lifecycle.clone())
            .into_service()
            .max_decoding_message_size(config.max_recv_msg_size);

        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let drain_signal = async move {
            let _ = drain_rx.await;
        };

        let mut server: JoinHandle<std::result::Result<(), tonic::transport::Error>> =
            match incoming {
                Incoming::Tcp(listener) => tokio::spawn(
                    Server::builder()
                        .add_service(service)
                        .serve_with_incoming_shutdown(
                            TcpListenerStream::new(listener),
                            drain_signal,
                        ),
                ),
                Incoming::Unix(listener) => tokio::spawn(
                    Server::builder()
                        .add_service(service)
                        .serve_with_incoming_shutdown(
                            UnixListenerStream::new(listener),
                            drain_signal,
                        ),
                ),
            };

        lifecycle.transition(ListenerState::Serving);
        debug!(
            address = %config.address,
            max_recv_msg_size = config.max_recv_msg_size,
            shutdown_timeout = ?config.shutdown_timeout,
            "Serving"
        );

        tokio::select! {
            joined = &mut server => {
                // The server ended without being asked to.
                lifecycle.transition(ListenerState::Stopped);
                return match joined {
                    Ok(Ok(())) => Ok(StopReason::Drained),
                    Ok(Err(e)) => Err(Error::Transport(e)),
                    Err(e) => Err(Error::from(e)),
                };
            }
            _ = shutdown => {}
        }

        info!("Shutting down");
        lifecycle.transition(ListenerState::Draining);
        let _ = drain_tx.send(());

        let reason = tokio::select! {
            joined = &mut server => {
                match joined {
                    Ok(Err(e)) => warn!(error = %e, "Server error while draining"),
                    Err(e) => warn!(error = %e, "Server task failed while draining"),
                    Ok(Ok(())) => {}
                }
                StopReason::Drained
            }
            _ = tokio::time::sleep(config.shutdown_timeout) => {
                info!("Graceful shutdown timed out, forcing stop");
                server.abort();
                StopReason::Forced
            }
        };

        lifecycle.transition(ListenerState::Stopped);
        Ok(reason)
    }
}

/// Bind `config.address` and serve `inspector` until `shutdown` resolves.
pub async fn serve<F>(config: ListenerConfig, inspector: Inspector, shutdown: F) -> Result<StopReason>
where
    F: Future<Output = ()>,
{
    Listener::new(config).bind().await?.serve(inspector, shutdown).await
}

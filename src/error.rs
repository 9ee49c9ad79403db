//! Error types for the Pipeline Inspector.
//!
//! Only startup and transport failures are represented here. Problems with an
//! individual event never surface as an `Error`; see [`crate::render::RenderError`].

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;

/// A specialized Result type for Pipeline Inspector operations.
pub type Result<T> = result::Result<T, Error>;

/// The error type for Pipeline Inspector operations.
#[derive(Debug)]
pub enum Error {
    /// The listener could not acquire its address
    Bind { address: String, source: io::Error },
    /// The listen address could not be parsed
    InvalidAddress(String),
    /// Configuration errors
    Config(String),
    /// I/O errors
    Io(io::Error),
    /// gRPC transport errors raised while serving
    Transport(tonic::transport::Error),
    /// Runtime errors, e.g. a serving task that panicked
    Runtime(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bind { address, source } => {
                write!(f, "cannot listen on {}: {}", address, source)
            }
            Error::InvalidAddress(msg) => write!(f, "Invalid listen address: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Transport(err) => write!(f, "Server error: {}", err),
            Error::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Bind { source, .. } => Some(source),
            Error::Io(err) => Some(err),
            Error::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<tonic::transport::Error> for Error {
    fn from(err: tonic::transport::Error) -> Self {
        Error::Transport(err)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Runtime(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_names_address() {
        let err = Error::Bind {
            address: "unix:///tmp/inspector.sock".to_string(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };
        let msg = err.to_string();
        assert!(msg.contains("unix:///tmp/inspector.sock"));
        assert!(msg.contains("address in use"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: Error = config::ConfigError::Message("missing key".to_string()).into();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("missing key")));
        assert!(err.source().is_none());
    }
}

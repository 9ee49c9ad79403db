//! Pipeline Inspector.
//!
//! A gRPC sink for function pipeline telemetry. Callers report each step
//! before (`EmitRequest`) and after (`EmitResponse`) it runs; the inspector
//! renders every event as a JSON line or a human readable block and writes it
//! to stdout (or any other async writer).

pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod listener;
pub mod meta;
pub mod payload;
pub mod render;
pub mod service;
pub mod signals;
pub mod sink;

/// Generated protobuf types and gRPC stubs.
pub mod proto {
    tonic::include_proto!("pipelineinspector.proto.v1alpha1");
}

// Re-export commonly used types
pub use error::{Error, Result};
pub use lifecycle::{Lifecycle, ListenerState};
pub use listener::{ListenAddress, Listener, ListenerConfig, StopReason};
pub use render::{EventType, RenderMode, Renderer};
pub use service::Inspector;

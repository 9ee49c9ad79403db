//! Event rendering.
//!
//! A [`Renderer`] turns one [`Event`] into the exact bytes written to the
//! output sink. Two modes exist:
//! - [`RenderMode::Line`]: one JSON object per line, for log pipelines
//! - [`RenderMode::Block`]: a multi-line, human readable block
//!
//! Rendering is a pure function of the event; the mode is fixed when the
//! renderer is built.

mod block;
mod line;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

use crate::meta::StepMetadata;
use crate::payload::Payload;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Single-line JSON records
    #[default]
    #[serde(alias = "json")]
    #[value(alias = "json")]
    Line,
    /// Multi-line human readable blocks
    #[serde(alias = "text")]
    #[value(alias = "text")]
    Block,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Line => write!(f, "line"),
            RenderMode::Block => write!(f, "block"),
        }
    }
}

/// Which side of a step execution an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Request,
    Response,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Request => "REQUEST",
            EventType::Response => "RESPONSE",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inspector event, built per call and dropped after rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: EventType,
    pub meta: StepMetadata,
    pub payload: Payload,
    /// Function error; only ever set on responses, never empty.
    pub error: Option<String>,
}

impl Event {
    pub fn request(meta: StepMetadata, payload: Payload) -> Self {
        Self {
            event_type: EventType::Request,
            meta,
            payload,
            error: None,
        }
    }

    /// An empty error message means the function succeeded.
    pub fn response(meta: StepMetadata, payload: Payload, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            event_type: EventType::Response,
            meta,
            payload,
            error: (!error.is_empty()).then_some(error),
        }
    }
}

/// Failure to render a single event. The event is dropped, never the call.
#[derive(Debug)]
pub enum RenderError {
    /// JSON serialization of the metadata or the record failed
    Serialization(serde_json::Error),
    /// YAML rendering of the payload failed
    Yaml(serde_yaml::Error),
    /// Writing into the output buffer failed
    Format(fmt::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Serialization(err) => write!(f, "cannot marshal event: {}", err),
            RenderError::Yaml(err) => write!(f, "cannot marshal payload: {}", err),
            RenderError::Format(err) => write!(f, "cannot format event: {}", err),
        }
    }
}

impl StdError for RenderError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            RenderError::Serialization(err) => Some(err),
            RenderError::Yaml(err) => Some(err),
            RenderError::Format(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Serialization(err)
    }
}

impl From<serde_yaml::Error> for RenderError {
    fn from(err: serde_yaml::Error) -> Self {
        RenderError::Yaml(err)
    }
}

impl From<fmt::Error> for RenderError {
    fn from(err: fmt::Error) -> Self {
        RenderError::Format(err)
    }
}

/// Renders events in a fixed [`RenderMode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    mode: RenderMode,
}

impl Renderer {
    pub fn new(mode: RenderMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Render an event into the bytes for a single sink write.
    pub fn render(&self, event: &Event) -> Result<Vec<u8>, RenderError> {
        match self.mode {
            RenderMode::Line => line::render(event),
            RenderMode::Block => block::render(event).map(String::into_bytes),
        }
    }
}

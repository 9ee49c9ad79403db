//! gRPC Pipeline Inspector service.
//!
//! Both RPCs decode the payload, render the event and write it to the output
//! sink, then acknowledge. The acknowledgement never depends on rendering:
//! the inspector observes the pipeline and must not make it fail or retry.

use tonic::{Request, Response, Status};
use tracing::debug;

use crate::lifecycle::Lifecycle;
use crate::meta::StepMetadata;
use crate::payload;
use crate::proto::pipeline_inspector_service_server::{
    PipelineInspectorService, PipelineInspectorServiceServer,
};
use crate::proto::{
    EmitRequestRequest, EmitRequestResponse, EmitResponseRequest, EmitResponseResponse,
};
use crate::render::{Event, RenderMode, Renderer};
use crate::sink::OutputSink;

/// Renders pipeline step events to an output sink.
#[derive(Debug, Clone)]
pub struct Inspector {
    renderer: Renderer,
    sink: OutputSink,
    lifecycle: Lifecycle,
}

impl Inspector {
    /// Create an inspector writing to stdout.
    pub fn new(mode: RenderMode) -> Self {
        Self {
            renderer: Renderer::new(mode),
            sink: OutputSink::stdout(),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Write events to `writer` instead of stdout.
    pub fn with_output<W>(self, writer: W) -> Self
    where
        W: tokio::io::AsyncWrite + Send + 'static,
    {
        self.with_sink(OutputSink::new(writer))
    }

    pub fn with_sink(mut self, sink: OutputSink) -> Self {
        self.sink = sink;
        self
    }

    /// Attach the lifecycle of the listener serving this inspector. Writes
    /// still pending when it reaches `Stopped` are abandoned.
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn mode(&self) -> RenderMode {
        self.renderer.mode()
    }

    /// Wrap into a tonic service.
    pub fn into_service(self) -> PipelineInspectorServiceServer<Self> {
        PipelineInspectorServiceServer::new(self)
    }

    async fn log_event(&self, event: Event) {
        let rendered = match self.renderer.render(&event) {
            Ok(rendered) => rendered,
            Err(e) => {
                debug!(error = %e, event_type = %event.event_type, "Cannot render event");
                return;
            }
        };

        tokio::select! {
            result = self.sink.write_event(&rendered) => {
                if let Err(e) = result {
                    debug!(error = %e, event_type = %event.event_type, "Cannot write event");
                }
            }
            _ = self.lifecycle.stopped() => {
                // A partly written record may be left behind; nothing is written after a stop.
                debug!(event_type = %event.event_type, "Listener stopped, dropping event");
            }
        }
    }
}

#[tonic::async_trait]
impl PipelineInspectorService for Inspector {
    /// Logs the function request before execution.
    async fn emit_request(
        &self,
        request: Request<EmitRequestRequest>,
    ) -> Result<Response<EmitRequestResponse>, Status> {
        let req = request.into_inner();
        let event = Event::request(
            StepMetadata::from(req.meta),
            payload::decode(&req.request),
        );
        self.log_event(event).await;
        Ok(Response::new(EmitRequestResponse {}))
    }

    /// Logs the function response after execution.
    async fn emit_response(
        &self,
        request: Request<EmitResponseRequest>,
    ) -> Result<Response<EmitResponseResponse>, Status> {
        let req = request.into_inner();
        let event = Event::response(
            StepMetadata::from(req.meta),
            payload::decode(&req.response),
            req.error,
        );
        self.log_event(event).await;
        Ok(Response::new(EmitResponseResponse {}))
    }
}

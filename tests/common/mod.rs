#![allow(dead_code)]

use pipeline_inspector_core::proto::pipeline_inspector_service_client::PipelineInspectorServiceClient;
use pipeline_inspector_core::{
    Inspector, Lifecycle, ListenAddress, Listener, ListenerConfig, RenderMode, Result, StopReason,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWrite, BufReader, DuplexStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tonic::transport::Channel;

pub struct TestServer {
    pub endpoint: String,
    pub lifecycle: Lifecycle,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<StopReason>>,
}

impl TestServer {
    /// Serve an inspector writing to `writer` on an ephemeral TCP port.
    pub async fn start<W>(mode: RenderMode, writer: W, shutdown_timeout: Duration) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        let mut config = ListenerConfig::new(ListenAddress::Tcp("127.0.0.1:0".parse().unwrap()));
        config.shutdown_timeout = shutdown_timeout;

        let bound = Listener::new(config).bind().await.unwrap();
        let addr = bound.local_addr().unwrap();
        let lifecycle = bound.lifecycle();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let inspector = Inspector::new(mode).with_output(writer);
        let handle = tokio::spawn(bound.serve(inspector, async {
            let _ = shutdown_rx.await;
        }));

        Self {
            endpoint: format!("http://{}", addr),
            lifecycle,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    pub async fn client(&self) -> PipelineInspectorServiceClient<Channel> {
        PipelineInspectorServiceClient::connect(self.endpoint.clone())
            .await
            .unwrap()
    }

    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Request shutdown and wait for the listener to stop.
    pub async fn stop(mut self) -> Result<StopReason> {
        self.shutdown();
        self.handle.await.unwrap()
    }
}

/// Read `n` newline-terminated lines from `reader`.
pub async fn read_lines(reader: DuplexStream, n: usize) -> Vec<String> {
    let mut lines = BufReader::new(reader).lines();
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        match tokio::time::timeout(Duration::from_secs(5), lines.next_line()).await {
            Ok(Ok(Some(line))) => out.push(line),
            other => panic!("expected {} lines, got {}: {:?}", n, out.len(), other),
        }
    }
    out
}

/// Read one block (terminated by a blank line) from `reader`.
pub async fn read_block(reader: &mut BufReader<DuplexStream>) -> String {
    let mut block = String::new();
    loop {
        let mut line = String::new();
        let read = tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
            .await
            .expect("timed out reading block")
            .unwrap();
        assert!(read > 0, "sink closed mid-block: {:?}", block);
        block.push_str(&line);
        if line == "\n" {
            return block;
        }
    }
}

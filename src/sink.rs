//! Shared output sink.
//!
//! Every event is written with a single [`OutputSink::write_event`] call that
//! holds the sink lock for the whole buffer, so concurrent events never
//! interleave their bytes.

use std::io;
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

type BoxedWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Cloneable handle to one underlying writer.
#[derive(Clone)]
pub struct OutputSink {
    writer: Arc<Mutex<BoxedWriter>>,
}

impl OutputSink {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        Self {
            writer: Arc::new(Mutex::new(Box::pin(writer))),
        }
    }

    /// Process standard output.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }

    /// Write one rendered event and flush it.
    ///
    /// Suspends while another event holds the sink or while the writer
    /// applies backpressure (e.g. a full pipe).
    pub async fn write_event(&self, buf: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(buf).await?;
        writer.flush().await
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

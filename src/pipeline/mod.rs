//! The audio pipeline: a lazy, single-consumer stream of decoded bytes.
//!
//! A pipeline is produced by the [`PipelineBuilder`](crate::PipelineBuilder)
//! and consumed exactly once by the session's send-audio operation. It is a
//! live decode of an external source, not a seekable buffer - once reading
//! begins it cannot be restarted. Destruction goes through a shared
//! [`PipelineCtl`] handle so the shutdown controller can tear the decode
//! resources down from outside the consuming flow.

mod decode;
mod gate;

pub use gate::{Readiness, ReadinessGate};

pub(crate) use decode::{BoxChunkStream, ByteSource, DecodeStage};

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;

/// Read size for one pipeline chunk.
const CHUNK_SIZE: usize = 8 * 1024;

/// A lazy, ordered, finite stream of decoded audio bytes.
///
/// Owned exclusively by the orchestrator from creation until full
/// consumption or destruction. Cloning is deliberately not offered; only the
/// lightweight [`PipelineCtl`] handle is shared.
pub struct AudioPipeline {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    ctl: PipelineCtl,
}

impl AudioPipeline {
    /// Creates a pipeline over a decode-stage output together with the child
    /// processes and feeder task that keep it supplied.
    pub(crate) fn new(
        reader: Box<dyn AsyncRead + Send + Unpin>,
        children: Vec<Child>,
        feeder: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            reader,
            ctl: PipelineCtl {
                shared: Arc::new(PipelineShared {
                    children: Mutex::new(children),
                    feeder: Mutex::new(feeder),
                    destroyed: AtomicBool::new(false),
                }),
            },
        }
    }

    /// Creates a pipeline over an arbitrary reader.
    ///
    /// Useful for tests and custom sources - the full orchestration can be
    /// exercised without spawning a decode process.
    pub fn from_reader(reader: Box<dyn AsyncRead + Send + Unpin>) -> Self {
        Self::new(reader, Vec::new(), None)
    }

    /// A shared control handle for destroying this pipeline.
    pub fn ctl(&self) -> PipelineCtl {
        self.ctl.clone()
    }

    /// Reads the next chunk of decoded audio.
    ///
    /// Returns `Ok(None)` at end of stream, or immediately once the pipeline
    /// has been destroyed.
    ///
    /// # Errors
    ///
    /// Propagates read errors from the underlying decode output.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        if self.ctl.is_destroyed() {
            return Ok(None);
        }
        let mut buf = vec![0u8; CHUNK_SIZE];
        let n = self.reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }
}

/// Shared, non-consuming control handle to an [`AudioPipeline`].
///
/// Held by the shutdown controller while the pipeline is in flight.
/// [`destroy()`](PipelineCtl::destroy) is idempotent: the first call kills
/// the decode processes and aborts the feeder task, later calls do nothing.
#[derive(Clone)]
pub struct PipelineCtl {
    shared: Arc<PipelineShared>,
}

struct PipelineShared {
    children: Mutex<Vec<Child>>,
    feeder: Mutex<Option<JoinHandle<()>>>,
    destroyed: AtomicBool,
}

impl PipelineCtl {
    /// Destroys the pipeline, releasing decode and transform resources.
    pub fn destroy(&self) {
        if self.shared.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(feeder) = self.shared.feeder.lock().take() {
            feeder.abort();
        }
        for mut child in self.shared.children.lock().drain(..) {
            if let Err(e) = child.start_kill() {
                tracing::debug!(error = %e, "decode process already gone");
            }
        }
        tracing::debug!("audio pipeline destroyed");
    }

    /// Returns `true` once [`destroy()`](PipelineCtl::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.shared.destroyed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_pipeline_reads_until_end() {
        let data = vec![7u8; CHUNK_SIZE + 100];
        let mut pipeline = AudioPipeline::from_reader(Box::new(Cursor::new(data)));

        let first = pipeline.next_chunk().await.unwrap().unwrap();
        assert_eq!(first.len(), CHUNK_SIZE);
        let second = pipeline.next_chunk().await.unwrap().unwrap();
        assert_eq!(second.len(), 100);
        assert!(pipeline.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_destroyed_pipeline_yields_nothing() {
        let mut pipeline = AudioPipeline::from_reader(Box::new(Cursor::new(vec![1u8; 64])));
        pipeline.ctl().destroy();
        assert!(pipeline.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let pipeline = AudioPipeline::from_reader(Box::new(Cursor::new(Vec::new())));
        let ctl = pipeline.ctl();
        ctl.destroy();
        ctl.destroy();
        assert!(ctl.is_destroyed());
    }
}

//! Readiness gate over an audio pipeline.
//!
//! External decode and fetch latency is unpredictable; announcing a track
//! and then waiting for the first bytes leaves dead air in the channel. The
//! gate lets the orchestrator hold the session unopened until the pipeline
//! has actually produced data, buffering only that first chunk.

use std::io;
use std::time::Instant;

use crate::pipeline::{AudioPipeline, PipelineCtl};

/// Outcome of waiting on the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// At least one chunk of decoded data is available.
    Ready,
    /// The pipeline ended before producing any data.
    Ended,
}

/// Wraps an [`AudioPipeline`] with a one-shot "first data available" signal.
///
/// [`wait_ready()`](ReadinessGate::wait_ready) resolves once the first chunk
/// is observed; the chunk is held back and returned by the next
/// [`next_chunk()`](ReadinessGate::next_chunk) call, so the stream contents
/// pass through unchanged. The ready event fires at most once.
pub struct ReadinessGate {
    pipeline: AudioPipeline,
    buffered: Option<Vec<u8>>,
    ready_at: Option<Instant>,
}

impl ReadinessGate {
    /// Wraps the given pipeline.
    pub fn new(pipeline: AudioPipeline) -> Self {
        Self {
            pipeline,
            buffered: None,
            ready_at: None,
        }
    }

    /// Suspends until the first chunk is available, the pipeline ends, or a
    /// read error occurs. Subsequent calls return immediately once the event
    /// has fired.
    ///
    /// # Errors
    ///
    /// Propagates the pipeline's read error instead of a readiness outcome.
    pub async fn wait_ready(&mut self) -> io::Result<Readiness> {
        if self.ready_at.is_some() {
            return Ok(Readiness::Ready);
        }
        match self.pipeline.next_chunk().await? {
            Some(chunk) => {
                tracing::debug!(bytes = chunk.len(), "first audio chunk available");
                self.buffered = Some(chunk);
                self.ready_at = Some(Instant::now());
                Ok(Readiness::Ready)
            }
            None => Ok(Readiness::Ended),
        }
    }

    /// When the ready event fired, if it has.
    pub fn ready_at(&self) -> Option<Instant> {
        self.ready_at
    }

    /// Reads the next chunk, draining the held-back first chunk before the
    /// underlying pipeline.
    ///
    /// # Errors
    ///
    /// Propagates read errors from the underlying pipeline.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        if let Some(chunk) = self.buffered.take() {
            return Ok(Some(chunk));
        }
        self.pipeline.next_chunk().await
    }

    /// The wrapped pipeline's control handle.
    pub fn ctl(&self) -> PipelineCtl {
        self.pipeline.ctl()
    }
}

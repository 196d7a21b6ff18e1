//! Recording mock protocol client.
//!
//! Records every executed operation so tests (and the dry-run demo) can
//! assert the exact command sequence without a live service. The mock drains
//! the audio pipeline like a real send would, supports an injected failure
//! at a chosen operation, and tracks how often it was closed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ProtocolError;
use crate::protocol::{ConnectOptions, PttConnector, PttSession, ScriptOp, SessionStatus};

/// A session double that records operations instead of talking to a service.
pub struct MockSession {
    status: Mutex<SessionStatus>,
    operations: Mutex<Vec<&'static str>>,
    fail_on: Mutex<Option<&'static str>>,
    sent_text: Mutex<Option<String>>,
    image_bytes: AtomicUsize,
    audio_bytes: AtomicUsize,
    close_count: AtomicUsize,
    opened_at: Mutex<Option<Instant>>,
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSession {
    /// Creates an unopened mock session.
    pub fn new() -> Self {
        Self {
            status: Mutex::new(SessionStatus::Unopened),
            operations: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
            sent_text: Mutex::new(None),
            image_bytes: AtomicUsize::new(0),
            audio_bytes: AtomicUsize::new(0),
            close_count: AtomicUsize::new(0),
            opened_at: Mutex::new(None),
        }
    }

    /// Makes the named operation fail when it is executed.
    pub fn fail_on(&self, operation: &'static str) {
        *self.fail_on.lock() = Some(operation);
    }

    /// The operations executed so far, in order.
    pub fn operations(&self) -> Vec<&'static str> {
        self.operations.lock().clone()
    }

    /// The caption text that was sent, if any.
    pub fn sent_text(&self) -> Option<String> {
        self.sent_text.lock().clone()
    }

    /// Total preview-image bytes received.
    pub fn image_bytes(&self) -> usize {
        self.image_bytes.load(Ordering::SeqCst)
    }

    /// Total audio bytes drained from the pipeline.
    pub fn audio_bytes(&self) -> usize {
        self.audio_bytes.load(Ordering::SeqCst)
    }

    /// How many times `close()` was called.
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    /// When the session was opened, if it was.
    pub fn opened_at(&self) -> Option<Instant> {
        *self.opened_at.lock()
    }

    fn open(&self) {
        *self.status.lock() = SessionStatus::Open;
        *self.opened_at.lock() = Some(Instant::now());
    }
}

#[async_trait]
impl PttSession for MockSession {
    fn status(&self) -> SessionStatus {
        *self.status.lock()
    }

    async fn execute(&self, op: ScriptOp<'_>) -> Result<(), ProtocolError> {
        if self.status() != SessionStatus::Open {
            return Err(ProtocolError::SessionClosed);
        }
        let name = op.name();
        if *self.fail_on.lock() == Some(name) {
            return Err(ProtocolError::command_failed(name, "injected failure"));
        }
        match op {
            ScriptOp::Login(_) => {}
            ScriptOp::SendImage(image) => {
                self.image_bytes.fetch_add(image.len(), Ordering::SeqCst);
            }
            ScriptOp::SendText(text) => {
                *self.sent_text.lock() = Some(text.to_string());
            }
            ScriptOp::SendAudio { audio, .. } => {
                while let Ok(Some(chunk)) = audio.next_chunk().await {
                    self.audio_bytes.fetch_add(chunk.len(), Ordering::SeqCst);
                }
            }
        }
        self.operations.lock().push(name);
        Ok(())
    }

    async fn close(&self) -> Result<(), ProtocolError> {
        *self.status.lock() = SessionStatus::Closed;
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A connector that hands out one shared [`MockSession`].
pub struct MockConnector {
    session: Arc<MockSession>,
    fail_connect: bool,
    connect_count: AtomicUsize,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Creates a connector with a fresh recording session.
    pub fn new() -> Self {
        Self {
            session: Arc::new(MockSession::new()),
            fail_connect: false,
            connect_count: AtomicUsize::new(0),
        }
    }

    /// Creates a connector whose `connect` always fails.
    pub fn failing() -> Self {
        Self {
            session: Arc::new(MockSession::new()),
            fail_connect: true,
            connect_count: AtomicUsize::new(0),
        }
    }

    /// The shared session, for assertions.
    pub fn session(&self) -> Arc<MockSession> {
        Arc::clone(&self.session)
    }

    /// How many times `connect` was attempted.
    pub fn connect_count(&self) -> usize {
        self.connect_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PttConnector for MockConnector {
    async fn connect(
        &self,
        endpoint: &str,
        options: &ConnectOptions,
    ) -> Result<Arc<dyn PttSession>, ProtocolError> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(ProtocolError::connect_failed(format!(
                "no route to {endpoint}"
            )));
        }
        tracing::debug!(endpoint, client = %options.client_name, "mock session opened");
        self.session.open();
        Ok(self.session() as Arc<dyn PttSession>)
    }
}

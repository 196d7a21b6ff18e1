//! Shutdown controller for user interruption and terminal failures.
//!
//! The controller is an explicit context object rather than process-global
//! state: the orchestrator registers the in-flight pipeline and session as
//! they are created and clears them as they are torn down. Triggering it
//! destroys the pipeline first (releasing decode resources), then closes the
//! session - but only if the session is actually open. Both steps tolerate
//! the resource never having been created.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::pipeline::PipelineCtl;
use crate::protocol::{PttSession, SessionStatus};

/// Tracks the current pipeline and session for out-of-band teardown.
///
/// Clones share the same state. The controller holds only a non-owning
/// [`Weak`] reference to the session; idempotence comes from taking the
/// references out and from the session's own status, not from a lock held
/// across the teardown.
#[derive(Clone, Default)]
pub struct ShutdownController {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    pipeline: Mutex<Option<PipelineCtl>>,
    session: Mutex<Option<Weak<dyn PttSession>>>,
}

impl ShutdownController {
    /// Creates a controller tracking nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the in-flight pipeline.
    pub fn track_pipeline(&self, ctl: PipelineCtl) {
        *self.inner.pipeline.lock() = Some(ctl);
    }

    /// Forgets the tracked pipeline.
    pub fn clear_pipeline(&self) {
        self.inner.pipeline.lock().take();
    }

    /// Registers the in-flight session.
    pub fn track_session(&self, session: Weak<dyn PttSession>) {
        *self.inner.session.lock() = Some(session);
    }

    /// Forgets the tracked session.
    pub fn clear_session(&self) {
        self.inner.session.lock().take();
    }

    /// Tears down whatever is currently tracked.
    ///
    /// Destroys the pipeline first, then closes the session if - and only
    /// if - it is `Open`. Safe to call repeatedly and at any point in the
    /// invocation, including before either resource exists.
    pub async fn trigger(&self) {
        if let Some(ctl) = self.inner.pipeline.lock().take() {
            ctl.destroy();
        }

        let session = self.inner.session.lock().take();
        let Some(session) = session.and_then(|weak| weak.upgrade()) else {
            return;
        };
        if session.status() != SessionStatus::Open {
            return;
        }
        tracing::warn!("closing session");
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "session close failed during shutdown");
        }
    }

    /// Installs a ctrl-c handler that tears everything down and exits the
    /// process cleanly.
    ///
    /// Interruption is the only cancellation path - there are no timeouts -
    /// so this is the escape hatch for hung external calls as well.
    pub fn install_interrupt_handler(&self) -> tokio::task::JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            tracing::warn!("interrupted, shutting down");
            controller.trigger().await;
            std::process::exit(0);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::AudioPipeline;
    use crate::protocol::mock::{MockConnector, MockSession};
    use crate::protocol::{ConnectOptions, PttConnector};
    use std::io::Cursor;

    #[tokio::test]
    async fn test_trigger_with_nothing_tracked() {
        let controller = ShutdownController::new();
        controller.trigger().await;
        controller.trigger().await;
    }

    #[tokio::test]
    async fn test_trigger_destroys_pipeline_and_closes_session() {
        let controller = ShutdownController::new();

        let pipeline = AudioPipeline::from_reader(Box::new(Cursor::new(vec![0u8; 16])));
        let ctl = pipeline.ctl();
        controller.track_pipeline(pipeline.ctl());

        let connector = MockConnector::new();
        let session = connector
            .connect("wss://test", &ConnectOptions::default())
            .await
            .unwrap();
        controller.track_session(Arc::downgrade(&session));

        controller.trigger().await;

        assert!(ctl.is_destroyed());
        assert_eq!(connector.session().close_count(), 1);
    }

    #[tokio::test]
    async fn test_trigger_twice_closes_at_most_once() {
        let controller = ShutdownController::new();
        let connector = MockConnector::new();
        let session = connector
            .connect("wss://test", &ConnectOptions::default())
            .await
            .unwrap();
        controller.track_session(Arc::downgrade(&session));

        controller.trigger().await;
        controller.trigger().await;
        assert_eq!(connector.session().close_count(), 1);
    }

    #[tokio::test]
    async fn test_trigger_skips_unopened_session() {
        let controller = ShutdownController::new();
        let session: Arc<dyn PttSession> = Arc::new(MockSession::new());
        controller.track_session(Arc::downgrade(&session));

        controller.trigger().await;
        // Never opened, so close must not have been attempted.
        assert_eq!(session.status(), SessionStatus::Unopened);
    }

    #[tokio::test]
    async fn test_dropped_session_is_tolerated() {
        let controller = ShutdownController::new();
        let session: Arc<dyn PttSession> = Arc::new(MockSession::new());
        controller.track_session(Arc::downgrade(&session));
        drop(session);
        controller.trigger().await;
    }
}

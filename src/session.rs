//! Session sequencing: one ordered script against a fresh session.
//!
//! The target protocol session is a single ordered command stream, so image,
//! caption, and audio are strictly sequenced - each operation's asynchronous
//! result is observed before the next begins, and the first failure aborts
//! the remainder. Nothing is retried; a failed exchange ends the attempt.

use std::sync::Arc;

use crate::config::TranscodeParams;
use crate::error::{CastError, ProtocolError};
use crate::pipeline::ReadinessGate;
use crate::presentation::Presentation;
use crate::protocol::{
    ConnectOptions, Credentials, PttConnector, PttSession, ScriptOp, SessionStatus,
};
use crate::shutdown::ShutdownController;

/// Inputs for one session script execution.
pub struct SessionScript<'a> {
    /// Login credentials (channel already overridden if requested).
    pub credentials: &'a Credentials,
    /// Optional caption and preview image.
    pub presentation: &'a Presentation,
    /// The ready audio pipeline.
    pub audio: &'a mut ReadinessGate,
    /// Transcode parameters for the audio send.
    pub transcode: TranscodeParams,
}

/// Outcome of a session script.
#[derive(Debug, Default)]
pub struct SessionReport {
    /// Names of the operations that completed, in order.
    pub operations: Vec<&'static str>,
    /// `true` when every scripted operation completed.
    pub completed: bool,
    /// The failure that aborted the script, if any.
    pub error: Option<ProtocolError>,
}

/// Connects, runs the ordered script, and closes the session exactly once.
///
/// The script is login, then send-image and send-text when the corresponding
/// payload is present, then send-audio. A rejected operation is logged and
/// recorded in the report - the session is still closed and `Ok` is
/// returned, since a command failure is not fatal for the process.
///
/// # Errors
///
/// Returns [`CastError::Connect`] when no session could be established; in
/// that case nothing was opened and nothing is closed.
pub async fn run_session(
    connector: &dyn PttConnector,
    endpoint: &str,
    options: &ConnectOptions,
    script: SessionScript<'_>,
    shutdown: &ShutdownController,
) -> Result<SessionReport, CastError> {
    tracing::info!(endpoint, "opening session");
    let session = connector
        .connect(endpoint, options)
        .await
        .map_err(CastError::Connect)?;
    shutdown.track_session(Arc::downgrade(&session));

    let mut ops: Vec<ScriptOp<'_>> = Vec::new();
    ops.push(ScriptOp::Login(script.credentials));
    if let Some(image) = script.presentation.image.as_deref() {
        ops.push(ScriptOp::SendImage(image));
    }
    if let Some(caption) = script.presentation.caption.as_deref() {
        ops.push(ScriptOp::SendText(caption));
    }
    ops.push(ScriptOp::SendAudio {
        audio: script.audio,
        transcode: script.transcode,
    });

    let mut report = SessionReport::default();
    for op in ops {
        let name = op.name();
        tracing::debug!(command = name, "executing session command");
        match session.execute(op).await {
            Ok(()) => report.operations.push(name),
            Err(e) => {
                tracing::error!(command = name, error = %e, "session command failed");
                report.error = Some(e);
                break;
            }
        }
    }
    report.completed = report.error.is_none();

    if session.status() == SessionStatus::Open {
        tracing::info!("closing session");
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "session close failed");
        }
    }
    shutdown.clear_session();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransformOptions;
    use crate::pipeline::AudioPipeline;
    use crate::protocol::mock::MockConnector;
    use std::io::Cursor;

    fn test_credentials() -> Credentials {
        Credentials {
            username: "u".to_string(),
            password: "p".to_string(),
            channel: "c".to_string(),
            auth_token: None,
        }
    }

    async fn ready_gate(bytes: usize) -> ReadinessGate {
        let pipeline = AudioPipeline::from_reader(Box::new(Cursor::new(vec![1u8; bytes])));
        let mut gate = ReadinessGate::new(pipeline);
        gate.wait_ready().await.unwrap();
        gate
    }

    #[tokio::test]
    async fn test_full_script_order() {
        let connector = MockConnector::new();
        let credentials = test_credentials();
        let presentation = Presentation {
            caption: Some("caption".to_string()),
            image: Some(vec![0u8; 10]),
        };
        let mut gate = ready_gate(100).await;

        let report = run_session(
            &connector,
            "wss://test",
            &ConnectOptions::default(),
            SessionScript {
                credentials: &credentials,
                presentation: &presentation,
                audio: &mut gate,
                transcode: TransformOptions::default().transcode(),
            },
            &ShutdownController::new(),
        )
        .await
        .unwrap();

        assert!(report.completed);
        assert_eq!(
            report.operations,
            vec!["login", "send_image", "send_text", "send_audio"]
        );
        let mock = connector.session();
        assert_eq!(
            mock.operations(),
            vec!["login", "send_image", "send_text", "send_audio"]
        );
        assert_eq!(mock.close_count(), 1);
        assert_eq!(mock.audio_bytes(), 100);
    }

    #[tokio::test]
    async fn test_absent_payloads_are_skipped() {
        let connector = MockConnector::new();
        let credentials = test_credentials();
        let mut gate = ready_gate(10).await;

        let report = run_session(
            &connector,
            "wss://test",
            &ConnectOptions::default(),
            SessionScript {
                credentials: &credentials,
                presentation: &Presentation::empty(),
                audio: &mut gate,
                transcode: TransformOptions::default().transcode(),
            },
            &ShutdownController::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.operations, vec!["login", "send_audio"]);
    }

    #[tokio::test]
    async fn test_failure_aborts_script_but_closes() {
        let connector = MockConnector::new();
        connector.session().fail_on("send_text");
        let credentials = test_credentials();
        let presentation = Presentation {
            caption: Some("caption".to_string()),
            image: Some(vec![0u8; 10]),
        };
        let mut gate = ready_gate(10).await;

        let report = run_session(
            &connector,
            "wss://test",
            &ConnectOptions::default(),
            SessionScript {
                credentials: &credentials,
                presentation: &presentation,
                audio: &mut gate,
                transcode: TransformOptions::default().transcode(),
            },
            &ShutdownController::new(),
        )
        .await
        .unwrap();

        assert!(!report.completed);
        assert_eq!(report.operations, vec!["login", "send_image"]);
        assert!(matches!(
            report.error,
            Some(ProtocolError::CommandFailed { .. })
        ));
        let mock = connector.session();
        // Audio never started, session still closed exactly once.
        assert_eq!(mock.audio_bytes(), 0);
        assert_eq!(mock.close_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_is_fatal() {
        let connector = MockConnector::failing();
        let credentials = test_credentials();
        let mut gate = ready_gate(10).await;

        let err = run_session(
            &connector,
            "wss://test",
            &ConnectOptions::default(),
            SessionScript {
                credentials: &credentials,
                presentation: &Presentation::empty(),
                audio: &mut gate,
                transcode: TransformOptions::default().transcode(),
            },
            &ShutdownController::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CastError::Connect(_)));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(connector.session().close_count(), 0);
    }
}

//! The push-to-talk protocol seam.
//!
//! The wire protocol itself lives outside this crate. The orchestrator only
//! needs an ordered command session: connect, then login / send-image /
//! send-text / send-audio in a strict sequence, then close. [`PttConnector`]
//! and [`PttSession`] are that seam; implement them for a real service, or
//! use the bundled [`mock`] client for tests and dry runs.

pub mod mock;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TranscodeParams;
use crate::error::{CastError, ProtocolError};
use crate::pipeline::ReadinessGate;

/// Login credentials for the push-to-talk service.
///
/// Loaded from a JSON credentials file; the channel may be overridden per
/// invocation from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Channel to talk into.
    pub channel: String,
    /// Optional pre-issued auth token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Credentials {
    /// Loads credentials from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CastError::Credentials`] when the file cannot be read or
    /// parsed.
    pub fn from_file(path: &Path) -> Result<Self, CastError> {
        let raw = std::fs::read_to_string(path).map_err(|e| CastError::Credentials {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| CastError::Credentials {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Options for opening a session.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Client name announced to the service.
    pub client_name: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            client_name: "ptt-cast".to_string(),
        }
    }
}

/// Lifecycle state of a session handle. Transitions are monotonic - a closed
/// session is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created but not yet connected.
    Unopened,
    /// Connected and authenticated command stream.
    Open,
    /// Closed; no further operations are possible.
    Closed,
}

/// One operation of the ordered session script.
pub enum ScriptOp<'a> {
    /// Authenticate with the service.
    Login(&'a Credentials),
    /// Send the preview image.
    SendImage(&'a [u8]),
    /// Send the caption text.
    SendText(&'a str),
    /// Stream the audio pipeline into the channel.
    SendAudio {
        /// The gated pipeline to drain.
        audio: &'a mut ReadinessGate,
        /// Transcode parameters for the send.
        transcode: TranscodeParams,
    },
}

impl ScriptOp<'_> {
    /// Stable operation name, for logging and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::SendImage(_) => "send_image",
            Self::SendText(_) => "send_text",
            Self::SendAudio { .. } => "send_audio",
        }
    }
}

/// An open, authenticated push-to-talk session.
///
/// The session is a single ordered command stream: callers must await each
/// [`execute`](PttSession::execute) before issuing the next operation, and
/// close the session exactly once when the script is done.
#[async_trait]
pub trait PttSession: Send + Sync {
    /// Current lifecycle state.
    fn status(&self) -> SessionStatus;

    /// Executes one script operation, resolving when the service has
    /// acknowledged it (or, for audio, when the pipeline is fully consumed).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the service rejects the operation; the
    /// caller aborts the remaining script and does not retry.
    async fn execute(&self, op: ScriptOp<'_>) -> Result<(), ProtocolError>;

    /// Closes the session. Must be tolerant of being called on an already
    /// closed session.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the close handshake fails.
    async fn close(&self) -> Result<(), ProtocolError>;
}

impl std::fmt::Debug for dyn PttSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PttSession")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Opens sessions against a push-to-talk service endpoint.
#[async_trait]
pub trait PttConnector: Send + Sync {
    /// Connects and returns an open session handle.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ConnectFailed`] when no session could be
    /// established.
    async fn connect(
        &self,
        endpoint: &str,
        options: &ConnectOptions,
    ) -> Result<Arc<dyn PttSession>, ProtocolError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_credentials_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"username": "u", "password": "p", "channel": "The Lounge"}}"#
        )
        .unwrap();
        let credentials = Credentials::from_file(file.path()).unwrap();
        assert_eq!(credentials.username, "u");
        assert_eq!(credentials.channel, "The Lounge");
        assert!(credentials.auth_token.is_none());
    }

    #[test]
    fn test_credentials_missing_file() {
        let err = Credentials::from_file(Path::new("/no/such/credentials.json")).unwrap_err();
        assert!(matches!(err, CastError::Credentials { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_credentials_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(Credentials::from_file(file.path()).is_err());
    }

    #[test]
    fn test_op_names() {
        let credentials = Credentials {
            username: String::new(),
            password: String::new(),
            channel: String::new(),
            auth_token: None,
        };
        assert_eq!(ScriptOp::Login(&credentials).name(), "login");
        assert_eq!(ScriptOp::SendImage(&[]).name(), "send_image");
        assert_eq!(ScriptOp::SendText("hi").name(), "send_text");
    }
}

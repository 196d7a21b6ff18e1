//! Error types for ptt-cast.
//!
//! Errors are split into three categories:
//! - **Fatal errors** ([`CastError`]): end the invocation and carry a process
//!   exit code
//! - **Protocol errors** ([`ProtocolError`]): a rejected session operation;
//!   aborts the remaining script but the session is still closed
//! - **Extraction errors** ([`ExtractError`]): failures of the video-link
//!   extraction collaborator, mapped to stream-initialization failures

use std::path::PathBuf;

/// Fatal errors that end a playback invocation.
///
/// Each variant maps to a distinct process exit code via
/// [`exit_code()`](CastError::exit_code). Protocol command failures are NOT
/// fatal - they are recorded in the [`SessionReport`](crate::SessionReport)
/// and the process exits 0 after the session is closed.
#[derive(Debug, thiserror::Error)]
pub enum CastError {
    /// The local file named by the target does not exist.
    #[error("source not found: {path}")]
    SourceNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The pipeline could not produce a usable audio stream.
    ///
    /// Covers fetch errors, extraction errors, decode-stage spawn failures,
    /// and a pipeline that ended before yielding any data.
    #[error("stream initialization failed: {reason}")]
    StreamInitFailed {
        /// What went wrong while setting up the stream.
        reason: String,
    },

    /// Transform options are outside their allowed ranges.
    #[error("invalid options: {reason}")]
    InvalidOptions {
        /// Which constraint was violated.
        reason: String,
    },

    /// The credentials file could not be read or parsed.
    #[error("failed to load credentials from {path}: {reason}")]
    Credentials {
        /// Path to the credentials file.
        path: PathBuf,
        /// Why loading failed.
        reason: String,
    },

    /// Connecting to the push-to-talk service failed.
    ///
    /// No session exists in this case, so there is nothing to close.
    #[error("session connect failed: {0}")]
    Connect(#[source] ProtocolError),
}

impl CastError {
    /// Creates a stream-initialization error with the given reason.
    pub fn stream_init(reason: impl Into<String>) -> Self {
        Self::StreamInitFailed {
            reason: reason.into(),
        }
    }

    /// Creates an invalid-options error with the given reason.
    pub fn invalid_options(reason: impl Into<String>) -> Self {
        Self::InvalidOptions {
            reason: reason.into(),
        }
    }

    /// The process exit code for this error.
    ///
    /// Source-not-found and stream-initialization failures keep their own
    /// codes so callers can tell them apart; everything else exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SourceNotFound { .. } => 2,
            Self::StreamInitFailed { .. } => 3,
            Self::InvalidOptions { .. } | Self::Credentials { .. } | Self::Connect(_) => 1,
        }
    }
}

/// Errors surfaced by a push-to-talk session or connector.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The connector could not open a session.
    #[error("connection failed: {reason}")]
    ConnectFailed {
        /// Why the connection failed.
        reason: String,
    },

    /// The service rejected a script operation.
    #[error("{command} rejected: {reason}")]
    CommandFailed {
        /// Name of the rejected operation.
        command: String,
        /// Rejection reason reported by the service.
        reason: String,
    },

    /// An operation was attempted on a session that is already closed.
    #[error("session is closed")]
    SessionClosed,
}

impl ProtocolError {
    /// Creates a connect-failed error with the given reason.
    pub fn connect_failed(reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            reason: reason.into(),
        }
    }

    /// Creates a command-failed error for the given operation.
    pub fn command_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from the video-link extraction collaborator.
///
/// The pipeline builder maps these to [`CastError::StreamInitFailed`]; they
/// are kept separate so [`MediaExtractor`](crate::MediaExtractor)
/// implementations do not depend on the orchestrator's taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The extraction tool is missing or could not be started.
    #[error("extractor unavailable: {reason}")]
    Unavailable {
        /// Why the extractor could not run.
        reason: String,
    },

    /// Requesting link metadata failed.
    #[error("metadata request failed: {reason}")]
    Metadata {
        /// What the metadata request reported.
        reason: String,
    },

    /// Opening the audio stream for the link failed.
    #[error("audio stream request failed: {reason}")]
    Stream {
        /// What the stream request reported.
        reason: String,
    },
}

impl ExtractError {
    /// Creates a metadata error with the given reason.
    pub fn metadata(reason: impl Into<String>) -> Self {
        Self::Metadata {
            reason: reason.into(),
        }
    }

    /// Creates a stream error with the given reason.
    pub fn stream(reason: impl Into<String>) -> Self {
        Self::Stream {
            reason: reason.into(),
        }
    }
}

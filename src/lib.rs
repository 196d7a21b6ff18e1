//! # ptt-cast
//!
//! Stream a local audio file, a generic URL, or a video-sharing link into a
//! live push-to-talk channel session, optionally preceded by a caption and a
//! composed preview image.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ptt_cast::{Credentials, DetailFlags, Orchestrator, PlayRequest, TransformOptions};
//!
//! let orchestrator = Orchestrator::builder(Arc::new(my_connector)).build();
//! orchestrator.shutdown().install_interrupt_handler();
//!
//! let report = orchestrator
//!     .run(PlayRequest {
//!         target: "https://youtu.be/dQw4w9WgXcQ".to_string(),
//!         options: TransformOptions::default(),
//!         credentials: Credentials::from_file("credentials.json".as_ref())?,
//!         channel: Some("The Lounge".to_string()),
//!         details: DetailFlags::all(),
//!     })
//!     .await?;
//! ```
//!
//! ## Architecture
//!
//! One invocation is a single cooperative flow:
//!
//! - **Classification**: the target string maps to a local file, a generic
//!   URL, or a video link - pure string matching, no I/O
//! - **Pipeline**: every source feeds bytes into one ffmpeg decode/transform
//!   stage; the output is a lazy, single-consumer PCM byte stream
//! - **Readiness gate**: the session is not opened until the pipeline has
//!   produced its first chunk, removing the dead-air gap between the
//!   announcement and the audio
//! - **Session script**: login, optional image, optional caption, audio - a
//!   strict ordered command sequence with no retries, closed exactly once
//! - **Shutdown controller**: observes the in-flight pipeline and session and
//!   tears them down (pipeline first) on interruption, idempotently
//!
//! The wire protocol is not implemented here: bring a
//! [`PttConnector`]/[`PttSession`] implementation for your service, or use
//! the bundled [`MockConnector`] for tests and dry runs.

#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod orchestrator;
mod session;
mod shutdown;
mod target;

pub mod media;
pub mod pipeline;
pub mod presentation;
pub mod protocol;

pub use builder::{BuiltPipeline, PipelineBuilder};
pub use config::{
    parse_start_offset, DetailFlags, FrameSize, SamplingRate, TranscodeParams, TransformOptions,
    BITRATE_RANGE, TEMPO_RANGE, VOLUME_RANGE,
};
pub use error::{CastError, ExtractError, ProtocolError};
pub use media::extractor::{
    AudioQuality, MediaExtractor, MediaStream, StreamRequest, Thumbnail, VideoInfo, YtDlpExtractor,
};
pub use media::tags::{read_tags, TrackTags};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, PlayRequest, DEFAULT_ENDPOINT};
pub use pipeline::{AudioPipeline, PipelineCtl, Readiness, ReadinessGate};
pub use presentation::Presentation;
pub use protocol::mock::{MockConnector, MockSession};
pub use protocol::{
    ConnectOptions, Credentials, PttConnector, PttSession, ScriptOp, SessionStatus,
};
pub use session::{run_session, SessionReport, SessionScript};
pub use shutdown::ShutdownController;
pub use target::{classify, video_id, SourceKind, TargetDescriptor};

//! The playback orchestrator: one invocation, end to end.
//!
//! Classify the target, build the pipeline, hold the session until the
//! pipeline has data, run the ordered session script, and tear everything
//! down in the right order no matter which stage failed.

use std::sync::Arc;

use crate::builder::{BuiltPipeline, PipelineBuilder};
use crate::config::{DetailFlags, TransformOptions};
use crate::error::CastError;
use crate::media::extractor::{MediaExtractor, YtDlpExtractor};
use crate::pipeline::{Readiness, ReadinessGate};
use crate::protocol::{ConnectOptions, Credentials, PttConnector};
use crate::session::{run_session, SessionReport, SessionScript};
use crate::shutdown::ShutdownController;
use crate::target::TargetDescriptor;

/// Default push-to-talk service endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://zello.io/ws";

/// Everything one invocation needs.
pub struct PlayRequest {
    /// The playback target: file path, URL, or video link.
    pub target: String,
    /// Decode/transform and transcode configuration.
    pub options: TransformOptions,
    /// Login credentials.
    pub credentials: Credentials,
    /// Optional channel override applied to the credentials.
    pub channel: Option<String>,
    /// Which presentation details to produce.
    pub details: DetailFlags,
}

/// Runs playback invocations against a push-to-talk service.
///
/// Built once via [`Orchestrator::builder`]; the protocol connector is the
/// only required collaborator, everything else has a bundled default.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use ptt_cast::{
///     Credentials, DetailFlags, MockConnector, Orchestrator, PlayRequest, TransformOptions,
/// };
///
/// # async fn run() -> Result<(), ptt_cast::CastError> {
/// let orchestrator = Orchestrator::builder(Arc::new(MockConnector::new())).build();
/// let report = orchestrator
///     .run(PlayRequest {
///         target: "album/track.mp3".to_string(),
///         options: TransformOptions::default(),
///         credentials: Credentials::from_file("credentials.json".as_ref())?,
///         channel: None,
///         details: DetailFlags::all(),
///     })
///     .await?;
/// assert!(report.completed);
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator {
    connector: Arc<dyn PttConnector>,
    extractor: Arc<dyn MediaExtractor>,
    endpoint: String,
    connect_options: ConnectOptions,
    shutdown: ShutdownController,
    http: reqwest::Client,
}

/// Builder for [`Orchestrator`].
#[must_use]
pub struct OrchestratorBuilder {
    connector: Arc<dyn PttConnector>,
    extractor: Option<Arc<dyn MediaExtractor>>,
    endpoint: String,
    connect_options: ConnectOptions,
    shutdown: Option<ShutdownController>,
}

impl OrchestratorBuilder {
    /// Overrides the service endpoint. Default: [`DEFAULT_ENDPOINT`].
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the connect options.
    pub fn connect_options(mut self, options: ConnectOptions) -> Self {
        self.connect_options = options;
        self
    }

    /// Overrides the video-link extractor. Default: [`YtDlpExtractor`].
    pub fn extractor(mut self, extractor: Arc<dyn MediaExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Uses an existing shutdown controller (so the caller can install the
    /// interrupt handler on it). Default: a fresh controller.
    pub fn shutdown(mut self, shutdown: ShutdownController) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> Orchestrator {
        Orchestrator {
            connector: self.connector,
            extractor: self
                .extractor
                .unwrap_or_else(|| Arc::new(YtDlpExtractor::new())),
            endpoint: self.endpoint,
            connect_options: self.connect_options,
            shutdown: self.shutdown.unwrap_or_default(),
            http: reqwest::Client::new(),
        }
    }
}

impl Orchestrator {
    /// Starts building an orchestrator around a protocol connector.
    pub fn builder(connector: Arc<dyn PttConnector>) -> OrchestratorBuilder {
        OrchestratorBuilder {
            connector,
            extractor: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_options: ConnectOptions::default(),
            shutdown: None,
        }
    }

    /// The shutdown controller observing this orchestrator's resources.
    pub fn shutdown(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// Runs one playback invocation.
    ///
    /// The session is not opened until the pipeline's readiness event has
    /// fired. A rejected session command is recorded in the report, not
    /// returned as an error - the session was still closed and the process
    /// outcome is a clean exit.
    ///
    /// # Errors
    ///
    /// Fatal resolution and connection failures, per
    /// [`CastError::exit_code`]. On any error the tracked resources have
    /// already been torn down.
    pub async fn run(&self, request: PlayRequest) -> Result<SessionReport, CastError> {
        request.options.validate()?;

        let descriptor = TargetDescriptor::resolve(&request.target, request.options.start_at);
        tracing::info!(raw = descriptor.raw(), kind = ?descriptor.kind(), "target classified");

        let builder = PipelineBuilder::new(
            request.options.clone(),
            request.details,
            Arc::clone(&self.extractor),
            self.http.clone(),
        );
        let BuiltPipeline {
            audio,
            presentation,
        } = match builder.build(&descriptor).await {
            Ok(built) => built,
            Err(e) => {
                tracing::error!(raw = descriptor.raw(), error = %e, "source resolution failed");
                self.shutdown.trigger().await;
                return Err(e);
            }
        };
        self.shutdown.track_pipeline(audio.ctl());

        // Announcing a track and then buffering would leave dead air in the
        // channel, so the session stays unopened until data exists.
        let mut gate = ReadinessGate::new(audio);
        tracing::info!("waiting for audio data");
        match gate.wait_ready().await {
            Ok(Readiness::Ready) => tracing::debug!("audio data is ready"),
            Ok(Readiness::Ended) => {
                self.shutdown.trigger().await;
                return Err(CastError::stream_init(
                    "pipeline ended before producing any data",
                ));
            }
            Err(e) => {
                self.shutdown.trigger().await;
                return Err(CastError::stream_init(format!("pipeline read failed: {e}")));
            }
        }

        let mut credentials = request.credentials;
        if let Some(channel) = request.channel {
            credentials.channel = channel;
        }

        let result = run_session(
            self.connector.as_ref(),
            &self.endpoint,
            &self.connect_options,
            SessionScript {
                credentials: &credentials,
                presentation: &presentation,
                audio: &mut gate,
                transcode: request.options.transcode(),
            },
            &self.shutdown,
        )
        .await;

        // The session is done (or never opened); the pipeline must not be
        // read past this point.
        self.shutdown.clear_pipeline();
        gate.ctl().destroy();

        match &result {
            Ok(report) if report.completed => {
                tracing::info!(operations = report.operations.len(), "playback complete");
            }
            Ok(report) => {
                tracing::warn!(
                    completed = report.operations.len(),
                    "playback aborted by a rejected command"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "session could not be established");
            }
        }
        result
    }
}

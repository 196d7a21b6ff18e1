//! Pipeline builder: resolves a target into an audio pipeline and its
//! presentation payload.
//!
//! Each source kind is opened differently, but all of them end up feeding
//! bytes into the same ffmpeg decode/transform stage, so downstream code
//! never cares where the audio came from.

use std::path::Path;
use std::sync::Arc;

use crate::config::{DetailFlags, TransformOptions};
use crate::error::CastError;
use crate::media::extractor::{MediaExtractor, StreamRequest};
use crate::media::{fetch, tags};
use crate::pipeline::{AudioPipeline, ByteSource, DecodeStage};
use crate::presentation::{
    caption_from_tags, caption_from_video, fallback_caption, render_video_preview, Presentation,
};
use crate::target::{SourceKind, TargetDescriptor};

/// A built pipeline and the presentation derived from the source.
pub struct BuiltPipeline {
    /// The decoded, transformed audio stream.
    pub audio: AudioPipeline,
    /// Caption and preview image, per the requested detail flags.
    pub presentation: Presentation,
}

impl std::fmt::Debug for BuiltPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltPipeline")
            .field("presentation", &self.presentation)
            .finish_non_exhaustive()
    }
}

/// Builds audio pipelines from target descriptors.
pub struct PipelineBuilder {
    options: TransformOptions,
    details: DetailFlags,
    extractor: Arc<dyn MediaExtractor>,
    http: reqwest::Client,
    decode: DecodeStage,
}

impl PipelineBuilder {
    /// Creates a builder with the given transform options and collaborators.
    pub fn new(
        options: TransformOptions,
        details: DetailFlags,
        extractor: Arc<dyn MediaExtractor>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            options,
            details,
            extractor,
            http,
            decode: DecodeStage::new(),
        }
    }

    /// Resolves the descriptor's source and builds the pipeline.
    ///
    /// # Errors
    ///
    /// [`CastError::SourceNotFound`] for a missing local file;
    /// [`CastError::StreamInitFailed`] for every other resolution failure
    /// (fetch errors, extraction errors, decode-stage spawn failures).
    pub async fn build(&self, descriptor: &TargetDescriptor) -> Result<BuiltPipeline, CastError> {
        match descriptor.kind() {
            SourceKind::LocalFile => self.build_local(descriptor).await,
            SourceKind::GenericUrl => self.build_url(descriptor).await,
            SourceKind::VideoLink => self.build_video(descriptor).await,
        }
    }

    async fn build_local(&self, descriptor: &TargetDescriptor) -> Result<BuiltPipeline, CastError> {
        let path = descriptor.path();
        if tokio::fs::metadata(path).await.is_err() {
            return Err(CastError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        tracing::info!(path = %path.display(), "local file detected");

        let presentation = self.local_presentation(path).await;

        let file = tokio::fs::File::open(path).await.map_err(|e| {
            CastError::stream_init(format!("failed to open {}: {e}", path.display()))
        })?;
        let audio = self
            .decode
            .spawn(
                ByteSource::reader(file),
                &self.options,
                descriptor.start_at(),
                Vec::new(),
            )
            .await?;

        Ok(BuiltPipeline {
            audio,
            presentation,
        })
    }

    async fn local_presentation(&self, path: &Path) -> Presentation {
        if !self.details.text && !self.details.image {
            return Presentation::empty();
        }
        let owned = path.to_path_buf();
        // Tag probing is synchronous I/O; keep it off the async flow.
        let file_tags = tokio::task::spawn_blocking(move || tags::read_tags(&owned))
            .await
            .ok()
            .flatten();

        let caption = self.details.text.then(|| {
            file_tags
                .as_ref()
                .and_then(caption_from_tags)
                .unwrap_or_else(|| fallback_caption(path))
        });
        let image = if self.details.image {
            file_tags.and_then(|t| t.cover)
        } else {
            None
        };
        Presentation { caption, image }
    }

    async fn build_url(&self, descriptor: &TargetDescriptor) -> Result<BuiltPipeline, CastError> {
        tracing::info!(url = descriptor.raw(), "generic url detected");
        let body = fetch::open_url_stream(&self.http, descriptor.raw()).await?;
        let audio = self
            .decode
            .spawn(ByteSource::chunks(body), &self.options, None, Vec::new())
            .await?;

        // No metadata is derivable from a bare URL.
        Ok(BuiltPipeline {
            audio,
            presentation: Presentation::empty(),
        })
    }

    async fn build_video(&self, descriptor: &TargetDescriptor) -> Result<BuiltPipeline, CastError> {
        let link = descriptor.raw();
        tracing::info!(link, id = ?crate::target::video_id(link), "video link detected");

        let mut presentation = Presentation::empty();
        if self.details.text || self.details.image {
            tracing::debug!("requesting video metadata");
            let info = self
                .extractor
                .basic_info(link)
                .await
                .map_err(|e| CastError::stream_init(e.to_string()))?;

            if self.details.text {
                presentation.caption = Some(caption_from_video(&info));
            }
            if self.details.image {
                if let Some(thumbnail) = info.best_thumbnail() {
                    let bytes = fetch::fetch_bytes(&self.http, &thumbnail.url).await?;
                    presentation.image =
                        Some(render_video_preview(&bytes, info.duration_seconds)?);
                } else {
                    tracing::warn!("video has no thumbnails, skipping preview");
                }
            }
        }

        tracing::debug!("requesting video audio stream");
        let request = StreamRequest {
            start_at: descriptor.start_at(),
            ..Default::default()
        };
        let media = self
            .extractor
            .open_audio_stream(link, &request)
            .await
            .map_err(|e| CastError::stream_init(e.to_string()))?;
        let (reader, guard) = media.into_parts();

        // The extractor already applied the start offset.
        let audio = self
            .decode
            .spawn(
                ByteSource::Reader(reader),
                &self.options,
                None,
                guard.into_iter().collect(),
            )
            .await?;

        Ok(BuiltPipeline {
            audio,
            presentation,
        })
    }
}

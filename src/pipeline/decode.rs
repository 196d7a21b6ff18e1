//! The ffmpeg-backed decode/transform stage.
//!
//! Every source kind feeds raw container bytes into an ffmpeg child process
//! on stdin and reads signed 16-bit PCM from its stdout, so resampling,
//! volume/tempo scaling, loudness normalization, and compression are all one
//! filter chain regardless of where the bytes came from.

use std::io;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};

use crate::config::TransformOptions;
use crate::error::CastError;
use crate::pipeline::AudioPipeline;

/// A boxed stream of fetched byte chunks (the reqwest body shape).
pub(crate) type BoxChunkStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Bytes flowing into the decode stage.
pub(crate) enum ByteSource {
    /// An async reader (file, extractor stdout, in-memory test data).
    Reader(Box<dyn AsyncRead + Send + Unpin>),
    /// A chunk stream (HTTP response body).
    Chunks(BoxChunkStream),
}

impl ByteSource {
    pub(crate) fn reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Reader(Box::new(reader))
    }

    pub(crate) fn chunks(stream: BoxChunkStream) -> Self {
        Self::Chunks(stream)
    }
}

/// Spawns and wires the ffmpeg decode/transform process.
pub(crate) struct DecodeStage {
    program: String,
}

impl Default for DecodeStage {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeStage {
    pub(crate) fn new() -> Self {
        Self {
            program: "ffmpeg".to_string(),
        }
    }

    /// Builds the full ffmpeg argument list for the given options.
    ///
    /// `start_at` becomes an input-side `-ss`; it is `None` when the source
    /// already applied the offset (extractor streams).
    pub(crate) fn transform_args(
        options: &TransformOptions,
        start_at: Option<Duration>,
    ) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        if let Some(offset) = start_at {
            args.push("-ss".to_string());
            args.push(format_offset(offset));
        }
        args.push("-i".to_string());
        args.push("pipe:0".to_string());

        let filters = audio_filters(options);
        if !filters.is_empty() {
            args.push("-af".to_string());
            args.push(filters.join(","));
        }

        args.push("-f".to_string());
        args.push("s16le".to_string());
        args.push("-acodec".to_string());
        args.push("pcm_s16le".to_string());
        args.push("-ar".to_string());
        args.push(options.sampling_rate.as_hz().to_string());
        args.push("-ac".to_string());
        args.push(options.channels.to_string());
        args.push("pipe:1".to_string());
        args
    }

    /// Spawns the decode process and the stdin feeder task.
    ///
    /// `aux` carries any helper child process that produces the source bytes
    /// (the extractor), so destroying the pipeline kills it too.
    ///
    /// # Errors
    ///
    /// Returns [`CastError::StreamInitFailed`] if the process cannot be
    /// spawned or its pipes are unavailable.
    pub(crate) async fn spawn(
        &self,
        source: ByteSource,
        options: &TransformOptions,
        start_at: Option<Duration>,
        aux: Vec<Child>,
    ) -> Result<AudioPipeline, CastError> {
        let args = Self::transform_args(options, start_at);
        tracing::debug!(program = %self.program, ?args, "spawning decode stage");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CastError::stream_init(format!("failed to spawn {}: {e}", self.program))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CastError::stream_init("decode stage has no stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CastError::stream_init("decode stage has no stdout"))?;

        let feeder = tokio::spawn(feed(source, stdin));

        let mut children = aux;
        children.push(child);
        Ok(AudioPipeline::new(Box::new(stdout), children, Some(feeder)))
    }
}

/// Copies the source bytes into the decode process until either side ends.
async fn feed(source: ByteSource, mut stdin: ChildStdin) {
    match source {
        ByteSource::Reader(mut reader) => {
            if let Err(e) = tokio::io::copy(&mut reader, &mut stdin).await {
                tracing::debug!(error = %e, "decode feeder stopped");
            }
        }
        ByteSource::Chunks(mut chunks) => {
            while let Some(next) = chunks.next().await {
                match next {
                    Ok(chunk) => {
                        if let Err(e) = stdin.write_all(&chunk).await {
                            tracing::debug!(error = %e, "decode feeder stopped");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "source stream failed");
                        break;
                    }
                }
            }
        }
    }
    // Signal end of input so ffmpeg flushes and exits.
    let _ = stdin.shutdown().await;
}

fn audio_filters(options: &TransformOptions) -> Vec<String> {
    let mut filters = Vec::new();
    if let Some(volume) = options.volume_factor {
        filters.push(format!("volume={volume}"));
    }
    if let Some(tempo) = options.tempo_factor {
        filters.push(format!("atempo={tempo}"));
    }
    if options.normalizer {
        filters.push("loudnorm".to_string());
    }
    if options.compressor {
        filters.push("acompressor".to_string());
    }
    filters
}

fn format_offset(offset: Duration) -> String {
    if offset.subsec_nanos() == 0 {
        offset.as_secs().to_string()
    } else {
        format!("{:.3}", offset.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingRate;

    #[test]
    fn test_args_plain() {
        let options = TransformOptions::default();
        let args = DecodeStage::transform_args(&options, None);
        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                "pipe:0",
                "-f",
                "s16le",
                "-acodec",
                "pcm_s16le",
                "-ar",
                "48000",
                "-ac",
                "1",
                "pipe:1"
            ]
        );
    }

    #[test]
    fn test_args_filter_chain_order() {
        let options = TransformOptions {
            volume_factor: Some(0.3),
            tempo_factor: Some(1.25),
            normalizer: true,
            compressor: true,
            ..Default::default()
        };
        let args = DecodeStage::transform_args(&options, None);
        let af = args.iter().position(|a| a == "-af").unwrap();
        assert_eq!(args[af + 1], "volume=0.3,atempo=1.25,loudnorm,acompressor");
    }

    #[test]
    fn test_args_start_offset_precedes_input() {
        let options = TransformOptions {
            sampling_rate: SamplingRate::Hz16000,
            ..Default::default()
        };
        let args = DecodeStage::transform_args(&options, Some(Duration::from_secs(90)));
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[ss + 1], "90");
        assert!(ss < input);
        let ar = args.iter().position(|a| a == "-ar").unwrap();
        assert_eq!(args[ar + 1], "16000");
    }

    #[test]
    fn test_format_offset_fractional() {
        assert_eq!(format_offset(Duration::from_millis(1500)), "1.500");
        assert_eq!(format_offset(Duration::from_secs(45)), "45");
    }
}

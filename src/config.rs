//! Transform and transcode configuration.

use std::time::Duration;

use crate::CastError;

/// Allowed volume scaling range.
pub const VOLUME_RANGE: std::ops::RangeInclusive<f64> = 0.01..=2.0;

/// Allowed tempo scaling range.
pub const TEMPO_RANGE: std::ops::RangeInclusive<f64> = 0.5..=2.0;

/// Allowed bitrate range in kbps.
pub const BITRATE_RANGE: std::ops::RangeInclusive<u32> = 4..=96;

/// Sampling rates supported by the push-to-talk audio codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingRate {
    /// 8 kHz narrowband.
    Hz8000,
    /// 16 kHz wideband.
    Hz16000,
    /// 24 kHz super-wideband.
    Hz24000,
    /// 48 kHz fullband.
    #[default]
    Hz48000,
}

impl SamplingRate {
    /// The rate in Hz.
    #[must_use]
    pub fn as_hz(&self) -> u32 {
        match self {
            Self::Hz8000 => 8000,
            Self::Hz16000 => 16000,
            Self::Hz24000 => 24000,
            Self::Hz48000 => 48000,
        }
    }

    /// Looks up a member of the allowed set, or `None` for any other rate.
    pub fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            8000 => Some(Self::Hz8000),
            16000 => Some(Self::Hz16000),
            24000 => Some(Self::Hz24000),
            48000 => Some(Self::Hz48000),
            _ => None,
        }
    }
}

/// Frame sizes supported by the push-to-talk audio codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameSize {
    /// 20 ms frames.
    #[default]
    Ms20,
    /// 40 ms frames.
    Ms40,
    /// 60 ms frames.
    Ms60,
}

impl FrameSize {
    /// The frame duration in milliseconds.
    #[must_use]
    pub fn as_millis(&self) -> u32 {
        match self {
            Self::Ms20 => 20,
            Self::Ms40 => 40,
            Self::Ms60 => 60,
        }
    }

    /// Looks up a member of the allowed set, or `None` for any other size.
    pub fn from_millis(ms: u32) -> Option<Self> {
        match ms {
            20 => Some(Self::Ms20),
            40 => Some(Self::Ms40),
            60 => Some(Self::Ms60),
            _ => None,
        }
    }
}

/// Configuration for the decode/transform stage and the audio send.
///
/// Sampling rate and frame size are enumerated types, so they are valid by
/// construction; the numeric fields are checked by
/// [`validate()`](TransformOptions::validate) before a pipeline is built.
///
/// # Example
///
/// ```
/// use ptt_cast::TransformOptions;
///
/// let options = TransformOptions {
///     volume_factor: Some(0.3),
///     ..Default::default()
/// };
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Output sampling rate.
    pub sampling_rate: SamplingRate,

    /// Codec frame size used when sending audio.
    pub frame_size: FrameSize,

    /// Send bitrate in kbps. Default: 32.
    pub bitrate_kbps: u32,

    /// Output channel count. Default: 1 (the channel session is mono).
    pub channels: u16,

    /// Optional volume scaling, `0.01..=2.0`.
    pub volume_factor: Option<f64>,

    /// Optional tempo scaling, `0.5..=2.0`.
    pub tempo_factor: Option<f64>,

    /// Apply loudness normalization.
    pub normalizer: bool,

    /// Apply dynamic range compression.
    pub compressor: bool,

    /// Optional start offset into the source.
    pub start_at: Option<Duration>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            sampling_rate: SamplingRate::default(),
            frame_size: FrameSize::default(),
            bitrate_kbps: 32,
            channels: 1,
            volume_factor: None,
            tempo_factor: None,
            normalizer: false,
            compressor: false,
            start_at: None,
        }
    }
}

impl TransformOptions {
    /// Checks the numeric fields against their allowed ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CastError::InvalidOptions`] naming the violated constraint.
    pub fn validate(&self) -> Result<(), CastError> {
        if let Some(volume) = self.volume_factor {
            if !VOLUME_RANGE.contains(&volume) {
                return Err(CastError::invalid_options(format!(
                    "volume factor {volume} outside {VOLUME_RANGE:?}"
                )));
            }
        }
        if let Some(tempo) = self.tempo_factor {
            if !TEMPO_RANGE.contains(&tempo) {
                return Err(CastError::invalid_options(format!(
                    "tempo factor {tempo} outside {TEMPO_RANGE:?}"
                )));
            }
        }
        if !BITRATE_RANGE.contains(&self.bitrate_kbps) {
            return Err(CastError::invalid_options(format!(
                "bitrate {} kbps outside {BITRATE_RANGE:?}",
                self.bitrate_kbps
            )));
        }
        if self.channels == 0 {
            return Err(CastError::invalid_options("channel count must be nonzero"));
        }
        Ok(())
    }

    /// The transcode parameters handed to the send-audio operation.
    #[must_use]
    pub fn transcode(&self) -> TranscodeParams {
        TranscodeParams {
            sampling_rate: self.sampling_rate,
            frame_size: self.frame_size,
            bitrate_kbps: self.bitrate_kbps,
            channels: self.channels,
        }
    }
}

/// Parameters applied when sending audio into a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeParams {
    /// Sampling rate of the sent audio.
    pub sampling_rate: SamplingRate,
    /// Codec frame size.
    pub frame_size: FrameSize,
    /// Bitrate in kbps.
    pub bitrate_kbps: u32,
    /// Channel count.
    pub channels: u16,
}

/// Which presentation details to produce alongside the audio.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailFlags {
    /// Send a caption text before the audio.
    pub text: bool,
    /// Send a preview image before the caption.
    pub image: bool,
}

impl DetailFlags {
    /// Both caption and preview enabled.
    pub fn all() -> Self {
        Self {
            text: true,
            image: true,
        }
    }
}

/// Parses a start offset in `SS`, `MM:SS`, or `HH:MM:SS` form.
///
/// # Errors
///
/// Returns [`CastError::InvalidOptions`] for empty input, non-numeric parts,
/// or more than three `:`-separated fields.
pub fn parse_start_offset(input: &str) -> Result<Duration, CastError> {
    let parts: Vec<&str> = input.split(':').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(CastError::invalid_options(format!(
            "unrecognized start offset: {input:?}"
        )));
    }
    let mut seconds: u64 = 0;
    for part in &parts {
        let field: u64 = part.parse().map_err(|_| {
            CastError::invalid_options(format!("unrecognized start offset: {input:?}"))
        })?;
        seconds = seconds * 60 + field;
    }
    Ok(Duration::from_secs(seconds))
}

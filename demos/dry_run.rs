//! Dry-run player: the full orchestration against the bundled recording
//! client instead of a live service.
//!
//! Classification, pipeline build, readiness gating, caption and preview
//! production, and the ordered session script all run for real; only the
//! wire protocol is replaced by the recorder, whose log is printed at the
//! end.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example dry_run -- song.mp3 --text --volume 0.3
//! cargo run --example dry_run -- https://youtu.be/dQw4w9WgXcQ --text --image
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ptt_cast::{
    parse_start_offset, CastError, Credentials, DetailFlags, FrameSize, MockConnector,
    Orchestrator, PlayRequest, SamplingRate, TransformOptions,
};

#[derive(Debug, Parser)]
#[command(name = "dry_run")]
#[command(about = "Play a target into a recording push-to-talk session")]
struct Cli {
    /// File path, URL, or video link to play.
    target: String,

    /// Credentials JSON file (username, password, channel).
    #[arg(long, default_value = "credentials.json")]
    credentials: PathBuf,

    /// Override the channel from the credentials file.
    #[arg(long)]
    channel: Option<String>,

    /// Volume factor, 0.01 to 2.
    #[arg(long)]
    volume: Option<f64>,

    /// Tempo factor, 0.5 to 2.
    #[arg(long)]
    tempo: Option<f64>,

    /// Sampling rate in Hz: 8000, 16000, 24000, or 48000.
    #[arg(long, default_value_t = 48000)]
    rate: u32,

    /// Frame size in ms: 20, 40, or 60.
    #[arg(long, default_value_t = 20)]
    frame: u32,

    /// Bitrate in kbps, 4 to 96.
    #[arg(long, default_value_t = 32)]
    bitrate: u32,

    /// Start offset: SS, MM:SS, or HH:MM:SS.
    #[arg(long)]
    start_at: Option<String>,

    /// Apply loudness normalization.
    #[arg(long)]
    normalizer: bool,

    /// Apply dynamic range compression.
    #[arg(long)]
    compressor: bool,

    /// Produce and send the caption text.
    #[arg(long)]
    text: bool,

    /// Produce and send the preview image.
    #[arg(long)]
    image: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            match e.downcast_ref::<CastError>() {
                Some(cast) => ExitCode::from(cast.exit_code() as u8),
                None => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let credentials = if cli.credentials.exists() {
        Credentials::from_file(&cli.credentials)?
    } else {
        Credentials {
            username: "dry-run".to_string(),
            password: String::new(),
            channel: "dry-run".to_string(),
            auth_token: None,
        }
    };

    let options = TransformOptions {
        sampling_rate: SamplingRate::from_hz(cli.rate)
            .ok_or_else(|| anyhow::anyhow!("unsupported sampling rate: {}", cli.rate))?,
        frame_size: FrameSize::from_millis(cli.frame)
            .ok_or_else(|| anyhow::anyhow!("unsupported frame size: {}", cli.frame))?,
        bitrate_kbps: cli.bitrate,
        channels: 1,
        volume_factor: cli.volume,
        tempo_factor: cli.tempo,
        normalizer: cli.normalizer,
        compressor: cli.compressor,
        start_at: cli.start_at.as_deref().map(parse_start_offset).transpose()?,
    };

    let connector = Arc::new(MockConnector::new());
    let orchestrator = Orchestrator::builder(connector.clone()).build();
    orchestrator.shutdown().install_interrupt_handler();

    let report = orchestrator
        .run(PlayRequest {
            target: cli.target,
            options,
            credentials,
            channel: cli.channel,
            details: DetailFlags {
                text: cli.text,
                image: cli.image,
            },
        })
        .await?;

    let session = connector.session();
    println!("executed: {}", report.operations.join(", "));
    println!("audio bytes: {}", session.audio_bytes());
    println!("image bytes: {}", session.image_bytes());
    if let Some(caption) = session.sent_text() {
        println!("caption:\n{caption}");
    }
    if let Some(error) = report.error {
        println!("aborted by: {error}");
    }
    Ok(())
}

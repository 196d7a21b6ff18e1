//! Renders a preview card from a local image file, the way a video link's
//! thumbnail is composed before being sent into the channel.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example preview_card -- thumbnail.png --duration 245 --out card.jpg
//! ```

use std::path::PathBuf;

use clap::Parser;

use ptt_cast::presentation::render_video_preview;

#[derive(Debug, Parser)]
#[command(name = "preview_card")]
#[command(about = "Compose a preview card from an image and a duration")]
struct Cli {
    /// Source image file (any decodable format).
    image: PathBuf,

    /// Duration in seconds for the label overlay.
    #[arg(long, default_value_t = 125)]
    duration: u64,

    /// Output JPEG path.
    #[arg(long, default_value = "card.jpg")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let bytes = std::fs::read(&cli.image)?;
    let card = render_video_preview(&bytes, cli.duration)?;
    std::fs::write(&cli.out, &card)?;
    println!("wrote {} ({} bytes)", cli.out.display(), card.len());
    Ok(())
}

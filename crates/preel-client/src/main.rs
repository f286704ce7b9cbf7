//! PromptReel CLI - drive the studio API from the terminal.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::images::ImagesCommand;
use commands::text_to_video::TextToVideoCommand;
use commands::voice_to_video::VoiceToVideoCommand;

#[derive(Parser)]
#[command(
    name = "preel",
    version,
    about = "Generate image batches and slideshow videos from prompts",
    after_help = "EXAMPLES:\n  \
                  # Generate one image per CSV row and download the zip\n  \
                  preel images --csv prompts.csv --style watercolor\n\n  \
                  # Turn a script into a narrated slideshow video\n  \
                  preel text-to-video --script story.txt --aspect-ratio 16:9\n\n  \
                  # Build a video from a narration recording\n  \
                  preel voice-to-video --audio narration.mp3 --output story.mp4"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image per prompt from a CSV file
    Images(ImagesCommand),

    /// Generate a narrated slideshow video from a script file
    TextToVideo(TextToVideoCommand),

    /// Generate a slideshow video from a narration recording
    VoiceToVideo(VoiceToVideoCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress lines go to stdout; keep tracing quiet unless asked
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    match cli.command {
        Commands::Images(cmd) => cmd.execute().await,
        Commands::TextToVideo(cmd) => cmd.execute().await,
        Commands::VoiceToVideo(cmd) => cmd.execute().await,
    }
}

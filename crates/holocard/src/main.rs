//! HOLOCARD CLI - headless card preview
//!
//! ```bash
//! # What does this machine support?
//! holocard caps
//!
//! # Mythic card at ultra for two seconds, no GPU needed
//! holocard preview --rarity mythic --quality ultra --frames 120 --no-gpu
//!
//! # Use a preference file
//! holocard preview --rarity rare --prefs ~/.config/holocard/prefs.toml
//! ```

use clap::{Parser, Subcommand};
use holocard_shared::{QualityPreset, Rarity};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;

/// HOLOCARD - adaptive premium card renderer
#[derive(Parser)]
#[command(name = "holocard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the detected device capability profile
    Caps,

    /// Render one card headless and print a frame report
    Preview {
        /// Card rarity
        #[arg(short, long, default_value = "rare")]
        rarity: Rarity,

        /// Quality preset, overriding the preference file
        #[arg(short, long)]
        quality: Option<QualityPreset>,

        /// Preference file (TOML)
        #[arg(short, long)]
        prefs: Option<PathBuf>,

        /// Number of frames to render
        #[arg(short, long, default_value = "120")]
        frames: u32,

        /// Surface width in pixels
        #[arg(long, default_value = "400")]
        width: u32,

        /// Surface height in pixels
        #[arg(long, default_value = "560")]
        height: u32,

        /// Record draw calls instead of touching the GPU
        #[arg(long)]
        no_gpu: bool,

        /// Pretend no graphics API is available
        #[arg(long)]
        unsupported: bool,

        /// Seed for particle layout and performance sampling
        #[arg(long, default_value = "1213156431")]
        seed: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_ascii_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(!cli.no_color)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Caps => commands::caps::run(),
        Commands::Preview {
            rarity,
            quality,
            prefs,
            frames,
            width,
            height,
            no_gpu,
            unsupported,
            seed,
        } => commands::preview::run(&commands::preview::PreviewArgs {
            rarity,
            quality,
            prefs,
            frames,
            width,
            height,
            no_gpu,
            unsupported,
            seed,
        })?,
    }

    Ok(())
}

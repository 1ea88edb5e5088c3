//! texstream - pooled staging-buffer texture streaming demo
//!
//! Streams a full 4096x4096 RGBA8 frame from CPU memory into a GPU texture
//! every display refresh and draws three offset triangles sampling it.
//!
//! # Usage
//!
//! ```bash
//! texstream
//! texstream --fullscreen
//! texstream --no-vsync
//! texstream --config path/to/texstream.toml
//! ```
//!
//! # Keyboard Shortcuts
//!
//! - ESC: Quit

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use texstream::config;

#[derive(Parser)]
#[command(name = "texstream")]
#[command(
    author,
    version,
    about = "Streams CPU frames into a GPU texture through a pool of reusable staging buffers"
)]
struct Args {
    /// Configuration file (TOML); missing file falls back to defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start in fullscreen mode (borderless window)
    #[arg(long, short = 'f')]
    fullscreen: bool,

    /// Disable vertical sync (uncapped frame rate)
    #[arg(long)]
    no_vsync: bool,

    /// Cap on live staging buffers (overrides config)
    #[arg(long)]
    max_staging_buffers: Option<usize>,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(e) = run(args) {
        tracing::error!("Application error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = config::load(args.config.as_deref());

    // CLI overrides
    if args.fullscreen {
        config.video.fullscreen = true;
    }
    if args.no_vsync {
        config.video.vsync = false;
    }
    if let Some(cap) = args.max_staging_buffers {
        config.stream.max_staging_buffers = cap;
    }

    tracing::info!("Starting texstream");
    texstream::app::run(config)
}

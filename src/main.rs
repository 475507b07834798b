// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use filtercam::backends::camera::types::{CameraBackendType, FacingMode};
use filtercam::backends::camera::{CameraBackend, get_backend};
use filtercam::backends::virtual_camera::VirtualBackend;
use filtercam::config::Config;
use filtercam::media::FilterType;
use filtercam::pipelines::video::{GStreamerEncoder, MediaEncoder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

mod cli;

#[derive(Parser)]
#[command(name = "filtercam")]
#[command(about = "Filtered photo and video capture for front and rear cameras")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Use the built-in virtual cameras instead of real devices
    #[arg(long = "virtual", global = true)]
    virtual_camera: bool,

    /// Still image shown by the virtual cameras (implies --virtual)
    #[arg(long, global = true)]
    image: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in terminal mode (default)
    Terminal,

    /// List available cameras
    List,

    /// Take a photo
    Photo {
        /// Camera facing: front or rear
        #[arg(long)]
        facing: Option<FacingMode>,

        /// Filter to apply (e.g. grayscale, sepia, blur)
        #[arg(long)]
        filter: Option<FilterType>,

        /// Output file path (default: ~/Pictures/filtercam/photo.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a video
    Video {
        /// Recording duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Camera facing: front or rear
        #[arg(long)]
        facing: Option<FacingMode>,

        /// Filter to apply (e.g. grayscale, sepia, blur)
        #[arg(long)]
        filter: Option<FilterType>,

        /// Output file path (default: ~/Pictures/filtercam/video.webm)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Record microphone audio
        #[arg(short, long)]
        audio: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=filtercam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let backend = create_backend(cli.virtual_camera, cli.image);
    let encoder: Arc<dyn MediaEncoder> = Arc::new(GStreamerEncoder::new());

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });

    match cli.command {
        None | Some(Commands::Terminal) => filtercam::terminal::run(config, backend, encoder),
        Some(Commands::List) => cli::list_cameras(backend.as_ref()),
        Some(Commands::Photo {
            facing,
            filter,
            output,
        }) => cli::take_photo(
            config,
            backend,
            encoder,
            cli::CaptureOptions {
                facing,
                filter,
                output,
            },
        ),
        Some(Commands::Video {
            duration,
            facing,
            filter,
            output,
            audio,
        }) => cli::record_video(
            config,
            backend,
            encoder,
            cli::CaptureOptions {
                facing,
                filter,
                output,
            },
            duration,
            audio,
        ),
    }
}

fn create_backend(virtual_camera: bool, image: Option<PathBuf>) -> Arc<dyn CameraBackend> {
    match image {
        Some(path) => Arc::new(VirtualBackend::with_image(path)),
        None if virtual_camera => Arc::from(get_backend(CameraBackendType::Virtual)),
        None => Arc::from(get_backend(CameraBackendType::GStreamer)),
    }
}

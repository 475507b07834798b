// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking photos
//! - Recording videos
//!
//! Photo and video commands drive the same application model as the
//! terminal interface, just without a screen.

use filtercam::app::{AppModel, CaptureMode, Message, Preview, RecordingPhase, Runtime};
use filtercam::backends::camera::CameraBackend;
use filtercam::backends::camera::types::FacingMode;
use filtercam::config::Config;
use filtercam::constants::{PHOTO_FILENAME, VIDEO_FILENAME, timing};
use filtercam::media::FilterType;
use filtercam::media::encoders::detection::detect_profiles;
use filtercam::pipelines::video::MediaEncoder;
use filtercam::storage::save_artifact_blocking;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// How long to wait for the first camera frame
const OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Options shared by the photo and video commands
pub struct CaptureOptions {
    pub facing: Option<FacingMode>,
    pub filter: Option<FilterType>,
    pub output: Option<PathBuf>,
}

impl CaptureOptions {
    fn apply(&self, config: &mut Config) {
        if let Some(facing) = self.facing {
            config.facing = facing;
        }
        if let Some(filter) = self.filter {
            config.filter = filter;
        }
    }
}

/// List all available cameras
pub fn list_cameras(backend: &dyn CameraBackend) -> Result<(), Box<dyn std::error::Error>> {
    let cameras = backend.enumerate_cameras()?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", backend.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Facing: {}", camera.location_label());
        println!("      Path:   {}", camera.path);
        println!();
    }

    let profiles = detect_profiles();
    if profiles.is_empty() {
        println!("Recording: not supported (no VP8/VP9 encoder installed)");
    } else {
        println!("Recording profiles: {}", profiles.join(", "));
    }

    Ok(())
}

/// Take a photo with the requested facing and filter
pub fn take_photo(
    mut config: Config,
    backend: Arc<dyn CameraBackend>,
    encoder: Arc<dyn MediaEncoder>,
    options: CaptureOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    options.apply(&mut config);
    config.record_audio = false;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut runtime = Runtime::new(AppModel::new(config, backend, encoder));
        open_camera(&mut runtime).await?;

        println!("Capturing photo...");
        runtime.dispatch(Message::Capture);
        runtime
            .run_until(
                |model| matches!(model.preview, Preview::Photo(_)) || model.notification().is_some(),
                OPEN_TIMEOUT,
            )
            .await;
        check_notification(runtime.model())?;

        let Preview::Photo(photo) = &runtime.model().preview else {
            return Err("Timed out waiting for the photo".into());
        };
        println!(
            "Photo: {}x{}, filter {}",
            photo.image.width(),
            photo.image.height(),
            photo.filter.display_name()
        );

        let path = write_output(
            runtime.model(),
            options.output.as_deref(),
            PHOTO_FILENAME,
            &photo.data,
        )?;
        println!("Saved: {}", path.display());

        runtime.into_model();
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Record a video for `duration` seconds
pub fn record_video(
    mut config: Config,
    backend: Arc<dyn CameraBackend>,
    encoder: Arc<dyn MediaEncoder>,
    options: CaptureOptions,
    duration: u64,
    audio: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    options.apply(&mut config);
    config.record_audio = audio;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut runtime = Runtime::new(AppModel::new(config, backend, encoder));
        runtime.dispatch(Message::SwitchMode(CaptureMode::Video));
        open_camera(&mut runtime).await?;

        runtime.dispatch(Message::StartRecording);
        while let Some(remaining) = runtime.model().recording.countdown() {
            println!("Recording in {}...", remaining);
            runtime
                .run_until(
                    |model| model.recording.countdown() != Some(remaining),
                    OPEN_TIMEOUT,
                )
                .await;
        }
        check_notification(runtime.model())?;
        if runtime.model().recording.phase() != RecordingPhase::Recording {
            return Err("Recording did not start".into());
        }

        println!("Recording for {} seconds... (Ctrl+C to abort)", duration);
        let limit = Duration::from_secs(duration) + OPEN_TIMEOUT;
        runtime
            .run_until(
                |model| model.recording.elapsed_secs() >= duration || !model.recording.is_active(),
                limit,
            )
            .await;
        check_notification(runtime.model())?;

        println!("Stopping...");
        runtime.dispatch(Message::StopRecording);
        runtime
            .run_until(
                |model| !model.recording.is_active(),
                timing::FINALIZE_TIMEOUT + Duration::from_secs(1),
            )
            .await;
        check_notification(runtime.model())?;

        let Preview::Video(video) = &runtime.model().preview else {
            return Err("Recording did not finish".into());
        };
        println!(
            "Video: {} s, {} chunks, {} bytes ({})",
            video.duration_secs,
            video.chunk_count,
            video.data.len(),
            video.mime_type
        );

        let path = write_output(
            runtime.model(),
            options.output.as_deref(),
            VIDEO_FILENAME,
            &video.data,
        )?;
        println!("Saved: {}", path.display());

        runtime.into_model();
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Start the camera and wait for its first frame
async fn open_camera(runtime: &mut Runtime) -> Result<(), Box<dyn std::error::Error>> {
    println!("Opening {} camera...", runtime.model().facing);
    runtime.dispatch(Message::StartCamera);
    runtime
        .run_until(
            |model| {
                model.notification().is_some()
                    || model
                        .stream
                        .as_ref()
                        .is_some_and(|stream| stream.latest_frame().is_some())
            },
            OPEN_TIMEOUT,
        )
        .await;
    check_notification(runtime.model())?;

    let Some(stream) = &runtime.model().stream else {
        return Err("Timed out waiting for the camera".into());
    };
    if stream.latest_frame().is_none() {
        return Err(format!("No frames from {}", stream.device.name).into());
    }
    println!("Using: {} ({})", stream.device.name, runtime.model().facing);
    Ok(())
}

fn check_notification(model: &AppModel) -> Result<(), Box<dyn std::error::Error>> {
    match model.notification() {
        Some(notification) => Err(format!("{}: {}", notification.title, notification.body).into()),
        None => Ok(()),
    }
}

/// Write to `output` if given, otherwise into the download directory
fn write_output(
    model: &AppModel,
    output: Option<&Path>,
    filename: &str,
    data: &[u8],
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, data)?;
            Ok(path.to_path_buf())
        }
        None => Ok(save_artifact_blocking(
            &model.config.resolved_download_dir(),
            filename,
            data,
        )?),
    }
}

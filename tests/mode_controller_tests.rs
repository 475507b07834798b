// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for capture modes, filters and affordances

mod common;

use common::*;
use filtercam::app::{CaptureMode, Message, Preview, RecordingPhase};
use filtercam::media::FilterType;

#[tokio::test]
async fn test_starts_in_photo_mode() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = runtime(test_config(dir.path()), FakeBackend::new(), FakeEncoder::new());
    assert_eq!(runtime.model().mode, CaptureMode::Photo);
    assert!(!runtime.model().can_capture(), "no stream yet");

    start_camera(&mut runtime).await;

    let model = runtime.model();
    assert!(model.can_capture());
    assert!(!model.can_record());
    assert!(!model.can_pause());
    assert!(!model.can_stop());
    assert!(model.can_switch_mode());
}

#[tokio::test]
async fn test_toggle_mode_swaps_controls() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = runtime(test_config(dir.path()), FakeBackend::new(), FakeEncoder::new());
    start_camera(&mut runtime).await;

    runtime.dispatch(Message::ToggleMode);
    assert_eq!(runtime.model().mode, CaptureMode::Video);
    assert!(runtime.model().can_record());
    assert!(!runtime.model().can_capture());

    runtime.dispatch(Message::SwitchMode(CaptureMode::Photo));
    assert_eq!(runtime.model().mode, CaptureMode::Photo);
    assert!(runtime.model().can_capture());
}

#[tokio::test]
async fn test_mode_switch_clears_photo_preview() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = runtime(test_config(dir.path()), FakeBackend::new(), FakeEncoder::new());
    start_camera(&mut runtime).await;

    runtime.dispatch(Message::Capture);
    assert!(
        runtime
            .run_until(|m| matches!(m.preview, Preview::Photo(_)), WAIT)
            .await
    );

    runtime.dispatch(Message::ToggleMode);
    assert_eq!(runtime.model().mode, CaptureMode::Video);
    assert!(runtime.model().preview.is_live());
}

#[tokio::test]
async fn test_mode_locked_while_recording() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = runtime(test_config(dir.path()), FakeBackend::new(), FakeEncoder::new());
    runtime.dispatch(Message::ToggleMode);
    start_camera(&mut runtime).await;

    runtime.dispatch(Message::StartRecording);
    assert_eq!(runtime.model().recording.phase(), RecordingPhase::CountingDown);
    assert!(!runtime.model().can_switch_mode());

    runtime.dispatch(Message::ToggleMode);
    assert_eq!(runtime.model().mode, CaptureMode::Video);

    runtime.dispatch(Message::StopRecording);
    assert_eq!(runtime.model().recording.phase(), RecordingPhase::Idle);
    runtime.dispatch(Message::ToggleMode);
    assert_eq!(runtime.model().mode, CaptureMode::Photo);
}

#[tokio::test]
async fn test_filter_selection() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.filter = FilterType::Sepia;
    let mut runtime = runtime(config, FakeBackend::new(), FakeEncoder::new());
    assert_eq!(runtime.model().filter(), FilterType::Sepia);

    let mut receiver = runtime.model().filter_receiver();
    runtime.dispatch(Message::SetFilter(FilterType::Grayscale));
    assert_eq!(runtime.model().filter(), FilterType::Grayscale);
    assert!(receiver.has_changed().unwrap());
    assert_eq!(*receiver.borrow_and_update(), FilterType::Grayscale);

    runtime.dispatch(Message::NextFilter);
    assert_eq!(runtime.model().filter(), FilterType::Grayscale.next());
    runtime.dispatch(Message::PreviousFilter);
    assert_eq!(runtime.model().filter(), FilterType::Grayscale);
}

#[tokio::test]
async fn test_filters_cycle_through_all() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = runtime(test_config(dir.path()), FakeBackend::new(), FakeEncoder::new());

    let mut seen = Vec::new();
    for _ in 0..FilterType::ALL.len() {
        seen.push(runtime.model().filter());
        runtime.dispatch(Message::NextFilter);
    }
    assert_eq!(seen, FilterType::ALL.to_vec());
    assert_eq!(runtime.model().filter(), FilterType::None);

    runtime.dispatch(Message::PreviousFilter);
    assert_eq!(runtime.model().filter(), FilterType::Vintage);
}

#[tokio::test]
async fn test_notifications_queue_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = runtime(test_config(dir.path()), FakeBackend::denied(), FakeEncoder::new());
    start_camera(&mut runtime).await;
    runtime.dispatch(Message::SwitchCamera);
    runtime.run_until(|m| !m.is_acquiring(), WAIT).await;

    assert_eq!(runtime.model().notifications.len(), 2);
    runtime.dispatch(Message::DismissNotification);
    assert_eq!(runtime.model().notifications.len(), 1);
    runtime.dispatch(Message::DismissNotification);
    assert!(runtime.model().notification().is_none());

    // Dismissing with nothing queued is harmless
    runtime.dispatch(Message::DismissNotification);
    assert!(runtime.model().notification().is_none());
}

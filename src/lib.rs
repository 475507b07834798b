// SPDX-License-Identifier: MPL-2.0

//! Filtercam - filtered photo and video capture
//!
//! This library provides the core functionality for the filtercam
//! application: camera acquisition with front/rear facing, live filters,
//! in-memory photo capture and pausable WebM recording.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Application model, messages and handlers
//! - [`backends`]: Camera and microphone backend abstraction
//! - [`media`]: Filters, frame composition and encoder detection
//! - [`pipelines`]: Photo and video capture pipelines
//! - [`config`]: User configuration handling
//! - [`storage`]: Downloading captured media
//! - [`terminal`]: Terminal user interface
//!
//! # Example
//!
//! ```ignore
//! // Interactive terminal interface:
//! // filtercam
//! // Without hardware:
//! // filtercam --virtual photo --facing rear --filter sepia
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{AppModel, CaptureMode, Message};
pub use config::Config;
pub use constants::BitratePreset;
pub use media::FilterType;

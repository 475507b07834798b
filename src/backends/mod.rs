// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera and microphone capture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  App Layer                   │
//! └────────────────────┬────────────────────────┘
//!                      │ LiveStream
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │     Camera       │  │ Virtual Camera  │  │
//! │  │   (GStreamer)    │  │  (synthetic)    │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Backend trait, shared types, device selection and the
//!   GStreamer implementation
//! - [`virtual_camera`]: In-process camera and microphone for running
//!   without hardware

pub mod camera;
pub mod virtual_camera;

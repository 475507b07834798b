// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for photo and video capture
//!
//! Both pipelines work on the live stream without interrupting the preview.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │  photo.png   │
//! │   (RGBA)     │     │  - Filter/mirror  │     │  (in memory) │
//! │              │     │  - PNG encoding   │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Live Stream  │ ──▶ │  Video Pipeline   │ ──▶ │  video.webm  │
//! │ (video+mic)  │     │  - Compositor     │     │  (chunks)    │
//! │              │     │  - VP9/VP8 + Opus │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! Nothing is written to disk until the user downloads the result.

pub mod photo;
pub mod video;

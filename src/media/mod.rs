// SPDX-License-Identifier: MPL-2.0

//! Media processing: filters, frame composition and encoder selection
//!
//! # Modules
//!
//! - [`filters`]: The filter set and its CPU implementation
//! - [`compose`]: Mirroring and filtering applied to every output frame
//! - [`encoders`]: Recording profiles and GStreamer encoder elements

pub mod compose;
pub mod encoders;
pub mod filters;

pub use compose::{compose_frame, compose_image};
pub use filters::FilterType;

// SPDX-License-Identifier: GPL-3.0-only

//! Message handler modules
//!
//! Handlers are organized by functional domain.

pub mod camera;
pub mod capture;
pub mod ui;
